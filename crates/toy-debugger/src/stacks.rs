//! Read-only, paginated dumps of a machine's three stacks — the debugger's
//! `stack`/`exec`/`dict` listing commands never mutate what they inspect.

use toy_vm::{DictFrame, Machine};

/// Default page size for a stack dump, matching the original interactive
/// debugger's `_StackDumper` — any of the three stacks can run arbitrarily
/// deep, so an unbounded dump is never the right default.
pub const DEFAULT_MAX_ROWS: usize = 20;

/// Dumps up to `max_rows` values from the top of the operand stack.
pub fn operand_stack(machine: &Machine, max_rows: usize) -> Vec<String> {
    machine.operand_stack.iter_top_to_bottom().take(max_rows).map(ToString::to_string).collect()
}

/// Dumps up to `max_rows` instructions from the top of the execution stack.
pub fn execution_stack(machine: &Machine, max_rows: usize) -> Vec<String> {
    machine.execution_stack.iter_top_to_bottom().take(max_rows).map(ToString::to_string).collect()
}

/// Dumps up to `max_rows` frames from the top of the dictionary stack. The
/// system frame is summarized rather than enumerated — its contents never
/// change within a session.
pub fn dictionary_stack(machine: &Machine, max_rows: usize) -> Vec<String> {
    machine
        .dictionary_stack
        .iter_top_to_bottom()
        .take(max_rows)
        .map(|frame| match frame {
            DictFrame::System(table) => format!("<system dictionary: {} names>", table.len()),
            DictFrame::User(dict) => format!("<user dictionary: {} names>", dict.borrow().len()),
        })
        .collect()
}
