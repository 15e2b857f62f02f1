//! Single-step and step-over execution control, implemented by splicing a
//! self-removing trap into a live procedure body.

use std::cell::RefCell;
use std::rc::Rc;

use toy_vm::{Body, DictFrame, Machine, RuntimeInstr, Trap, VmError};

/// Advances `machine` by exactly one source-level step.
///
/// Pops the next execution-stack instruction. If it is an `Operator` that
/// resolves to a user-defined `Procedure` and `over` is false, a trap is
/// spliced into position 0 of that procedure's body: the call is re-pushed,
/// entered, and the machine stops the instant the trap fires — at the
/// body's first instruction. Otherwise (`over` is true, or the instruction
/// doesn't resolve to a user procedure at all — a literal, or a built-in)
/// the trap is pushed directly after the re-pushed instruction, so the
/// whole call executes as a single unit and the machine stops at the
/// instruction that follows it.
///
/// Mirrors the original interactive debugger's `_interrupt_and_remove`
/// closure, including the self-removing trap so the user never observes it
/// in a subsequent procedure listing.
pub fn step(machine: &mut Machine, over: bool) -> Result<(), VmError> {
    let Some(instr) = machine.execution_stack.pop() else {
        return Ok(());
    };

    let target_body = if over {
        None
    } else {
        match &instr {
            RuntimeInstr::Operator(name) => resolve_user_procedure(machine, name),
            _ => None,
        }
    };

    match target_body {
        Some(body) => {
            let trap = RuntimeInstr::Trap(Rc::new(Trap::new(body.clone(), 0)));
            body.borrow_mut().insert(0, trap);
            machine.execution_stack.push(instr);
        }
        None => {
            let owner: Body = Rc::new(RefCell::new(Vec::new()));
            let trap = RuntimeInstr::Trap(Rc::new(Trap::new(owner, 0)));
            machine.execution_stack.push(trap);
            machine.execution_stack.push(instr);
        }
    }

    machine.clear_interrupt();
    machine.run_all()
}

/// Resolves `name` the same way `Machine::invoke` would, but without
/// executing anything — used to decide whether a step should descend into
/// a user procedure or treat the call as a single opaque unit.
fn resolve_user_procedure(machine: &Machine, name: &str) -> Option<Body> {
    for frame in machine.dictionary_stack.iter_top_to_bottom() {
        match frame {
            DictFrame::System(table) => {
                if table.contains_key(name) {
                    return None;
                }
            }
            DictFrame::User(dict) => {
                if let Some(value) = dict.borrow().get(name) {
                    return match value {
                        RuntimeInstr::Procedure(body) => Some(body.clone()),
                        _ => None,
                    };
                }
            }
        }
    }
    None
}
