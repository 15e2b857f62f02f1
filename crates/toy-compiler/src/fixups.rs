//! Finds the names a compiled procedure references that it does not
//! itself define.

use std::collections::BTreeSet;

use toy_store::Instruction;
use toy_vm::builtins::is_builtin;

/// The transitive set of `Operator` names reachable from `instr`, minus the
/// system dictionary's own names.
///
/// This is the fragment's external-reference set: every name in it must be
/// resolved by some other fragment's ticket member at link time (distilled
/// spec invariant 5).
pub fn external_names(instr: &Instruction) -> BTreeSet<String> {
    instr
        .walk()
        .filter_map(Instruction::name)
        .filter(|name| !is_builtin(name))
        .map(str::to_string)
        .collect()
}
