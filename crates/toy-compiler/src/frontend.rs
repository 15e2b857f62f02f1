//! The seam between a source front end and the compile back end.
//!
//! The distilled specification treats source parsing as an external
//! collaborator: nothing here lexes or parses Toy source. A caller (a test
//! harness today, a future parser crate tomorrow) builds a [`CompileUnit`]
//! directly and hands a batch of them to [`crate::program::compile_program`].

use toy_store::Instruction;

/// One top-level name a compilation binds, with the (not-yet-rebased)
/// procedure it compiled from.
#[derive(Debug, Clone)]
pub struct CompileUnit {
    /// The name this procedure is bound to, e.g. a top-level `def`.
    pub name: String,
    /// The procedure's instruction tree, in source order, with absolute
    /// source locations (if any) — rebasing happens inside the compiler.
    pub procedure: Instruction,
}

impl CompileUnit {
    /// Creates a compile unit.
    pub fn new(name: impl Into<String>, procedure: Instruction) -> Self {
        Self {
            name: name.into(),
            procedure,
        }
    }
}
