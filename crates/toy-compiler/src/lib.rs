//! Turns rebased instruction trees into the repository's content-addressed
//! fragments, plus the ticket that records one compilation's bindings.
//!
//! Source parsing is an external collaborator (distilled spec §1): this
//! crate's input is a batch of [`frontend::CompileUnit`]s a caller already
//! built, not source text.

mod backend;
pub mod error;
mod fixups;
mod frontend;
mod program;
mod prune;

pub use backend::back_end;
pub use error::CompileError;
pub use fixups::external_names;
pub use frontend::CompileUnit;
pub use program::{compile_program, CompileOutput};
pub use prune::is_cached;
