//! The Toy virtual machine: loads a linked executable and runs it on three
//! front-push, front-pop stacks.

pub mod builtins;
pub mod dyld;
mod error;
pub mod machine;
pub mod runtime;
mod stack;

pub use dyld::{LoadError, LoadedProgram};
pub use error::VmError;
pub use machine::{BuiltinFn, DictFrame, Machine};
pub use runtime::{Body, RuntimeInstr, Trap};
pub use stack::Stack;
