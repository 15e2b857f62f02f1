//! Errors raised while loading or executing a Toy program.

use thiserror::Error;

/// Errors the VM can raise while executing a program.
#[derive(Debug, Error)]
pub enum VmError {
    /// An `Operator` referenced a name not found in any frame of the
    /// dictionary stack.
    #[error("name not found: {0}")]
    NameNotFound(String),

    /// A built-in received an operand of the wrong kind.
    #[error("type check failed in '{op}': expected {expected}, got {found}")]
    TypeCheck {
        /// The built-in operator that rejected its operand.
        op: &'static str,
        /// What it expected.
        expected: &'static str,
        /// What it actually found on the stack.
        found: &'static str,
    },

    /// A pop or peek was attempted on an empty stack.
    #[error("stack underflow in '{0}'")]
    StackUnderflow(&'static str),

    /// A write was attempted against the immutable system dictionary.
    #[error("cannot redefine system name: {0}")]
    SystemDictionaryIsImmutable(String),

    /// An error surfaced while loading an executable into the VM.
    #[error("failed to load executable: {0}")]
    Load(#[from] crate::dyld::LoadError),
}
