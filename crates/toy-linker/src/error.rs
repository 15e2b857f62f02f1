//! Errors raised while linking tickets against a repository into an
//! executable.

use thiserror::Error;
use uuid::Uuid;

/// Errors the linker can raise.
#[derive(Debug, Error)]
pub enum LinkError {
    /// A ticket id passed to the linker has no entry in the repository.
    #[error("ticket {0} is not recorded in the repository")]
    TicketMissing(Uuid),

    /// A ticket member's digest has no fragment in the repository.
    #[error("fragment {0} is missing from the repository")]
    FragmentMissing(String),

    /// Two tickets being linked together both bind the same name.
    #[error("name '{0}' is defined more than once among the linked tickets")]
    DuplicateDefinition(String),

    /// A requested entry point is not among the eligible fragments.
    #[error("entry point '{0}' is undefined")]
    UndefinedEntryPoint(String),

    /// A fragment's external fixup (or the graph walk following it)
    /// references a name with no eligible binding. Distinct from
    /// `FragmentMissing`: the *name* was never bound by any linked ticket,
    /// rather than a bound digest being absent from the repository.
    #[error("reference to undefined name '{0}'")]
    UndefinedReference(String),

    /// A fixup's offset does not fall within its section's bytes.
    #[error("fixup into '{name}' at offset {offset} falls outside its section")]
    FixupOutOfBounds {
        /// The fragment name the fixup would have patched.
        name: String,
        /// The out-of-range offset.
        offset: i64,
    },

    /// An I/O failure while writing the linked executable.
    #[error("I/O error while linking: {0}")]
    Io(#[from] std::io::Error),

    /// The executable could not be encoded.
    #[error(transparent)]
    Executable(#[from] toy_store::ExecutableError),

    /// The repository could not be loaded or saved.
    #[error(transparent)]
    Repository(#[from] toy_store::RepositoryError),
}
