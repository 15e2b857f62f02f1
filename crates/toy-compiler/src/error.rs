//! Errors raised while compiling a set of procedures into the repository.

use thiserror::Error;

/// Errors the compiler can raise.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The same name was compiled twice within one invocation — distinct
    /// from the linker's cross-ticket `DuplicateDefinition`, which is
    /// about collisions between separate compilations.
    #[error("name '{0}' compiled more than once in the same unit")]
    DuplicateNameInUnit(String),

    /// A unit's procedure was not itself a `Procedure` instruction — every
    /// top-level name must bind one.
    #[error("compile unit '{0}' did not bind a Procedure")]
    NotAProcedure(String),

    /// Rebasing violated the monotonic-line invariant: a located
    /// instruction appeared before the tree's established `line_base`.
    #[error("non-monotonic source line in '{0}'")]
    NonMonotonicLine(String),

    /// Writing the external ticket file failed.
    #[error("failed to write ticket file '{path}': {source}")]
    TicketWrite {
        /// Path the compiler attempted to write.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The ticket file's JSON envelope could not be produced.
    #[error("failed to encode ticket file: {0}")]
    TicketEncode(#[from] serde_json::Error),

    /// The repository could not be loaded or saved.
    #[error(transparent)]
    Repository(#[from] toy_store::RepositoryError),
}
