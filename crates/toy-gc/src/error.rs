//! Errors raised while collecting, stripping, or merging repositories.

use thiserror::Error;

/// Errors the garbage collector, stripper, or merger can raise.
///
/// Notably absent: a "reference points at a missing file" variant. Per the
/// distilled specification, a ticket or link whose external file has gone
/// missing or drifted is not a failure — it is simply no longer a root, and
/// collection proceeds without it (see `toy_gc::collector`).
#[derive(Debug, Error)]
pub enum GcError {
    /// An I/O failure while reading or writing the repository file itself.
    #[error("I/O error during garbage collection: {0}")]
    Io(#[from] std::io::Error),

    /// The repository could not be loaded or saved.
    #[error(transparent)]
    Repository(#[from] toy_store::RepositoryError),
}
