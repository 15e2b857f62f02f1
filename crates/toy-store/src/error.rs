//! Errors raised while encoding, decoding, or loading repository artifacts.

use thiserror::Error;

/// Errors that can occur while decoding an instruction stream or a
/// repository's binary framing.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The stream ended before the expected number of bytes could be read.
    #[error("unexpected end of stream at offset {0}")]
    UnexpectedEnd(usize),

    /// The fixed magic number that must precede every instruction did not
    /// match. Indicates the reader and writer have desynchronized.
    #[error("instruction magic number mismatch at offset {0}")]
    BadMagic(usize),

    /// The class-id following the magic number does not correspond to any
    /// known instruction variant.
    #[error("unknown instruction class-id {0:#010x} at offset {1}")]
    UnknownClass(u32, usize),

    /// A string field was not valid UTF-8.
    #[error("invalid UTF-8 string at offset {0}")]
    InvalidUtf8(usize),

    /// The repository file's magic number did not match.
    #[error("repository magic number mismatch")]
    BadRepositoryMagic,

    /// The repository file declares a version this build does not support.
    #[error("unsupported repository version {0}")]
    UnsupportedVersion(u32),
}

/// Errors that can occur while loading or saving a [`crate::Repository`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The file could not be decoded as a repository at all.
    #[error("repository '{path}' was not valid: {source}")]
    Invalid {
        /// Path that failed to decode.
        path: String,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// An I/O failure while reading or writing the repository file.
    #[error("I/O error on repository file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while rebasing a compiled procedure's source
/// locations (distilled spec invariant 6 and §4.2).
#[derive(Debug, Error)]
pub enum RebaseError {
    /// A located instruction's absolute line fell before the tree's
    /// established `line_base`, which can only happen if the tree was not
    /// built from a single compilation's source order.
    #[error("source line {line} precedes established line_base {line_base}")]
    NonMonotonicLine {
        /// The offending instruction's absolute line.
        line: u32,
        /// The base established by the tree's first located instruction.
        line_base: u32,
    },
}

/// Errors that can occur while loading, saving, or interpreting an
/// [`crate::Executable`] or [`crate::TicketFile`].
#[derive(Debug, Error)]
pub enum ExecutableError {
    /// An I/O failure while reading or writing the file.
    #[error("I/O error on executable file: {0}")]
    Io(#[from] std::io::Error),

    /// The file was not valid JSON, or not shaped like an executable.
    #[error("executable file was not valid: {0}")]
    Json(#[from] serde_json::Error),

    /// A section name in the file is not one of the known section types.
    #[error("unknown section name '{0}' in executable file")]
    UnknownSection(String),
}
