//! Source correspondence for a single instruction.

/// A single position in a source file, stored relative to the enclosing
/// fragment's `line_base` while the instruction lives inside a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Path of the source file, as written by the front end. Stored verbatim
    /// (no canonicalization) so two compilations of the same unit produce
    /// identical digests regardless of the caller's current directory.
    pub srcfile: String,
    /// Line number, relative to the fragment's first located instruction
    /// once rebased (see `crate::rebase`).
    pub line: u32,
    /// Column number, absolute.
    pub column: u32,
}

impl SourceLocation {
    /// Creates a new location.
    pub fn new(srcfile: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            srcfile: srcfile.into(),
            line,
            column,
        }
    }

    /// Feeds this location's contents into a running digest. Matches the
    /// original implementation's order: srcfile bytes, then line, then
    /// column, each as big-endian bytes.
    pub(crate) fn digest(&self, hasher: &mut sha2::Sha256) {
        use sha2::Digest;
        hasher.update(self.srcfile.as_bytes());
        hasher.update(self.line.to_be_bytes());
        hasher.update(self.column.to_be_bytes());
    }
}
