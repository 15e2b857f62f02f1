//! The closed set of byte streams a fragment can carry.

use std::fmt;

/// Identifies a per-fragment byte stream.
///
/// `Ord` is derived in lexicographic-by-name order (`Data < DebugLine <
/// Text`) because the linker assigns section base addresses by sorting
/// section types by name (see `toy_linker::layout`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionType {
    /// Relocatable data bytes. Currently unused by the compiler back end
    /// but part of the closed set the repository format supports.
    Data,
    /// Source-correspondence records. A "stay-at-home" section: excluded
    /// from linker layout, but still copied verbatim into an executable.
    DebugLine,
    /// Encoded instruction bytes. The only section type the compiler back
    /// end currently emits fixups against, and always a fragment's
    /// primary section.
    Text,
}

impl SectionType {
    /// The stable name used in symbol suffixes (`"{name}/{section}"``) and
    /// the codec's on-disk tag.
    pub fn name(self) -> &'static str {
        match self {
            SectionType::Data => "data",
            SectionType::DebugLine => "debug_line",
            SectionType::Text => "text",
        }
    }

    /// Inverse of [`SectionType::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "data" => Some(SectionType::Data),
            "debug_line" => Some(SectionType::DebugLine),
            "text" => Some(SectionType::Text),
            _ => None,
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicographic_order_matches_name_order() {
        let mut names = vec![SectionType::Text, SectionType::Data, SectionType::DebugLine];
        names.sort();
        assert_eq!(names, vec![SectionType::Data, SectionType::DebugLine, SectionType::Text]);
    }

    #[test]
    fn name_round_trips() {
        for s in [SectionType::Data, SectionType::DebugLine, SectionType::Text] {
            assert_eq!(SectionType::from_name(s.name()), Some(s));
        }
    }
}
