//! The unit stored, deduplicated, and linked against: one compiled
//! procedure's encoded sections and the fixups needed to place it alongside
//! the rest of a program.

use std::collections::BTreeMap;

use crate::section::SectionType;

/// A reference to another fragment, resolved by name at link time.
///
/// `offset == -1` is the "pointer-only" sentinel: the linker still records
/// the dependency (for graph-walk ordering and GC reachability) but does
/// not patch any bytes, because the toy language has no byte-level encoding
/// for a named reference — the relationship exists only to order the
/// layout and to be followed in reverse by future tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XFixup {
    /// Byte offset within the section's data, or `-1` for no patch.
    pub offset: i64,
    /// Symbolic name of the fragment being referenced.
    pub name: String,
}

/// A reference to another section of the *same* fragment, resolved once
/// that fragment's sections have been assigned addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IFixup {
    /// Byte offset within the section's data, or `-1` for no patch.
    pub offset: i64,
    /// The section whose final base address supplies the patch value.
    pub section: SectionType,
}

/// One section's encoded bytes plus the fixups that patch them at link
/// time. Immutable after the compiler emits it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FSection {
    /// Encoded bytes for this section.
    pub data: Vec<u8>,
    /// External fixups, in emission order.
    pub xfixups: Vec<XFixup>,
    /// Internal fixups, in emission order.
    pub ifixups: Vec<IFixup>,
}

impl FSection {
    /// A section with no fixups.
    pub fn plain(data: Vec<u8>) -> Self {
        Self {
            data,
            xfixups: Vec::new(),
            ifixups: Vec::new(),
        }
    }
}

/// One content-addressed compilation unit: a procedure's sections. Stored
/// in the repository keyed by the digest of the procedure that produced it
/// (see `crate::Instruction::digest`) — identical digests collapse to one
/// stored copy (distilled spec invariants 1 and 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Sections this fragment carries, keyed by type.
    pub sections: BTreeMap<SectionType, FSection>,
    /// The section that defines this fragment's address when referenced by
    /// name. Always `Text` in this system, but carried explicitly rather
    /// than hard-coded so the linker and GC don't need to know that.
    pub primary: SectionType,
}

impl Fragment {
    /// A fragment with only a `text` section and no fixups.
    pub fn text_only(bytes: Vec<u8>) -> Self {
        let mut sections = BTreeMap::new();
        sections.insert(SectionType::Text, FSection::plain(bytes));
        Self {
            sections,
            primary: SectionType::Text,
        }
    }

    /// The bytes of a section, or an empty slice if the fragment does not
    /// carry that section at all.
    pub fn section_bytes(&self, kind: SectionType) -> &[u8] {
        self.sections.get(&kind).map(|s| s.data.as_slice()).unwrap_or(&[])
    }

    /// Every external name referenced from any of this fragment's sections.
    pub fn referenced_names(&self) -> impl Iterator<Item = &str> {
        self.sections.values().flat_map(|s| s.xfixups.iter().map(|f| f.name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_missing_yields_empty_slice() {
        let frag = Fragment::text_only(vec![1, 2]);
        assert!(frag.section_bytes(SectionType::Data).is_empty());
        assert_eq!(frag.section_bytes(SectionType::Text), &[1, 2]);
    }

    #[test]
    fn referenced_names_collects_xfixup_targets_across_sections() {
        let mut sections = BTreeMap::new();
        sections.insert(
            SectionType::Text,
            FSection {
                data: vec![0, 0, 0, 0],
                xfixups: vec![XFixup {
                    offset: 2,
                    name: "helper".into(),
                }],
                ifixups: vec![],
            },
        );
        let frag = Fragment {
            sections,
            primary: SectionType::Text,
        };
        let names: Vec<_> = frag.referenced_names().collect();
        assert_eq!(names, vec!["helper"]);
    }
}
