//! Assigns addresses to every fragment the graph walk visits, one section
//! at a time, in post-order — referents end up at lower addresses than the
//! referrers that point to them.

use std::collections::BTreeMap;

use toy_store::SectionType;

use crate::eligible::EligibleFragment;
use crate::graph::LinkVisitor;

/// Section types excluded from address layout. Their bytes still travel
/// with the executable (attached to debug records, keyed by fragment
/// digest), just never laid out at an address of their own.
pub fn is_stay_at_home(kind: SectionType) -> bool {
    kind == SectionType::DebugLine
}

/// One fragment's placement within a single section's byte stream.
#[derive(Debug, Clone)]
pub struct Placement {
    /// The fragment's bound name.
    pub name: String,
    /// Its digest, carried through for debug record construction.
    pub digest: String,
    /// Section-relative address (before the section's base is added).
    pub address: u64,
}

/// One section's placements, in the order the graph walk produced them,
/// plus the running "dot" (next free address) used while building it.
#[derive(Debug, Clone, Default)]
pub struct SectionLayout {
    /// Placements in layout order.
    pub placements: Vec<Placement>,
    /// Total bytes placed so far in this section.
    pub dot: u64,
}

/// The linker's complete address assignment: every laid-out section plus
/// the symbol table built while laying it out.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Sections that received at least one placement, key-ordered
    /// (`Data < DebugLine < Text`, though `DebugLine` never appears here).
    pub sections: BTreeMap<SectionType, SectionLayout>,
    /// Name (or `name/section` for a non-primary section) to
    /// section-relative address.
    pub name_address: BTreeMap<String, u64>,
}

/// A [`LinkVisitor`] that builds a [`Layout`] as the graph walk visits
/// fragments in post-order.
pub struct LayoutBuilder<'a> {
    layout: &'a mut Layout,
}

impl<'a> LayoutBuilder<'a> {
    /// Builds layout into `layout` as the walk proceeds.
    pub fn new(layout: &'a mut Layout) -> Self {
        Self { layout }
    }
}

impl LinkVisitor for LayoutBuilder<'_> {
    fn visit(&mut self, name: &str, digest: &str, fragment: &EligibleFragment) {
        for (kind, section) in &fragment.fragment.sections {
            if is_stay_at_home(*kind) {
                continue;
            }

            let section_layout = self.layout.sections.entry(*kind).or_default();
            let address = section_layout.dot;
            section_layout.placements.push(Placement {
                name: name.to_string(),
                digest: digest.to_string(),
                address,
            });

            let key = if *kind == fragment.fragment.primary {
                name.to_string()
            } else {
                format!("{name}/{}", kind.name())
            };
            self.layout.name_address.insert(key, address);

            section_layout.dot += section.data.len() as u64;
        }
    }
}

/// Computes each laid-out section's base address: sections sorted
/// lexicographically by name, each assigned the cumulative size of every
/// section before it — a single concatenative address space.
pub fn section_bases(layout: &Layout) -> BTreeMap<SectionType, u64> {
    let mut bases = BTreeMap::new();
    let mut offset = 0u64;
    for (kind, section_layout) in &layout.sections {
        bases.insert(*kind, offset);
        offset += section_layout.dot;
    }
    bases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::walk_from_entries;
    use toy_store::{Fragment, XFixup};

    fn frag(bytes: Vec<u8>, xfixups: Vec<XFixup>) -> EligibleFragment {
        let mut fragment = Fragment::text_only(bytes);
        fragment.sections.get_mut(&SectionType::Text).unwrap().xfixups = xfixups;
        EligibleFragment {
            digest: "d".into(),
            fragment,
            line_base: None,
        }
    }

    #[test]
    fn scenario_places_referent_before_referrer() {
        // Distilled spec §8 scenario 3.
        let mut eligible = BTreeMap::new();
        eligible.insert(
            "main".to_string(),
            frag(vec![0, 0, 0, 0], vec![XFixup { offset: 2, name: "f".into() }]),
        );
        eligible.insert("f".to_string(), frag(vec![0, 0], vec![]));

        let mut layout = Layout::default();
        walk_from_entries(&["main".to_string()], &eligible, &mut LayoutBuilder::new(&mut layout)).unwrap();

        assert_eq!(layout.name_address["f"], 0);
        assert_eq!(layout.name_address["main"], 2);

        let bases = section_bases(&layout);
        assert_eq!(bases[&SectionType::Text], 0);
    }

    #[test]
    fn non_primary_section_is_published_under_slash_name() {
        let mut fragment = Fragment::text_only(vec![1, 2]);
        fragment
            .sections
            .insert(SectionType::Data, toy_store::FSection::plain(vec![9]));
        let ef = EligibleFragment {
            digest: "d".into(),
            fragment,
            line_base: None,
        };
        let mut eligible = BTreeMap::new();
        eligible.insert("main".to_string(), ef);

        let mut layout = Layout::default();
        walk_from_entries(&["main".to_string()], &eligible, &mut LayoutBuilder::new(&mut layout)).unwrap();

        assert!(layout.name_address.contains_key("main"));
        assert!(layout.name_address.contains_key("main/data"));
    }
}
