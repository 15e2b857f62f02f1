//! Depth-first traversal of the external-reference graph, from entry
//! points down to every fragment they transitively depend on.

use std::collections::{BTreeMap, HashSet};

use crate::eligible::EligibleFragment;
use crate::error::LinkError;

/// Receives one callback per distinct fragment name, in post-order: every
/// referent a fragment depends on is visited before the fragment itself.
///
/// Mirrors the reference toolchain's own visitor-based graph walk — one
/// method, called exactly once per name, so a layout pass (or any other
/// graph consumer) never needs its own cycle/diamond bookkeeping.
pub trait LinkVisitor {
    /// Called once per distinct name, after every name it references
    /// (directly or transitively) has already been visited.
    fn visit(&mut self, name: &str, digest: &str, fragment: &EligibleFragment);
}

/// Walks the external-reference graph from every entry point in `entries`,
/// failing if any entry point is undefined (distilled spec's
/// `UndefinedEntryPoint`). A `HashSet` of visited names makes cycles and
/// diamonds safe: each name is visited exactly once, the first time it is
/// reached.
pub fn walk_from_entries(
    entries: &[String],
    eligible: &BTreeMap<String, EligibleFragment>,
    visitor: &mut impl LinkVisitor,
) -> Result<(), LinkError> {
    for entry in entries {
        if !eligible.contains_key(entry) {
            return Err(LinkError::UndefinedEntryPoint(entry.clone()));
        }
    }

    let mut visited = HashSet::new();
    for entry in entries {
        walk(entry, eligible, &mut visited, visitor)?;
    }
    Ok(())
}

fn walk(
    name: &str,
    eligible: &BTreeMap<String, EligibleFragment>,
    visited: &mut HashSet<String>,
    visitor: &mut impl LinkVisitor,
) -> Result<(), LinkError> {
    if visited.contains(name) {
        return Ok(());
    }
    visited.insert(name.to_string());

    let ef = eligible.get(name).ok_or_else(|| LinkError::UndefinedReference(name.to_string()))?;

    for referent in ef.fragment.referenced_names() {
        walk(referent, eligible, visited, visitor)?;
    }

    visitor.visit(name, &ef.digest, ef);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use toy_store::{Fragment, SectionType, XFixup};

    fn frag_referencing(names: &[&str]) -> EligibleFragment {
        let mut fragment = Fragment::text_only(vec![0, 0]);
        fragment.sections.get_mut(&SectionType::Text).unwrap().xfixups =
            names.iter().map(|n| XFixup { offset: -1, name: n.to_string() }).collect();
        EligibleFragment {
            digest: format!("d-{}", names.join("-")),
            fragment,
            line_base: None,
        }
    }

    #[test]
    fn visits_post_order_and_each_name_once() {
        let mut eligible = BTreeMap::new();
        eligible.insert("main".to_string(), frag_referencing(&["helper"]));
        eligible.insert("helper".to_string(), frag_referencing(&[]));

        let mut order = Vec::new();
        struct Recorder<'a>(&'a mut Vec<String>);
        impl LinkVisitor for Recorder<'_> {
            fn visit(&mut self, name: &str, _digest: &str, _fragment: &EligibleFragment) {
                self.0.push(name.to_string());
            }
        }
        walk_from_entries(&["main".to_string()], &eligible, &mut Recorder(&mut order)).unwrap();
        assert_eq!(order, vec!["helper", "main"]);
    }

    #[test]
    fn cycles_are_visited_exactly_once() {
        let mut eligible = BTreeMap::new();
        eligible.insert("a".to_string(), frag_referencing(&["b"]));
        eligible.insert("b".to_string(), frag_referencing(&["a"]));

        let mut order = Vec::new();
        struct Recorder<'a>(&'a mut Vec<String>);
        impl LinkVisitor for Recorder<'_> {
            fn visit(&mut self, name: &str, _digest: &str, _fragment: &EligibleFragment) {
                self.0.push(name.to_string());
            }
        }
        walk_from_entries(&["a".to_string()], &eligible, &mut Recorder(&mut order)).unwrap();
        assert_eq!(order.len(), 2);
        assert!(order.contains(&"a".to_string()));
        assert!(order.contains(&"b".to_string()));
    }

    #[test]
    fn undefined_entry_point_errors() {
        let eligible = BTreeMap::new();
        struct Noop;
        impl LinkVisitor for Noop {
            fn visit(&mut self, _: &str, _: &str, _: &EligibleFragment) {}
        }
        let err = walk_from_entries(&["main".to_string()], &eligible, &mut Noop).unwrap_err();
        assert!(matches!(err, LinkError::UndefinedEntryPoint(name) if name == "main"));
    }
}
