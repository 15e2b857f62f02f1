//! Folds several repositories into one, for ecosystems that build fragments
//! in parallel and need to consolidate them into a single store.

use thiserror::Error;
use uuid::Uuid;

use log::warn;
use toy_store::Repository;

/// Errors raised while merging repositories.
#[derive(Debug, Error)]
pub enum MergeError {
    /// `merge` was called with no inputs — there is no sensible identity to
    /// mint a result repository under.
    #[error("merge requires at least one input repository")]
    NoInputs,
}

/// Folds `inputs` into a single repository.
///
/// The first input's UUID becomes the result's identity (arbitrary but
/// stable choice, recorded in DESIGN.md). Fragments fold digest-wise:
/// a `None` already on record is unconditionally overwritten by an
/// incoming `Some` body (merge can heal a repository that was stripped);
/// two incoming `Some` bodies for the same digest that already agree are a
/// silent no-op (legitimate — distinct compilations of identical source
/// produce identical digests); two that disagree are a content-addressing
/// violation, logged and the first body kept. Tickets fold by UUID,
/// logging and skipping a collision rather than failing outright, since
/// ticket UUIDs are expected to be unique across the ecosystem and a clash
/// indicates a caller error rather than this merge's own fault. Links are
/// never merged — they are specific to the repository file the executable
/// that produced them still points at.
pub fn merge(inputs: &[Repository]) -> Result<Repository, MergeError> {
    let first = inputs.first().ok_or(MergeError::NoInputs)?;
    let mut result = Repository::new(first.uuid);

    for input in inputs {
        for (digest, incoming) in &input.fragments {
            match (result.fragments.get(digest).cloned(), incoming) {
                (None, incoming) => {
                    result.fragments.insert(digest.clone(), incoming.clone());
                }
                (Some(None), Some(_)) => {
                    result.fragments.insert(digest.clone(), incoming.clone());
                }
                (Some(Some(_)), None) => {
                    // Incoming is stripped, existing has a body: keep the body.
                }
                (Some(Some(existing)), Some(new)) if &existing != new => {
                    warn!("merge: digest {digest} disagrees between inputs, keeping the first body seen");
                }
                _ => {
                    // Both `None`, or both `Some` and equal: no-op.
                }
            }
        }

        for (id, entry) in &input.tickets {
            if result.tickets.contains_key(id) {
                warn!("merge: ticket {id} collides across inputs, skipping");
                continue;
            }
            result.store_ticket(*id, entry.clone());
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use toy_store::{Fragment, TicketFileEntry, TicketMember};

    #[test]
    fn merges_fragments_from_distinct_repositories() {
        let mut a = Repository::new(Uuid::new_v4());
        a.store_fragment("d1", Fragment::text_only(vec![1]));
        let mut b = Repository::new(Uuid::new_v4());
        b.store_fragment("d2", Fragment::text_only(vec![2]));

        let merged = merge(&[a, b]).unwrap();
        assert!(merged.fragment("d1").is_some());
        assert!(merged.fragment("d2").is_some());
    }

    #[test]
    fn stripped_destination_is_healed_by_an_incoming_body() {
        let mut a = Repository::new(Uuid::new_v4());
        a.fragments.insert("d1".into(), None);
        let mut b = Repository::new(Uuid::new_v4());
        b.store_fragment("d1", Fragment::text_only(vec![9]));

        let merged = merge(&[a, b]).unwrap();
        assert!(merged.fragment("d1").is_some());
    }

    #[test]
    fn agreeing_duplicate_bodies_merge_silently() {
        let mut a = Repository::new(Uuid::new_v4());
        a.store_fragment("d1", Fragment::text_only(vec![1]));
        let mut b = Repository::new(Uuid::new_v4());
        b.store_fragment("d1", Fragment::text_only(vec![1]));

        let merged = merge(&[a, b]).unwrap();
        assert_eq!(merged.fragment("d1").unwrap().section_bytes(toy_store::SectionType::Text), &[1]);
    }

    #[test]
    fn colliding_ticket_uuids_are_skipped_not_errored() {
        let id = Uuid::new_v4();
        let mut a = Repository::new(Uuid::new_v4());
        a.store_ticket(
            id,
            TicketFileEntry {
                path: "/tmp/a.o".into(),
                members: vec![TicketMember {
                    name: "main".into(),
                    digest: "d1".into(),
                    line_base: None,
                }],
            },
        );
        let mut b = Repository::new(Uuid::new_v4());
        b.store_ticket(
            id,
            TicketFileEntry {
                path: "/tmp/b.o".into(),
                members: vec![],
            },
        );

        let merged = merge(&[a, b]).unwrap();
        assert_eq!(merged.tickets.len(), 1);
        assert_eq!(merged.tickets[&id].path, "/tmp/a.o");
    }

    #[test]
    fn no_inputs_is_rejected() {
        let err = merge(&[]).unwrap_err();
        assert!(matches!(err, MergeError::NoInputs));
    }

    #[test]
    fn links_are_never_merged() {
        let mut a = Repository::new(Uuid::new_v4());
        a.store_link(toy_store::LinksRecord {
            file: "/tmp/a.texe".into(),
            uuid: Uuid::new_v4(),
        });
        let b = Repository::new(Uuid::new_v4());

        let merged = merge(&[a, b]).unwrap();
        assert!(merged.links.is_empty());
    }
}
