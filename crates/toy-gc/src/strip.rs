//! Discards every fragment body while keeping every digest on record — the
//! cheapest way to shrink a repository file without losing the ability to
//! recompile against it later.

use uuid::Uuid;

use toy_store::Repository;

/// Clears every fragment's body to `None`, drops every ticket and link, and
/// regenerates the repository's identity.
///
/// Tickets and links are cleared rather than merely left dangling: both
/// reference fragment bodies (directly, or via a linked executable's debug
/// records) that no longer exist, so keeping them around would only let a
/// later `toy gc` rediscover work that `toy strip` just threw away. The
/// fresh UUID marks the stripped repository as a distinct artifact from the
/// one it was stripped from — any executable linked against the original
/// will correctly refuse to load against it (see `toy_vm::dyld::LoadError::RepositoryMismatch`).
pub fn strip(repo: Repository) -> Repository {
    let mut stripped = Repository::new(Uuid::new_v4());
    for digest in repo.fragments.into_keys() {
        stripped.fragments.insert(digest, None);
    }
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;
    use toy_store::{Fragment, TicketFileEntry, TicketMember};

    #[test]
    fn clears_every_fragment_body_but_keeps_digests() {
        let mut repo = Repository::new(Uuid::new_v4());
        repo.store_fragment("d1", Fragment::text_only(vec![1]));
        repo.store_fragment("d2", Fragment::text_only(vec![2]));

        let stripped = strip(repo);
        assert!(stripped.contains_digest("d1"));
        assert!(stripped.contains_digest("d2"));
        assert!(stripped.fragment("d1").is_none());
        assert!(stripped.fragment("d2").is_none());
    }

    #[test]
    fn clears_tickets_and_links_and_mints_a_new_uuid() {
        let original_uuid = Uuid::new_v4();
        let mut repo = Repository::new(original_uuid);
        repo.store_ticket(
            Uuid::new_v4(),
            TicketFileEntry {
                path: "/tmp/a.o".into(),
                members: vec![TicketMember {
                    name: "main".into(),
                    digest: "d1".into(),
                    line_base: None,
                }],
            },
        );

        let stripped = strip(repo);
        assert!(stripped.tickets.is_empty());
        assert!(stripped.links.is_empty());
        assert_ne!(stripped.uuid, original_uuid);
    }

    #[test]
    fn strip_then_gc_preserves_every_digest() {
        // Distilled spec §8 scenario: a fresh GC pass over a just-stripped
        // repository must not discard the bodyless digests it just kept.
        let mut repo = Repository::new(Uuid::new_v4());
        repo.store_fragment("d1", Fragment::text_only(vec![1]));
        repo.store_fragment("d2", Fragment::text_only(vec![2]));

        let stripped = strip(repo);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("repo.ryr");
        crate::collector::collect(&stripped, &dest).unwrap();

        let collected = Repository::load(&dest).unwrap();
        assert!(collected.contains_digest("d1"));
        assert!(collected.contains_digest("d2"));
    }
}
