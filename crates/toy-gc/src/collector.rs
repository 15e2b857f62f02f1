//! Traces a repository from its extant external roots — ticket files and
//! linked executables still on disk — and rewrites it to keep only what
//! those roots still reach.

use std::path::Path;

use log::warn;
use toy_store::{Executable, Repository, TicketFile};

use crate::error::GcError;

/// Collects `source`, writing the result back to `source`'s own file at
/// `dest_path`.
///
/// A stripped (`None`) fragment is kept unconditionally — it costs nothing
/// to retain and might still be named by a ticket or link elsewhere.
/// A ticket or link is kept only if its external file still exists and
/// decodes to the UUID the repository recorded for it; anything else is
/// treated as "this reference is gone," not an error (distilled spec §4.8,
/// the one locally-recovered error class per §7).
pub fn collect(source: &Repository, dest_path: &Path) -> Result<(), GcError> {
    let mut dest = Repository::new(source.uuid);

    for (digest, fragment) in &source.fragments {
        if fragment.is_none() {
            dest.fragments.insert(digest.clone(), None);
        }
    }

    for (id, entry) in &source.tickets {
        if !ticket_file_matches(&entry.path, *id) {
            warn!("gc: dropping ticket {id} — external file '{}' is gone or stale", entry.path);
            continue;
        }
        for member in &entry.members {
            if let Some(fragment) = source.fragments.get(&member.digest).and_then(Option::clone) {
                dest.fragments.insert(member.digest.clone(), Some(fragment));
            }
        }
        dest.tickets.insert(*id, entry.clone());
    }

    for link in &source.links {
        let exe = match load_matching_executable(&link.file, link.uuid) {
            Some(exe) => exe,
            None => {
                warn!("gc: dropping link to '{}' — executable is gone or stale", link.file);
                continue;
            }
        };
        for record in &exe.debug {
            if let Some(fragment) = source.fragments.get(&record.fragment_digest).and_then(Option::clone) {
                dest.fragments.insert(record.fragment_digest.clone(), Some(fragment));
            }
        }
        dest.store_link(link.clone());
    }

    dest.save(dest_path)?;
    Ok(())
}

fn ticket_file_matches(path: &str, id: uuid::Uuid) -> bool {
    let Ok(json) = std::fs::read_to_string(path) else {
        return false;
    };
    let Ok(ticket) = serde_json::from_str::<TicketFile>(&json) else {
        return false;
    };
    ticket.id == id
}

fn load_matching_executable(path: &str, id: uuid::Uuid) -> Option<Executable> {
    let exe = Executable::load(Path::new(path)).ok()?;
    if exe.uuid == id {
        Some(exe)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use toy_store::{DebugLineRecord, Fragment, LinksRecord, RepositoryRecord, Symbol, TicketFileEntry, TicketMember};
    use uuid::Uuid;

    #[test]
    fn drops_ticket_whose_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::new(Uuid::new_v4());
        repo.store_fragment("d1", Fragment::text_only(vec![1]));
        repo.store_ticket(
            Uuid::new_v4(),
            TicketFileEntry {
                path: dir.path().join("gone.o").display().to_string(),
                members: vec![TicketMember {
                    name: "main".into(),
                    digest: "d1".into(),
                    line_base: None,
                }],
            },
        );

        let dest_path = dir.path().join("repo.ryr");
        collect(&repo, &dest_path).unwrap();
        let collected = Repository::load(&dest_path).unwrap();
        assert!(collected.tickets.is_empty());
        assert!(collected.fragments.is_empty());
    }

    #[test]
    fn keeps_ticket_whose_file_still_matches() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::new(Uuid::new_v4());
        repo.store_fragment("d1", Fragment::text_only(vec![1]));
        let ticket_id = Uuid::new_v4();
        let ticket_path = dir.path().join("a.o");
        std::fs::write(&ticket_path, serde_json::to_string(&TicketFile::new(ticket_id)).unwrap()).unwrap();
        repo.store_ticket(
            ticket_id,
            TicketFileEntry {
                path: ticket_path.display().to_string(),
                members: vec![TicketMember {
                    name: "main".into(),
                    digest: "d1".into(),
                    line_base: None,
                }],
            },
        );

        let dest_path = dir.path().join("repo.ryr");
        collect(&repo, &dest_path).unwrap();
        let collected = Repository::load(&dest_path).unwrap();
        assert_eq!(collected.tickets.len(), 1);
        assert!(collected.fragment("d1").is_some());
    }

    #[test]
    fn stripped_fragments_survive_even_when_unreferenced() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::new(Uuid::new_v4());
        repo.fragments.insert("stripped".into(), None);

        let dest_path = dir.path().join("repo.ryr");
        collect(&repo, &dest_path).unwrap();
        let collected = Repository::load(&dest_path).unwrap();
        assert!(collected.contains_digest("stripped"));
        assert!(collected.fragment("stripped").is_none());
    }

    #[test]
    fn gc_drops_link_to_missing_executable() {
        // Distilled spec §8 scenario.
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::new(Uuid::new_v4());
        repo.store_fragment("d1", Fragment::text_only(vec![1]));
        repo.store_link(LinksRecord {
            file: dir.path().join("gone.texe").display().to_string(),
            uuid: Uuid::new_v4(),
        });

        let dest_path = dir.path().join("repo.ryr");
        collect(&repo, &dest_path).unwrap();
        let collected = Repository::load(&dest_path).unwrap();
        assert!(collected.links.is_empty());
    }

    #[test]
    fn keeps_link_and_its_debug_fragments_when_executable_matches() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::new(Uuid::new_v4());
        repo.store_fragment("d1", Fragment::text_only(vec![1, 2]));

        let link_uuid = Uuid::new_v4();
        let mut data = BTreeMap::new();
        data.insert(toy_store::SectionType::Text, vec![1, 2]);
        let exe = Executable {
            uuid: link_uuid,
            repository: RepositoryRecord {
                path: "repo.ryr".into(),
                uuid: repo.uuid,
            },
            symbols: vec![Symbol {
                name: "main".into(),
                address: 0,
                size: 2,
            }],
            data,
            debug: vec![DebugLineRecord {
                address: 0,
                fragment_digest: "d1".into(),
                line_base: 1,
            }],
        };
        let exe_path = dir.path().join("a.texe");
        exe.save(&exe_path).unwrap();
        repo.store_link(LinksRecord {
            file: exe_path.display().to_string(),
            uuid: link_uuid,
        });

        let dest_path = dir.path().join("repo.ryr");
        collect(&repo, &dest_path).unwrap();
        let collected = Repository::load(&dest_path).unwrap();
        assert_eq!(collected.links.len(), 1);
        assert!(collected.fragment("d1").is_some());
    }
}
