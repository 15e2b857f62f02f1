//! Collects the fragments a particular link is allowed to see: the union of
//! every member bound by the tickets it was asked to link.

use std::collections::BTreeMap;

use toy_store::{Fragment, Repository};
use uuid::Uuid;

use crate::error::LinkError;

/// One name's binding as visible to a particular link.
#[derive(Debug, Clone)]
pub struct EligibleFragment {
    /// Digest of the bound fragment.
    pub digest: String,
    /// The fragment itself, cloned out of the repository so the linker can
    /// work without holding a borrow of it for the whole link.
    pub fragment: Fragment,
    /// The fragment's `line_base`, if it carries debug information.
    pub line_base: Option<u32>,
}

/// Builds the name→fragment map a link over `tickets` is eligible to use.
///
/// Per distilled spec §4.4: every ticket id must be on record, every member
/// digest must resolve to a fragment, and no two tickets may bind the same
/// name.
pub fn collect(tickets: &[Uuid], repo: &Repository) -> Result<BTreeMap<String, EligibleFragment>, LinkError> {
    let mut eligible = BTreeMap::new();

    for ticket_id in tickets {
        let entry = repo.ticket(ticket_id).ok_or(LinkError::TicketMissing(*ticket_id))?;
        for member in &entry.members {
            let fragment = repo
                .fragment(&member.digest)
                .ok_or_else(|| LinkError::FragmentMissing(member.digest.clone()))?;

            if eligible.contains_key(&member.name) {
                return Err(LinkError::DuplicateDefinition(member.name.clone()));
            }

            eligible.insert(
                member.name.clone(),
                EligibleFragment {
                    digest: member.digest.clone(),
                    fragment: fragment.clone(),
                    line_base: member.line_base,
                },
            );
        }
    }

    Ok(eligible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use toy_store::{Fragment as Frag, TicketFileEntry, TicketMember};

    fn repo_with(entries: Vec<(Uuid, Vec<(&str, &str)>)>) -> Repository {
        let mut repo = Repository::new(Uuid::new_v4());
        for (id, members) in entries {
            let mut ticket_members = Vec::new();
            for (name, digest) in members {
                repo.store_fragment(digest, Frag::text_only(vec![0]));
                ticket_members.push(TicketMember {
                    name: name.into(),
                    digest: digest.into(),
                    line_base: None,
                });
            }
            repo.store_ticket(
                id,
                TicketFileEntry {
                    path: "/tmp/x.o".into(),
                    members: ticket_members,
                },
            );
        }
        repo
    }

    #[test]
    fn collects_members_across_tickets() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let repo = repo_with(vec![(a, vec![("main", "d1")]), (b, vec![("helper", "d2")])]);
        let result = collect(&[a, b], &repo).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.contains_key("main"));
        assert!(result.contains_key("helper"));
    }

    #[test]
    fn missing_ticket_is_rejected() {
        let repo = Repository::new(Uuid::new_v4());
        let err = collect(&[Uuid::new_v4()], &repo).unwrap_err();
        assert!(matches!(err, LinkError::TicketMissing(_)));
    }

    #[test]
    fn missing_fragment_is_rejected() {
        let id = Uuid::new_v4();
        let mut repo = Repository::new(Uuid::new_v4());
        repo.store_ticket(
            id,
            TicketFileEntry {
                path: "/tmp/x.o".into(),
                members: vec![TicketMember {
                    name: "main".into(),
                    digest: "missing".into(),
                    line_base: None,
                }],
            },
        );
        let err = collect(&[id], &repo).unwrap_err();
        assert!(matches!(err, LinkError::FragmentMissing(d) if d == "missing"));
    }

    #[test]
    fn duplicate_definition_across_tickets_is_rejected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let repo = repo_with(vec![(a, vec![("main", "d1")]), (b, vec![("main", "d2")])]);
        let err = collect(&[a, b], &repo).unwrap_err();
        assert!(matches!(err, LinkError::DuplicateDefinition(name) if name == "main"));
    }
}
