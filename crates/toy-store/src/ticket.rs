//! Tickets: the compiler's receipt for one compilation, and the tiny file
//! handed back to the caller that names it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One name bound during a single compilation: which fragment it compiled
/// to, and the source line that fragment's locations are relative to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMember {
    /// The name this member binds, e.g. a top-level procedure's name.
    pub name: String,
    /// Digest of the fragment this name compiled to.
    pub digest: String,
    /// The fragment's `line_base`, carried alongside the digest so the
    /// linker and debugger can reattach absolute line numbers without
    /// re-reading the fragment itself. `None` when the procedure carries no
    /// debug information.
    pub line_base: Option<u32>,
}

/// A compilation's full record, as kept in the repository: the path of the
/// external ticket file the compiler wrote, and every name that
/// compilation bound. The repository keys these by the compile UUID; the
/// external file itself holds nothing but that UUID.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TicketFileEntry {
    /// Absolute path of the ticket file the compiler wrote.
    pub path: String,
    /// Names this compilation bound, in compile order.
    pub members: Vec<TicketMember>,
}

impl TicketFileEntry {
    /// Creates a ticket file entry with no members yet.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            members: Vec::new(),
        }
    }
}

/// The externalized form of a ticket: the tiny JSON file `toy compile`
/// writes next to its output, containing nothing but the id needed to look
/// the full [`TicketFileEntry`] back up in the repository.
///
/// `#[serde(transparent)]` makes the on-disk form a bare quoted UUID string
/// (`"3fa8...".`) rather than a wrapping `{"id": ...}` object — the ticket
/// file's sole content is the UUID, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketFile {
    /// Identifies this compilation's [`TicketFileEntry`] in the repository.
    pub id: Uuid,
}

impl TicketFile {
    /// Creates a ticket file for a freshly minted compilation id.
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_file_round_trips_through_json() {
        let entry = TicketFile::new(Uuid::nil());
        let json = serde_json::to_string(&entry).unwrap();
        let back: TicketFile = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }

    #[test]
    fn ticket_file_on_disk_form_is_a_bare_uuid_string() {
        let entry = TicketFile::new(Uuid::nil());
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
