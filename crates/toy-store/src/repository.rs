//! The on-disk program repository: every fragment ever compiled, every
//! ticket issued for a compilation, and every link record noting which
//! executable depends on what.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use uuid::Uuid;

use crate::codec::{Reader, Writer};
use crate::error::{CodecError, RepositoryError};
use crate::fragment::{FSection, Fragment, IFixup, XFixup};
use crate::section::SectionType;
use crate::ticket::{TicketFileEntry, TicketMember};

const REPOSITORY_MAGIC: &[u8; 4] = b"TOYR";
const REPOSITORY_VERSION: u32 = 1;

/// Notes that a linked executable file depends on a repository's fragments,
/// so `toy gc` can tell which ones are still reachable from the outside
/// world. Consulted, never trusted blindly: GC re-reads the file at `file`
/// and checks `uuid` before treating the record as live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinksRecord {
    /// Absolute path of a previously emitted executable.
    pub file: String,
    /// UUID stamped into that executable.
    pub uuid: Uuid,
}

/// The full content-addressed store: fragments keyed by digest, tickets
/// keyed by compile id, and link records for every executable produced so
/// far.
///
/// A fragment entry of `None` means the digest is known (some ticket or
/// link once pointed at it) but its body was discarded by `toy strip` —
/// distinct from the digest being entirely absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Identity of this repository instance. Preserved by GC and merge,
    /// regenerated by strip.
    pub uuid: Uuid,
    /// Fragments keyed by their content digest; `None` marks a stripped
    /// fragment.
    pub fragments: BTreeMap<String, Option<Fragment>>,
    /// Tickets keyed by compile id.
    pub tickets: BTreeMap<Uuid, TicketFileEntry>,
    /// Link records, one per linked executable still on record.
    pub links: Vec<LinksRecord>,
}

impl Repository {
    /// A fresh, empty repository with a new identity.
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            fragments: BTreeMap::new(),
            tickets: BTreeMap::new(),
            links: Vec::new(),
        }
    }

    /// Inserts a fragment under `digest` if that digest isn't already
    /// present. Reinserting an existing digest is a no-op — fragment
    /// immutability (distilled spec invariant 2) — callers that need to
    /// assert equality should compare first.
    pub fn store_fragment(&mut self, digest: impl Into<String>, fragment: Fragment) {
        self.fragments.entry(digest.into()).or_insert(Some(fragment));
    }

    /// Looks up a fragment by digest. Returns `None` both when the digest
    /// is absent and when it is present but stripped; use
    /// [`Repository::contains_digest`] to distinguish the two.
    pub fn fragment(&self, digest: &str) -> Option<&Fragment> {
        self.fragments.get(digest).and_then(|f| f.as_ref())
    }

    /// Whether `digest` is known at all, stripped or not.
    pub fn contains_digest(&self, digest: &str) -> bool {
        self.fragments.contains_key(digest)
    }

    /// Records a ticket, keyed by its compile id.
    pub fn store_ticket(&mut self, id: Uuid, entry: TicketFileEntry) {
        self.tickets.insert(id, entry);
    }

    /// Looks up a ticket by compile id.
    pub fn ticket(&self, id: &Uuid) -> Option<&TicketFileEntry> {
        self.tickets.get(id)
    }

    /// Records that an executable depends on this repository, replacing
    /// any prior record for the same output path.
    pub fn store_link(&mut self, record: LinksRecord) {
        self.links.retain(|r| r.file != record.file);
        self.links.push(record);
    }

    /// Loads a repository from `path`. A missing file yields a fresh
    /// repository with a newly generated UUID — `toy compile` against an
    /// output directory that has never been built into must not require a
    /// separate initialization step.
    pub fn load(path: &Path) -> Result<Self, RepositoryError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new(Uuid::new_v4())),
            Err(err) => return Err(RepositoryError::Io(err)),
        };
        Self::decode(&bytes).map_err(|source| RepositoryError::Invalid {
            path: path.display().to_string(),
            source,
        })
    }

    /// Writes the repository to `path` atomically: encodes to a sibling
    /// `.tmp` file, then renames it over `path`, so a reader never observes
    /// a partially written repository.
    pub fn save(&self, path: &Path) -> Result<(), RepositoryError> {
        let bytes = self.encode();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_bytes(REPOSITORY_MAGIC);
        w.write_u32(REPOSITORY_VERSION);
        w.write_bytes(self.uuid.as_bytes());

        w.write_u32(self.fragments.len() as u32);
        for (digest, fragment) in &self.fragments {
            w.write_string(digest);
            match fragment {
                None => w.write_u8(0),
                Some(fragment) => {
                    w.write_u8(1);
                    encode_fragment(&mut w, fragment);
                }
            }
        }

        w.write_u32(self.tickets.len() as u32);
        for (id, entry) in &self.tickets {
            w.write_bytes(id.as_bytes());
            w.write_string(&entry.path);
            w.write_u32(entry.members.len() as u32);
            for member in &entry.members {
                w.write_string(&member.name);
                w.write_string(&member.digest);
                encode_optional_u32(&mut w, member.line_base);
            }
        }

        w.write_u32(self.links.len() as u32);
        for link in &self.links {
            w.write_string(&link.file);
            w.write_bytes(link.uuid.as_bytes());
        }

        w.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let magic = r.read_bytes(4)?;
        if magic != REPOSITORY_MAGIC {
            return Err(CodecError::BadRepositoryMagic);
        }
        let version = r.read_u32()?;
        if version != REPOSITORY_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        let uuid = read_uuid(&mut r)?;

        let mut fragments = BTreeMap::new();
        let fragment_count = r.read_u32()?;
        for _ in 0..fragment_count {
            let digest = r.read_string()?;
            let fragment = match r.read_u8()? {
                0 => None,
                _ => Some(decode_fragment(&mut r)?),
            };
            fragments.insert(digest, fragment);
        }

        let mut tickets = BTreeMap::new();
        let ticket_count = r.read_u32()?;
        for _ in 0..ticket_count {
            let id = read_uuid(&mut r)?;
            let path = r.read_string()?;
            let member_count = r.read_u32()?;
            let mut members = Vec::with_capacity(member_count as usize);
            for _ in 0..member_count {
                let name = r.read_string()?;
                let digest = r.read_string()?;
                let line_base = decode_optional_u32(&mut r)?;
                members.push(TicketMember { name, digest, line_base });
            }
            tickets.insert(id, TicketFileEntry { path, members });
        }

        let mut links = Vec::new();
        let link_count = r.read_u32()?;
        for _ in 0..link_count {
            let file = r.read_string()?;
            let uuid = read_uuid(&mut r)?;
            links.push(LinksRecord { file, uuid });
        }

        Ok(Repository {
            uuid,
            fragments,
            tickets,
            links,
        })
    }
}

fn read_uuid(r: &mut Reader<'_>) -> Result<Uuid, CodecError> {
    let bytes = r.read_bytes(16)?;
    Ok(Uuid::from_slice(bytes).expect("length checked by read_bytes(16)"))
}

fn encode_optional_u32(w: &mut Writer, value: Option<u32>) {
    match value {
        None => w.write_u8(0),
        Some(v) => {
            w.write_u8(1);
            w.write_u32(v);
        }
    }
}

fn decode_optional_u32(r: &mut Reader<'_>) -> Result<Option<u32>, CodecError> {
    Ok(match r.read_u8()? {
        0 => None,
        _ => Some(r.read_u32()?),
    })
}

fn encode_section(w: &mut Writer, section: &FSection) {
    w.write_blob(&section.data);
    w.write_u32(section.xfixups.len() as u32);
    for fixup in &section.xfixups {
        w.write_i64(fixup.offset);
        w.write_string(&fixup.name);
    }
    w.write_u32(section.ifixups.len() as u32);
    for fixup in &section.ifixups {
        w.write_i64(fixup.offset);
        w.write_string(fixup.section.name());
    }
}

fn decode_section(r: &mut Reader<'_>) -> Result<FSection, CodecError> {
    let offset = r.offset();
    let data = r.read_blob()?;

    let xfixup_count = r.read_u32()?;
    let mut xfixups = Vec::with_capacity(xfixup_count as usize);
    for _ in 0..xfixup_count {
        let fixup_offset = r.read_i64()?;
        let name = r.read_string()?;
        xfixups.push(XFixup {
            offset: fixup_offset,
            name,
        });
    }

    let ifixup_count = r.read_u32()?;
    let mut ifixups = Vec::with_capacity(ifixup_count as usize);
    for _ in 0..ifixup_count {
        let fixup_offset = r.read_i64()?;
        let tag = r.read_string()?;
        let section = SectionType::from_name(&tag).ok_or(CodecError::InvalidUtf8(offset))?;
        ifixups.push(IFixup {
            offset: fixup_offset,
            section,
        });
    }

    Ok(FSection { data, xfixups, ifixups })
}

fn encode_fragment(w: &mut Writer, fragment: &Fragment) {
    w.write_string(fragment.primary.name());
    w.write_u8(fragment.sections.len() as u8);
    for (kind, section) in &fragment.sections {
        w.write_string(kind.name());
        encode_section(w, section);
    }
}

fn decode_fragment(r: &mut Reader<'_>) -> Result<Fragment, CodecError> {
    let offset = r.offset();
    let primary_tag = r.read_string()?;
    let primary = SectionType::from_name(&primary_tag).ok_or(CodecError::InvalidUtf8(offset))?;

    let section_count = r.read_u8()?;
    let mut sections = BTreeMap::new();
    for _ in 0..section_count {
        let tag = r.read_string()?;
        let kind = SectionType::from_name(&tag).ok_or(CodecError::InvalidUtf8(offset))?;
        sections.insert(kind, decode_section(r)?);
    }

    Ok(Fragment { sections, primary })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fragment() -> Fragment {
        let mut sections = BTreeMap::new();
        sections.insert(
            SectionType::Text,
            FSection {
                data: vec![1, 2, 3],
                xfixups: vec![XFixup {
                    offset: 2,
                    name: "helper".into(),
                }],
                ifixups: vec![],
            },
        );
        Fragment {
            sections,
            primary: SectionType::Text,
        }
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let mut repo = Repository::new(Uuid::nil());
        repo.store_fragment("abc", sample_fragment());
        repo.fragments.insert("stripped-digest".into(), None);
        repo.store_ticket(
            Uuid::nil(),
            TicketFileEntry {
                path: "/tmp/a.o".into(),
                members: vec![TicketMember {
                    name: "main".into(),
                    digest: "abc".into(),
                    line_base: Some(5),
                }],
            },
        );
        repo.store_link(LinksRecord {
            file: "/tmp/a.out".into(),
            uuid: Uuid::nil(),
        });

        let bytes = repo.encode();
        let decoded = Repository::decode(&bytes).unwrap();
        assert_eq!(decoded, repo);
    }

    #[test]
    fn store_fragment_is_idempotent_on_same_digest() {
        let mut repo = Repository::new(Uuid::nil());
        repo.store_fragment("abc", sample_fragment());
        repo.store_fragment("abc", Fragment::text_only(vec![9, 9]));
        assert_eq!(repo.fragment("abc").unwrap().section_bytes(SectionType::Text), &[1, 2, 3]);
    }

    #[test]
    fn stripped_digest_is_known_but_has_no_fragment() {
        let mut repo = Repository::new(Uuid::nil());
        repo.fragments.insert("abc".into(), None);
        assert!(repo.contains_digest("abc"));
        assert!(repo.fragment("abc").is_none());
    }

    #[test]
    fn load_missing_file_yields_fresh_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::load(&dir.path().join("nope.repo")).unwrap();
        assert!(repo.fragments.is_empty());
    }

    #[test]
    fn save_then_load_round_trips_via_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.repo");

        let mut repo = Repository::new(Uuid::nil());
        repo.store_fragment("abc", sample_fragment());
        repo.save(&path).unwrap();

        let loaded = Repository::load(&path).unwrap();
        assert_eq!(loaded, repo);
        assert!(!dir.path().join("store.tmp").exists());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let err = Repository::decode(&[0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, CodecError::BadRepositoryMagic));
    }
}
