//! The linker's output: a self-contained, addressable program image ready
//! for the VM to load.
//!
//! Unlike the repository, executables are serialized as JSON with
//! hex-encoded section bytes — there is no size pressure here (one file per
//! linked program, not a long-lived accumulating store) and a textual
//! format is far easier to eyeball while debugging the linker.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ExecutableError;
use crate::section::SectionType;

/// One named, sized entry point into an executable's address space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// The symbol's name: a fragment's own name, or `name/section` for a
    /// non-primary section (see `toy_linker::layout`).
    pub name: String,
    /// Address the symbol's bytes start at.
    pub address: u64,
    /// Length of the symbol's bytes.
    pub size: u64,
}

/// Associates a placed fragment with the source line its instructions are
/// relative to, so the VM and debugger can recover absolute locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugLineRecord {
    /// Address the fragment was placed at.
    pub address: u64,
    /// Digest of the fragment, used to fetch its `debug_line` bytes back
    /// out of the repository when loading.
    pub fragment_digest: String,
    /// The line number the fragment's stored locations are relative to.
    pub line_base: u32,
}

/// Identifies the repository an executable was linked from, so the VM and
/// GC can detect a stale or mismatched repository before trusting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Path of the repository the executable was linked from.
    pub path: String,
    /// That repository's identity at link time.
    pub uuid: Uuid,
}

/// A complete, linked program image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    /// This link's own identity, matched against `LinksRecord::uuid`.
    pub uuid: Uuid,
    /// The repository this executable was linked from.
    pub repository: RepositoryRecord,
    /// Every symbol placed during linking.
    pub symbols: Vec<Symbol>,
    /// Concatenated, fixed-up bytes for every laid-out section.
    pub data: BTreeMap<SectionType, Vec<u8>>,
    /// One record per fragment that carried debug information.
    pub debug: Vec<DebugLineRecord>,
}

impl Executable {
    /// Writes the executable as JSON to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ExecutableError> {
        let dto = ExecutableDto::from(self);
        let json = serde_json::to_string_pretty(&dto)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reads an executable previously written by [`Executable::save`].
    pub fn load(path: &Path) -> Result<Self, ExecutableError> {
        let json = fs::read_to_string(path)?;
        let dto: ExecutableDto = serde_json::from_str(&json)?;
        Executable::try_from(dto)
    }
}

#[derive(Serialize, Deserialize)]
struct ExecutableDto {
    uuid: Uuid,
    repository: RepositoryRecord,
    symbols: Vec<Symbol>,
    data: BTreeMap<String, String>,
    debug: Vec<DebugLineRecord>,
}

impl From<&Executable> for ExecutableDto {
    fn from(exe: &Executable) -> Self {
        ExecutableDto {
            uuid: exe.uuid,
            repository: exe.repository.clone(),
            symbols: exe.symbols.clone(),
            data: exe
                .data
                .iter()
                .map(|(kind, bytes)| (kind.name().to_string(), hex::encode(bytes)))
                .collect(),
            debug: exe.debug.clone(),
        }
    }
}

impl TryFrom<ExecutableDto> for Executable {
    type Error = ExecutableError;

    fn try_from(dto: ExecutableDto) -> Result<Self, Self::Error> {
        let mut data = BTreeMap::new();
        for (name, hex_bytes) in dto.data {
            let kind = SectionType::from_name(&name).ok_or(ExecutableError::UnknownSection(name))?;
            let bytes = hex::decode(hex_bytes).map_err(|_| ExecutableError::UnknownSection("<bad hex>".into()))?;
            data.insert(kind, bytes);
        }
        Ok(Executable {
            uuid: dto.uuid,
            repository: dto.repository,
            symbols: dto.symbols,
            data,
            debug: dto.debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Executable {
        let mut data = BTreeMap::new();
        data.insert(SectionType::Text, vec![0xde, 0xad, 0xbe, 0xef]);
        Executable {
            uuid: Uuid::nil(),
            repository: RepositoryRecord {
                path: "/tmp/repo.bin".into(),
                uuid: Uuid::nil(),
            },
            symbols: vec![Symbol {
                name: "main".into(),
                address: 0,
                size: 4,
            }],
            data,
            debug: vec![DebugLineRecord {
                address: 0,
                fragment_digest: "abc".into(),
                line_base: 10,
            }],
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.texe");
        let exe = sample();
        exe.save(&path).unwrap();
        let loaded = Executable::load(&path).unwrap();
        assert_eq!(loaded, exe);
    }

    #[test]
    fn section_bytes_are_hex_encoded_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.texe");
        sample().save(&path).unwrap();
        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("deadbeef"));
    }
}
