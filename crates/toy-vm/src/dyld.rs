//! Turns a linked [`Executable`] back into instruction trees the machine
//! can run, reattaching debug locations along the way.

use std::collections::BTreeMap;

use thiserror::Error;
use toy_store::{codec::Reader, CodecError, Executable, Repository, SectionType};

use crate::runtime::RuntimeInstr;

/// Errors raised while loading an executable.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The executable's repository record does not match the repository it
    /// was loaded against.
    #[error("executable was linked against a different repository (expected {expected}, found {found})")]
    RepositoryMismatch {
        /// The repository's actual UUID.
        expected: String,
        /// The UUID recorded in the executable.
        found: String,
    },

    /// A debug record referenced a digest the repository does not have a
    /// fragment for.
    #[error("debug record referenced unknown fragment digest {0}")]
    MissingFragment(String),

    /// A symbol's address did not correspond to any decoded instruction —
    /// only possible if the executable was hand-corrupted.
    #[error("no instruction at address {0}")]
    UnknownSymbolAddress(u64),

    /// The `text` section could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),
}

/// A program as loaded into the VM: every top-level (primary-section)
/// symbol's instruction tree, with debug locations reattached where the
/// executable carries them.
pub struct LoadedProgram {
    /// Name to decoded, debug-reattached instruction.
    pub entries: BTreeMap<String, RuntimeInstr>,
}

impl LoadedProgram {
    /// Loads `exe`, validating it against `repo`.
    pub fn load(exe: &Executable, repo: &Repository) -> Result<Self, LoadError> {
        if exe.repository.uuid != repo.uuid {
            return Err(LoadError::RepositoryMismatch {
                expected: repo.uuid.to_string(),
                found: exe.repository.uuid.to_string(),
            });
        }

        let empty = Vec::new();
        let text = exe.data.get(&SectionType::Text).unwrap_or(&empty);

        let mut decoded: BTreeMap<String, toy_store::Instruction> = BTreeMap::new();
        for symbol in &exe.symbols {
            if symbol.name.contains('/') {
                // A non-primary-section symbol; nothing to decode as a
                // standalone instruction tree.
                continue;
            }
            let start = symbol.address as usize;
            let end = start + symbol.size as usize;
            let slice = text.get(start..end).unwrap_or(&[]);
            let mut reader = Reader::new(slice);
            let instr = toy_store::Instruction::read(&mut reader)?;
            decoded.insert(symbol.name.clone(), instr);
        }

        for record in &exe.debug {
            let fragment = repo
                .fragment(&record.fragment_digest)
                .ok_or_else(|| LoadError::MissingFragment(record.fragment_digest.clone()))?;
            let debug_bytes = fragment.section_bytes(SectionType::DebugLine);

            let symbol_name = exe
                .symbols
                .iter()
                .find(|s| !s.name.contains('/') && s.address == record.address)
                .map(|s| s.name.clone())
                .ok_or(LoadError::UnknownSymbolAddress(record.address))?;

            if let Some(instr) = decoded.get_mut(&symbol_name) {
                let mut reader = Reader::new(debug_bytes);
                instr.read_debug(&mut reader, record.line_base)?;
            }
        }

        let entries = decoded
            .iter()
            .map(|(name, instr)| (name.clone(), RuntimeInstr::from_instruction(instr)))
            .collect();

        Ok(LoadedProgram { entries })
    }

    /// Looks up an entry point by name.
    pub fn entry(&self, name: &str) -> Option<&RuntimeInstr> {
        self.entries.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;
    use toy_store::{Instruction, InstructionKind, RepositoryRecord, Symbol};
    use uuid::Uuid;

    #[test]
    fn loads_a_single_symbol_without_debug_info() {
        let instr = Instruction::new(InstructionKind::Procedure(vec![
            Instruction::new(InstructionKind::Number(1.0)),
            Instruction::new(InstructionKind::Number(2.0)),
            Instruction::new(InstructionKind::Operator("add".into())),
        ]));
        let mut sections = Map::new();
        instr.write(&mut sections);
        let text_bytes = sections[&SectionType::Text].bytes().to_vec();

        let repo_uuid = Uuid::new_v4();
        let repo = Repository::new(repo_uuid);

        let mut data = Map::new();
        let size = text_bytes.len() as u64;
        data.insert(SectionType::Text, text_bytes);

        let exe = Executable {
            uuid: Uuid::new_v4(),
            repository: RepositoryRecord {
                path: "repo.bin".into(),
                uuid: repo_uuid,
            },
            symbols: vec![Symbol {
                name: "main".into(),
                address: 0,
                size,
            }],
            data,
            debug: vec![],
        };

        let loaded = LoadedProgram::load(&exe, &repo).unwrap();
        assert!(loaded.entry("main").is_some());
    }

    #[test]
    fn repository_mismatch_is_rejected() {
        let repo = Repository::new(Uuid::new_v4());
        let exe = Executable {
            uuid: Uuid::new_v4(),
            repository: RepositoryRecord {
                path: "repo.bin".into(),
                uuid: Uuid::new_v4(),
            },
            symbols: vec![],
            data: Map::new(),
            debug: vec![],
        };
        let err = LoadedProgram::load(&exe, &repo).unwrap_err();
        assert!(matches!(err, LoadError::RepositoryMismatch { .. }));
    }
}
