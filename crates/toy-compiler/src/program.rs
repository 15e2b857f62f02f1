//! Orchestrates one compilation: rebase, prune, back-end, and the ticket
//! that records the result — the full compile-to-repository contract
//! (distilled spec §4.3).

use std::fs;
use std::path::Path;

use toy_store::{rebase, Repository, TicketFile, TicketFileEntry, TicketMember};
use uuid::Uuid;

use crate::backend::back_end;
use crate::error::CompileError;
use crate::frontend::CompileUnit;
use crate::prune;

/// What one call to [`compile_program`] produced.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The fresh id minted for this compilation, also the repository's
    /// ticket key and the sole content of the external ticket file.
    pub ticket_id: Uuid,
    /// Every name this compilation bound, in input order.
    pub members: Vec<TicketMember>,
}

/// Compiles `units` against `repo`, writing any new fragments into it and
/// recording a fresh ticket, then externalizes that ticket's id to
/// `ticket_path`.
///
/// Mirrors the distilled spec's compiler pipeline exactly: each unit is
/// rebased, pruned against the repository's existing cache, assembled into
/// a `Fragment` by the back end if not already cached, and finally bound
/// into a new `TicketFileEntry`. Caller is responsible for persisting
/// `repo` afterwards (`toy-cli`'s `compile` command does this once, after
/// every unit in the batch has been processed).
pub fn compile_program(units: Vec<CompileUnit>, repo: &mut Repository, ticket_path: &Path) -> Result<CompileOutput, CompileError> {
    check_no_duplicate_names(&units)?;

    let mut members = Vec::with_capacity(units.len());
    for unit in units {
        members.push(compile_unit(unit, repo)?);
    }

    let ticket_id = Uuid::new_v4();
    write_ticket_file(ticket_id, ticket_path)?;
    let entry = TicketFileEntry {
        path: absolute_path_string(ticket_path),
        members: members.clone(),
    };
    repo.store_ticket(ticket_id, entry);

    Ok(CompileOutput { ticket_id, members })
}

fn compile_unit(unit: CompileUnit, repo: &mut Repository) -> Result<TicketMember, CompileError> {
    if !matches!(unit.procedure.kind, toy_store::InstructionKind::Procedure(_)) {
        return Err(CompileError::NotAProcedure(unit.name));
    }

    let mut procedure = unit.procedure;
    let line_base = rebase::rebase(&mut procedure).map_err(|_| CompileError::NonMonotonicLine(unit.name.clone()))?;

    let digest = procedure.digest();
    if !prune::is_cached(repo, &digest) {
        let fragment = back_end(&procedure);
        repo.store_fragment(digest.clone(), fragment);
    }

    Ok(TicketMember {
        name: unit.name,
        digest,
        line_base,
    })
}

fn check_no_duplicate_names(units: &[CompileUnit]) -> Result<(), CompileError> {
    let mut seen = std::collections::BTreeSet::new();
    for unit in units {
        if !seen.insert(unit.name.as_str()) {
            return Err(CompileError::DuplicateNameInUnit(unit.name.clone()));
        }
    }
    Ok(())
}

fn write_ticket_file(id: Uuid, path: &Path) -> Result<(), CompileError> {
    let json = serde_json::to_string(&TicketFile::new(id))?;
    fs::write(path, json).map_err(|source| CompileError::TicketWrite {
        path: path.display().to_string(),
        source,
    })
}

/// Canonicalizes `path` so the repository's `TicketFileEntry::path` is a
/// stable absolute path that `toy gc` can re-resolve regardless of the
/// caller's current directory. Falls back to the plain display form on
/// failure rather than erroring the whole compile over it.
fn absolute_path_string(path: &Path) -> String {
    fs::canonicalize(path)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use toy_store::{Instruction, InstructionKind, SourceLocation};
    use uuid::Uuid as RepoUuid;

    fn proc(body: Vec<Instruction>) -> Instruction {
        Instruction::new(InstructionKind::Procedure(body))
    }

    #[test]
    fn compiling_twice_adds_no_new_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let ticket_path = dir.path().join("a.o");
        let mut repo = Repository::new(RepoUuid::new_v4());

        let unit = || {
            CompileUnit::new(
                "a",
                proc(vec![
                    Instruction::new(InstructionKind::Number(1.0)),
                    Instruction::new(InstructionKind::Number(2.0)),
                    Instruction::new(InstructionKind::Operator("add".into())),
                ]),
            )
        };

        compile_program(vec![unit()], &mut repo, &ticket_path).unwrap();
        assert_eq!(repo.fragments.len(), 1);

        let ticket_path_2 = dir.path().join("a2.o");
        compile_program(vec![unit()], &mut repo, &ticket_path_2).unwrap();
        assert_eq!(repo.fragments.len(), 1);
        assert_eq!(repo.tickets.len(), 2);
    }

    #[test]
    fn duplicate_name_in_one_unit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::new(RepoUuid::new_v4());
        let units = vec![
            CompileUnit::new("a", proc(vec![])),
            CompileUnit::new("a", proc(vec![])),
        ];
        let err = compile_program(units, &mut repo, &dir.path().join("a.o")).unwrap_err();
        assert!(matches!(err, CompileError::DuplicateNameInUnit(name) if name == "a"));
    }

    #[test]
    fn rebase_is_reflected_in_line_base() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::new(RepoUuid::new_v4());
        let unit = CompileUnit::new(
            "a",
            Instruction::located(
                InstructionKind::Procedure(vec![Instruction::located(
                    InstructionKind::Operator("dup".into()),
                    SourceLocation::new("a.toy", 11, 0),
                )]),
                SourceLocation::new("a.toy", 10, 0),
            ),
        );
        let out = compile_program(vec![unit], &mut repo, &dir.path().join("a.o")).unwrap();
        assert_eq!(out.members[0].line_base, Some(10));
    }

    #[test]
    fn ticket_file_is_written_with_the_compile_id() {
        let dir = tempfile::tempdir().unwrap();
        let ticket_path = dir.path().join("a.o");
        let mut repo = Repository::new(RepoUuid::new_v4());
        let out = compile_program(vec![CompileUnit::new("a", proc(vec![]))], &mut repo, &ticket_path).unwrap();

        let written = fs::read_to_string(&ticket_path).unwrap();
        let decoded: TicketFile = serde_json::from_str(&written).unwrap();
        assert_eq!(decoded.id, out.ticket_id);
    }
}
