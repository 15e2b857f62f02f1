//! `toy compile`: reads a JSON fixture of procedures, compiles each into
//! the repository, and writes the ticket file the linker will consume.

use std::path::PathBuf;

use toy_store::{Instruction, Repository};

use crate::fixture;

pub fn execute(source: PathBuf, out: Option<PathBuf>, repository: PathBuf, debug_info: bool) -> anyhow::Result<()> {
    let out = out.unwrap_or_else(|| {
        let mut name = source.clone().into_os_string();
        name.push(".o");
        PathBuf::from(name)
    });

    let mut units = fixture::load(&source)?;
    if !debug_info {
        for unit in &mut units {
            strip_locations(&mut unit.procedure);
        }
    }

    let mut repo = Repository::load(&repository)?;
    let output = toy_compiler::compile_program(units, &mut repo, &out)?;
    repo.save(&repository)?;

    log::info!("compiled {} name(s) into ticket {}", output.members.len(), output.ticket_id);
    for member in &output.members {
        log::debug!("  {} -> {}", member.name, member.digest);
    }
    println!("wrote {}", out.display());
    Ok(())
}

/// Recursively clears every instruction's source location — used when
/// `-g/--debug-info` is not requested, so the resulting fragment carries no
/// debug-line section at all.
fn strip_locations(instr: &mut Instruction) {
    instr.locn = None;
    if let toy_store::InstructionKind::Procedure(body) = &mut instr.kind {
        for child in body {
            strip_locations(child);
        }
    }
}
