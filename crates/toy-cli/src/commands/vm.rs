//! `toy vm`: loads a linked executable and runs its `main` entry to
//! completion.

use std::path::PathBuf;

use anyhow::Context;
use toy_store::{Executable, Repository};
use toy_vm::{LoadedProgram, Machine};

pub fn execute(executable: PathBuf, repository: PathBuf, trace: bool) -> anyhow::Result<()> {
    let repo = Repository::load(&repository)?;
    let exe = Executable::load(&executable)?;
    let program = LoadedProgram::load(&exe, &repo)?;

    let entry = program
        .entry("main")
        .with_context(|| format!("executable {} has no 'main' entry point", executable.display()))?;

    let mut machine = Machine::new();
    machine.tracing = trace;
    machine.run(entry)?;

    log::info!("run completed with {} value(s) left on the operand stack", machine.operand_stack.len());
    Ok(())
}
