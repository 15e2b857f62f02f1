//! `toy debugger`: loads an optional executable onto a fresh machine and
//! drives it with `step`/`next`/`continue`/stack-dump commands, either from
//! a batch of `-c` flags or, absent any, an interactive stdin loop.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use toy_debugger::{stacks, step};
use toy_store::{Executable, Repository};
use toy_vm::{LoadedProgram, Machine, RuntimeInstr};

pub fn execute(
    program: Option<PathBuf>,
    repository: PathBuf,
    entry: String,
    commands: Vec<String>,
) -> anyhow::Result<()> {
    let mut machine = Machine::new();

    if let Some(program_path) = program {
        let repo = Repository::load(&repository)?;
        let exe = Executable::load(&program_path)?;
        let loaded = LoadedProgram::load(&exe, &repo)?;
        let entry_instr = loaded
            .entry(&entry)
            .with_context(|| format!("executable {} has no '{entry}' entry point", program_path.display()))?;
        queue(&mut machine, entry_instr);
    }

    if commands.is_empty() {
        run_interactive(&mut machine)
    } else {
        for command in &commands {
            run_one(&mut machine, command)?;
        }
        Ok(())
    }
}

/// Loads `entry` onto the execution stack without running it, so the first
/// `step`/`next` the caller issues advances exactly one instruction.
fn queue(machine: &mut Machine, entry: &RuntimeInstr) {
    match entry {
        RuntimeInstr::Procedure(body) => {
            machine.execution_stack.push_all_preserving_order(body.borrow().clone());
        }
        other => machine.execution_stack.push(other.clone()),
    }
}

fn run_interactive(machine: &mut Machine) -> anyhow::Result<()> {
    println!("toy debugger — step, next, continue, stack, exec, dict, quit");
    let stdin = io::stdin();
    loop {
        print!("(toy) ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command == "quit" || command == "exit" {
            break;
        }
        run_one(machine, command)?;
    }
    Ok(())
}

fn run_one(machine: &mut Machine, command: &str) -> anyhow::Result<()> {
    match command {
        "step" | "s" => step::step(machine, false)?,
        "next" | "n" => step::step(machine, true)?,
        "continue" | "c" => {
            machine.clear_interrupt();
            machine.run_all()?;
        }
        "stack" => print_rows(&stacks::operand_stack(machine, stacks::DEFAULT_MAX_ROWS)),
        "exec" => print_rows(&stacks::execution_stack(machine, stacks::DEFAULT_MAX_ROWS)),
        "dict" => print_rows(&stacks::dictionary_stack(machine, stacks::DEFAULT_MAX_ROWS)),
        other => println!("unknown command: {other}"),
    }
    Ok(())
}

fn print_rows(rows: &[String]) {
    for row in rows {
        println!("{row}");
    }
}
