//! `toy`: unified command-line entry point for the compiler, linker, VM,
//! debugger, and repository maintenance tools.

mod commands;
mod fixture;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "toy")]
#[command(about = "Toy language toolchain: compile, link, run, debug, and maintain repositories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the full error chain (including causes) instead of a single line
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON fixture of procedures into a repository
    Compile {
        /// Path to the JSON fixture naming one or more procedures
        source: std::path::PathBuf,
        /// Ticket file to write (default: `<source>.o`)
        #[arg(short = 'o', long = "out")]
        out: Option<std::path::PathBuf>,
        /// Repository file to compile into
        #[arg(short = 'r', long = "repository", default_value = "repo.ryr")]
        repository: std::path::PathBuf,
        /// Preserve source locations (debug-line info) in the compiled fragments
        #[arg(short = 'g', long = "debug-info")]
        debug_info: bool,
    },

    /// Link one or more tickets against a repository into an executable
    Link {
        /// Ticket files to link together
        tickets: Vec<std::path::PathBuf>,
        /// Repository file to link against
        #[arg(short = 'r', long = "repository", default_value = "repo.ryr")]
        repository: std::path::PathBuf,
        /// Output executable path
        #[arg(short = 'o', long = "out", default_value = "a.out")]
        out: std::path::PathBuf,
        /// Entry point name(s) (repeatable)
        #[arg(short = 'E', long = "entry", default_value = "main")]
        entry: Vec<String>,
    },

    /// Run a linked executable on the VM
    Vm {
        /// Executable to run
        executable: std::path::PathBuf,
        /// Repository the executable was linked against
        #[arg(short = 'r', long = "repository", default_value = "repo.ryr")]
        repository: std::path::PathBuf,
        /// Log every executed instruction at trace level
        #[arg(long)]
        trace: bool,
    },

    /// Load an executable and step through it interactively
    Debugger {
        /// Executable to load (omit to start with an empty machine)
        program: Option<std::path::PathBuf>,
        /// Repository the executable was linked against
        #[arg(short = 'r', long = "repository", default_value = "repo.ryr")]
        repository: std::path::PathBuf,
        /// Entry point to load onto the execution stack
        #[arg(short = 'E', long = "entry", default_value = "main")]
        entry: String,
        /// A debugger command to run non-interactively (repeatable: step, next, stack, exec, dict, continue)
        #[arg(short = 'c', long = "command")]
        command: Vec<String>,
    },

    /// Garbage-collect a repository in place: drop stale tickets and links
    Gc {
        /// Repository to collect
        #[arg(short = 'r', long = "repository", default_value = "repo.ryr")]
        repository: std::path::PathBuf,
    },

    /// Merge several repositories into one
    Merge {
        /// Repositories to merge, in order
        inputs: Vec<std::path::PathBuf>,
        /// Path to write the merged repository to
        #[arg(short = 'r', long = "repository", default_value = "merged.ryr")]
        repository: std::path::PathBuf,
    },

    /// Strip every fragment body from a repository, keeping only digests
    Strip {
        /// Repository to strip
        #[arg(short = 'i', long = "input", default_value = "repo.ryr")]
        input: std::path::PathBuf,
        /// Path to write the stripped repository to
        #[arg(short = 'o', long = "output", default_value = "repoc.ryr")]
        output: std::path::PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if cli.debug {
                eprintln!("error: {err:?}");
            } else {
                eprintln!("error: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn dispatch(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Compile { source, out, repository, debug_info } =>
            commands::compile::execute(source, out, repository, debug_info),

        Commands::Link { tickets, repository, out, entry } =>
            commands::link::execute(tickets, repository, out, entry),

        Commands::Vm { executable, repository, trace } =>
            commands::vm::execute(executable, repository, trace),

        Commands::Debugger { program, repository, entry, command } =>
            commands::debugger::execute(program, repository, entry, command),

        Commands::Gc { repository } =>
            commands::gc::execute(repository),

        Commands::Merge { inputs, repository } =>
            commands::merge::execute(inputs, repository),

        Commands::Strip { input, output } =>
            commands::strip::execute(input, output),
    }
}
