//! JSON fixture format `toy compile` reads its input from.
//!
//! The workspace deliberately has no lexer or parser (§1's stated
//! non-goal): the compiler's only input is an in-memory `Procedure` tree a
//! caller builds. For the CLI to have anything to point at on a command
//! line, it accepts that tree pre-built as JSON — one file naming one or
//! more top-level procedures, each an ordinary instruction tree a test
//! harness or future front end could equally well construct in-process.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use toy_compiler::CompileUnit;
use toy_store::{Instruction, InstructionKind, SourceLocation};

/// One compile unit as read from a fixture file: a name and its procedure.
#[derive(Debug, Deserialize)]
pub struct FixtureUnit {
    pub name: String,
    pub procedure: FixtureInstruction,
}

/// The JSON mirror of [`toy_store::Instruction`]. `srcfile`/`line` are
/// optional: an instruction naming a `srcfile` carries a source location
/// matching [`Instruction::located`]; one that omits it carries none,
/// matching [`Instruction::new`]. `column` defaults to 0 when `srcfile` is
/// present but `column` is not.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FixtureInstruction {
    Boolean {
        value: bool,
        srcfile: Option<String>,
        #[serde(default)]
        line: u32,
        #[serde(default)]
        column: u32,
    },
    Number {
        value: f64,
        srcfile: Option<String>,
        #[serde(default)]
        line: u32,
        #[serde(default)]
        column: u32,
    },
    String {
        value: String,
        srcfile: Option<String>,
        #[serde(default)]
        line: u32,
        #[serde(default)]
        column: u32,
    },
    Operator {
        name: String,
        srcfile: Option<String>,
        #[serde(default)]
        line: u32,
        #[serde(default)]
        column: u32,
    },
    Procedure {
        body: Vec<FixtureInstruction>,
        srcfile: Option<String>,
        #[serde(default)]
        line: u32,
        #[serde(default)]
        column: u32,
    },
}

impl FixtureInstruction {
    fn into_instruction(self) -> Instruction {
        let (kind, srcfile, line, column) = match self {
            FixtureInstruction::Boolean { value, srcfile, line, column } => {
                (InstructionKind::Boolean(value), srcfile, line, column)
            }
            FixtureInstruction::Number { value, srcfile, line, column } => {
                (InstructionKind::Number(value), srcfile, line, column)
            }
            FixtureInstruction::String { value, srcfile, line, column } => {
                (InstructionKind::String(value), srcfile, line, column)
            }
            FixtureInstruction::Operator { name, srcfile, line, column } => {
                (InstructionKind::Operator(name), srcfile, line, column)
            }
            FixtureInstruction::Procedure { body, srcfile, line, column } => {
                let body = body.into_iter().map(FixtureInstruction::into_instruction).collect();
                (InstructionKind::Procedure(body), srcfile, line, column)
            }
        };
        match srcfile {
            Some(srcfile) => Instruction::located(kind, SourceLocation::new(srcfile, line, column)),
            None => Instruction::new(kind),
        }
    }
}

/// Reads `path` as a JSON array of [`FixtureUnit`]s and converts each into a
/// [`CompileUnit`].
pub fn load(path: &Path) -> anyhow::Result<Vec<CompileUnit>> {
    let text = fs::read_to_string(path)?;
    let units: Vec<FixtureUnit> = serde_json::from_str(&text)?;
    Ok(units
        .into_iter()
        .map(|u| CompileUnit::new(u.name, u.procedure.into_instruction()))
        .collect())
}
