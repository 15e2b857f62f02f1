//! The Toy instruction set: typed AST nodes that are both the compiler's
//! output and the VM's input.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::codec::{class_id, Reader, Writer, INSTRUCTION_MAGIC};
use crate::error::CodecError;
use crate::location::SourceLocation;
use crate::section::SectionType;

/// One instruction plus its (optional) source correspondence.
///
/// Locations live alongside the instruction rather than inside each variant
/// so that digesting, writing, and debug-reattaching the location is
/// written once instead of once per variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The instruction's payload.
    pub kind: InstructionKind,
    /// Source correspondence, if the compiler recorded one. `None` for
    /// instructions synthesized without a source origin.
    pub locn: Option<SourceLocation>,
}

/// The payload carried by an [`Instruction`].
///
/// `BuiltinState` from the distilled specification — a runtime-only trap
/// instruction created by the VM/debugger — deliberately has no variant
/// here: it is never digested, never written, and never read, so it lives
/// entirely in `toy-vm`'s own execution-time instruction representation
/// (see `toy_vm::runtime::RuntimeInstr`) rather than in this crate's
/// compiler/linker-facing data model.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind {
    /// A boolean literal.
    Boolean(bool),
    /// A floating point literal.
    Number(f64),
    /// A string literal.
    String(String),
    /// A reference to another fragment or a system-dictionary entry by
    /// symbolic name.
    Operator(String),
    /// A nested, ordered sequence of instructions — the unit of caching.
    Procedure(Vec<Instruction>),
}

impl InstructionKind {
    /// The tag used to derive this variant's codec class-id and its digest
    /// prefix. Stable across releases; changing it changes every digest.
    pub fn tag(&self) -> &'static str {
        match self {
            InstructionKind::Boolean(_) => "Boolean",
            InstructionKind::Number(_) => "Number",
            InstructionKind::String(_) => "String",
            InstructionKind::Operator(_) => "Operator",
            InstructionKind::Procedure(_) => "Procedure",
        }
    }

    /// The symbolic name this instruction references, if any. `Operator` is
    /// the only variant that names something; every other variant yields
    /// `None`, which callers (see `toy_compiler::fixups`) must filter out of
    /// any name set they accumulate.
    pub fn name(&self) -> Option<&str> {
        match self {
            InstructionKind::Operator(name) => Some(name),
            _ => None,
        }
    }

    /// The nested instructions directly contained by this one. Empty for
    /// every variant except `Procedure`.
    pub fn children(&self) -> &[Instruction] {
        match self {
            InstructionKind::Procedure(body) => body,
            _ => &[],
        }
    }
}

impl Instruction {
    /// Creates an instruction with no known source location.
    pub fn new(kind: InstructionKind) -> Self {
        Self { kind, locn: None }
    }

    /// Creates an instruction carrying a source location.
    pub fn located(kind: InstructionKind, locn: SourceLocation) -> Self {
        Self {
            kind,
            locn: Some(locn),
        }
    }

    /// The symbolic name this instruction references; see
    /// [`InstructionKind::name`].
    pub fn name(&self) -> Option<&str> {
        self.kind.name()
    }

    /// Nested instructions, recursively including grandchildren,
    /// grandgrandchildren, etc. Used by the compiler to find every
    /// `Operator` reachable from a procedure.
    pub fn walk(&self) -> InstructionWalk<'_> {
        InstructionWalk { stack: vec![self] }
    }

    /// Computes this instruction's content digest as a lowercase hex string.
    ///
    /// Two instructions with identical shape, values, and (rebased) source
    /// locations always produce the same digest; changing any value,
    /// variant, column, or child changes it (distilled spec invariant 1 and
    /// §8's digest-stability/-sensitivity properties).
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        self.digest_into(&mut hasher);
        hex::encode(hasher.finalize())
    }

    pub(crate) fn digest_into(&self, hasher: &mut Sha256) {
        hasher.update(self.kind.tag().as_bytes());
        match &self.kind {
            InstructionKind::Boolean(v) => {
                hasher.update(if *v { b"t" } else { b"f" });
            }
            InstructionKind::Number(v) => {
                // Bit-exact hex form: equal doubles hash equally on every
                // platform, unlike a locale- or precision-sensitive Display.
                hasher.update(format!("{:016x}", v.to_bits()).as_bytes());
            }
            InstructionKind::String(v) => {
                hasher.update(v.as_bytes());
            }
            InstructionKind::Operator(name) => {
                hasher.update(name.as_bytes());
            }
            InstructionKind::Procedure(body) => {
                hasher.update((body.len() as u32).to_be_bytes());
                for child in body {
                    child.digest_into(hasher);
                }
            }
        }
        match &self.locn {
            None => hasher.update(b"n"),
            Some(locn) => {
                hasher.update(b"d");
                locn.digest(hasher);
            }
        }
    }

    /// Writes this instruction into the fragment's section streams: a
    /// magic+class-id header and variant payload into `text`, then — only
    /// if a location is present — a matching debug record into
    /// `debug_line`.
    pub fn write(&self, sections: &mut BTreeMap<SectionType, Writer>) {
        let text_offset = sections.entry(SectionType::Text).or_default().offset();

        let id = class_id(self.kind.tag());
        {
            let text = sections.entry(SectionType::Text).or_default();
            text.write_u16(INSTRUCTION_MAGIC);
            text.write_u32(id);
        }
        self.write_payload(sections);

        if let Some(locn) = &self.locn {
            let debug = sections.entry(SectionType::DebugLine).or_default();
            debug.write_u32(id);
            let srcfile = locn.srcfile.as_bytes();
            debug.write_u32(text_offset as u32);
            debug.write_u32(locn.line);
            debug.write_u32(locn.column);
            debug.write_u32(srcfile.len() as u32);
            debug.write_bytes(srcfile);
        }
    }

    fn write_payload(&self, sections: &mut BTreeMap<SectionType, Writer>) {
        match &self.kind {
            InstructionKind::Boolean(v) => {
                sections
                    .entry(SectionType::Text)
                    .or_default()
                    .write_u8(if *v { 1 } else { 0 });
            }
            InstructionKind::Number(v) => {
                sections.entry(SectionType::Text).or_default().write_f64(*v);
            }
            InstructionKind::String(v) => {
                sections.entry(SectionType::Text).or_default().write_string(v);
            }
            InstructionKind::Operator(name) => {
                sections.entry(SectionType::Text).or_default().write_string(name);
            }
            InstructionKind::Procedure(body) => {
                sections
                    .entry(SectionType::Text)
                    .or_default()
                    .write_u32(body.len() as u32);
                for child in body {
                    child.write(sections);
                }
            }
        }
    }

    /// Reads one instruction (without its debug location — see
    /// [`Instruction::read_debug`]) from the fragment's `text` section.
    pub fn read(text: &mut Reader<'_>) -> Result<Self, CodecError> {
        let start = text.offset();
        let magic = text.read_u16()?;
        if magic != INSTRUCTION_MAGIC {
            return Err(CodecError::BadMagic(start));
        }
        let id = text.read_u32()?;

        let kind = if id == class_id("Boolean") {
            InstructionKind::Boolean(text.read_u8()? != 0)
        } else if id == class_id("Number") {
            InstructionKind::Number(text.read_f64()?)
        } else if id == class_id("String") {
            InstructionKind::String(text.read_string()?)
        } else if id == class_id("Operator") {
            InstructionKind::Operator(text.read_string()?)
        } else if id == class_id("Procedure") {
            let len = text.read_u32()? as usize;
            let mut body = Vec::with_capacity(len);
            for _ in 0..len {
                body.push(Instruction::read(text)?);
            }
            InstructionKind::Procedure(body)
        } else {
            return Err(CodecError::UnknownClass(id, start));
        };

        Ok(Instruction { kind, locn: None })
    }

    /// Reattaches source locations read from `debug`, recursing depth-first
    /// to match the order [`Instruction::write`] produced: every child's
    /// debug record before this instruction's own. `line_base` is the
    /// enclosing fragment's first absolute source line; debug records store
    /// line numbers relative to it (distilled spec invariant 6).
    ///
    /// Callers only invoke this when the fragment's `line_base` is `Some`,
    /// i.e. every instruction in the tree was written with a location —
    /// debug recording is all-or-nothing per compiled procedure.
    pub fn read_debug(&mut self, debug: &mut Reader<'_>, line_base: u32) -> Result<(), CodecError> {
        if let InstructionKind::Procedure(body) = &mut self.kind {
            for child in body.iter_mut() {
                child.read_debug(debug, line_base)?;
            }
        }

        let start = debug.offset();
        let id = debug.read_u32()?;
        if id != class_id(self.kind.tag()) {
            return Err(CodecError::UnknownClass(id, start));
        }
        let _text_offset = debug.read_u32()?;
        let line = debug.read_u32()?;
        let column = debug.read_u32()?;
        let srcfile = debug.read_string()?;

        self.locn = Some(SourceLocation {
            srcfile,
            line: line + line_base,
            column,
        });
        Ok(())
    }
}

/// Depth-first iterator over an instruction and all of its descendants,
/// parent before children.
pub struct InstructionWalk<'a> {
    stack: Vec<&'a Instruction>,
}

impl<'a> Iterator for InstructionWalk<'a> {
    type Item = &'a Instruction;

    fn next(&mut self) -> Option<Self::Item> {
        let instr = self.stack.pop()?;
        for child in instr.kind.children().iter().rev() {
            self.stack.push(child);
        }
        Some(instr)
    }
}
