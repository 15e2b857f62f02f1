//! Normalizes a compiled instruction tree's source locations to be relative
//! to its first located instruction, so that moving a procedure's text
//! around in a file (or reindenting it) does not change its digest.

use crate::error::RebaseError;
use crate::instruction::{Instruction, InstructionKind};

/// Rebases `instr`'s locations in place, returning the line number they were
/// relative to (the fragment's `line_base`), or `None` if no instruction in
/// the tree carries a location at all.
///
/// The base is the line of the first located instruction encountered in a
/// parent-before-children, left-to-right walk — matching [`Instruction::walk`].
/// Every subsequent located instruction must have an absolute line `>=
/// line_base`; a tree built from a well-formed compilation always satisfies
/// this, so a violation means the caller handed rebase a tree it didn't
/// itself compile from source order.
pub fn rebase(instr: &mut Instruction) -> Result<Option<u32>, RebaseError> {
    let Some(line_base) = first_line(instr) else {
        return Ok(None);
    };
    check_monotonic(instr, line_base)?;
    subtract(instr, line_base);
    Ok(Some(line_base))
}

fn first_line(instr: &Instruction) -> Option<u32> {
    if let Some(locn) = &instr.locn {
        return Some(locn.line);
    }
    for child in instr.kind.children() {
        if let Some(line) = first_line(child) {
            return Some(line);
        }
    }
    None
}

fn check_monotonic(instr: &Instruction, line_base: u32) -> Result<(), RebaseError> {
    if let Some(locn) = &instr.locn {
        if locn.line < line_base {
            return Err(RebaseError::NonMonotonicLine {
                line: locn.line,
                line_base,
            });
        }
    }
    for child in instr.kind.children() {
        check_monotonic(child, line_base)?;
    }
    Ok(())
}

fn subtract(instr: &mut Instruction, line_base: u32) {
    if let Some(locn) = &mut instr.locn {
        locn.line -= line_base;
    }
    if let InstructionKind::Procedure(body) = &mut instr.kind {
        for child in body.iter_mut() {
            subtract(child, line_base);
        }
    }
}
