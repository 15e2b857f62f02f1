//! Turns one rebased procedure into the [`Fragment`] the repository stores.

use std::collections::BTreeMap;

use toy_store::codec::Writer;
use toy_store::{FSection, Fragment, Instruction, SectionType, XFixup};

use crate::fixups::external_names;

/// Serializes `instr` and assembles its `Fragment`.
///
/// Only the primary (`text`) section carries fixups — the distilled
/// specification's external-reference scan only ever looks at `Operator`
/// names reachable from the procedure itself, and every one of those names
/// is written as part of the `text` payload (the instruction stream), never
/// into `debug_line`.
pub fn back_end(instr: &Instruction) -> Fragment {
    let mut sections: BTreeMap<SectionType, Writer> = BTreeMap::new();
    instr.write(&mut sections);

    let text_bytes = sections.remove(&SectionType::Text).map(Writer::into_bytes).unwrap_or_default();
    let debug_bytes = sections.remove(&SectionType::DebugLine).map(Writer::into_bytes);

    let xfixups = external_names(instr)
        .into_iter()
        .map(|name| XFixup { offset: -1, name })
        .collect();

    let mut fragment_sections = BTreeMap::new();
    fragment_sections.insert(
        SectionType::Text,
        FSection {
            data: text_bytes,
            xfixups,
            ifixups: Vec::new(),
        },
    );
    if let Some(debug_bytes) = debug_bytes {
        fragment_sections.insert(SectionType::DebugLine, FSection::plain(debug_bytes));
    }

    Fragment {
        sections: fragment_sections,
        primary: SectionType::Text,
    }
}
