//! Assembles the final [`Executable`]: walks the graph, lays out every
//! section, patches fixups, and records symbols and debug lines.

use std::collections::BTreeMap;
use std::path::Path;

use toy_store::{DebugLineRecord, Executable, Repository, RepositoryRecord, SectionType, Symbol};
use uuid::Uuid;

use crate::eligible::EligibleFragment;
use crate::error::LinkError;
use crate::fixup::apply_fixups;
use crate::graph::walk_from_entries;
use crate::layout::{section_bases, Layout, LayoutBuilder};

/// A completed link: the executable ready to write, and the fresh UUID
/// stamped into it (also what the caller should record in the repository's
/// `LinksRecord`).
pub struct LinkResult {
    /// The assembled executable.
    pub executable: Executable,
    /// This link's identity.
    pub link_uuid: Uuid,
}

/// Links `entries` against `eligible`, the fragment set a prior
/// [`crate::eligible::collect`] call produced.
///
/// `repo_path` and `repo.uuid` are stamped into the executable's
/// [`RepositoryRecord`] so later tools (the VM, the GC) can detect a
/// mismatched repository before trusting the file.
pub fn link(eligible: &BTreeMap<String, EligibleFragment>, entries: &[String], repo: &Repository, repo_path: &Path) -> Result<LinkResult, LinkError> {
    let mut layout = Layout::default();
    walk_from_entries(entries, eligible, &mut LayoutBuilder::new(&mut layout))?;
    let bases = section_bases(&layout);

    let mut data: BTreeMap<SectionType, Vec<u8>> = BTreeMap::new();
    let mut symbols = Vec::new();
    let mut debug = Vec::new();

    for (kind, section_layout) in &layout.sections {
        let mut bytes = Vec::new();
        for placement in &section_layout.placements {
            let ef = eligible
                .get(&placement.name)
                .expect("every placed name was visited from the eligible set");
            let fsection = ef
                .fragment
                .sections
                .get(kind)
                .expect("the layout only places sections the fragment actually has");

            let patched = apply_fixups(
                &fsection.data,
                &fsection.xfixups,
                &fsection.ifixups,
                &placement.name,
                &ef.fragment,
                eligible,
                &layout.name_address,
                &bases,
            )?;
            debug_assert_eq!(patched.len(), fsection.data.len());

            let address = placement.address + bases[kind];
            symbols.push(Symbol {
                name: symbol_name(&placement.name, *kind, ef),
                address,
                size: patched.len() as u64,
            });

            if *kind == ef.fragment.primary {
                if let Some(line_base) = ef.line_base {
                    debug.push(DebugLineRecord {
                        address,
                        fragment_digest: ef.digest.clone(),
                        line_base,
                    });
                }
            }

            bytes.extend_from_slice(&patched);
        }
        data.insert(*kind, bytes);
    }

    let link_uuid = Uuid::new_v4();
    let executable = Executable {
        uuid: link_uuid,
        repository: RepositoryRecord {
            path: repo_path.display().to_string(),
            uuid: repo.uuid,
        },
        symbols,
        data,
        debug,
    };

    Ok(LinkResult { executable, link_uuid })
}

fn symbol_name(name: &str, kind: SectionType, ef: &EligibleFragment) -> String {
    if kind == ef.fragment.primary {
        name.to_string()
    } else {
        format!("{name}/{}", kind.name())
    }
}
