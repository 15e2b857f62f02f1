//! `toy link`: resolves a batch of ticket files against a repository and
//! writes the linked executable, recording the link in the repository.

use std::fs;
use std::path::PathBuf;

use toy_store::{LinksRecord, Repository, TicketFile};
use uuid::Uuid;

pub fn execute(tickets: Vec<PathBuf>, repository: PathBuf, out: PathBuf, entry: Vec<String>) -> anyhow::Result<()> {
    let mut repo = Repository::load(&repository)?;

    let ticket_ids = tickets
        .iter()
        .map(|path| read_ticket_id(path))
        .collect::<anyhow::Result<Vec<Uuid>>>()?;

    let eligible = toy_linker::collect(&ticket_ids, &repo)?;
    let result = toy_linker::link(&eligible, &entry, &repo, &repository)?;

    result.executable.save(&out)?;
    repo.store_link(LinksRecord {
        file: absolute_path_string(&out),
        uuid: result.link_uuid,
    });
    repo.save(&repository)?;

    log::info!("linked {} symbol(s) into {}", result.executable.symbols.len(), out.display());
    println!("wrote {}", out.display());
    Ok(())
}

fn read_ticket_id(path: &PathBuf) -> anyhow::Result<Uuid> {
    let text = fs::read_to_string(path)?;
    let ticket: TicketFile = serde_json::from_str(&text)?;
    Ok(ticket.id)
}

/// Canonicalizes `path` so the recorded [`LinksRecord::file`] is a stable
/// absolute path `toy gc` can re-resolve regardless of its own current
/// directory. Falls back to the plain display form on failure.
fn absolute_path_string(path: &std::path::Path) -> String {
    fs::canonicalize(path)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}
