//! `toy gc`: drops tickets and links whose external files have vanished or
//! gone stale, in place.

use std::path::PathBuf;

use toy_store::Repository;

pub fn execute(repository: PathBuf) -> anyhow::Result<()> {
    let repo = Repository::load(&repository)?;
    let before = (repo.tickets.len(), repo.links.len());

    toy_gc::collect(&repo, &repository)?;

    let after = Repository::load(&repository)?;
    log::info!(
        "gc: tickets {} -> {}, links {} -> {}",
        before.0,
        after.tickets.len(),
        before.1,
        after.links.len()
    );
    Ok(())
}
