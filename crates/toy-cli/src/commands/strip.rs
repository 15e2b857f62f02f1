//! `toy strip`: clears every fragment body in a repository, keeping only
//! its digests, tickets, and links.

use std::path::PathBuf;

use toy_store::Repository;

pub fn execute(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let repo = Repository::load(&input)?;
    let fragment_count = repo.fragments.len();

    let stripped = toy_gc::strip(repo);
    stripped.save(&output)?;

    log::info!("stripped {} fragment bodies, wrote {}", fragment_count, output.display());
    println!("wrote {}", output.display());
    Ok(())
}
