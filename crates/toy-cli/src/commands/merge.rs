//! `toy merge`: folds several repositories into one, in listed order.

use std::path::PathBuf;

use toy_store::Repository;

pub fn execute(inputs: Vec<PathBuf>, repository: PathBuf) -> anyhow::Result<()> {
    let repos = inputs
        .iter()
        .map(|path| Repository::load(path))
        .collect::<Result<Vec<Repository>, _>>()?;

    let merged = toy_gc::merge(&repos)?;
    merged.save(&repository)?;

    log::info!("merged {} repositories into {} ({} fragments)", repos.len(), repository.display(), merged.fragments.len());
    println!("wrote {}", repository.display());
    Ok(())
}
