//! Skips re-emitting fragments the repository already has a live body for.

use toy_store::Repository;

/// Whether `digest` is already cached in `repo` with a live (non-stripped)
/// fragment body — if so, the compiler must not reprocess the procedure
/// that produced it: the stored fragment is authoritative, and a fresh
/// serialization could only ever be identical to it (same digest, same
/// content, by invariant 1).
///
/// A digest that is present but stripped (`None`) is treated as *not*
/// cached: resolving the distilled spec's §9 third open question in favor
/// of forcing recompilation rather than silently leaving a ticket member
/// pointing at a body that can never be materialized again. See DESIGN.md.
pub fn is_cached(repo: &Repository, digest: &str) -> bool {
    repo.fragment(digest).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use toy_store::Fragment;
    use uuid::Uuid;

    #[test]
    fn live_digest_is_cached_but_stripped_one_forces_recompile() {
        let mut repo = Repository::new(Uuid::new_v4());
        repo.store_fragment("live", Fragment::text_only(vec![1]));
        repo.fragments.insert("stripped".into(), None);

        assert!(is_cached(&repo, "live"));
        assert!(!is_cached(&repo, "stripped"));
        assert!(!is_cached(&repo, "absent"));
    }
}
