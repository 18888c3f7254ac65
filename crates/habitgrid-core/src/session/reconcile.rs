//! Merging a locally cached collection with the remote one.

use std::collections::HashSet;

use crate::challenge::Challenge;

/// Result of [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    /// Remote challenges in remote order, then local-only ones in cache order
    pub challenges: Vec<Challenge>,
    /// Local-only challenges the remote has never seen
    pub pending: Vec<Challenge>,
}

/// Merge `local` into `remote`.
///
/// The remote document wins for ids present on both sides. Challenges only
/// in the local cache are appended and reported as pending so the caller
/// can save them.
pub fn reconcile(local: Vec<Challenge>, remote: Vec<Challenge>) -> Reconciled {
    let remote_ids: HashSet<String> = remote.iter().map(|c| c.id.clone()).collect();
    let pending: Vec<Challenge> = local
        .into_iter()
        .filter(|c| !remote_ids.contains(&c.id))
        .collect();

    let mut challenges = remote;
    challenges.extend(pending.iter().cloned());
    Reconciled {
        challenges,
        pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::default_challenge;
    use chrono::NaiveDate;

    fn challenge(id: &str, name: &str) -> Challenge {
        let mut c = default_challenge(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        c.id = id.into();
        c.name = name.into();
        c
    }

    #[test]
    fn remote_wins_on_shared_ids() {
        let local = vec![challenge("a", "local a"), challenge("c", "local c")];
        let remote = vec![challenge("b", "remote b"), challenge("a", "remote a")];

        let merged = reconcile(local, remote);
        let names: Vec<&str> = merged.challenges.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["remote b", "remote a", "local c"]);
        assert_eq!(merged.pending.len(), 1);
        assert_eq!(merged.pending[0].id, "c");
    }

    #[test]
    fn empty_cache_changes_nothing() {
        let remote = vec![challenge("a", "x")];
        let merged = reconcile(Vec::new(), remote.clone());
        assert_eq!(merged.challenges, remote);
        assert!(merged.pending.is_empty());
    }
}
