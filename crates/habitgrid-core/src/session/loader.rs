//! Turning whatever a store returns into a usable collection.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::challenge::{default_challenge, Challenge};
use crate::error::StoreError;
use crate::identity::Identity;
use crate::storage::{ChallengeStore, ProfileState};

/// How the loaded collection came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Read from the store as-is
    Stored,
    /// Store was empty; a default challenge was created and saved
    SynthesizedDefault,
    /// Store was empty; legacy keys were folded into a saved default
    MigratedLegacy,
    /// Loading failed; an unsaved default is held in memory
    Fallback,
}

/// A non-empty collection with a resolved active challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCollection {
    pub challenges: Vec<Challenge>,
    /// Index of the active challenge in `challenges`
    pub active: usize,
    pub source: LoadSource,
}

/// Load the collection of `identity`, creating or migrating it as needed.
///
/// Never fails. Any store or profile error is logged and replaced by a
/// default challenge that is not persisted. The stand-in gets a fresh id
/// so edits made on it can never overwrite the stored default.
pub async fn load_collection<S: ChallengeStore>(
    store: &S,
    profile: &dyn ProfileState,
    identity: &Identity,
    today: NaiveDate,
) -> LoadedCollection {
    match try_load(store, profile, identity, today).await {
        Ok(loaded) => loaded,
        Err(e) => {
            let mut challenge = default_challenge(today);
            challenge.id = Uuid::new_v4().to_string();
            warn!(
                uid = %identity.uid,
                challenge = %challenge.id,
                error = %e,
                "failed to load challenges, using in-memory default"
            );
            LoadedCollection {
                challenges: vec![challenge],
                active: 0,
                source: LoadSource::Fallback,
            }
        }
    }
}

async fn try_load<S: ChallengeStore>(
    store: &S,
    profile: &dyn ProfileState,
    identity: &Identity,
    today: NaiveDate,
) -> Result<LoadedCollection, StoreError> {
    let mut challenges = store.list(identity).await?;

    let source = if challenges.is_empty() {
        let legacy = profile.legacy_snapshot()?;
        let mut challenge = default_challenge(today);
        let migrated = !legacy.is_empty();
        legacy.apply_to(&mut challenge);
        challenge.normalize();

        store.save(identity, &challenge).await?;
        challenges.push(challenge);

        if migrated {
            // the default is already saved; leftover keys are harmless
            if let Err(e) = profile.clear_legacy() {
                warn!(uid = %identity.uid, error = %e, "failed to remove legacy keys");
            }
            info!(uid = %identity.uid, "migrated legacy tracker data into default challenge");
            LoadSource::MigratedLegacy
        } else {
            info!(uid = %identity.uid, "created default challenge");
            LoadSource::SynthesizedDefault
        }
    } else {
        LoadSource::Stored
    };

    normalize_collection(&mut challenges);
    let remembered = profile.active_id(identity)?;
    let active = resolve_active(&challenges, remembered.as_deref());

    Ok(LoadedCollection {
        challenges,
        active,
        source,
    })
}

/// Drop explicit `None` cells and challenges whose id was already seen.
pub fn normalize_collection(challenges: &mut Vec<Challenge>) {
    let mut seen = HashSet::new();
    challenges.retain(|c| {
        let first = seen.insert(c.id.clone());
        if !first {
            warn!(challenge = %c.id, "dropping duplicate challenge id");
        }
        first
    });
    for challenge in challenges.iter_mut() {
        challenge.normalize();
    }
}

/// Index of the remembered challenge, or 0 when it is unset or gone.
pub fn resolve_active(challenges: &[Challenge], remembered: Option<&str>) -> usize {
    remembered
        .and_then(|id| challenges.iter().position(|c| c.id == id))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{CellState, TrackerState, DEFAULT_CHALLENGE_ID};
    use crate::storage::{keys, MemoryProfile, MemoryStore};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    fn named(id: &str) -> Challenge {
        let mut c = default_challenge(today());
        c.id = id.to_string();
        c
    }

    #[test]
    fn duplicates_keep_first_and_none_cells_drop() {
        let mut first = named("a");
        first.name = "first".into();
        first.tracker_state = TrackerState::from([
            ("mandatory-1-1".to_string(), CellState::None),
            ("mandatory-1-2".to_string(), CellState::High),
        ]);
        let mut second = named("a");
        second.name = "second".into();

        let mut challenges = vec![first, second, named("b")];
        normalize_collection(&mut challenges);

        assert_eq!(challenges.len(), 2);
        assert_eq!(challenges[0].name, "first");
        assert_eq!(challenges[0].tracker_state.len(), 1);
    }

    #[test]
    fn active_prefers_remembered_id() {
        let challenges = vec![named("a"), named("b")];
        assert_eq!(resolve_active(&challenges, Some("b")), 1);
        assert_eq!(resolve_active(&challenges, Some("gone")), 0);
        assert_eq!(resolve_active(&challenges, None), 0);
    }

    #[tokio::test]
    async fn empty_store_gets_saved_default() {
        let store = MemoryStore::new();
        let profile = MemoryProfile::default();
        let who = Identity::new("u1");

        let loaded = load_collection(&store, &profile, &who, today()).await;
        assert_eq!(loaded.source, LoadSource::SynthesizedDefault);
        assert_eq!(loaded.challenges.len(), 1);
        assert_eq!(loaded.challenges[0].end_date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(store.list(&who).await.unwrap(), loaded.challenges);
    }

    #[tokio::test]
    async fn malformed_legacy_falls_back_without_saving() {
        let store = MemoryStore::new();
        let profile = MemoryProfile::default();
        profile.set(keys::LEGACY_TRACKER_STATE, "[1,2").unwrap();
        let who = Identity::new("u1");

        let loaded = load_collection(&store, &profile, &who, today()).await;
        assert_eq!(loaded.source, LoadSource::Fallback);
        assert_ne!(loaded.challenges[0].id, DEFAULT_CHALLENGE_ID);
        assert_eq!(store.save_count(), 0);
        assert!(profile.get(keys::LEGACY_TRACKER_STATE).unwrap().is_some());
    }

    /// Profile whose legacy keys cannot be removed.
    struct StickyProfile(MemoryProfile);

    impl ProfileState for StickyProfile {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.0.set(key, value)
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::unavailable("read-only profile"))
        }
    }

    #[tokio::test]
    async fn failed_legacy_cleanup_keeps_migrated_collection() {
        let store = MemoryStore::new();
        let profile = StickyProfile(MemoryProfile::default());
        profile.set(keys::LEGACY_TRACKER_STATE, r#"{"mandatory-1-1": 1}"#).unwrap();
        let who = Identity::new("u1");

        let loaded = load_collection(&store, &profile, &who, today()).await;
        assert_eq!(loaded.source, LoadSource::MigratedLegacy);
        assert_eq!(loaded.challenges[0].id, DEFAULT_CHALLENGE_ID);
        assert_eq!(store.list(&who).await.unwrap(), loaded.challenges);
    }
}
