//! Persistence for challenge collections and local profile state.
//!
//! [`ChallengeStore`] is the list/save/delete contract every backend
//! satisfies. [`ProfileState`] is the small local key-value space that
//! remembers the active challenge, the signed-in profile, and the legacy
//! keys consumed by migration.

mod config;
mod local;
mod memory;
pub mod migrations;
mod remote;

pub use config::{
    Config, DashboardConfig, ProfileConfig, StorageBackend, StorageConfig, SyncConfig,
};
pub use local::LocalStore;
pub use memory::{MemoryProfile, MemoryStore};
pub use remote::RemoteStore;

use std::future::Future;
use std::path::PathBuf;

use crate::challenge::{Challenge, Habit, TrackerState};
use crate::error::StoreError;
use crate::identity::Identity;

/// Key layout of the local key-value space.
pub mod keys {
    /// Bare tracker state written by single-challenge versions.
    pub const LEGACY_TRACKER_STATE: &str = "tracker_state";
    /// Bare habit list written by single-challenge versions.
    pub const LEGACY_HABITS: &str = "habits";
    /// Uid of the signed-in local profile.
    pub const SIGNED_IN: &str = "signed_in_uid";

    /// JSON array of challenges for a profile.
    pub fn collection(uid: &str) -> String {
        format!("{uid}/challenges")
    }

    /// Remembered active challenge id for a profile.
    pub fn active_id(uid: &str) -> String {
        format!("{uid}/active_id")
    }
}

/// Returns the data directory.
///
/// `HABITGRID_HOME` wins when set. Otherwise `~/.config/habitgrid`, or
/// `~/.config/habitgrid-dev` when `HABITGRID_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("HABITGRID_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HABITGRID_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("habitgrid-dev")
            } else {
                base_dir.join("habitgrid")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Backing store for a user's challenges.
///
/// `save` overwrites the whole document (last write wins). Deleting an id
/// that does not exist succeeds.
pub trait ChallengeStore: Send + Sync {
    fn list(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<Vec<Challenge>, StoreError>> + Send;

    fn save(
        &self,
        identity: &Identity,
        challenge: &Challenge,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete(
        &self,
        identity: &Identity,
        challenge_id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Values found under the legacy keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacySnapshot {
    pub tracker_state: Option<TrackerState>,
    pub habits: Option<Vec<Habit>>,
}

impl LegacySnapshot {
    pub fn is_empty(&self) -> bool {
        self.tracker_state.is_none() && self.habits.is_none()
    }

    /// Move the legacy values into `challenge`, replacing its fields.
    pub fn apply_to(self, challenge: &mut Challenge) {
        if let Some(tracker_state) = self.tracker_state {
            challenge.tracker_state = tracker_state;
        }
        if let Some(habits) = self.habits {
            challenge.habits = habits;
        }
    }
}

/// Local key-value profile state.
pub trait ProfileState: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remembered active challenge id for `identity`.
    fn active_id(&self, identity: &Identity) -> Result<Option<String>, StoreError> {
        self.get(&keys::active_id(&identity.uid))
    }

    fn remember_active(&self, identity: &Identity, challenge_id: &str) -> Result<(), StoreError> {
        self.set(&keys::active_id(&identity.uid), challenge_id)
    }

    /// Read the legacy keys without removing them.
    ///
    /// # Errors
    /// Returns [`StoreError::Malformed`] if a legacy value is not valid JSON
    /// of the expected shape.
    fn legacy_snapshot(&self) -> Result<LegacySnapshot, StoreError> {
        let tracker_state = match self.get(keys::LEGACY_TRACKER_STATE)? {
            Some(raw) => Some(
                serde_json::from_str(&raw)
                    .map_err(|e| StoreError::malformed(keys::LEGACY_TRACKER_STATE, e))?,
            ),
            None => None,
        };
        let habits = match self.get(keys::LEGACY_HABITS)? {
            Some(raw) => Some(
                serde_json::from_str(&raw)
                    .map_err(|e| StoreError::malformed(keys::LEGACY_HABITS, e))?,
            ),
            None => None,
        };
        Ok(LegacySnapshot {
            tracker_state,
            habits,
        })
    }

    fn clear_legacy(&self) -> Result<(), StoreError> {
        self.remove(keys::LEGACY_TRACKER_STATE)?;
        self.remove(keys::LEGACY_HABITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{default_challenge, CellState, HabitType};

    #[test]
    fn key_layout_is_scoped_by_uid() {
        assert_eq!(keys::collection("local"), "local/challenges");
        assert_eq!(keys::active_id("u-42"), "u-42/active_id");
    }

    #[test]
    fn legacy_snapshot_parses_old_shapes() {
        let profile = MemoryProfile::default();
        assert!(profile.legacy_snapshot().unwrap().is_empty());

        profile
            .set(keys::LEGACY_TRACKER_STATE, r#"{"ob-1-1": 1, "ob-1-2": 3}"#)
            .unwrap();
        profile
            .set(
                keys::LEGACY_HABITS,
                r#"[{"id": "ob-1", "name": "Gym", "type": "obligatorio"}]"#,
            )
            .unwrap();

        let snapshot = profile.legacy_snapshot().unwrap();
        let tracker = snapshot.tracker_state.as_ref().unwrap();
        assert_eq!(tracker["ob-1-2"], CellState::Low);
        assert_eq!(snapshot.habits.as_ref().unwrap()[0].kind, HabitType::Mandatory);

        let mut challenge = default_challenge(chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        snapshot.apply_to(&mut challenge);
        assert_eq!(challenge.habits.len(), 1);
        assert_eq!(challenge.tracker_state.len(), 2);

        profile.clear_legacy().unwrap();
        assert!(profile.legacy_snapshot().unwrap().is_empty());
    }

    #[test]
    fn malformed_legacy_value_is_reported() {
        let profile = MemoryProfile::default();
        profile.set(keys::LEGACY_HABITS, "not json").unwrap();
        let err = profile.legacy_snapshot().unwrap_err();
        assert!(matches!(err, StoreError::Malformed { ref key, .. } if key == keys::LEGACY_HABITS));
    }
}
