//! The signed-in user's working collection.
//!
//! A [`Session`] owns the loaded challenges and the active selection.
//! Mutations apply in memory first and return [`PersistTask`]s for the
//! caller to run.

mod loader;
mod reconcile;
mod task;

pub use loader::{load_collection, normalize_collection, resolve_active, LoadSource, LoadedCollection};
pub use reconcile::{reconcile, Reconciled};
pub use task::{PersistTask, RetryPolicy, SaveIndicator};

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::challenge::{default_challenge, CellState, Challenge, ChallengeDraft};
use crate::error::ValidationError;
use crate::identity::{Identity, IdentityProvider};
use crate::stats::{compute_stats, ChallengeStats};
use crate::storage::{ChallengeStore, ProfileState};

/// Loaded challenges of one identity. Always holds at least one challenge.
pub struct Session {
    identity: Identity,
    challenges: Vec<Challenge>,
    active: usize,
    source: LoadSource,
    profile: Arc<dyn ProfileState>,
    today: NaiveDate,
}

impl Session {
    /// Load the collection of whoever `provider` reports as signed in.
    /// Returns `None` when nobody is.
    pub async fn open<P, S>(provider: &P, store: &S, profile: Arc<dyn ProfileState>) -> Option<Self>
    where
        P: IdentityProvider + ?Sized,
        S: ChallengeStore,
    {
        let identity = provider.current_user()?;
        Some(Self::load(store, profile, identity).await)
    }

    pub async fn load<S: ChallengeStore>(
        store: &S,
        profile: Arc<dyn ProfileState>,
        identity: Identity,
    ) -> Self {
        Self::load_on(store, profile, identity, Local::now().date_naive()).await
    }

    /// Load with an explicit "today" for the default challenge dates.
    pub async fn load_on<S: ChallengeStore>(
        store: &S,
        profile: Arc<dyn ProfileState>,
        identity: Identity,
        today: NaiveDate,
    ) -> Self {
        let loaded = load_collection(store, profile.as_ref(), &identity, today).await;
        debug!(
            uid = %identity.uid,
            count = loaded.challenges.len(),
            source = ?loaded.source,
            "session loaded"
        );
        Self {
            identity,
            challenges: loaded.challenges,
            active: loaded.active,
            source: loaded.source,
            profile,
            today,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    pub fn active(&self) -> &Challenge {
        &self.challenges[self.active]
    }

    pub fn active_id(&self) -> &str {
        &self.active().id
    }

    pub fn load_source(&self) -> LoadSource {
        self.source
    }

    pub fn challenge(&self, id: &str) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.id == id)
    }

    /// Make `id` the active challenge and remember it for the next load.
    pub fn select(&mut self, id: &str) -> Result<(), ValidationError> {
        let index = self
            .position(id)
            .ok_or_else(|| ValidationError::UnknownChallenge(id.to_string()))?;
        self.activate(index);
        Ok(())
    }

    /// Dashboard statistics of the active challenge.
    pub fn stats(&self) -> ChallengeStats {
        compute_stats(self.active())
    }

    /// Append a challenge built from `draft` and make it active.
    pub fn create_challenge(&mut self, draft: ChallengeDraft) -> Result<PersistTask, ValidationError> {
        let challenge = draft.into_challenge()?;
        self.challenges.push(challenge.clone());
        self.activate(self.challenges.len() - 1);
        Ok(self.save_task(challenge))
    }

    /// Rename a habit of the active challenge. `None` when the habit is
    /// unknown, the name is blank, or nothing changed.
    pub fn rename_habit(&mut self, habit_id: &str, name: &str) -> Option<PersistTask> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let challenge = &mut self.challenges[self.active];
        if !challenge.rename_habit(habit_id, name) {
            return None;
        }
        let challenge = challenge.clone();
        Some(self.save_task(challenge))
    }

    /// Advance one cell of the active challenge through the toggle cycle.
    pub fn toggle_cell(
        &mut self,
        habit_id: &str,
        day: u32,
    ) -> Result<(CellState, PersistTask), ValidationError> {
        let challenge = &mut self.challenges[self.active];
        if challenge.habit(habit_id).is_none() {
            return Err(ValidationError::UnknownHabit {
                challenge_id: challenge.id.clone(),
                habit_id: habit_id.to_string(),
            });
        }
        let day_count = challenge.day_count();
        if day == 0 || day > day_count {
            return Err(ValidationError::DayOutOfRange { day, day_count });
        }

        let state = challenge.advance_cell(habit_id, day);
        let challenge = challenge.clone();
        Ok((state, self.save_task(challenge)))
    }

    /// Remove a challenge.
    ///
    /// Returns the delete task, followed by a save task for a fresh default
    /// challenge when the collection would otherwise be empty. Run them in
    /// order.
    pub fn delete_challenge(&mut self, id: &str) -> Result<Vec<PersistTask>, ValidationError> {
        let index = self
            .position(id)
            .ok_or_else(|| ValidationError::UnknownChallenge(id.to_string()))?;
        self.challenges.remove(index);

        let mut tasks = vec![PersistTask::Delete {
            identity: self.identity.clone(),
            challenge_id: id.to_string(),
        }];

        if self.challenges.is_empty() {
            let mut challenge = default_challenge(self.today);
            if self.source == LoadSource::Fallback {
                // the store may still hold a default we never saw
                challenge.id = uuid::Uuid::new_v4().to_string();
            }
            self.challenges.push(challenge.clone());
            tasks.push(self.save_task(challenge));
            self.activate(0);
        } else if index == self.active {
            self.activate(0);
        } else if index < self.active {
            self.active -= 1;
        }
        Ok(tasks)
    }

    /// Merge a locally cached collection into the loaded one and return
    /// save tasks for the challenges only the cache knew about.
    pub fn reconcile_with(&mut self, cached: Vec<Challenge>) -> Vec<PersistTask> {
        let active_id = self.active_id().to_string();
        let merged = reconcile(cached, std::mem::take(&mut self.challenges));
        self.challenges = merged.challenges;
        normalize_collection(&mut self.challenges);
        self.active = resolve_active(&self.challenges, Some(&active_id));

        merged
            .pending
            .into_iter()
            .map(|challenge| self.save_task(challenge))
            .collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.challenges.iter().position(|c| c.id == id)
    }

    fn activate(&mut self, index: usize) {
        self.active = index;
        let id = &self.challenges[index].id;
        if let Err(e) = self.profile.remember_active(&self.identity, id) {
            warn!(challenge = %id, error = %e, "failed to remember active challenge");
        }
    }

    fn save_task(&self, challenge: Challenge) -> PersistTask {
        PersistTask::Save {
            identity: self.identity.clone(),
            challenge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::DEFAULT_CHALLENGE_ID;
    use crate::storage::{MemoryProfile, MemoryStore};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    async fn session() -> (Session, Arc<MemoryProfile>) {
        let profile = Arc::new(MemoryProfile::default());
        let store = MemoryStore::new();
        let session = Session::load_on(&store, profile.clone(), Identity::new("u1"), today()).await;
        (session, profile)
    }

    #[tokio::test]
    async fn create_activates_and_remembers() {
        let (mut session, profile) = session().await;
        let draft = ChallengeDraft::new("Spring", today(), NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        let task = session.create_challenge(draft).unwrap();

        assert_eq!(session.challenges().len(), 2);
        assert_eq!(session.active().name, "Spring");
        assert_eq!(task.challenge_id(), session.active_id());
        let remembered = profile.active_id(session.identity()).unwrap();
        assert_eq!(remembered.as_deref(), Some(session.active_id()));
    }

    #[tokio::test]
    async fn invalid_draft_mutates_nothing() {
        let (mut session, _) = session().await;
        let err = session.create_challenge(ChallengeDraft::default()).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("name"));
        assert_eq!(session.challenges().len(), 1);
    }

    #[tokio::test]
    async fn toggle_validates_habit_and_day() {
        let (mut session, _) = session().await;
        assert!(matches!(
            session.toggle_cell("nope", 1),
            Err(ValidationError::UnknownHabit { .. })
        ));
        assert!(matches!(
            session.toggle_cell("mandatory-1", 0),
            Err(ValidationError::DayOutOfRange { .. })
        ));

        let (state, task) = session.toggle_cell("mandatory-1", 1).unwrap();
        assert_eq!(state, CellState::High);
        match task {
            PersistTask::Save { challenge, .. } => {
                assert_eq!(challenge.cell("mandatory-1", 1), CellState::High)
            }
            other => panic!("unexpected task {other:?}"),
        }
    }

    #[tokio::test]
    async fn rename_unknown_or_unchanged_yields_no_task() {
        let (mut session, _) = session().await;
        assert!(session.rename_habit("missing", "x").is_none());
        assert!(session.rename_habit("mandatory-1", "  ").is_none());
        assert!(session.rename_habit("mandatory-1", "Cold shower").is_some());
        assert!(session.rename_habit("mandatory-1", "Cold shower").is_none());
    }

    #[tokio::test]
    async fn deleting_last_challenge_synthesizes_default() {
        let (mut session, _) = session().await;
        let tasks = session.delete_challenge(DEFAULT_CHALLENGE_ID).unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(matches!(tasks[0], PersistTask::Delete { .. }));
        assert!(matches!(tasks[1], PersistTask::Save { .. }));
        assert_eq!(session.challenges().len(), 1);
        assert_eq!(session.active_id(), DEFAULT_CHALLENGE_ID);
    }

    #[tokio::test]
    async fn deleting_before_active_keeps_selection() {
        let (mut session, _) = session().await;
        let end = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        session.create_challenge(ChallengeDraft::new("B", today(), end)).unwrap();
        let active = session.active_id().to_string();

        session.delete_challenge(DEFAULT_CHALLENGE_ID).unwrap();
        assert_eq!(session.active_id(), active);
        assert!(session.select("gone").is_err());
    }

    #[tokio::test]
    async fn deleting_fallback_challenge_never_targets_stored_default() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let profile = Arc::new(MemoryProfile::default());
        let mut session = Session::load_on(&store, profile, Identity::new("u1"), today()).await;
        assert_eq!(session.load_source(), LoadSource::Fallback);

        let fallback_id = session.active_id().to_string();
        let tasks = session.delete_challenge(&fallback_id).unwrap();
        assert!(tasks.iter().all(|t| t.challenge_id() != DEFAULT_CHALLENGE_ID));
        assert_ne!(session.active_id(), DEFAULT_CHALLENGE_ID);
    }
}
