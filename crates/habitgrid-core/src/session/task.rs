//! Deferred persistence produced by session mutations.
//!
//! A mutation changes the in-memory collection right away and hands back a
//! [`PersistTask`]. The caller decides whether to await it, retry it, or
//! spawn it on the runtime. A failed task is logged and never rolls the
//! in-memory state back.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::challenge::Challenge;
use crate::error::StoreError;
use crate::identity::Identity;
use crate::storage::ChallengeStore;

/// A save or delete waiting to be sent to a store.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistTask {
    Save {
        identity: Identity,
        challenge: Challenge,
    },
    Delete {
        identity: Identity,
        challenge_id: String,
    },
}

impl PersistTask {
    pub fn challenge_id(&self) -> &str {
        match self {
            PersistTask::Save { challenge, .. } => &challenge.id,
            PersistTask::Delete { challenge_id, .. } => challenge_id,
        }
    }

    fn action(&self) -> &'static str {
        match self {
            PersistTask::Save { .. } => "save",
            PersistTask::Delete { .. } => "delete",
        }
    }

    /// Send the task to `store` once.
    pub async fn run<S: ChallengeStore>(&self, store: &S) -> Result<(), StoreError> {
        match self {
            PersistTask::Save {
                identity,
                challenge,
            } => store.save(identity, challenge).await,
            PersistTask::Delete {
                identity,
                challenge_id,
            } => store.delete(identity, challenge_id).await,
        }
    }

    /// Send the task, retrying [`StoreError::Unavailable`] with exponential
    /// backoff. Malformed-data errors are returned immediately.
    pub async fn run_with_retry<S: ChallengeStore>(
        &self,
        store: &S,
        policy: &RetryPolicy,
    ) -> Result<(), StoreError> {
        let attempts = policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.run(store).await {
                Ok(()) => {
                    debug!(action = self.action(), challenge = %self.challenge_id(), attempt, "persisted");
                    return Ok(());
                }
                Err(e) if e.is_unavailable() && attempt < attempts => {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        action = self.action(),
                        challenge = %self.challenge_id(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "persist failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run the task in the background.
    ///
    /// `indicator` reports the task as in flight from the moment this
    /// returns until the task finishes, whatever the outcome.
    pub fn spawn<S>(
        self,
        store: Arc<S>,
        indicator: SaveIndicator,
        policy: RetryPolicy,
    ) -> JoinHandle<Result<(), StoreError>>
    where
        S: ChallengeStore + 'static,
    {
        let guard = indicator.begin();
        tokio::spawn(async move {
            let result = self.run_with_retry(store.as_ref(), &policy).await;
            if let Err(e) = &result {
                warn!(
                    action = self.action(),
                    challenge = %self.challenge_id(),
                    error = %e,
                    "persist failed, in-memory state kept"
                );
                guard.fail();
            }
            drop(guard);
            result
        })
    }
}

/// Backoff schedule for [`PersistTask::run_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay after the `attempt`-th failure (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250))
    }
}

#[derive(Debug, Default)]
struct IndicatorState {
    in_flight: AtomicUsize,
    failures: AtomicUsize,
}

/// Shared "saving..." flag for spawned persist tasks.
#[derive(Debug, Clone, Default)]
pub struct SaveIndicator {
    state: Arc<IndicatorState>,
}

impl SaveIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any spawned task is still running.
    pub fn is_saving(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }

    /// Tasks that gave up since the indicator was created.
    pub fn failures(&self) -> usize {
        self.state.failures.load(Ordering::SeqCst)
    }

    fn begin(&self) -> SaveGuard {
        self.state.in_flight.fetch_add(1, Ordering::SeqCst);
        SaveGuard {
            state: Arc::clone(&self.state),
        }
    }
}

/// Marks one task in flight until dropped.
struct SaveGuard {
    state: Arc<IndicatorState>,
}

impl SaveGuard {
    fn fail(&self) {
        self.state.failures.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
