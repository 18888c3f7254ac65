//! Subcommands and the store wiring they share.

pub mod auth;
pub mod cell;
pub mod challenge;
pub mod config;
pub mod habit;
pub mod stats;

use std::error::Error;
use std::sync::Arc;

use habitgrid_core::error::{CoreError, StoreError};
use habitgrid_core::session::{LoadSource, PersistTask, Session};
use habitgrid_core::storage::{ChallengeStore, Config, LocalStore, RemoteStore, StorageBackend};
use habitgrid_core::{LocalIdentity, ProfileState};

pub type CommandResult = Result<(), Box<dyn Error>>;

/// Configured stores for one CLI invocation.
///
/// The local SQLite store always holds profile state. With the remote
/// backend it also caches the collection. Challenges created while the
/// remote was down are pushed on the next run; edits to challenges the
/// remote already has are replaced by the remote copy.
pub struct Workspace {
    pub config: Config,
    local: Arc<LocalStore>,
    remote: Option<RemoteStore>,
}

impl Workspace {
    pub fn open() -> Result<Self, Box<dyn Error>> {
        let config = Config::load()?;
        let local = Arc::new(LocalStore::open()?);
        let remote = match config.storage.backend {
            StorageBackend::Local => None,
            StorageBackend::Remote => Some(RemoteStore::from_config(&config.storage)?),
        };
        Ok(Self {
            config,
            local,
            remote,
        })
    }

    pub fn identity_provider(&self) -> LocalIdentity {
        LocalIdentity::new(self.profile(), self.config.identity())
    }

    fn profile(&self) -> Arc<dyn ProfileState> {
        self.local.clone()
    }

    /// Load the signed-in profile's collection.
    pub async fn session(&self) -> Result<Session, Box<dyn Error>> {
        let provider = self.identity_provider();
        let Some(remote) = &self.remote else {
            return Session::open(&provider, self.local.as_ref(), self.profile())
                .await
                .ok_or_else(|| CoreError::NotSignedIn.into());
        };

        let mut session = Session::open(&provider, remote, self.profile())
            .await
            .ok_or(CoreError::NotSignedIn)?;
        if session.load_source() == LoadSource::Fallback {
            return Ok(session);
        }

        let identity = session.identity().clone();
        let cached = self.local.list(&identity).await?;
        let pending = session.reconcile_with(cached);
        if !pending.is_empty() {
            tracing::info!(count = pending.len(), "pushing challenges only found in local cache");
        }
        self.persist(pending).await?;
        for challenge in session.challenges() {
            self.local.save(&identity, challenge).await?;
        }
        Ok(session)
    }

    /// Run persist tasks in order against the local store, then the remote
    /// one with the configured retry policy.
    pub async fn persist(&self, tasks: Vec<PersistTask>) -> Result<(), StoreError> {
        let policy = self.config.retry_policy();
        for task in tasks {
            match &self.remote {
                None => task.run_with_retry(self.local.as_ref(), &policy).await?,
                Some(remote) => {
                    task.run(self.local.as_ref()).await?;
                    task.run_with_retry(remote, &policy).await?;
                }
            }
        }
        Ok(())
    }
}

/// Print `value` as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
