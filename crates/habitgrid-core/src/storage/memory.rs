//! In-process store and profile state.
//!
//! Used by tests and by callers that want a throwaway collection. The
//! store can be switched to fail every call, which is how the failure
//! paths of the loader and of persist tasks are exercised.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{ChallengeStore, ProfileState};
use crate::challenge::Challenge;
use crate::error::StoreError;
use crate::identity::Identity;

/// Challenge documents kept in memory, per uid, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Vec<Challenge>>>,
    unavailable: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `challenges` for `identity`.
    pub fn with_challenges(identity: &Identity, challenges: Vec<Challenge>) -> Self {
        let store = Self::default();
        if let Ok(mut documents) = store.documents.lock() {
            documents.insert(identity.uid.clone(), challenges);
        }
        store
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn documents(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<Challenge>>>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("memory store is offline"));
        }
        self.documents
            .lock()
            .map_err(|_| StoreError::unavailable("memory store lock poisoned"))
    }
}

impl ChallengeStore for MemoryStore {
    async fn list(&self, identity: &Identity) -> Result<Vec<Challenge>, StoreError> {
        let documents = self.documents()?;
        Ok(documents.get(&identity.uid).cloned().unwrap_or_default())
    }

    async fn save(&self, identity: &Identity, challenge: &Challenge) -> Result<(), StoreError> {
        let mut documents = self.documents()?;
        let collection = documents.entry(identity.uid.clone()).or_default();
        match collection.iter_mut().find(|c| c.id == challenge.id) {
            Some(existing) => *existing = challenge.clone(),
            None => collection.push(challenge.clone()),
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, identity: &Identity, challenge_id: &str) -> Result<(), StoreError> {
        let mut documents = self.documents()?;
        if let Some(collection) = documents.get_mut(&identity.uid) {
            collection.retain(|c| c.id != challenge_id);
        }
        Ok(())
    }
}

/// Profile state kept in memory.
#[derive(Debug, Default)]
pub struct MemoryProfile {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryProfile {
    fn values(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, StoreError> {
        self.values
            .lock()
            .map_err(|_| StoreError::unavailable("memory profile lock poisoned"))
    }
}

impl ProfileState for MemoryProfile {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values()?.remove(key);
        Ok(())
    }
}
