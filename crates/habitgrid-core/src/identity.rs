//! Identity collaborator.
//!
//! The core never authenticates anyone itself. It asks an
//! [`IdentityProvider`] who is signed in and treats "nobody" as "no
//! collection to show".

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::CoreError;
use crate::storage::{keys, ProfileState};

/// The signed-in user, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            photo_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Source of the current user.
pub trait IdentityProvider {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<Identity>;

    /// Sign in and return the resulting identity.
    fn login(&mut self) -> Result<Identity, CoreError>;

    /// Sign out. Signing out while signed out is not an error.
    fn logout(&mut self) -> Result<(), CoreError>;
}

/// Single local profile. Signing in records the profile uid in the
/// profile state so it survives restarts.
pub struct LocalIdentity {
    profile: Arc<dyn ProfileState>,
    identity: Identity,
}

impl LocalIdentity {
    pub fn new(profile: Arc<dyn ProfileState>, identity: Identity) -> Self {
        Self { profile, identity }
    }
}

impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<Identity> {
        match self.profile.get(keys::SIGNED_IN) {
            Ok(Some(uid)) if uid == self.identity.uid => Some(self.identity.clone()),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read signed-in profile");
                None
            }
        }
    }

    fn login(&mut self) -> Result<Identity, CoreError> {
        self.profile.set(keys::SIGNED_IN, &self.identity.uid)?;
        tracing::info!(uid = %self.identity.uid, "signed in");
        Ok(self.identity.clone())
    }

    fn logout(&mut self) -> Result<(), CoreError> {
        self.profile.remove(keys::SIGNED_IN)?;
        tracing::info!(uid = %self.identity.uid, "signed out");
        Ok(())
    }
}
