//! HTTP document store.
//!
//! Challenges live at `{base}/users/{uid}/challenges/{id}`. Listing the
//! collection returns a JSON array, `PUT` overwrites a document, `DELETE`
//! removes it.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use url::Url;

use super::{ChallengeStore, StorageConfig};
use crate::challenge::Challenge;
use crate::error::{ConfigError, StoreError};
use crate::identity::Identity;

/// Client for a remote challenge document store.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    http_client: Client,
    base_url: Url,
    token: Option<String>,
}

impl RemoteStore {
    /// Create a store rooted at `base_url`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if the URL does not parse or
    /// cannot carry path segments.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            key: "storage.remote_url".to_string(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                key: "storage.remote_url".to_string(),
                message: format!("'{base_url}' cannot be used as a base URL"),
            });
        }
        Ok(Self {
            http_client: Client::new(),
            base_url,
            token: None,
        })
    }

    /// Send `token` as a bearer credential on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, ConfigError> {
        if config.remote_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "storage.remote_url".to_string(),
                message: "required when storage.backend = \"remote\"".to_string(),
            });
        }
        let store = Self::new(&config.remote_url)?;
        Ok(if config.remote_token.is_empty() {
            store
        } else {
            store.with_token(config.remote_token.clone())
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::unavailable(format!("invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn collection_url(&self, uid: &str) -> Result<Url, StoreError> {
        self.url(&["users", uid, "challenges"])
    }

    fn document_url(&self, uid: &str, challenge_id: &str) -> Result<Url, StoreError> {
        self.url(&["users", uid, "challenges", challenge_id])
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn ensure_success(response: Response, url: &Url) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(StoreError::unavailable(format!("{url} responded with {status}")))
    }
}

impl ChallengeStore for RemoteStore {
    async fn list(&self, identity: &Identity) -> Result<Vec<Challenge>, StoreError> {
        let url = self.collection_url(&identity.uid)?;
        let response = self
            .authorize(self.http_client.get(url.clone()))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(%url, "remote collection not found, treating as empty");
            return Ok(Vec::new());
        }

        let body = ensure_success(response, &url)?.text().await?;
        let challenges: Vec<Challenge> =
            serde_json::from_str(&body).map_err(|e| StoreError::malformed(url.as_str(), e))?;
        tracing::debug!(%url, count = challenges.len(), "listed remote challenges");
        Ok(challenges)
    }

    async fn save(&self, identity: &Identity, challenge: &Challenge) -> Result<(), StoreError> {
        let url = self.document_url(&identity.uid, &challenge.id)?;
        let response = self
            .authorize(self.http_client.put(url.clone()))
            .json(challenge)
            .send()
            .await?;
        ensure_success(response, &url)?;
        tracing::debug!(%url, "saved remote challenge");
        Ok(())
    }

    async fn delete(&self, identity: &Identity, challenge_id: &str) -> Result<(), StoreError> {
        let url = self.document_url(&identity.uid, challenge_id)?;
        let response = self
            .authorize(self.http_client.delete(url.clone()))
            .send()
            .await?;
        if response.status() != StatusCode::NOT_FOUND {
            ensure_success(response, &url)?;
        }
        tracing::debug!(%url, "deleted remote challenge");
        Ok(())
    }
}
