//! Access token caching
//!
//! A [`TokenCache`] belongs to the client that uses it. Readers share the
//! cached token; a token with less than a minute left is renewed under the
//! write lock, and the freshness check is repeated there so concurrent callers
//! trigger a single renewal.

use crate::constants::auth::TOKEN_RENEW_MARGIN_SECS;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::future::Future;
use tokio::sync::RwLock;
use tracing::info;

/// A bearer token and its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Whether the token is still usable at `now` with the renewal margin
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        (self.expires_at - now).num_seconds() >= TOKEN_RENEW_MARGIN_SECS
    }
}

/// Lazily refreshed token slot
#[derive(Debug, Default)]
pub struct TokenCache {
    token: RwLock<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token, renewing it with `refresh` when stale
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken>>,
    {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
                return Ok(token.value.clone());
            }
        }

        let mut slot = self.token.write().await;
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = refresh().await?;
        info!("Access token renewed, expires at {}", token.expires_at);
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    /// Drop the cached token so the next call renews it
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    /// The cached token, fresh or not
    pub async fn current(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }
}
