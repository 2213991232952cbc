use std::sync::Arc;

use crate::cache::{FetchOptions, QueryCache, QueryKey};
use crate::error::Result;
use crate::http::ApiClient;
use crate::types::User;
use crate::util::retry::RetryPolicy;

/// Authentication status derived from the identity fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Authenticated(User),
    Unauthenticated,
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Unauthenticated => None,
        }
    }
}

/// Cached `GET /auth/me`. Never retried; served from cache for the
/// configured session stale time.
#[derive(Clone)]
pub struct SessionQuery {
    api: Arc<ApiClient>,
    cache: QueryCache,
}

impl SessionQuery {
    pub fn new(api: Arc<ApiClient>, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    /// Well-known cache key of the session record.
    pub fn key() -> QueryKey {
        QueryKey::resource("me")
    }

    pub async fn user(&self) -> Result<User> {
        let api = self.api.clone();
        let options = FetchOptions::default()
            .stale_time(self.api.config().session_stale_time)
            .retry(RetryPolicy::none());
        self.cache
            .fetch_as(&Self::key(), options, move || {
                let api = api.clone();
                async move { api.get::<serde_json::Value>("/auth/me").await }
            })
            .await
    }

    /// Any failure to fetch the identity means "not authenticated".
    pub async fn status(&self) -> SessionStatus {
        match self.user().await {
            Ok(user) => SessionStatus::Authenticated(user),
            Err(err) => {
                tracing::debug!(error = %err, "session unavailable");
                SessionStatus::Unauthenticated
            }
        }
    }

    /// Last-known identity without touching the network.
    pub fn cached(&self) -> Option<User> {
        self.cache.get_as(&Self::key())
    }
}
