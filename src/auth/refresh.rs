//! The shared refresh procedure.
//!
//! Used by both the HTTP client (on a 401) and the event stream client (on a
//! push-connection error). Concurrent calls are allowed: each one persists a
//! freshly issued pair and the last writer wins.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;

use super::error::AuthError;
use super::store::CredentialStore;
use super::token::{CredentialPair, TokenResponse};
use crate::config::ClientConfig;

/// Exchanges the stored refresh token for a new credential pair.
#[async_trait]
pub trait CredentialRefresher: Send + Sync {
    /// Returns the new access token, or `None` on any failure. Never errors.
    async fn refresh(&self) -> Option<String>;
}

/// `POST /auth/refresh {refresh_token}` against the API.
pub struct RefreshProcedure {
    client: reqwest::Client,
    url: String,
    store: Arc<dyn CredentialStore>,
}

impl RefreshProcedure {
    pub fn new(client: reqwest::Client, config: &ClientConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            url: config.endpoint("/auth/refresh"),
            store,
        }
    }

    /// Exchange and persist, reporting why a refresh did not happen.
    pub async fn exchange(&self) -> Result<CredentialPair, AuthError> {
        let refresh_token = self.store.refresh_token().ok_or(AuthError::NotLoggedIn)?;

        let resp = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !resp.status().is_success() {
            tracing::debug!(status = resp.status().as_u16(), "token refresh rejected");
            return Err(AuthError::RefreshRejected);
        }

        let body = resp.bytes().await?;
        let tokens: TokenResponse = serde_json::from_slice(&body)?;

        let pair = CredentialPair::from(tokens);
        self.store.set(&pair)?;
        Ok(pair)
    }
}

#[async_trait]
impl CredentialRefresher for RefreshProcedure {
    async fn refresh(&self) -> Option<String> {
        match self.exchange().await {
            Ok(pair) => {
                tracing::debug!("access token refreshed");
                Some(pair.access_token)
            }
            Err(AuthError::NotLoggedIn) => None,
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed");
                None
            }
        }
    }
}
