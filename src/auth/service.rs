use std::sync::Arc;

use serde::de::IgnoredAny;
use serde_json::json;

use super::session::SessionQuery;
use super::token::{CredentialPair, TokenResponse};
use crate::cache::QueryCache;
use crate::error::Result;
use crate::http::ApiClient;
use crate::navigation::{HOME_PATH, LOGIN_PATH};
use crate::types::RegisterRequest;

/// Sign-in, registration and sign-out flows.
///
/// Every token-issuing call persists the returned pair atomically, marks the
/// cached session stale and navigates home.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use bellbook::auth::{AuthService, MemoryCredentialStore};
/// use bellbook::cache::QueryCache;
/// use bellbook::config::ClientConfig;
/// use bellbook::http::ApiClient;
/// use bellbook::navigation::WatchNavigator;
///
/// # async fn example() -> bellbook::error::Result<()> {
/// let config = ClientConfig::from_env();
/// let cache = QueryCache::new(config.query.clone());
/// let api = Arc::new(ApiClient::new(
///     config,
///     Arc::new(MemoryCredentialStore::new()),
///     Arc::new(WatchNavigator::new()),
/// )?);
/// let auth = AuthService::new(api, cache);
/// auth.login("teacher@school.co.za", "secret").await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthService {
    api: Arc<ApiClient>,
    cache: QueryCache,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    /// Ask the server to text a one-time password to `phone`.
    pub async fn request_otp(&self, phone: &str) -> Result<()> {
        let _: IgnoredAny = self
            .api
            .post("/auth/otp/request", &json!({ "phone": normalize_phone(phone) }))
            .await?;
        Ok(())
    }

    pub async fn verify_otp(&self, phone: &str, otp: &str) -> Result<CredentialPair> {
        let tokens: TokenResponse = self
            .api
            .post(
                "/auth/otp/verify",
                &json!({ "phone": normalize_phone(phone), "otp": otp }),
            )
            .await?;
        self.establish(tokens)
    }

    /// Staff sign-in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<CredentialPair> {
        let tokens: TokenResponse = self
            .api
            .post("/auth/login", &json!({ "email": email, "password": password }))
            .await?;
        self.establish(tokens)
    }

    /// Parent self-registration.
    pub async fn register(&self, request: &RegisterRequest) -> Result<CredentialPair> {
        let request = RegisterRequest {
            phone: normalize_phone(&request.phone),
            ..request.clone()
        };
        let tokens: TokenResponse = self.api.post("/auth/register", &request).await?;
        self.establish(tokens)
    }

    /// Best-effort server logout, then drop credentials and every cached
    /// query, and navigate to login. Never fails.
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.api.store().refresh_token() {
            let result: Result<IgnoredAny> = self
                .api
                .post("/auth/logout", &json!({ "refresh_token": refresh_token }))
                .await;
            if let Err(err) = result {
                tracing::debug!(error = %err, "server logout failed; continuing");
            }
        }
        if let Err(err) = self.api.store().clear() {
            tracing::warn!(error = %err, "failed to clear credentials");
        }
        self.cache.clear();
        self.api.navigator().redirect(LOGIN_PATH);
    }

    fn establish(&self, tokens: TokenResponse) -> Result<CredentialPair> {
        let pair = CredentialPair::from(tokens);
        self.api.store().set(&pair)?;
        self.cache.invalidate(&SessionQuery::key());
        self.api.navigator().redirect(HOME_PATH);
        Ok(pair)
    }
}

/// Strip spaces and dashes, keeping a leading `+`.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| *c != ' ' && *c != '-').collect()
}
