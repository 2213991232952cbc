//! Authenticated JSON client with one-shot silent refresh.

pub mod response;

pub use response::{status_to_error, ApiResponse};

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::Value;

use crate::auth::refresh::{CredentialRefresher, RefreshProcedure};
use crate::auth::store::CredentialStore;
use crate::config::ClientConfig;
use crate::error::{BellbookError, Result};
use crate::navigation::{Navigator, LOGIN_PATH};

/// HTTP client for the BellBook API.
///
/// Every call attaches the stored access token. A 401 triggers exactly one
/// refresh; if it succeeds the request is replayed once with the new token and
/// that outcome is final. If it fails, credentials are cleared, the navigator
/// is sent to `/login` and the call fails with [`BellbookError::Unauthorized`].
/// At most two requests reach the network per logical call.
pub struct ApiClient {
    client: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn CredentialRefresher>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let client = config.http_client()?;
        let refresher = Arc::new(RefreshProcedure::new(client.clone(), &config, store.clone()));
        Ok(Self {
            client,
            config,
            store,
            refresher,
            navigator,
        })
    }

    /// Replace the refresh procedure.
    pub fn with_refresher(mut self, refresher: Arc<dyn CredentialRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn refresher(&self) -> &Arc<dyn CredentialRefresher> {
        &self.refresher
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, Some(&body)).await
    }

    /// POST without a request body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::POST, path, None).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::PUT, path, Some(&body)).await
    }

    /// DELETE; any response body is discarded.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request::<IgnoredAny>(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Typed request; see [`ApiResponse::into_typed`] for no-content handling.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        self.request_raw(method, path, body, HeaderMap::new())
            .await?
            .into_typed()
    }

    /// Issue a request, merging `headers` under the bearer credential.
    pub async fn request_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: HeaderMap,
    ) -> Result<ApiResponse> {
        let url = self.config.endpoint(path);
        let token = self.store.access_token();
        let mut resp = self
            .send_once(&method, &url, body, &headers, token.as_deref())
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!(%method, path, "401 received, attempting refresh");
            let Some(token) = self.refresher.refresh().await else {
                self.force_logout();
                return Err(BellbookError::Unauthorized);
            };
            resp = self
                .send_once(&method, &url, body, &headers, Some(&token))
                .await?;
        }

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(ApiResponse::NoContent);
        }

        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(status_to_error(status.as_u16(), &bytes));
        }
        response::parse_success(&bytes)
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        extra: &HeaderMap,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .headers(merged_headers(extra, token));
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }
        Ok(request.send().await?)
    }

    /// Irrecoverable session: drop credentials and send the user to login.
    pub(crate) fn force_logout(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "failed to clear credentials");
        }
        tracing::info!("session could not be refreshed, logging out");
        self.navigator.redirect(LOGIN_PATH);
    }
}

/// JSON content type, then caller headers, then the bearer credential, which
/// callers cannot override.
fn merged_headers(extra: &HeaderMap, token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in extra {
        headers.insert(name.clone(), value.clone());
    }
    headers.remove(AUTHORIZATION);
    if let Some(token) = token {
        if let Ok(val) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(AUTHORIZATION, val);
        }
    }
    headers
}
