//! Shared test doubles: recording navigator, scripted push transport and
//! refresher, and token helpers.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use futures::stream;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::time::Instant;

use bellbook::auth::{CredentialPair, CredentialRefresher, CredentialStore, MemoryCredentialStore};
use bellbook::config::ClientConfig;
use bellbook::error::{BellbookError, Result};
use bellbook::events::{EventLines, PushTransport};
use bellbook::http::ApiClient;
use bellbook::navigation::Navigator;

/// Unsigned token whose `exp` is `exp_offset_secs` from now.
pub fn token_expiring_in(exp_offset_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + exp_offset_secs;
    token_with_claims(&json!({"sub": "u1", "role": "teacher", "exp": exp}))
}

pub fn token_with_claims(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.sig")
}

pub fn signed_in_store(access: &str, refresh: &str) -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_pair(CredentialPair::new(access, refresh)))
}

/// Navigator that records every redirect.
#[derive(Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, to: &str) {
        self.redirects.lock().unwrap().push(to.to_string());
    }
}

/// API client against a mock server mounted under `/api`.
pub fn api_client(
    server_uri: &str,
    store: Arc<MemoryCredentialStore>,
    navigator: Arc<RecordingNavigator>,
) -> ApiClient {
    let config = ClientConfig::new().with_base_url(format!("{server_uri}/api"));
    ApiClient::new(config, store, navigator).unwrap()
}

pub fn token_response(access: &str, refresh: &str) -> Value {
    json!({"access_token": access, "refresh_token": refresh, "token_type": "bearer"})
}

/// Refresher that plays back scripted outcomes, then `fallback`, and on
/// success writes the new pair into `store` like the real procedure.
pub struct ScriptedRefresher {
    outcomes: Mutex<VecDeque<Option<String>>>,
    fallback: Option<String>,
    store: Option<Arc<MemoryCredentialStore>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedRefresher {
    pub fn always(token: Option<&str>) -> Arc<Self> {
        Self::scripted(Vec::new(), token)
    }

    pub fn scripted(outcomes: Vec<Option<&str>>, fallback: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into_iter().map(|o| o.map(str::to_string)).collect()),
            fallback: fallback.map(str::to_string),
            store: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn persisting_to(token: &str, store: Arc<MemoryCredentialStore>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(VecDeque::new()),
            fallback: Some(token.to_string()),
            store: Some(store),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    /// Like [`always`](Self::always), but each call takes `delay` to resolve.
    pub fn slow(delay: Duration, token: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(VecDeque::new()),
            fallback: token.map(str::to_string),
            store: None,
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialRefresher for ScriptedRefresher {
    async fn refresh(&self) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        if let (Some(token), Some(store)) = (&outcome, &self.store) {
            store.set(&CredentialPair::new(token.as_str(), "refreshed")).unwrap();
        }
        outcome
    }
}

/// How one scripted connection attempt behaves.
pub enum Connect {
    /// Fail to open.
    Fail,
    /// Open, deliver `lines`, then drop the connection.
    OpenThenDrop(Vec<String>),
    /// Open, deliver `lines`, then stay open.
    OpenAndHold(Vec<String>),
    /// Never finish opening.
    Stall,
}

/// Push transport that plays back scripted connection attempts, then
/// `fallback` forever, recording when and with which token each attempt
/// was made.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Connect>>,
    fallback: fn() -> Connect,
    attempts: Mutex<Vec<(Instant, String)>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Connect>, fallback: fn() -> Connect) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            attempts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Self::new(Vec::new(), || Connect::Fail)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.attempts.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    /// Whole seconds between consecutive connection attempts.
    pub fn gaps_secs(&self) -> Vec<u64> {
        let attempts = self.attempts.lock().unwrap();
        attempts
            .windows(2)
            .map(|w| w[1].0.duration_since(w[0].0).as_secs())
            .collect()
    }
}

#[async_trait]
impl PushTransport for ScriptedTransport {
    async fn connect(&self, access_token: &str) -> Result<EventLines> {
        self.attempts
            .lock()
            .unwrap()
            .push((Instant::now(), access_token.to_string()));
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(self.fallback);
        match step {
            Connect::Fail => Err(BellbookError::Stream("connection refused".into())),
            Connect::OpenThenDrop(lines) => Ok(stream::iter(lines.into_iter().map(Ok)).boxed()),
            Connect::OpenAndHold(lines) => Ok(stream::iter(lines.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed()),
            Connect::Stall => futures::future::pending().await,
        }
    }
}
