//! Long-lived push subscription for one signed-in session.
//!
//! The client runs as a single task that owns its connection and timer.
//! Every state transition first checks the cancellation token, so a task
//! that was torn down never reconnects, refreshes, or logs out after the
//! fact.

use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::refresh::CredentialRefresher;
use crate::auth::store::CredentialStore;
use crate::cache::QueryCache;
use crate::config::BackoffConfig;
use crate::error::Result;
use crate::http::ApiClient;
use crate::navigation::{Navigator, LOGIN_PATH};

use super::backoff::Backoff;
use super::envelope::parse_event;
use super::transport::{event_payload, EventLines, HttpPushTransport, PushTransport};

/// Connection lifecycle as observed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Not started, stopped for lack of credentials, or torn down.
    Disconnected,
    Connecting,
    Open,
    /// Waiting `delay` before the next connection attempt.
    BackoffWait { delay: Duration },
    /// Refresh failed; credentials were cleared. Terminal.
    LoggedOut,
}

/// Configuration of a push subscription. Call [`start`](Self::start) once per
/// signed-in session.
#[derive(Builder)]
pub struct EventStreamClient {
    transport: Arc<dyn PushTransport>,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn CredentialRefresher>,
    navigator: Arc<dyn Navigator>,
    cache: QueryCache,
    #[builder(default)]
    backoff: BackoffConfig,
}

impl EventStreamClient {
    /// Subscribe over HTTP with the API client's credentials, refresh
    /// procedure, navigator, and backoff settings.
    pub fn for_api(api: &ApiClient, cache: QueryCache) -> Result<Self> {
        Ok(Self {
            transport: Arc::new(HttpPushTransport::new(api.config())?),
            store: api.store().clone(),
            refresher: api.refresher().clone(),
            navigator: api.navigator().clone(),
            cache,
            backoff: api.config().backoff,
        })
    }

    /// Spawn the subscription task. Must be called within a Tokio runtime.
    pub fn start(&self) -> EventStreamHandle {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(StreamState::Disconnected);
        let worker = Worker {
            transport: self.transport.clone(),
            store: self.store.clone(),
            refresher: self.refresher.clone(),
            navigator: self.navigator.clone(),
            cache: self.cache.clone(),
            backoff: Backoff::new(self.backoff),
            state: state_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(worker.run());
        EventStreamHandle {
            cancel,
            state: state_rx,
            task: Some(task),
        }
    }
}

/// Owner of a running subscription. Dropping it tears the subscription down.
pub struct EventStreamHandle {
    cancel: CancellationToken,
    state: watch::Receiver<StreamState>,
    task: Option<JoinHandle<()>>,
}

impl EventStreamHandle {
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    /// Close the connection and cancel any pending reconnect. Idempotent.
    pub fn teardown(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!("tearing down event stream");
            self.cancel.cancel();
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the task to exit, either on its own (logged out, no
    /// credentials) or after [`teardown`](Self::teardown).
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "event stream task failed");
            }
        }
    }
}

impl Drop for EventStreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Worker {
    transport: Arc<dyn PushTransport>,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn CredentialRefresher>,
    navigator: Arc<dyn Navigator>,
    cache: QueryCache,
    backoff: Backoff,
    state: watch::Sender<StreamState>,
    cancel: CancellationToken,
}

/// How an open connection ended.
enum Closed {
    TornDown,
    Lost,
}

impl Worker {
    async fn run(mut self) {
        loop {
            let Some(token) = self.store.access_token() else {
                tracing::debug!("no access token, event stream idle");
                self.transition(StreamState::Disconnected);
                return;
            };
            if !self.transition(StreamState::Connecting) {
                break;
            }

            let connected = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                connected = self.transport.connect(&token) => connected,
            };

            match connected {
                Ok(lines) => {
                    if !self.transition(StreamState::Open) {
                        break;
                    }
                    self.backoff.reset();
                    tracing::info!("event stream open");
                    if let Closed::TornDown = self.pump(lines).await {
                        break;
                    }
                }
                Err(err) => tracing::warn!(error = %err, "event stream connection failed"),
            }

            let refreshed = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                refreshed = self.refresher.refresh() => refreshed,
            };
            if self.cancel.is_cancelled() {
                break;
            }
            if refreshed.is_none() {
                self.log_out();
                return;
            }

            let delay = self.backoff.next_delay();
            if !self.transition(StreamState::BackoffWait { delay }) {
                break;
            }
            tracing::debug!(delay_ms = delay.as_millis() as u64, "event stream reconnect scheduled");
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        self.state.send_replace(StreamState::Disconnected);
    }

    async fn pump(&self, mut lines: EventLines) -> Closed {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Closed::TornDown,
                next = lines.next() => next,
            };
            match next {
                Some(Ok(line)) => self.dispatch(&line),
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "event stream dropped");
                    return Closed::Lost;
                }
                None => {
                    tracing::debug!("event stream closed by server");
                    return Closed::Lost;
                }
            }
        }
    }

    fn dispatch(&self, line: &str) {
        let Some(event) = event_payload(line).and_then(parse_event) else {
            return;
        };
        tracing::trace!(?event, "push event");
        for key in event.invalidations() {
            self.cache.invalidate(&key);
        }
    }

    fn log_out(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "failed to clear credentials");
        }
        tracing::info!("event stream credentials rejected, logging out");
        self.navigator.redirect(LOGIN_PATH);
        self.transition(StreamState::LoggedOut);
    }

    /// Publish `next` unless torn down.
    fn transition(&self, next: StreamState) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.state.send_replace(next);
        true
    }
}
