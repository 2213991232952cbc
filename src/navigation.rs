//! Navigation requests issued by the client core, as an injected seam.

use tokio::sync::watch;

/// Where the client sends the user when the session cannot be recovered.
pub const LOGIN_PATH: &str = "/login";
/// Landing view after a successful sign-in.
pub const HOME_PATH: &str = "/";

/// Receives redirects issued by the sync core (forced logout, sign-in).
pub trait Navigator: Send + Sync {
    fn redirect(&self, to: &str);
}

/// Navigator backed by a `watch` channel; the UI layer observes the latest
/// forced destination.
///
/// # Example
/// ```
/// use bellbook::navigation::{Navigator, WatchNavigator, LOGIN_PATH};
///
/// let nav = WatchNavigator::new();
/// let rx = nav.subscribe();
/// nav.redirect(LOGIN_PATH);
/// assert_eq!(rx.borrow().as_deref(), Some(LOGIN_PATH));
/// ```
#[derive(Debug)]
pub struct WatchNavigator {
    tx: watch::Sender<Option<String>>,
}

impl WatchNavigator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<String> {
        self.tx.borrow().clone()
    }
}

impl Default for WatchNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for WatchNavigator {
    fn redirect(&self, to: &str) {
        tracing::info!(to, "forced navigation");
        self.tx.send_replace(Some(to.to_string()));
    }
}
