//! Route table and the guard in front of protected views.

use std::fmt;

use crate::auth::store::CredentialStore;
use crate::auth::token::is_expired;
use crate::navigation::{HOME_PATH, LOGIN_PATH};

/// Outcome of evaluating the guard for one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
}

/// Allow protected views only with a present, unexpired access token.
///
/// The check is local and unverified. It is evaluated per navigation and
/// never cached, so a token that expires mid-session is caught on the next
/// route change.
pub fn guard(store: &dyn CredentialStore) -> GuardDecision {
    match store.access_token() {
        Some(token) if !is_expired(&token) => GuardDecision::Allow,
        _ => GuardDecision::Redirect(LOGIN_PATH),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Announcements,
    CreateAnnouncement,
    Announcement(String),
    Messages,
    Conversation(String),
    Calendar,
    Settings,
}

impl Route {
    /// Match a path. Unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let route = match segments.as_slice() {
            [] => Self::Dashboard,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["announcements"] => Self::Announcements,
            ["announcements", "create"] => Self::CreateAnnouncement,
            ["announcements", id] => Self::Announcement((*id).to_string()),
            ["messages"] => Self::Messages,
            ["messages", id] => Self::Conversation((*id).to_string()),
            ["calendar"] => Self::Calendar,
            ["settings"] => Self::Settings,
            _ => return None,
        };
        Some(route)
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("/login"),
            Self::Register => f.write_str("/register"),
            Self::Dashboard => f.write_str("/"),
            Self::Announcements => f.write_str("/announcements"),
            Self::CreateAnnouncement => f.write_str("/announcements/create"),
            Self::Announcement(id) => write!(f, "/announcements/{id}"),
            Self::Messages => f.write_str("/messages"),
            Self::Conversation(id) => write!(f, "/messages/{id}"),
            Self::Calendar => f.write_str("/calendar"),
            Self::Settings => f.write_str("/settings"),
        }
    }
}

/// Resolve a navigation to the route that renders or the path to go to.
/// Unknown paths go home; protected routes pass through [`guard`].
pub fn resolve(path: &str, store: &dyn CredentialStore) -> Result<Route, &'static str> {
    let Some(route) = Route::parse(path) else {
        return Err(HOME_PATH);
    };
    if route.is_public() {
        return Ok(route);
    }
    match guard(store) {
        GuardDecision::Allow => Ok(route),
        GuardDecision::Redirect(to) => Err(to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryCredentialStore;
    use crate::auth::token::{encode_test_token, CredentialPair};
    use serde_json::json;

    fn store_with(exp_offset_secs: i64) -> MemoryCredentialStore {
        let exp = chrono::Utc::now().timestamp() + exp_offset_secs;
        let token = encode_test_token(&json!({"sub": "u1", "exp": exp, "role": "parent"}));
        MemoryCredentialStore::with_pair(CredentialPair::new(token, "r"))
    }

    #[test]
    fn absent_token_redirects_to_login() {
        let store = MemoryCredentialStore::new();
        assert_eq!(guard(&store), GuardDecision::Redirect("/login"));
    }

    #[test]
    fn expired_token_redirects_to_login() {
        assert_eq!(guard(&store_with(-60)), GuardDecision::Redirect("/login"));
    }

    #[test]
    fn unreadable_token_redirects_to_login() {
        let store = MemoryCredentialStore::with_pair(CredentialPair::new("garbage", "r"));
        assert_eq!(guard(&store), GuardDecision::Redirect("/login"));
    }

    #[test]
    fn valid_token_allows() {
        assert_eq!(guard(&store_with(3600)), GuardDecision::Allow);
    }

    #[test]
    fn parses_route_table() {
        assert_eq!(Route::parse("/"), Some(Route::Dashboard));
        assert_eq!(Route::parse("/announcements/create"), Some(Route::CreateAnnouncement));
        assert_eq!(
            Route::parse("/announcements/a1"),
            Some(Route::Announcement("a1".into()))
        );
        assert_eq!(
            Route::parse("/messages/c1?focus=1"),
            Some(Route::Conversation("c1".into()))
        );
        assert_eq!(Route::parse("/settings/"), Some(Route::Settings));
        assert_eq!(Route::parse("/nope"), None);
        assert_eq!(Route::Conversation("c1".into()).to_string(), "/messages/c1");
    }

    #[test]
    fn resolve_applies_guard_to_protected_routes_only() {
        let anonymous = MemoryCredentialStore::new();
        assert_eq!(resolve("/login", &anonymous), Ok(Route::Login));
        assert_eq!(resolve("/register", &anonymous), Ok(Route::Register));
        assert_eq!(resolve("/messages", &anonymous), Err("/login"));
        assert_eq!(resolve("/unknown", &anonymous), Err("/"));

        let signed_in = store_with(3600);
        assert_eq!(resolve("/calendar", &signed_in), Ok(Route::Calendar));
    }

    #[test]
    fn guard_is_reevaluated_each_navigation() {
        let store = store_with(3600);
        assert_eq!(resolve("/", &store), Ok(Route::Dashboard));
        store.clear().unwrap();
        assert_eq!(resolve("/", &store), Err("/login"));
    }
}
