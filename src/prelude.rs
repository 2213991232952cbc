//! Convenience re-exports for common use.

pub use crate::auth::{
    AuthService, CredentialPair, CredentialRefresher, CredentialStore, FileCredentialStore,
    MemoryCredentialStore, SessionQuery, SessionStatus,
};
pub use crate::cache::{QueryCache, QueryKey};
pub use crate::config::ClientConfig;
pub use crate::error::{BellbookError, Result};
pub use crate::events::{EventStreamClient, EventStreamHandle, StreamState};
pub use crate::http::ApiClient;
pub use crate::navigation::{Navigator, WatchNavigator};
pub use crate::resources::{AnnouncementResources, ConversationResources};
pub use crate::route::{guard, resolve, GuardDecision, Route};
pub use crate::types::{Announcement, Channel, Conversation, MessageItem, Priority, Role, User};
