//! BellBook client sync core.
//!
//! Headless client for the BellBook school-communication API: credential
//! storage, bearer-authenticated requests with silent refresh, a query cache
//! kept current by server push, and the guard in front of protected views.
//!
//! All collaborators are explicit. One [`ApiClient`](http::ApiClient), one
//! [`QueryCache`](cache::QueryCache) and at most one running
//! [`EventStreamClient`](events::EventStreamClient) per signed-in session.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use bellbook::prelude::*;
//!
//! # async fn example() -> bellbook::error::Result<()> {
//! let config = ClientConfig::from_env();
//! let store = Arc::new(FileCredentialStore::new(config.credentials_dir.clone()));
//! let cache = QueryCache::new(config.query.clone());
//! let api = Arc::new(ApiClient::new(config, store, Arc::new(WatchNavigator::new()))?);
//!
//! AuthService::new(api.clone(), cache.clone())
//!     .login("teacher@school.co.za", "secret")
//!     .await?;
//!
//! let stream = EventStreamClient::for_api(&api, cache.clone())?.start();
//! for channel in AnnouncementResources::new(api, cache).channels().await? {
//!     println!("{}", channel.name);
//! }
//! stream.teardown();
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod navigation;
pub mod prelude;
pub mod resources;
pub mod route;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
