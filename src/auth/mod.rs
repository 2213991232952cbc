//! Credentials, token inspection, refresh, and session flows.

pub mod error;
pub mod refresh;
pub mod service;
pub mod session;
pub mod store;
pub mod token;

pub use error::AuthError;
pub use refresh::{CredentialRefresher, RefreshProcedure};
pub use service::AuthService;
pub use session::{SessionQuery, SessionStatus};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use token::{decode_claims, is_expired, token_role, CredentialPair, TokenResponse};
