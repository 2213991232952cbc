//! CLI entry point for BellBook.

pub mod auth;
pub mod content;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::auth::store::FileCredentialStore;
use crate::cache::QueryCache;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::ApiClient;
use crate::navigation::{Navigator, LOGIN_PATH};
use crate::types::Priority;

/// BellBook command-line client
#[derive(Parser, Debug)]
#[command(name = "bellbook", version, about = "BellBook school-communication client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in, register, and sign out
    Auth(AuthArgs),
    /// Channels and announcements
    Announcements(AnnouncementsArgs),
    /// Conversations and messages
    Messages(MessagesArgs),
    /// Follow live updates until interrupted
    Watch,
}

#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Text a one-time password to a phone number
    OtpRequest { phone: String },
    /// Sign in with a phone number and one-time password
    OtpVerify { phone: String, otp: String },
    /// Sign in with email and password
    Login { email: String, password: String },
    /// Create a parent account
    Register(RegisterArgs),
    /// Show the signed-in user
    Status,
    /// Sign out and forget credentials
    Logout,
}

#[derive(Parser, Debug)]
pub struct RegisterArgs {
    pub phone: String,
    pub otp: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub school_id: String,
}

#[derive(Parser, Debug)]
pub struct AnnouncementsArgs {
    #[command(subcommand)]
    pub command: AnnouncementCommands,
}

#[derive(Subcommand, Debug)]
pub enum AnnouncementCommands {
    /// List channels visible to you
    Channels,
    /// List announcements in a channel
    List {
        channel_id: String,
        /// urgent, normal or info
        #[arg(short, long)]
        priority: Option<Priority>,
    },
    /// Show one announcement
    Show { id: String },
    /// Mark an announcement as read
    Read { id: String },
}

#[derive(Parser, Debug)]
pub struct MessagesArgs {
    #[command(subcommand)]
    pub command: MessageCommands,
}

#[derive(Subcommand, Debug)]
pub enum MessageCommands {
    /// List conversations
    List,
    /// Show a conversation's messages
    Show { conversation_id: String },
    /// Send a message
    Send { conversation_id: String, body: String },
}

/// Shared client state for one CLI invocation.
pub struct Context {
    pub api: Arc<ApiClient>,
    pub cache: QueryCache,
}

impl Context {
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env();
        let store = Arc::new(FileCredentialStore::new(config.credentials_dir.clone()));
        let cache = QueryCache::new(config.query.clone());
        let api = Arc::new(ApiClient::new(config, store, Arc::new(TerminalNavigator))?);
        Ok(Self { api, cache })
    }
}

/// Turns forced navigation into a hint on stderr.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, to: &str) {
        if to == LOGIN_PATH {
            eprintln!("Session expired. Sign in again with `bellbook auth login`.");
        }
    }
}
