use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageItem {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub is_muted: bool,
    pub is_blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub school_id: String,
    pub subject: Option<String>,
    pub learner_id: Option<String>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    pub last_message: Option<MessageItem>,
    #[serde(default)]
    pub unread_count: u32,
}

/// Body of `POST /conversations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConversation {
    pub learner_id: String,
    /// The other party (teacher or parent).
    pub participant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}
