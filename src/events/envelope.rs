//! Push event envelopes and the cache invalidations they imply.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::cache::QueryKey;

/// A decoded `{type, ...fields}` envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Keepalive / handshake; no effect.
    Connected { user_id: Option<String> },
    AnnouncementNew {
        announcement_id: Option<String>,
        channel_id: Option<String>,
    },
    MessageNew { conversation_id: Option<String> },
    /// Well-formed envelope of a type this client does not know.
    Unrecognized(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Parse one payload. Malformed JSON or a missing `type` yields `None`.
pub fn parse_event(data: &str) -> Option<StreamEvent> {
    let envelope: Envelope = serde_json::from_str(data).ok()?;
    let field = |name: &str| {
        envelope
            .fields
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let event = match envelope.kind.as_str() {
        "connected" => StreamEvent::Connected {
            user_id: field("user_id"),
        },
        "announcement.new" => StreamEvent::AnnouncementNew {
            announcement_id: field("announcement_id"),
            channel_id: field("channel_id"),
        },
        "message.new" => StreamEvent::MessageNew {
            conversation_id: field("conversation_id"),
        },
        _ => StreamEvent::Unrecognized(envelope.kind),
    };
    Some(event)
}

impl StreamEvent {
    /// Cache keys to invalidate for this event.
    pub fn invalidations(&self) -> Vec<QueryKey> {
        match self {
            Self::AnnouncementNew { .. } => vec![
                QueryKey::resource("announcements"),
                QueryKey::resource("channels"),
            ],
            Self::MessageNew { conversation_id } => {
                let mut keys = vec![QueryKey::resource("conversations")];
                if let Some(id) = conversation_id {
                    keys.push(QueryKey::resource("messages").with(id.as_str()));
                }
                keys
            }
            Self::Connected { .. } | Self::Unrecognized(_) => Vec::new(),
        }
    }
}
