use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Urgent,
    #[default]
    Normal,
    Info,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChannelType {
    School,
    Grade,
    Class,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub school_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub description: Option<String>,
    pub grade_id: Option<String>,
    pub class_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub is_pinned: bool,
    pub send_whatsapp: bool,
    pub send_sms: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `None` until the calling user has read it.
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl Announcement {
    /// Sort timestamp: publication time, else creation time.
    pub fn effective_at(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// Body of `POST /announcements`.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct NewAnnouncement {
    #[builder(into)]
    pub channel_id: String,
    #[builder(into)]
    pub title: String,
    #[builder(into)]
    pub body: String,
    #[builder(default)]
    pub priority: Priority,
    #[builder(default)]
    pub is_pinned: bool,
    #[builder(default)]
    pub send_whatsapp: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementRead {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub read_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassBreakdown {
    pub target: String,
    pub total: u64,
    pub read: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementStats {
    pub announcement_id: String,
    pub total_recipients: u64,
    pub read_count: u64,
    pub read_percentage: f64,
    pub unread_count: u64,
    #[serde(default)]
    pub breakdown: Vec<ClassBreakdown>,
    pub last_read_at: Option<DateTime<Utc>>,
}
