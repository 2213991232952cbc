use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Account role, also carried as the `role` claim of the access token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    SchoolAdmin,
    Teacher,
    Parent,
}

impl Role {
    /// Roles allowed to publish announcements and moderate conversations.
    pub fn is_staff(self) -> bool {
        !matches!(self, Self::Parent)
    }
}

/// The authenticated user's identity record (`GET /auth/me`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub school_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub preferred_lang: String,
    pub avatar_url: Option<String>,
    pub is_active: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Parent self-registration via phone OTP.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[builder(into)]
    pub phone: String,
    #[builder(into)]
    pub otp: String,
    #[builder(into)]
    pub first_name: String,
    #[builder(into)]
    pub last_name: String,
    #[builder(into)]
    pub school_id: String,
}
