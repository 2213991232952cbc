//! Wire types exchanged with the BellBook API.

pub mod announcement;
pub mod messaging;
pub mod user;

pub use announcement::{
    Announcement, AnnouncementRead, AnnouncementStats, Channel, ChannelType, ClassBreakdown,
    NewAnnouncement, Priority,
};
pub use messaging::{Conversation, MessageItem, NewConversation, Participant};
pub use user::{RegisterRequest, Role, User};
