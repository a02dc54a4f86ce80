use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DM_ROOM;

/// A registered user. The password hash never leaves the persistence layer,
/// so it is deliberately absent here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub username: String,
    pub avatar: String,
    pub bio: String,
    pub status: String,
    pub is_admin: bool,
    pub is_vip: bool,
    pub is_muted: bool,
    pub is_banned: bool,
    pub last_seen: DateTime<Utc>,
    pub join_date: DateTime<Utc>,
}

/// A stored chat message.
///
/// `sender_username`, `avatar`, `is_admin` and `is_vip` are snapshots of the
/// sender's state at post time — revoking a flag later does not rewrite
/// history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_email: String,
    pub sender_username: String,
    pub avatar: String,
    pub text: String,
    pub image_url: Option<String>,
    pub room: String,
    pub recipient_email: Option<String>,
    pub is_announcement: bool,
    pub is_admin: bool,
    pub is_vip: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether the given identity may see this message. Public rooms are
    /// visible to everyone; a DM only to its sender and recipient.
    pub fn visible_to(&self, email: &str) -> bool {
        if self.room != DM_ROOM {
            return true;
        }
        self.sender_email == email || self.recipient_email.as_deref() == Some(email)
    }
}

/// A tier-upgrade ticket. Created by a user, resolved out of band by
/// moderation tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportRequest {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub requested_tier: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
