//! Database row types — these map directly to SQLite rows.
//! Distinct from pokec-types API models to keep the DB layer independent.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pokec_types::models::{Message, SupportRequest, User};
use uuid::Uuid;

pub struct UserRow {
    pub email: String,
    pub username: String,
    pub password: String,
    pub avatar: String,
    pub bio: String,
    pub status: String,
    pub is_admin: bool,
    pub is_vip: bool,
    pub is_muted: bool,
    pub is_banned: bool,
    pub last_seen: String,
    pub join_date: String,
}

impl UserRow {
    /// Convert to the API model, dropping the password hash.
    pub fn into_user(self) -> Result<User> {
        Ok(User {
            email: self.email,
            username: self.username,
            avatar: self.avatar,
            bio: self.bio,
            status: self.status,
            is_admin: self.is_admin,
            is_vip: self.is_vip,
            is_muted: self.is_muted,
            is_banned: self.is_banned,
            last_seen: parse_timestamp(&self.last_seen)?,
            join_date: parse_timestamp(&self.join_date)?,
        })
    }
}

pub struct MessageRow {
    pub id: String,
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
    pub client_key: Option<String>,
    pub created_at: String,
}

impl MessageRow {
    pub fn into_message(self) -> Result<Message> {
        Ok(Message {
            id: self
                .id
                .parse::<Uuid>()
                .with_context(|| format!("corrupt message id '{}'", self.id))?,
            sender_email: self.sender_email,
            sender_username: self.sender_username,
            avatar: self.avatar,
            text: self.text,
            image_url: self.image_url,
            room: self.room,
            recipient_email: self.recipient_email,
            is_announcement: self.is_announcement,
            is_admin: self.is_admin,
            is_vip: self.is_vip,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

pub struct SupportRequestRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub requested_tier: String,
    pub status: String,
    pub created_at: String,
}

impl SupportRequestRow {
    pub fn into_request(self) -> Result<SupportRequest> {
        Ok(SupportRequest {
            id: self
                .id
                .parse::<Uuid>()
                .with_context(|| format!("corrupt request id '{}'", self.id))?,
            email: self.email,
            username: self.username,
            requested_tier: self.requested_tier,
            status: self.status,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .with_context(|| format!("corrupt timestamp '{}'", raw))
}
