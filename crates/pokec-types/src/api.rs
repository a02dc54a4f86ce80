use serde::{Deserialize, Serialize};

use crate::models::User;

// -- JWT Claims --

/// JWT claims shared between pokec-api (REST middleware) and pokec-gateway
/// (WebSocket Identify). `sub` is the user's email — the unique key.
///
/// Claims only establish *who* is calling. Trust flags (admin/VIP/muted/
/// banned) are never encoded in the token; they are re-read from the store
/// on every call so a revocation takes effect immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Required when posting to the DM pseudo-room.
    #[serde(default)]
    pub recipient_email: Option<String>,
    /// Honored only when the sender is an admin; silently downgraded
    /// otherwise.
    #[serde(default)]
    pub announcement: bool,
    /// Optional client-generated idempotency token. Re-sending the same
    /// token returns the originally stored message instead of a duplicate.
    #[serde(default)]
    pub client_key: Option<String>,
}

// -- Profile --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

// -- Support --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeRequest {
    pub requested_tier: String,
}

// -- Moderation --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClearRoomRequest {
    /// Room to clear. Whether this is honored or the whole history is
    /// cleared depends on the server's configured clear scope.
    #[serde(default)]
    pub room: Option<String>,
}
