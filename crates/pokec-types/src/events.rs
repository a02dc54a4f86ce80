use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Message;

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    Ready { email: String, username: String },

    /// A new message was stored
    MessageCreate { message: Message },

    /// An admin deleted a single message
    MessageDelete { id: Uuid },

    /// An admin cleared a room (`None` = the whole history)
    RoomCleared { room: Option<String> },

    /// A user came online or went offline
    PresenceUpdate { username: String, online: bool },

    /// A user started typing in a room
    TypingStart { room: String, username: String },
}

impl GatewayEvent {
    /// Whether this event may be delivered to the given identity.
    /// Everything is global except DM message creation, which only the
    /// sender and the recipient may observe.
    pub fn visible_to(&self, email: &str) -> bool {
        match self {
            Self::MessageCreate { message } => message.visible_to(email),
            _ => true,
        }
    }
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },

    /// Indicate typing in a room
    StartTyping { room: String },
}
