pub mod api;
pub mod events;
pub mod models;

/// Room every new deployment starts with; system announcements land here.
pub const DEFAULT_ROOM: &str = "General";

/// Posting here requires the sender to be VIP or admin.
pub const VIP_ROOM: &str = "VIP Lounge";

/// Pseudo-room for direct messages. A message in this room carries a
/// `recipient_email` and is visible only to the sender and that recipient.
pub const DM_ROOM: &str = "DM";

/// Display name stamped on server-authored announcement messages.
pub const SYSTEM_USERNAME: &str = "System";
