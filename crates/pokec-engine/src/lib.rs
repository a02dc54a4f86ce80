//! The access & visibility engine: given a user's trust state and a
//! requested room or action, decides whether a read, a post, or a moderation
//! action is permitted, and computes the derived fields stamped onto a
//! stored message.
//!
//! Every operation is a single decide-then-write sequence against current
//! persisted state. Nothing is cached: admin status in particular is
//! re-read from the store on every moderation call.

pub mod error;
pub mod policy;
pub mod sanitize;

pub use error::EngineError;
pub use policy::{BanMode, ClearScope, Policy};

use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use pokec_db::Database;
use pokec_db::models::{MessageRow, SupportRequestRow};
use pokec_types::models::{Message, SupportRequest, User};
use pokec_types::{DEFAULT_ROOM, DM_ROOM, SYSTEM_USERNAME, VIP_ROOM};

/// Sender identity stamped on server-authored announcements.
const SYSTEM_EMAIL: &str = "system@pokec.local";

pub type Result<T> = std::result::Result<T, EngineError>;

/// A post as requested by a client, before any decision was made about it.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub sender_email: String,
    pub room: String,
    pub recipient_email: Option<String>,
    pub text: String,
    pub image_url: Option<String>,
    /// Honored only when the sender is currently an admin.
    pub announcement: bool,
    /// Optional idempotency token; a replay returns the stored original.
    pub client_key: Option<String>,
}

/// A privileged action. All of these are idempotent: repeating one on a
/// target already in the requested state succeeds as a no-op.
#[derive(Debug, Clone)]
pub enum ModAction {
    Ban { target: String },
    Mute { target: String },
    Unmute { target: String },
    /// Deliberately one-way: there is no revoke action.
    GrantVip { target: String },
    DeleteMessage { id: Uuid },
    ClearRoom { room: Option<String> },
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub status: Option<String>,
    pub avatar: Option<String>,
}

pub struct Engine {
    db: Arc<Database>,
    policy: Policy,
}

impl Engine {
    pub fn new(db: Arc<Database>, policy: Policy) -> Self {
        Self { db, policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    // -- Registration --

    /// Create a user. The very first user in the deployment is granted
    /// admin + VIP; everyone after starts with all trust flags false. The
    /// check-and-insert is atomic in the DB layer, so two racing first
    /// registrations cannot both win the bootstrap.
    pub fn register(&self, email: &str, username: &str, password: &str) -> Result<User> {
        let email = email.trim();
        let username = username.trim();
        if email.is_empty() {
            return Err(EngineError::EmptyField("email"));
        }
        if username.is_empty() {
            return Err(EngineError::EmptyField("username"));
        }
        if password.is_empty() {
            return Err(EngineError::EmptyField("password"));
        }

        // Argon2id with a fresh salt; the raw password is never stored.
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {e}"))?
            .to_string();

        let row = self
            .db
            .create_user(email, username, &password_hash, "", &now_rfc3339())?
            .ok_or(EngineError::DuplicateIdentity)?;
        let user = row.into_user()?;

        // Cosmetic, not a contract.
        self.announce(&format!("{username} joined the chat"));

        Ok(user)
    }

    // -- Login --

    /// Verify credentials, then the ban gate. The order matters: a banned
    /// account answers `AccountBanned` only to a correct password, so the
    /// ban state never leaks whether an email is registered.
    pub fn login(&self, email: &str, password: &str) -> Result<User> {
        let row = self
            .db
            .get_user_by_email(email.trim())?
            .ok_or(EngineError::InvalidCredentials)?;

        let parsed_hash = PasswordHash::new(&row.password)
            .map_err(|e| anyhow!("stored password hash unreadable: {e}"))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| EngineError::InvalidCredentials)?;

        if row.is_banned {
            return Err(EngineError::AccountBanned);
        }

        let mut user = row.into_user()?;

        // Best-effort: a failed last-seen update must not fail the login.
        let now = Utc::now();
        match self
            .db
            .touch_last_seen(&user.email, &to_rfc3339(now))
        {
            Ok(()) => user.last_seen = now,
            Err(e) => warn!("last-seen update failed for {}: {e}", user.email),
        }

        Ok(user)
    }

    // -- Posting --

    /// Decide whether the sender may post, sanitize the text, and store the
    /// message with the sender's current trust state stamped onto it.
    /// Later trust changes never rewrite the stored snapshot.
    pub fn post(&self, post: NewPost) -> Result<Message> {
        let sender = self
            .db
            .get_user_by_email(&post.sender_email)?
            .ok_or(EngineError::Unauthorized)?;

        if sender.is_banned {
            return Err(EngineError::Banned);
        }
        if sender.is_muted {
            return Err(EngineError::Muted);
        }
        if post.room == VIP_ROOM && !sender.is_vip && !sender.is_admin {
            return Err(EngineError::PaymentRequired);
        }

        // A DM must name a recipient that exists.
        if post.room == DM_ROOM {
            let recipient = post
                .recipient_email
                .as_deref()
                .ok_or(EngineError::NotFound("recipient"))?;
            if self.db.get_user_by_email(recipient)?.is_none() {
                return Err(EngineError::NotFound("recipient"));
            }
        }

        let text = sanitize::strip_tags(&post.text).trim().to_string();
        if text.is_empty() && post.image_url.is_none() && !self.policy.allow_empty {
            return Err(EngineError::EmptyMessage);
        }

        // Idempotency: a replayed client key returns the stored original.
        if let Some(key) = post.client_key.as_deref() {
            if let Some(existing) = self.db.find_message_by_client_key(&sender.email, key)? {
                return Ok(existing.into_message()?);
            }
        }

        let row = MessageRow {
            id: Uuid::new_v4().to_string(),
            sender_email: sender.email.clone(),
            sender_username: sender.username.clone(),
            avatar: sender.avatar.clone(),
            text,
            image_url: post.image_url,
            room: post.room,
            recipient_email: post.recipient_email,
            // Forced false unless the sender holds admin right now.
            is_announcement: post.announcement && sender.is_admin,
            is_admin: sender.is_admin,
            is_vip: sender.is_vip,
            client_key: post.client_key,
            created_at: now_rfc3339(),
        };
        self.db.insert_message(&row)?;

        Ok(row.into_message()?)
    }

    // -- Reading --

    /// The newest page of a room's history, returned oldest-first.
    /// `"DM"` is filtered to messages the requester is party to; every other
    /// room is open to any authenticated caller.
    pub fn room_history(&self, requesting_email: &str, room: &str) -> Result<Vec<Message>> {
        let limit = self.policy.page_size;
        let mut rows = if room == DM_ROOM {
            self.db.dm_messages(DM_ROOM, requesting_email, limit)?
        } else {
            self.db.room_messages(room, limit)?
        };
        rows.reverse();

        let messages = rows
            .into_iter()
            .map(|row| row.into_message())
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(messages)
    }

    // -- Moderation --

    /// Admin status is re-resolved from the store on every call; it is never
    /// trusted from a session token, since flags can change under a live
    /// session.
    pub fn moderate(&self, actor_email: &str, action: ModAction) -> Result<()> {
        let actor = self
            .db
            .get_user_by_email(actor_email)?
            .ok_or(EngineError::Unauthorized)?;
        if !actor.is_admin {
            return Err(EngineError::Unauthorized);
        }

        match action {
            ModAction::Ban { target } => match self.policy.ban_mode {
                BanMode::Flag => {
                    if !self.db.set_banned(&target, true)? {
                        return Err(EngineError::NotFound("user"));
                    }
                }
                BanMode::Delete => {
                    // Target already gone counts as success: the ban held.
                    self.db.delete_messages_from(&target)?;
                    self.db.delete_user(&target)?;
                }
            },
            ModAction::Mute { target } => {
                if !self.db.set_muted(&target, true)? {
                    return Err(EngineError::NotFound("user"));
                }
            }
            ModAction::Unmute { target } => {
                if !self.db.set_muted(&target, false)? {
                    return Err(EngineError::NotFound("user"));
                }
            }
            ModAction::GrantVip { target } => {
                if !self.db.set_vip(&target, true)? {
                    return Err(EngineError::NotFound("user"));
                }
            }
            ModAction::DeleteMessage { id } => {
                self.db.delete_message(&id.to_string())?;
            }
            ModAction::ClearRoom { room } => match self.policy.clear_scope {
                ClearScope::Global => {
                    self.db.clear_messages(None)?;
                }
                ClearScope::Room => {
                    let room = room.as_deref().ok_or(EngineError::EmptyField("room"))?;
                    self.db.clear_messages(Some(room))?;
                }
            },
        }

        Ok(())
    }

    /// Admin-only user roster.
    pub fn list_users(&self, actor_email: &str) -> Result<Vec<User>> {
        let actor = self
            .db
            .get_user_by_email(actor_email)?
            .ok_or(EngineError::Unauthorized)?;
        if !actor.is_admin {
            return Err(EngineError::Unauthorized);
        }

        let users = self
            .db
            .list_users()?
            .into_iter()
            .map(|row| row.into_user())
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(users)
    }

    // -- Self-service --

    pub fn update_profile(&self, email: &str, update: ProfileUpdate) -> Result<User> {
        if !self.db.update_profile(
            email,
            update.bio.as_deref(),
            update.status.as_deref(),
            update.avatar.as_deref(),
        )? {
            return Err(EngineError::NotFound("user"));
        }

        let row = self
            .db
            .get_user_by_email(email)?
            .ok_or(EngineError::NotFound("user"))?;
        Ok(row.into_user()?)
    }

    /// Record a tier-upgrade ticket and surface it as a system announcement.
    pub fn request_upgrade(&self, email: &str, requested_tier: &str) -> Result<SupportRequest> {
        let tier = requested_tier.trim();
        if tier.is_empty() {
            return Err(EngineError::EmptyField("requested_tier"));
        }

        let user = self
            .db
            .get_user_by_email(email)?
            .ok_or(EngineError::Unauthorized)?;

        let row = SupportRequestRow {
            id: Uuid::new_v4().to_string(),
            email: user.email.clone(),
            username: user.username.clone(),
            requested_tier: tier.to_string(),
            status: "Pending".to_string(),
            created_at: now_rfc3339(),
        };
        self.db.insert_support_request(&row)?;

        self.announce(&format!(
            "{} requested an upgrade to {tier}",
            user.username
        ));

        Ok(row.into_request()?)
    }

    /// Best-effort system-authored announcement to the default room.
    fn announce(&self, text: &str) {
        let row = MessageRow {
            id: Uuid::new_v4().to_string(),
            sender_email: SYSTEM_EMAIL.to_string(),
            sender_username: SYSTEM_USERNAME.to_string(),
            avatar: String::new(),
            text: text.to_string(),
            image_url: None,
            room: DEFAULT_ROOM.to_string(),
            recipient_email: None,
            is_announcement: true,
            is_admin: true,
            is_vip: true,
            client_key: None,
            created_at: now_rfc3339(),
        };
        if let Err(e) = self.db.insert_message(&row) {
            warn!("failed to store system announcement: {e}");
        }
    }
}

fn now_rfc3339() -> String {
    to_rfc3339(Utc::now())
}

/// Fixed-width RFC 3339 so lexicographic order matches chronological order.
fn to_rfc3339(ts: chrono::DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        engine_with(Policy::default())
    }

    fn engine_with(policy: Policy) -> Engine {
        Engine::new(Arc::new(Database::open_in_memory().unwrap()), policy)
    }

    fn post_to(eng: &Engine, sender: &str, room: &str, text: &str) -> Result<Message> {
        eng.post(NewPost {
            sender_email: sender.to_string(),
            room: room.to_string(),
            recipient_email: None,
            text: text.to_string(),
            image_url: None,
            announcement: false,
            client_key: None,
        })
    }

    #[test]
    fn first_user_becomes_admin_once() {
        let eng = engine();

        let first = eng.register("a@x.com", "alice", "password1").unwrap();
        assert!(first.is_admin);
        assert!(first.is_vip);

        // A failed registration in between must not shift the bootstrap.
        let dup = eng.register("a@x.com", "impostor", "password2");
        assert!(matches!(dup, Err(EngineError::DuplicateIdentity)));

        let second = eng.register("b@x.com", "bob", "password2").unwrap();
        assert!(!second.is_admin);
        assert!(!second.is_vip);
        assert!(!second.is_muted);
        assert!(!second.is_banned);
    }

    #[test]
    fn registration_rejects_empty_fields() {
        let eng = engine();
        assert!(matches!(
            eng.register("  ", "alice", "pw"),
            Err(EngineError::EmptyField("email"))
        ));
        assert!(matches!(
            eng.register("a@x.com", "", "pw"),
            Err(EngineError::EmptyField("username"))
        ));
        assert!(matches!(
            eng.register("a@x.com", "alice", ""),
            Err(EngineError::EmptyField("password"))
        ));
    }

    #[test]
    fn registration_announces_arrival() {
        let eng = engine();
        eng.register("a@x.com", "alice", "password1").unwrap();

        let history = eng.room_history("a@x.com", DEFAULT_ROOM).unwrap();
        let joined = history
            .iter()
            .find(|m| m.text == "alice joined the chat")
            .expect("arrival announcement stored");
        assert!(joined.is_announcement);
        assert_eq!(joined.sender_username, SYSTEM_USERNAME);
    }

    #[test]
    fn login_verifies_password_hash() {
        let eng = engine();
        eng.register("a@x.com", "alice", "password1").unwrap();

        let user = eng.login("a@x.com", "password1").unwrap();
        assert_eq!(user.username, "alice");

        assert!(matches!(
            eng.login("a@x.com", "wrong"),
            Err(EngineError::InvalidCredentials)
        ));
        assert!(matches!(
            eng.login("ghost@x.com", "password1"),
            Err(EngineError::InvalidCredentials)
        ));
    }

    #[test]
    fn banned_login_fails_after_credential_match() {
        let eng = engine();
        eng.register("admin@x.com", "root", "password1").unwrap();
        eng.register("b@x.com", "bob", "password2").unwrap();

        eng.moderate("admin@x.com", ModAction::Ban { target: "b@x.com".into() })
            .unwrap();

        // Correct password: the ban is allowed to show.
        assert!(matches!(
            eng.login("b@x.com", "password2"),
            Err(EngineError::AccountBanned)
        ));
        // Wrong password: must not leak that the account exists and is banned.
        assert!(matches!(
            eng.login("b@x.com", "wrong"),
            Err(EngineError::InvalidCredentials)
        ));
    }

    #[test]
    fn post_strips_markup() {
        let eng = engine();
        eng.register("a@x.com", "alice", "password1").unwrap();

        let msg = post_to(&eng, "a@x.com", "Lobby", "<script>alert(1)</script>hi").unwrap();
        assert_eq!(msg.text, "hi");
    }

    #[test]
    fn muted_user_cannot_post_anywhere() {
        let eng = engine();
        eng.register("admin@x.com", "root", "password1").unwrap();
        eng.register("b@x.com", "bob", "password2").unwrap();
        eng.moderate("admin@x.com", ModAction::Mute { target: "b@x.com".into() })
            .unwrap();

        assert!(matches!(
            post_to(&eng, "b@x.com", DEFAULT_ROOM, "hi"),
            Err(EngineError::Muted)
        ));
        assert!(matches!(
            post_to(&eng, "b@x.com", VIP_ROOM, "hi"),
            Err(EngineError::Muted)
        ));

        eng.moderate("admin@x.com", ModAction::Unmute { target: "b@x.com".into() })
            .unwrap();
        assert!(post_to(&eng, "b@x.com", DEFAULT_ROOM, "hi").is_ok());
    }

    #[test]
    fn banned_user_cannot_post() {
        let eng = engine();
        eng.register("admin@x.com", "root", "password1").unwrap();
        eng.register("b@x.com", "bob", "password2").unwrap();
        eng.moderate("admin@x.com", ModAction::Ban { target: "b@x.com".into() })
            .unwrap();

        assert!(matches!(
            post_to(&eng, "b@x.com", DEFAULT_ROOM, "hi"),
            Err(EngineError::Banned)
        ));
    }

    #[test]
    fn vip_lounge_requires_vip_or_admin() {
        let eng = engine();
        eng.register("admin@x.com", "root", "password1").unwrap();
        eng.register("b@x.com", "bob", "password2").unwrap();

        assert!(matches!(
            post_to(&eng, "b@x.com", VIP_ROOM, "let me in"),
            Err(EngineError::PaymentRequired)
        ));

        // Admins pass regardless of VIP.
        assert!(post_to(&eng, "admin@x.com", VIP_ROOM, "welcome").is_ok());

        eng.moderate("admin@x.com", ModAction::GrantVip { target: "b@x.com".into() })
            .unwrap();
        assert!(post_to(&eng, "b@x.com", VIP_ROOM, "let me in").is_ok());
    }

    #[test]
    fn stamped_flags_are_snapshots() {
        let eng = engine();
        eng.register("admin@x.com", "root", "password1").unwrap();
        eng.register("b@x.com", "bob", "password2").unwrap();

        let before = post_to(&eng, "b@x.com", "Lobby", "before vip").unwrap();
        assert!(!before.is_vip);

        eng.moderate("admin@x.com", ModAction::GrantVip { target: "b@x.com".into() })
            .unwrap();
        let after = post_to(&eng, "b@x.com", "Lobby", "after vip").unwrap();
        assert!(after.is_vip);

        // Re-reading history shows the original stamp, not the live flag.
        let history = eng.room_history("b@x.com", "Lobby").unwrap();
        let old = history.iter().find(|m| m.id == before.id).unwrap();
        assert!(!old.is_vip);
    }

    #[test]
    fn announcement_downgraded_for_non_admins() {
        let eng = engine();
        eng.register("admin@x.com", "root", "password1").unwrap();
        eng.register("b@x.com", "bob", "password2").unwrap();

        let requested = eng
            .post(NewPost {
                sender_email: "b@x.com".into(),
                room: "Lobby".into(),
                recipient_email: None,
                text: "IMPORTANT".into(),
                image_url: None,
                announcement: true,
                client_key: None,
            })
            .unwrap();
        assert!(!requested.is_announcement);

        let admin_msg = eng
            .post(NewPost {
                sender_email: "admin@x.com".into(),
                room: "Lobby".into(),
                recipient_email: None,
                text: "maintenance at noon".into(),
                image_url: None,
                announcement: true,
                client_key: None,
            })
            .unwrap();
        assert!(admin_msg.is_announcement);
    }

    #[test]
    fn dm_visible_only_to_sender_and_recipient() {
        let eng = engine();
        eng.register("a@x.com", "alice", "password1").unwrap();
        eng.register("b@x.com", "bob", "password2").unwrap();
        eng.register("c@x.com", "carol", "password3").unwrap();

        eng.post(NewPost {
            sender_email: "a@x.com".into(),
            room: DM_ROOM.into(),
            recipient_email: Some("b@x.com".into()),
            text: "psst".into(),
            image_url: None,
            announcement: false,
            client_key: None,
        })
        .unwrap();

        let for_a = eng.room_history("a@x.com", DM_ROOM).unwrap();
        let for_b = eng.room_history("b@x.com", DM_ROOM).unwrap();
        let for_c = eng.room_history("c@x.com", DM_ROOM).unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_b.len(), 1);
        assert!(for_c.is_empty());

        for m in for_a.iter().chain(for_b.iter()) {
            assert!(m.visible_to("a@x.com"));
            assert!(m.visible_to("b@x.com"));
            assert!(!m.visible_to("c@x.com"));
        }
    }

    #[test]
    fn dm_requires_existing_recipient() {
        let eng = engine();
        eng.register("a@x.com", "alice", "password1").unwrap();

        let no_recipient = eng.post(NewPost {
            sender_email: "a@x.com".into(),
            room: DM_ROOM.into(),
            recipient_email: None,
            text: "psst".into(),
            image_url: None,
            announcement: false,
            client_key: None,
        });
        assert!(matches!(no_recipient, Err(EngineError::NotFound("recipient"))));

        let ghost = eng.post(NewPost {
            sender_email: "a@x.com".into(),
            room: DM_ROOM.into(),
            recipient_email: Some("ghost@x.com".into()),
            text: "psst".into(),
            image_url: None,
            announcement: false,
            client_key: None,
        });
        assert!(matches!(ghost, Err(EngineError::NotFound("recipient"))));
    }

    #[test]
    fn empty_posts_rejected_unless_policy_allows() {
        let eng = engine();
        eng.register("a@x.com", "alice", "password1").unwrap();

        assert!(matches!(
            post_to(&eng, "a@x.com", "Lobby", "   "),
            Err(EngineError::EmptyMessage)
        ));
        // Text that sanitizes away is empty too.
        assert!(matches!(
            post_to(&eng, "a@x.com", "Lobby", "<b></b>"),
            Err(EngineError::EmptyMessage)
        ));

        // Image-only posts are fine.
        let with_image = eng
            .post(NewPost {
                sender_email: "a@x.com".into(),
                room: "Lobby".into(),
                recipient_email: None,
                text: String::new(),
                image_url: Some("uploads/cat.png".into()),
                announcement: false,
                client_key: None,
            })
            .unwrap();
        assert_eq!(with_image.image_url.as_deref(), Some("uploads/cat.png"));

        let lax = engine_with(Policy {
            allow_empty: true,
            ..Policy::default()
        });
        lax.register("a@x.com", "alice", "password1").unwrap();
        assert!(post_to(&lax, "a@x.com", "Lobby", "").is_ok());
    }

    #[test]
    fn replayed_client_key_returns_original() {
        let eng = engine();
        eng.register("a@x.com", "alice", "password1").unwrap();

        let send = |text: &str| {
            eng.post(NewPost {
                sender_email: "a@x.com".into(),
                room: "Lobby".into(),
                recipient_email: None,
                text: text.into(),
                image_url: None,
                announcement: false,
                client_key: Some("req-42".into()),
            })
            .unwrap()
        };

        let first = send("hello");
        let replay = send("hello");
        assert_eq!(first.id, replay.id);

        let history = eng.room_history("a@x.com", "Lobby").unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn history_caps_to_newest_page_oldest_first() {
        let eng = engine_with(Policy {
            page_size: 2,
            ..Policy::default()
        });
        eng.register("a@x.com", "alice", "password1").unwrap();

        post_to(&eng, "a@x.com", "Lobby", "one").unwrap();
        post_to(&eng, "a@x.com", "Lobby", "two").unwrap();
        post_to(&eng, "a@x.com", "Lobby", "three").unwrap();

        let history = eng.room_history("a@x.com", "Lobby").unwrap();
        let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["two", "three"]);
    }

    #[test]
    fn moderation_requires_live_admin_flag() {
        let eng = engine();
        eng.register("admin@x.com", "root", "password1").unwrap();
        eng.register("b@x.com", "bob", "password2").unwrap();

        assert!(matches!(
            eng.moderate("b@x.com", ModAction::Mute { target: "admin@x.com".into() }),
            Err(EngineError::Unauthorized)
        ));
        assert!(matches!(
            eng.moderate("ghost@x.com", ModAction::Mute { target: "b@x.com".into() }),
            Err(EngineError::Unauthorized)
        ));
        assert!(matches!(
            eng.list_users("b@x.com"),
            Err(EngineError::Unauthorized)
        ));
    }

    #[test]
    fn moderating_unknown_target_is_not_found() {
        let eng = engine();
        eng.register("admin@x.com", "root", "password1").unwrap();

        assert!(matches!(
            eng.moderate("admin@x.com", ModAction::Mute { target: "ghost@x.com".into() }),
            Err(EngineError::NotFound("user"))
        ));
        assert!(matches!(
            eng.moderate("admin@x.com", ModAction::Ban { target: "ghost@x.com".into() }),
            Err(EngineError::NotFound("user"))
        ));
    }

    #[test]
    fn delete_message_twice_succeeds() {
        let eng = engine();
        eng.register("admin@x.com", "root", "password1").unwrap();
        let msg = post_to(&eng, "admin@x.com", "Lobby", "oops").unwrap();

        eng.moderate("admin@x.com", ModAction::DeleteMessage { id: msg.id })
            .unwrap();
        // Second delete of the same id: still success, not NotFound.
        eng.moderate("admin@x.com", ModAction::DeleteMessage { id: msg.id })
            .unwrap();

        assert!(eng.room_history("admin@x.com", "Lobby").unwrap().is_empty());
    }

    #[test]
    fn repeated_ban_is_a_noop() {
        let eng = engine();
        eng.register("admin@x.com", "root", "password1").unwrap();
        eng.register("b@x.com", "bob", "password2").unwrap();

        eng.moderate("admin@x.com", ModAction::Ban { target: "b@x.com".into() })
            .unwrap();
        eng.moderate("admin@x.com", ModAction::Ban { target: "b@x.com".into() })
            .unwrap();
    }

    #[test]
    fn ban_flag_mode_retains_user_and_history() {
        let eng = engine();
        eng.register("admin@x.com", "root", "password1").unwrap();
        eng.register("b@x.com", "bob", "password2").unwrap();
        post_to(&eng, "b@x.com", "Lobby", "still here").unwrap();

        eng.moderate("admin@x.com", ModAction::Ban { target: "b@x.com".into() })
            .unwrap();

        let users = eng.list_users("admin@x.com").unwrap();
        let bob = users.iter().find(|u| u.email == "b@x.com").unwrap();
        assert!(bob.is_banned);
        assert_eq!(eng.room_history("admin@x.com", "Lobby").unwrap().len(), 1);
    }

    #[test]
    fn ban_delete_mode_removes_user_and_messages() {
        let eng = engine_with(Policy {
            ban_mode: BanMode::Delete,
            ..Policy::default()
        });
        eng.register("admin@x.com", "root", "password1").unwrap();
        eng.register("b@x.com", "bob", "password2").unwrap();
        post_to(&eng, "b@x.com", "Lobby", "soon gone").unwrap();

        eng.moderate("admin@x.com", ModAction::Ban { target: "b@x.com".into() })
            .unwrap();

        assert!(matches!(
            eng.login("b@x.com", "password2"),
            Err(EngineError::InvalidCredentials)
        ));
        assert!(eng.room_history("admin@x.com", "Lobby").unwrap().is_empty());

        // Banning the already-deleted target again is still a success.
        eng.moderate("admin@x.com", ModAction::Ban { target: "b@x.com".into() })
            .unwrap();
    }

    #[test]
    fn clear_room_honors_configured_scope() {
        let eng = engine();
        eng.register("admin@x.com", "root", "password1").unwrap();
        post_to(&eng, "admin@x.com", "Lobby", "a").unwrap();
        post_to(&eng, "admin@x.com", "Arcade", "b").unwrap();

        // Default scope: only the named room goes.
        eng.moderate("admin@x.com", ModAction::ClearRoom { room: Some("Lobby".into()) })
            .unwrap();
        assert!(eng.room_history("admin@x.com", "Lobby").unwrap().is_empty());
        assert_eq!(eng.room_history("admin@x.com", "Arcade").unwrap().len(), 1);

        // Room scope with no room named is a caller error.
        assert!(matches!(
            eng.moderate("admin@x.com", ModAction::ClearRoom { room: None }),
            Err(EngineError::EmptyField("room"))
        ));

        let global = engine_with(Policy {
            clear_scope: ClearScope::Global,
            ..Policy::default()
        });
        global.register("admin@x.com", "root", "password1").unwrap();
        post_to(&global, "admin@x.com", "Lobby", "a").unwrap();
        post_to(&global, "admin@x.com", "Arcade", "b").unwrap();

        global
            .moderate("admin@x.com", ModAction::ClearRoom { room: Some("Lobby".into()) })
            .unwrap();
        assert!(global.room_history("admin@x.com", "Lobby").unwrap().is_empty());
        assert!(global.room_history("admin@x.com", "Arcade").unwrap().is_empty());
    }

    #[test]
    fn profile_update_touches_only_given_fields() {
        let eng = engine();
        eng.register("a@x.com", "alice", "password1").unwrap();

        let user = eng
            .update_profile(
                "a@x.com",
                ProfileUpdate {
                    bio: Some("rustacean".into()),
                    ..ProfileUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(user.bio, "rustacean");
        assert_eq!(user.status, "");

        let user = eng
            .update_profile(
                "a@x.com",
                ProfileUpdate {
                    status: Some("away".into()),
                    avatar: Some(":)".into()),
                    ..ProfileUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(user.bio, "rustacean");
        assert_eq!(user.status, "away");
        assert_eq!(user.avatar, ":)");
    }

    #[test]
    fn upgrade_request_records_ticket_and_announces() {
        let eng = engine();
        eng.register("a@x.com", "alice", "password1").unwrap();

        let ticket = eng.request_upgrade("a@x.com", "VIP").unwrap();
        assert_eq!(ticket.status, "Pending");
        assert_eq!(ticket.requested_tier, "VIP");
        assert_eq!(ticket.username, "alice");

        let history = eng.room_history("a@x.com", DEFAULT_ROOM).unwrap();
        assert!(
            history
                .iter()
                .any(|m| m.is_announcement && m.text.contains("upgrade to VIP"))
        );
    }
}
