use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use pokec_types::events::GatewayEvent;

/// Manages all connected clients and broadcasts events.
///
/// Every connected client receives every broadcast; the per-connection loop
/// filters out events the client's identity may not see (DMs).
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Broadcast channel for gateway events
    broadcast_tx: broadcast::Sender<GatewayEvent>,

    /// Online users: email -> (conn_id, username). The conn_id marks which
    /// connection currently owns the presence entry, so a stale disconnect
    /// after a reconnect does not knock the user offline.
    online_users: RwLock<HashMap<String, (Uuid, String)>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                online_users: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Subscribe to gateway events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event to all connected clients.
    pub fn broadcast(&self, event: GatewayEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    /// Register a user as online. Returns the conn_id owning the entry.
    pub async fn user_online(&self, email: &str, username: &str) -> Uuid {
        let conn_id = Uuid::new_v4();
        self.inner
            .online_users
            .write()
            .await
            .insert(email.to_string(), (conn_id, username.to_string()));

        self.broadcast(GatewayEvent::PresenceUpdate {
            username: username.to_string(),
            online: true,
        });

        conn_id
    }

    /// Register a user as offline. Only cleans up if conn_id still owns the
    /// presence entry — a newer connection may have taken over.
    pub async fn user_offline(&self, email: &str, conn_id: Uuid) {
        let username = {
            let mut users = self.inner.online_users.write().await;
            match users.get(email) {
                Some((owner, _)) if *owner == conn_id => {
                    users.remove(email).map(|(_, name)| name)
                }
                _ => return,
            }
        };

        if let Some(username) = username {
            self.broadcast(GatewayEvent::PresenceUpdate {
                username,
                online: false,
            });
        }
    }

    /// Usernames currently online, for roster replay on connect.
    pub async fn online_users(&self) -> Vec<String> {
        self.inner
            .online_users
            .read()
            .await
            .values()
            .map(|(_, name)| name.clone())
            .collect()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
