use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Back-reference from a live connection to the room it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionBinding {
    pub room_code: String,
    /// Set by joinGame; kept while the connection stays in the same room
    pub player_name: Option<String>,
}

/// Tracks which room (if any) each live connection is bound to
///
/// Pure bookkeeping: no validation happens here. A connection without a
/// binding is inert as far as the relay is concerned.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Binds the connection to a room, returning whatever binding it replaced.
    /// Rebinding to the same room keeps the display name.
    async fn bind(&self, connection_id: &str, room_code: &str) -> Option<ConnectionBinding>;

    /// Stores a display name on an already bound connection
    async fn bind_player_name(&self, connection_id: &str, name: &str);

    async fn lookup(&self, connection_id: &str) -> Option<ConnectionBinding>;

    async fn lookup_room(&self, connection_id: &str) -> Option<String>;

    async fn lookup_name(&self, connection_id: &str) -> Option<String>;

    async fn unbind(&self, connection_id: &str) -> Option<ConnectionBinding>;

    /// Every connection currently bound to the room, in no particular order
    async fn connections_in_room(&self, room_code: &str) -> Vec<String>;

    /// Unbinds every connection of a room, returning their ids
    async fn unbind_room(&self, room_code: &str) -> Vec<String>;
}

pub struct InMemoryConnectionRegistry {
    bindings: Arc<RwLock<HashMap<String, ConnectionBinding>>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self {
            bindings: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn bind(&self, connection_id: &str, room_code: &str) -> Option<ConnectionBinding> {
        debug!(
            connection_id = %connection_id,
            game_code = %room_code,
            "Binding connection to room"
        );

        let mut bindings = self.bindings.write().await;
        let player_name = bindings
            .get(connection_id)
            .filter(|previous| previous.room_code == room_code)
            .and_then(|previous| previous.player_name.clone());

        bindings.insert(
            connection_id.to_string(),
            ConnectionBinding {
                room_code: room_code.to_string(),
                player_name,
            },
        )
    }

    async fn bind_player_name(&self, connection_id: &str, name: &str) {
        let mut bindings = self.bindings.write().await;
        if let Some(binding) = bindings.get_mut(connection_id) {
            binding.player_name = Some(name.to_string());
        }
    }

    async fn lookup(&self, connection_id: &str) -> Option<ConnectionBinding> {
        self.bindings.read().await.get(connection_id).cloned()
    }

    async fn lookup_room(&self, connection_id: &str) -> Option<String> {
        self.bindings
            .read()
            .await
            .get(connection_id)
            .map(|b| b.room_code.clone())
    }

    async fn lookup_name(&self, connection_id: &str) -> Option<String> {
        self.bindings
            .read()
            .await
            .get(connection_id)
            .and_then(|b| b.player_name.clone())
    }

    async fn unbind(&self, connection_id: &str) -> Option<ConnectionBinding> {
        self.bindings.write().await.remove(connection_id)
    }

    async fn connections_in_room(&self, room_code: &str) -> Vec<String> {
        self.bindings
            .read()
            .await
            .iter()
            .filter(|(_, binding)| binding.room_code == room_code)
            .map(|(connection_id, _)| connection_id.clone())
            .collect()
    }

    async fn unbind_room(&self, room_code: &str) -> Vec<String> {
        let mut bindings = self.bindings.write().await;
        let members: Vec<String> = bindings
            .iter()
            .filter(|(_, binding)| binding.room_code == room_code)
            .map(|(connection_id, _)| connection_id.clone())
            .collect();

        for connection_id in &members {
            bindings.remove(connection_id);
        }

        debug!(game_code = %room_code, unbound = members.len(), "Unbound room members");
        members
    }
}
