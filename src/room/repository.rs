use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::models::{Player, Room};

/// Errors raised by room store operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RoomStoreError {
    #[error("Room code already in use: {0}")]
    DuplicateCode(String),

    #[error("Room not found: {0}")]
    NotFound(String),
}

/// Trait for room store operations
///
/// Each call is atomic on its own. Callers that need several calls to appear
/// as one step hold the room's guard (see `relay::guards`).
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn create_room(&self, code: &str, host_connection_id: &str)
        -> Result<Room, RoomStoreError>;
    async fn get_room(&self, code: &str) -> Result<Room, RoomStoreError>;

    /// Removes the room if present, returning it
    async fn delete_room(&self, code: &str) -> Option<Room>;

    async fn add_player(
        &self,
        code: &str,
        connection_id: &str,
        display_name: &str,
    ) -> Result<Player, RoomStoreError>;

    /// Drops the connection from the roster and returns the remaining players
    async fn remove_player(
        &self,
        code: &str,
        connection_id: &str,
    ) -> Result<Vec<Player>, RoomStoreError>;

    async fn set_secondary_host(&self, code: &str, connection_id: &str)
        -> Result<(), RoomStoreError>;

    /// Clears the secondary host slot if it is held by the given connection
    async fn clear_secondary_host(
        &self,
        code: &str,
        connection_id: &str,
    ) -> Result<(), RoomStoreError>;

    /// Replaces the state wholesale
    async fn set_state(&self, code: &str, state: Value) -> Result<(), RoomStoreError>;

    async fn list_rooms(&self) -> Vec<Room>;

    /// Records activity in a room by bumping its last_activity_at timestamp
    async fn update_last_activity(&self, code: &str) -> Result<(), RoomStoreError>;

    /// Codes of rooms with no activity within the threshold
    async fn get_inactive_rooms(&self, inactivity_threshold: Duration) -> Vec<String>;
}

/// In-memory implementation of RoomRepository
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<String, Room>>,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    async fn with_room<T>(
        &self,
        code: &str,
        f: impl FnOnce(&mut Room) -> T + Send,
    ) -> Result<T, RoomStoreError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(code)
            .ok_or_else(|| RoomStoreError::NotFound(code.to_string()))?;
        Ok(f(room))
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self))]
    async fn create_room(
        &self,
        code: &str,
        host_connection_id: &str,
    ) -> Result<Room, RoomStoreError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(code) {
            warn!(game_code = %code, "Room code already in use");
            return Err(RoomStoreError::DuplicateCode(code.to_string()));
        }

        let room = Room::new(code.to_string(), host_connection_id.to_string());
        rooms.insert(code.to_string(), room.clone());

        debug!(game_code = %code, "Room created in memory");
        Ok(room)
    }

    async fn get_room(&self, code: &str) -> Result<Room, RoomStoreError> {
        let rooms = self.rooms.read().await;
        rooms
            .get(code)
            .cloned()
            .ok_or_else(|| RoomStoreError::NotFound(code.to_string()))
    }

    #[instrument(skip(self))]
    async fn delete_room(&self, code: &str) -> Option<Room> {
        let removed = self.rooms.write().await.remove(code);
        match &removed {
            Some(_) => info!(game_code = %code, "Room deleted"),
            None => debug!(game_code = %code, "Room already gone"),
        }
        removed
    }

    #[instrument(skip(self))]
    async fn add_player(
        &self,
        code: &str,
        connection_id: &str,
        display_name: &str,
    ) -> Result<Player, RoomStoreError> {
        let player = self
            .with_room(code, |room| {
                room.add_player(connection_id.to_string(), display_name.to_string())
            })
            .await?;

        debug!(game_code = %code, role = %player.role, "Player seated");
        Ok(player)
    }

    #[instrument(skip(self))]
    async fn remove_player(
        &self,
        code: &str,
        connection_id: &str,
    ) -> Result<Vec<Player>, RoomStoreError> {
        self.with_room(code, |room| {
            room.remove_player(connection_id);
            room.players.clone()
        })
        .await
    }

    async fn set_secondary_host(
        &self,
        code: &str,
        connection_id: &str,
    ) -> Result<(), RoomStoreError> {
        self.with_room(code, |room| {
            room.secondary_host_connection_id = Some(connection_id.to_string());
        })
        .await
    }

    async fn clear_secondary_host(
        &self,
        code: &str,
        connection_id: &str,
    ) -> Result<(), RoomStoreError> {
        self.with_room(code, |room| {
            if room.is_secondary_host(connection_id) {
                room.secondary_host_connection_id = None;
            }
        })
        .await
    }

    async fn set_state(&self, code: &str, state: Value) -> Result<(), RoomStoreError> {
        self.with_room(code, |room| room.state = state).await
    }

    async fn list_rooms(&self) -> Vec<Room> {
        self.rooms.read().await.values().cloned().collect()
    }

    async fn update_last_activity(&self, code: &str) -> Result<(), RoomStoreError> {
        self.with_room(code, |room| room.last_activity_at = Utc::now())
            .await
    }

    async fn get_inactive_rooms(&self, inactivity_threshold: Duration) -> Vec<String> {
        let rooms = self.rooms.read().await;
        rooms
            .values()
            .filter(|room| room.is_idle_for(inactivity_threshold))
            .map(|room| room.code.clone())
            .collect()
    }
}
