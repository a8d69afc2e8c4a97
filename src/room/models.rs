use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// A player seated in a room, serialized as `{id, name, role}` in roster updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,   // Connection id of the player
    pub name: String, // Display name as supplied by the client, not validated
    pub role: String, // "player1", "player2", ...
}

/// In-memory model of a relay room
#[derive(Debug, Clone)]
pub struct Room {
    pub code: String,
    pub host_connection_id: String,
    pub secondary_host_connection_id: Option<String>,
    pub players: Vec<Player>,
    /// Opaque game state, never inspected beyond emptiness
    pub state: Value,
    /// Last player number handed out; departed players keep their numbers
    pub player_counter: u32,
    pub last_activity_at: DateTime<Utc>,
}

impl Room {
    /// Creates an empty room owned by the given host connection
    pub fn new(code: String, host_connection_id: String) -> Self {
        Self {
            code,
            host_connection_id,
            secondary_host_connection_id: None,
            players: vec![],
            state: Value::Object(serde_json::Map::new()),
            player_counter: 0,
            last_activity_at: Utc::now(),
        }
    }

    pub fn is_host(&self, connection_id: &str) -> bool {
        self.host_connection_id == connection_id
    }

    pub fn is_secondary_host(&self, connection_id: &str) -> bool {
        self.secondary_host_connection_id.as_deref() == Some(connection_id)
    }

    /// No room-scoped event handled within the threshold. Thresholds beyond
    /// chrono's range never expire.
    pub fn is_idle_for(&self, threshold: Duration) -> bool {
        match chrono::Duration::from_std(threshold) {
            Ok(threshold) => self.last_activity_at < Utc::now() - threshold,
            Err(_) => false,
        }
    }

    /// True once the host has synced something worth replaying to late joiners
    pub fn has_state(&self) -> bool {
        !is_empty_state(&self.state)
    }

    /// Seats a new player and returns the seat; roles are never reissued
    pub fn add_player(&mut self, connection_id: String, name: String) -> Player {
        self.player_counter += 1;
        let player = Player {
            id: connection_id,
            name,
            role: format!("player{}", self.player_counter),
        };
        self.players.push(player.clone());
        player
    }

    /// Removes every seat held by the connection
    pub fn remove_player(&mut self, connection_id: &str) {
        self.players.retain(|p| p.id != connection_id);
    }
}

/// A state is empty when it has nothing to enumerate: null, `{}`, `[]`, `""`,
/// or a bare number/boolean.
pub fn is_empty_state(state: &Value) -> bool {
    match state {
        Value::Null | Value::Bool(_) | Value::Number(_) => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
