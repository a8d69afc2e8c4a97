use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::room::Player;

/// Events sent by clients, framed as `{"event": "...", "data": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum_macros::IntoStaticStr)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ClientEvent {
    /// Payload is the bare game code
    CreateGame(String),
    JoinGame(JoinGamePayload),
    JoinAsSecondaryHost(SecondaryHostPayload),
    /// Payload is the host's opaque game state
    SyncState(Value),
    HostAction(HostActionPayload),
    BuzzIn,
    PlayerClickedTile(TileClickPayload),
}

/// Events sent to clients, framed the same way as `ClientEvent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum_macros::IntoStaticStr)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ServerEvent {
    GameCodeExists,
    GameCreated(RoleAssignedPayload),
    GameNotFound,
    GameJoined(GameJoinedPayload),
    PlayersUpdated(PlayersUpdatedPayload),
    SecondaryHostJoined(RoleAssignedPayload),
    SyncGameState(Value),
    GameAction(HostActionPayload),
    PlayerBuzzed(PlayerBuzzedPayload),
    PlayerClickedTile(TileClickPayload),
    HostDisconnected,
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGamePayload {
    pub game_code: String,
    #[serde(default)]
    pub player_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryHostPayload {
    pub game_code: String,
}

/// Relayed as-is in both directions. `None` means the field was absent,
/// `Some(Value::Null)` that it was an explicit null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostActionPayload {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub action_type: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub params: Option<Value>,
}

/// Relayed as-is in both directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileClickPayload {
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub tile_id: Option<Value>,
}

/// A field that is present, even as `null`, is kept
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignedPayload {
    pub game_code: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameJoinedPayload {
    pub game_code: String,
    pub role: String,
    pub player_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayersUpdatedPayload {
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBuzzedPayload {
    pub player_name: String,
}

impl ClientEvent {
    /// Parse a raw text frame
    pub fn from_frame(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }

    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Helper functions for creating messages
impl ServerEvent {
    pub fn game_created(game_code: &str) -> Self {
        Self::GameCreated(RoleAssignedPayload {
            game_code: game_code.to_string(),
            role: "host".to_string(),
        })
    }

    pub fn secondary_host_joined(game_code: &str) -> Self {
        Self::SecondaryHostJoined(RoleAssignedPayload {
            game_code: game_code.to_string(),
            role: "secondaryHost".to_string(),
        })
    }

    pub fn game_joined(game_code: &str, player: &Player) -> Self {
        Self::GameJoined(GameJoinedPayload {
            game_code: game_code.to_string(),
            role: player.role.clone(),
            player_name: player.name.clone(),
        })
    }

    pub fn players_updated(players: Vec<Player>) -> Self {
        Self::PlayersUpdated(PlayersUpdatedPayload { players })
    }

    pub fn player_buzzed(player_name: &str) -> Self {
        Self::PlayerBuzzed(PlayerBuzzedPayload {
            player_name: player_name.to_string(),
        })
    }

    /// Serialize into a text frame
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}
