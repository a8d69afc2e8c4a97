use serde_json::Value;

use trivia_relay::{
    websockets::messages::{HostActionPayload, JoinGamePayload, SecondaryHostPayload, TileClickPayload},
    ClientEvent, MessageHandler,
};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

#[allow(dead_code)]
impl TestSetup {
    /// Dispatch a client event as if it arrived on the connection
    pub async fn send_event(&self, connection_id: &str, event: ClientEvent) {
        self.engine.handle_event(connection_id, event).await;
    }

    /// Feed a raw text frame through the message handler
    pub async fn send_frame(&self, connection_id: &str, frame: &str) {
        self.engine
            .handle_message(connection_id, frame.to_string())
            .await;
    }

    pub async fn disconnect(&self, connection_id: &str) {
        self.engine.handle_disconnect(connection_id).await;
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn create_game(&self, connection_id: &str, game_code: &str) {
        self.send_event(connection_id, ClientEvent::CreateGame(game_code.to_string()))
            .await;
    }

    pub async fn join_game(&self, connection_id: &str, game_code: &str, player_name: &str) {
        self.send_event(
            connection_id,
            ClientEvent::JoinGame(JoinGamePayload {
                game_code: game_code.to_string(),
                player_name: player_name.to_string(),
            }),
        )
        .await;
    }

    pub async fn join_as_secondary_host(&self, connection_id: &str, game_code: &str) {
        self.send_event(
            connection_id,
            ClientEvent::JoinAsSecondaryHost(SecondaryHostPayload {
                game_code: game_code.to_string(),
            }),
        )
        .await;
    }

    pub async fn sync_state(&self, connection_id: &str, state: Value) {
        self.send_event(connection_id, ClientEvent::SyncState(state))
            .await;
    }

    pub async fn host_action(&self, connection_id: &str, action_type: &str, params: Value) {
        self.send_event(
            connection_id,
            ClientEvent::HostAction(HostActionPayload {
                action_type: Some(Value::String(action_type.to_string())),
                params: Some(params),
            }),
        )
        .await;
    }

    pub async fn buzz_in(&self, connection_id: &str) {
        self.send_event(connection_id, ClientEvent::BuzzIn).await;
    }

    pub async fn click_tile(&self, connection_id: &str, tile_id: &str) {
        self.send_event(
            connection_id,
            ClientEvent::PlayerClickedTile(TileClickPayload {
                tile_id: Some(Value::String(tile_id.to_string())),
            }),
        )
        .await;
    }
}
