use std::sync::Arc;

use trivia_relay::{InMemoryConnectionRegistry, InMemoryRoomRepository, RelayEngine};

use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const ROOM_CODE: &str = "ABCD";
pub const HOST: &str = "host";

pub struct TestSetup {
    pub engine: Arc<RelayEngine>,
    pub rooms: Arc<InMemoryRoomRepository>,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    /// Player connection ids, in join order
    pub players: Vec<String>,
}

pub struct TestSetupBuilder {
    create_room: bool,
    players: Vec<(String, String)>, // (connection id, display name)
    secondary_host: Option<String>,
}

#[allow(dead_code)]
impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            create_room: false,
            players: vec![],
            secondary_host: None,
        }
    }

    /// Has `host` create room `ABCD`
    pub fn with_room(mut self) -> Self {
        self.create_room = true;
        self
    }

    pub fn with_players(mut self, players: Vec<(&str, &str)>) -> Self {
        self.create_room = true;
        self.players = players
            .into_iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        self
    }

    pub fn with_two_players(self) -> Self {
        self.with_players(vec![("alice", "Alice"), ("bob", "Bob")])
    }

    pub fn with_secondary_host(mut self, connection_id: &str) -> Self {
        self.create_room = true;
        self.secondary_host = Some(connection_id.to_string());
        self
    }

    /// Builds the engine, replays the room setup and clears recorded frames
    pub async fn build(self) -> TestSetup {
        let rooms = Arc::new(InMemoryRoomRepository::new());
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let engine = Arc::new(RelayEngine::new(
            rooms.clone(),
            Arc::new(InMemoryConnectionRegistry::new()),
            mock_conn_manager.clone(),
        ));

        let setup = TestSetup {
            engine,
            rooms,
            mock_conn_manager,
            players: self.players.iter().map(|(id, _)| id.clone()).collect(),
        };

        setup.mock_conn_manager.connect(HOST).await;
        if self.create_room {
            setup.create_game(HOST, ROOM_CODE).await;
        }
        for (id, name) in &self.players {
            setup.mock_conn_manager.connect(id).await;
            setup.join_game(id, ROOM_CODE, name).await;
        }
        if let Some(id) = &self.secondary_host {
            setup.mock_conn_manager.connect(id).await;
            setup.join_as_secondary_host(id, ROOM_CODE).await;
        }

        setup.clear_messages().await;
        setup
    }
}
