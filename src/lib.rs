// Library crate for the trivia relay server
// This file exposes the public API for the binary and integration tests

pub mod config;
pub mod connection;
pub mod relay;
pub mod room;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::RelayConfig;
pub use connection::{ConnectionRegistry, InMemoryConnectionRegistry};
pub use relay::{RelayEngine, RelayError};
pub use room::{InMemoryRoomRepository, Room, RoomRepository};
pub use shared::{AppError, AppState};
pub use websockets::{
    ClientEvent, ConnectionManager, InMemoryConnectionManager, MessageHandler, ServerEvent,
};
