// Public API - what other modules can use
pub use models::{Player, Room};
pub use repository::{InMemoryRoomRepository, RoomRepository, RoomStoreError};

// Internal modules
pub mod models;
pub mod repository;
