use thiserror::Error;

use crate::room::RoomStoreError;
use crate::websockets::messages::ServerEvent;

/// Errors that can occur while relaying a client event
///
/// All of them are local to the originating connection.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Room code already in use: {0}")]
    DuplicateRoomCode(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Unauthorized action: {0}")]
    UnauthorizedAction(String),

    #[error("Connection {0} is not bound to a room")]
    DisassociatedConnection(String),

    #[error("Failed to encode outbound event: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RelayError {
    /// The event, if any, owed to the originating connection
    pub fn reply(&self) -> Option<ServerEvent> {
        match self {
            RelayError::DuplicateRoomCode(_) => Some(ServerEvent::GameCodeExists),
            RelayError::RoomNotFound(_) => Some(ServerEvent::GameNotFound),
            RelayError::UnauthorizedAction(_)
            | RelayError::DisassociatedConnection(_)
            | RelayError::Encode(_) => None,
        }
    }
}

impl From<RoomStoreError> for RelayError {
    fn from(err: RoomStoreError) -> Self {
        match err {
            RoomStoreError::DuplicateCode(code) => RelayError::DuplicateRoomCode(code),
            RoomStoreError::NotFound(code) => RelayError::RoomNotFound(code),
        }
    }
}
