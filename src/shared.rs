use std::sync::Arc;
use thiserror::Error;

use crate::connection::InMemoryConnectionRegistry;
use crate::relay::RelayEngine;
use crate::room::InMemoryRoomRepository;
use crate::websockets::{ConnectionManager, InMemoryConnectionManager};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RelayEngine>,
    pub connection_manager: Arc<dyn ConnectionManager>,
}

impl AppState {
    pub fn new(engine: Arc<RelayEngine>, connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self {
            engine,
            connection_manager,
        }
    }

    /// Wires the in-memory room store, registry and transport together
    pub fn in_memory() -> Self {
        let connection_manager: Arc<dyn ConnectionManager> =
            Arc::new(InMemoryConnectionManager::new());
        let engine = Arc::new(RelayEngine::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(InMemoryConnectionRegistry::new()),
            Arc::clone(&connection_manager),
        ));

        Self::new(engine, connection_manager)
    }
}

/// Errors that stop the server from starting or serving
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
