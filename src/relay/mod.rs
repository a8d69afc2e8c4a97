// Relay engine: interprets client events against the room store and the
// connection registry, and decides who hears about them.

// Public API - what other modules can use
pub use cleanup_task::{start_cleanup_task, CleanupConfig};
pub use engine::RelayEngine;
pub use error::RelayError;

// Internal modules
mod cleanup_task;
mod engine;
mod error;
mod guards;
