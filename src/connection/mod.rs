// Public API
pub use registry::{ConnectionBinding, ConnectionRegistry, InMemoryConnectionRegistry};

// Internal modules
mod registry;
