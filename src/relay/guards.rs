use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per room code
///
/// Holding a room's guard for the whole of a handler keeps handlers of the
/// same room from interleaving. Different rooms never contend.
#[derive(Default)]
pub struct RoomGuards {
    guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RoomGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to the room
    pub async fn acquire(&self, room_code: &str) -> OwnedMutexGuard<()> {
        let guard = {
            let mut guards = self.guards.lock().await;
            Arc::clone(guards.entry(room_code.to_string()).or_default())
        };
        guard.lock_owned().await
    }

    /// Forgets the room's mutex if nobody holds or awaits it.
    /// Call after dropping your own guard.
    pub async fn release(&self, room_code: &str) {
        let mut guards = self.guards.lock().await;
        if guards
            .get(room_code)
            .is_some_and(|guard| Arc::strong_count(guard) == 1)
        {
            guards.remove(room_code);
        }
    }

    pub async fn len(&self) -> usize {
        self.guards.lock().await.len()
    }
}
