use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify, RwLock};

use trivia_relay::ConnectionManager;

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Records every frame sent to each connection instead of writing to a socket
#[derive(Clone)]
pub struct MockConnectionManager {
    sent_messages: Arc<RwLock<HashMap<String, VecDeque<String>>>>,
    connected: Arc<RwLock<HashSet<String>>>,
    liveness_gate: Arc<RwLock<Option<LivenessGate>>>,
}

/// Holds the next liveness check of one connection until released
#[derive(Clone)]
pub struct LivenessGate {
    connection_id: String,
    pub reached: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[allow(dead_code)]
impl MockConnectionManager {
    pub fn new() -> Self {
        Self {
            sent_messages: Arc::new(RwLock::new(HashMap::new())),
            connected: Arc::new(RwLock::new(HashSet::new())),
            liveness_gate: Arc::new(RwLock::new(None)),
        }
    }

    /// The next `is_connected(connection_id)` signals `reached` and waits for
    /// `release` before answering
    pub async fn gate_liveness_check(&self, connection_id: &str) -> LivenessGate {
        let gate = LivenessGate {
            connection_id: connection_id.to_string(),
            reached: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        *self.liveness_gate.write().await = Some(gate.clone());
        gate
    }

    pub async fn connect(&self, connection_id: &str) {
        self.connected
            .write()
            .await
            .insert(connection_id.to_string());
    }

    pub async fn get_messages_for(&self, connection_id: &str) -> Vec<String> {
        self.sent_messages
            .read()
            .await
            .get(connection_id)
            .map(|frames| frames.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Pops the oldest frame sent to the connection
    pub async fn consume_message_for(&self, connection_id: &str) -> Option<String> {
        self.sent_messages
            .write()
            .await
            .get_mut(connection_id)
            .and_then(|frames| frames.pop_front())
    }

    pub async fn clear_messages(&self) {
        self.sent_messages.write().await.clear();
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(&self, connection_id: String, _sender: mpsc::UnboundedSender<String>) {
        self.connect(&connection_id).await;
    }

    async fn remove_connection(&self, connection_id: &str) {
        self.connected.write().await.remove(connection_id);
    }

    async fn send_to_connection(&self, connection_id: &str, message: &str) {
        self.sent_messages
            .write()
            .await
            .entry(connection_id.to_string())
            .or_default()
            .push_back(message.to_string());
    }

    async fn send_to_connections(&self, connection_ids: &[String], message: &str) {
        for connection_id in connection_ids {
            self.send_to_connection(connection_id, message).await;
        }
    }

    async fn is_connected(&self, connection_id: &str) -> bool {
        let gate = {
            let mut gate = self.liveness_gate.write().await;
            if gate
                .as_ref()
                .is_some_and(|g| g.connection_id == connection_id)
            {
                gate.take()
            } else {
                None
            }
        };
        if let Some(gate) = gate {
            gate.reached.notify_one();
            gate.release.notified().await;
        }

        self.connected.read().await.contains(connection_id)
    }
}
