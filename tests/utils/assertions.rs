//! Test assertion helpers - fluent API for verifying relayed events
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::Value;

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct EventAssertion<'a> {
    setup: &'a TestSetup,
    connections: Vec<&'a str>,
}

impl<'a> EventAssertion<'a> {
    /// Create an assertion for all players in the setup
    pub fn for_all_players(setup: &'a TestSetup) -> Self {
        let connections = setup.players.iter().map(|s| s.as_str()).collect();
        Self { setup, connections }
    }

    /// Create an assertion for specific connections
    pub fn for_connections(setup: &'a TestSetup, connections: Vec<&'a str>) -> Self {
        Self { setup, connections }
    }

    /// Assert that every connection's next frame is the given event (consumes it)
    pub async fn received_event(self, expected_event: &str) -> EventContent {
        let mut frames: Vec<Value> = vec![];

        for connection in &self.connections {
            let frame = self
                .setup
                .mock_conn_manager
                .consume_message_for(connection)
                .await
                .unwrap_or_else(|| panic!("{} should have received {}", connection, expected_event));

            let frame: Value = serde_json::from_str(&frame).unwrap();
            assert_eq!(
                frame["event"], expected_event,
                "{} received wrong event",
                connection
            );
            frames.push(frame);
        }

        // A broadcast carries the same payload to everyone
        for (i, frame) in frames.iter().enumerate().skip(1) {
            assert_eq!(
                frame.get("data"),
                frames[0].get("data"),
                "{} payload differs from {}",
                self.connections[i],
                self.connections[0]
            );
        }

        EventContent {
            data: frames[0].get("data").cloned(),
        }
    }

    /// Assert that connections have no pending frames
    pub async fn received_nothing(self) {
        for connection in &self.connections {
            let frames = self
                .setup
                .mock_conn_manager
                .get_messages_for(connection)
                .await;
            assert!(
                frames.is_empty(),
                "{} should not have received anything, got {:?}",
                connection,
                frames
            );
        }
    }

    /// Assert the exact sequence of event names pending for each connection
    pub async fn received_sequence(self, expected_events: Vec<&str>) {
        for connection in &self.connections {
            let frames = self
                .setup
                .mock_conn_manager
                .get_messages_for(connection)
                .await;
            let events: Vec<String> = frames
                .iter()
                .map(|frame| {
                    let value: Value = serde_json::from_str(frame).unwrap();
                    value["event"].as_str().unwrap_or_default().to_string()
                })
                .collect();
            assert_eq!(events, expected_events, "{} got the wrong sequence", connection);
        }
    }
}

// ============================================================================
// Event Content Assertions
// ============================================================================

pub struct EventContent {
    data: Option<Value>,
}

impl EventContent {
    /// The raw `data` of the event (None if the event had no payload)
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Assert a top-level field of the payload
    pub fn with_field(self, key: &str, expected: Value) -> Self {
        let data = self.data.as_ref().expect("event has no payload");
        assert_eq!(data[key], expected, "unexpected value for {}", key);
        self
    }

    /// Assert the payload equals the given value
    pub fn with_data(self, expected: Value) -> Self {
        assert_eq!(self.data.as_ref(), Some(&expected));
        self
    }

    /// Assert the roster of a playersUpdated event as (id, name, role) triples
    pub fn with_players(self, expected: Vec<(&str, &str, &str)>) -> Self {
        let data = self.data.as_ref().expect("event has no payload");
        let actual: Vec<(String, String, String)> = data["players"]
            .as_array()
            .expect("players should be an array")
            .iter()
            .map(|p| {
                (
                    p["id"].as_str().unwrap_or_default().to_string(),
                    p["name"].as_str().unwrap_or_default().to_string(),
                    p["role"].as_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let expected: Vec<(String, String, String)> = expected
            .into_iter()
            .map(|(id, name, role)| (id.to_string(), name.to_string(), role.to_string()))
            .collect();
        assert_eq!(actual, expected);
        self
    }
}
