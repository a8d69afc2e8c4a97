use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument, warn};

use super::error::RelayError;
use super::guards::RoomGuards;
use crate::connection::{ConnectionBinding, ConnectionRegistry};
use crate::room::{Room, RoomRepository};
use crate::websockets::connection_manager::ConnectionManager;
use crate::websockets::messages::{
    ClientEvent, HostActionPayload, JoinGamePayload, SecondaryHostPayload, ServerEvent,
    TileClickPayload,
};
use crate::websockets::MessageHandler;

/// Routes client events between the connections of a room
///
/// The engine never looks inside game payloads. The only access control is
/// the identity check on host-only events.
pub struct RelayEngine {
    rooms: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    connections: Arc<dyn ConnectionManager>,
    guards: RoomGuards,
}

/// A room-scoped event's view of its room, valid while the guard is held
struct BoundRoom {
    binding: ConnectionBinding,
    room: Room,
    _guard: OwnedMutexGuard<()>,
}

impl RelayEngine {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        connections: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            rooms,
            registry,
            connections,
            guards: RoomGuards::new(),
        }
    }

    /// Dispatch one inbound event. Failures are reported to the caller at most
    /// once and never escape.
    pub async fn handle_event(&self, connection_id: &str, event: ClientEvent) {
        let event_name = event.name();
        debug!(connection_id = %connection_id, event = event_name, "Dispatching event");

        let result = match event {
            ClientEvent::CreateGame(game_code) => self.create_game(connection_id, &game_code).await,
            ClientEvent::JoinGame(payload) => self.join_game(connection_id, payload).await,
            ClientEvent::JoinAsSecondaryHost(payload) => {
                self.join_as_secondary_host(connection_id, payload).await
            }
            ClientEvent::SyncState(state) => self.sync_state(connection_id, state).await,
            ClientEvent::HostAction(payload) => self.host_action(connection_id, payload).await,
            ClientEvent::BuzzIn => self.buzz_in(connection_id).await,
            ClientEvent::PlayerClickedTile(payload) => {
                self.player_clicked_tile(connection_id, payload).await
            }
        };

        if let Err(err) = result {
            self.reject(connection_id, event_name, err).await;
        }
    }

    /// Reconcile a connection whose transport went away
    #[instrument(skip(self))]
    pub async fn handle_disconnect(&self, connection_id: &str) {
        self.connections.remove_connection(connection_id).await;

        match self.registry.unbind(connection_id).await {
            Some(binding) => {
                info!(
                    connection_id = %connection_id,
                    game_code = %binding.room_code,
                    "Connection left its room"
                );
                self.reconcile_departure(connection_id, &binding.room_code)
                    .await;
            }
            None => debug!(connection_id = %connection_id, "Unbound connection disconnected"),
        }
    }

    /// Close rooms that have gone quiet or whose host transport is gone.
    /// Returns how many rooms were closed.
    #[instrument(skip(self))]
    pub async fn reclaim_rooms(&self, inactivity_threshold: Duration) -> usize {
        let idle = self.rooms.get_inactive_rooms(inactivity_threshold).await;

        // (game code, host seen at selection time)
        let mut candidates: Vec<(String, String)> = vec![];
        for room in self.rooms.list_rooms().await {
            if idle.contains(&room.code)
                || !self.connections.is_connected(&room.host_connection_id).await
            {
                candidates.push((room.code, room.host_connection_id));
            }
        }

        let mut reclaimed = 0;
        for (game_code, host_connection_id) in candidates {
            let guard = self.guards.acquire(&game_code).await;
            match self.rooms.get_room(&game_code).await {
                // Same code may now belong to a new host
                Ok(room) if room.is_host(&host_connection_id) => {
                    if self.is_abandoned(&room, inactivity_threshold).await {
                        self.close_room(&room).await;
                        reclaimed += 1;
                        info!(game_code = %game_code, "Reclaimed abandoned room");
                    } else {
                        debug!(game_code = %game_code, "Room active again, kept");
                    }
                }
                Ok(_) => debug!(game_code = %game_code, "Room recreated by another host, kept"),
                Err(_) => debug!(game_code = %game_code, "Room closed before reclamation"),
            }
            drop(guard);
            self.guards.release(&game_code).await;
        }

        reclaimed
    }

    async fn is_abandoned(&self, room: &Room, inactivity_threshold: Duration) -> bool {
        room.is_idle_for(inactivity_threshold)
            || !self.connections.is_connected(&room.host_connection_id).await
    }

    async fn create_game(&self, connection_id: &str, game_code: &str) -> Result<(), RelayError> {
        let (previous, sent) = {
            let _guard = self.guards.acquire(game_code).await;
            self.rooms.create_room(game_code, connection_id).await?;
            let previous = self.registry.bind(connection_id, game_code).await;

            info!(connection_id = %connection_id, game_code = %game_code, "Game created");
            let sent = self
                .send_to(connection_id, &ServerEvent::game_created(game_code))
                .await;
            (previous, sent)
        };

        self.leave_previous_room(connection_id, game_code, previous)
            .await;
        sent
    }

    async fn join_game(
        &self,
        connection_id: &str,
        payload: JoinGamePayload,
    ) -> Result<(), RelayError> {
        let game_code = payload.game_code;
        let (previous, sent) = {
            let _guard = self.guards.acquire(&game_code).await;
            let player = self
                .rooms
                .add_player(&game_code, connection_id, &payload.player_name)
                .await?;
            let previous = self.registry.bind(connection_id, &game_code).await;
            self.registry
                .bind_player_name(connection_id, &player.name)
                .await;

            info!(
                connection_id = %connection_id,
                game_code = %game_code,
                player_name = %player.name,
                role = %player.role,
                "Player joined game"
            );

            let sent = async {
                self.send_to(connection_id, &ServerEvent::game_joined(&game_code, &player))
                    .await?;
                let room = self.rooms.get_room(&game_code).await?;
                self.broadcast(&game_code, &ServerEvent::players_updated(room.players.clone()), None)
                    .await?;
                self.replay_state(connection_id, &room).await
            }
            .await;
            self.record_activity(&game_code).await;
            (previous, sent)
        };

        self.leave_previous_room(connection_id, &game_code, previous)
            .await;
        sent
    }

    async fn join_as_secondary_host(
        &self,
        connection_id: &str,
        payload: SecondaryHostPayload,
    ) -> Result<(), RelayError> {
        let game_code = payload.game_code;
        let (previous, sent) = {
            let _guard = self.guards.acquire(&game_code).await;
            self.rooms
                .set_secondary_host(&game_code, connection_id)
                .await?;
            let previous = self.registry.bind(connection_id, &game_code).await;

            info!(connection_id = %connection_id, game_code = %game_code, "Secondary host joined game");

            let sent = async {
                self.send_to(connection_id, &ServerEvent::secondary_host_joined(&game_code))
                    .await?;
                let room = self.rooms.get_room(&game_code).await?;
                self.replay_state(connection_id, &room).await
            }
            .await;
            self.record_activity(&game_code).await;
            (previous, sent)
        };

        self.leave_previous_room(connection_id, &game_code, previous)
            .await;
        sent
    }

    async fn sync_state(&self, connection_id: &str, state: Value) -> Result<(), RelayError> {
        let bound = self.bound_room(connection_id).await?;
        if !bound.room.is_host(connection_id) {
            return Err(RelayError::UnauthorizedAction(
                "syncState from a non-host connection".to_string(),
            ));
        }

        let game_code = &bound.room.code;
        self.rooms.set_state(game_code, state.clone()).await?;
        self.broadcast(game_code, &ServerEvent::SyncGameState(state), Some(connection_id))
            .await?;
        self.record_activity(game_code).await;
        Ok(())
    }

    async fn host_action(
        &self,
        connection_id: &str,
        payload: HostActionPayload,
    ) -> Result<(), RelayError> {
        let bound = self.bound_room(connection_id).await?;
        if !bound.room.is_host(connection_id) {
            return Err(RelayError::UnauthorizedAction(
                "hostAction from a non-host connection".to_string(),
            ));
        }

        let game_code = &bound.room.code;
        self.broadcast(game_code, &ServerEvent::GameAction(payload), Some(connection_id))
            .await?;
        self.record_activity(game_code).await;
        Ok(())
    }

    async fn buzz_in(&self, connection_id: &str) -> Result<(), RelayError> {
        let bound = self.bound_room(connection_id).await?;
        let player_name = match bound.binding.player_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(RelayError::UnauthorizedAction(
                    "buzzIn from a connection without a display name".to_string(),
                ))
            }
        };

        let game_code = &bound.room.code;
        info!(game_code = %game_code, player_name = %player_name, "Player buzzed");
        self.broadcast(game_code, &ServerEvent::player_buzzed(player_name), None)
            .await?;
        self.record_activity(game_code).await;
        Ok(())
    }

    async fn player_clicked_tile(
        &self,
        connection_id: &str,
        payload: TileClickPayload,
    ) -> Result<(), RelayError> {
        let bound = self.bound_room(connection_id).await?;

        self.send_to(
            &bound.room.host_connection_id,
            &ServerEvent::PlayerClickedTile(payload),
        )
        .await?;
        self.record_activity(&bound.room.code).await;
        Ok(())
    }

    /// Look up the caller's room and take its guard
    async fn bound_room(&self, connection_id: &str) -> Result<BoundRoom, RelayError> {
        let disassociated = || RelayError::DisassociatedConnection(connection_id.to_string());

        loop {
            let seen = self
                .registry
                .lookup(connection_id)
                .await
                .ok_or_else(disassociated)?;
            let guard = self.guards.acquire(&seen.room_code).await;

            // The connection may have moved or its room closed while we waited
            let binding = match self.registry.lookup(connection_id).await {
                Some(binding) if binding.room_code == seen.room_code => binding,
                _ => {
                    drop(guard);
                    self.guards.release(&seen.room_code).await;
                    continue;
                }
            };

            return match self.rooms.get_room(&binding.room_code).await {
                Ok(room) => Ok(BoundRoom {
                    binding,
                    room,
                    _guard: guard,
                }),
                Err(_) => {
                    drop(guard);
                    self.guards.release(&seen.room_code).await;
                    Err(disassociated())
                }
            };
        }
    }

    /// A connection that moved to another room departs its previous one
    async fn leave_previous_room(
        &self,
        connection_id: &str,
        game_code: &str,
        previous: Option<ConnectionBinding>,
    ) {
        if let Some(previous) = previous {
            if previous.room_code != game_code {
                info!(
                    connection_id = %connection_id,
                    from = %previous.room_code,
                    to = %game_code,
                    "Connection moved to another room"
                );
                self.reconcile_departure(connection_id, &previous.room_code)
                    .await;
            }
        }
    }

    /// The connection is no longer bound to `game_code`; update the room
    async fn reconcile_departure(&self, connection_id: &str, game_code: &str) {
        let guard = self.guards.acquire(game_code).await;
        let room = match self.rooms.get_room(game_code).await {
            Ok(room) => room,
            Err(_) => {
                drop(guard);
                self.guards.release(game_code).await;
                debug!(game_code = %game_code, "Room already closed");
                return;
            }
        };

        if room.is_host(connection_id) {
            self.close_room(&room).await;
            drop(guard);
            self.guards.release(game_code).await;
            info!(game_code = %game_code, "Game ended (host disconnected)");
            return;
        }

        if room.is_secondary_host(connection_id) {
            if let Err(e) = self.rooms.clear_secondary_host(game_code, connection_id).await {
                warn!(game_code = %game_code, error = %e, "Failed to clear secondary host");
            }
        }

        let result = async {
            let players = self.rooms.remove_player(game_code, connection_id).await?;
            self.broadcast(game_code, &ServerEvent::players_updated(players), None)
                .await
        }
        .await;

        if let Err(e) = result {
            warn!(
                connection_id = %connection_id,
                game_code = %game_code,
                error = %e,
                "Failed to update roster after departure"
            );
        }
    }

    /// Tell everyone but the host the game is over, then forget the room.
    /// Caller holds the room's guard.
    async fn close_room(&self, room: &Room) {
        if let Err(e) = self
            .broadcast(
                &room.code,
                &ServerEvent::HostDisconnected,
                Some(&room.host_connection_id),
            )
            .await
        {
            warn!(game_code = %room.code, error = %e, "Failed to announce room closure");
        }

        self.rooms.delete_room(&room.code).await;
        self.registry.unbind_room(&room.code).await;
    }

    async fn replay_state(&self, connection_id: &str, room: &Room) -> Result<(), RelayError> {
        if room.has_state() {
            self.send_to(connection_id, &ServerEvent::SyncGameState(room.state.clone()))
                .await?;
        }
        Ok(())
    }

    async fn record_activity(&self, game_code: &str) {
        if let Err(e) = self.rooms.update_last_activity(game_code).await {
            debug!(game_code = %game_code, error = %e, "Could not record room activity");
        }
    }

    async fn reject(&self, connection_id: &str, event_name: &'static str, err: RelayError) {
        if let RelayError::RoomNotFound(game_code) = &err {
            self.guards.release(game_code).await;
        }

        match err.reply() {
            Some(reply) => {
                info!(
                    connection_id = %connection_id,
                    event = event_name,
                    error = %err,
                    "Event rejected"
                );
                if let Err(e) = self.send_to(connection_id, &reply).await {
                    warn!(connection_id = %connection_id, error = %e, "Failed to send rejection");
                }
            }
            None => debug!(
                connection_id = %connection_id,
                event = event_name,
                error = %err,
                "Event dropped"
            ),
        }
    }

    async fn send_to(&self, connection_id: &str, event: &ServerEvent) -> Result<(), RelayError> {
        let frame = event.to_frame()?;
        self.connections
            .send_to_connection(connection_id, &frame)
            .await;
        Ok(())
    }

    /// Send to every connection bound to the room, optionally skipping one
    async fn broadcast(
        &self,
        game_code: &str,
        event: &ServerEvent,
        except: Option<&str>,
    ) -> Result<(), RelayError> {
        let frame = event.to_frame()?;
        let recipients: Vec<String> = self
            .registry
            .connections_in_room(game_code)
            .await
            .into_iter()
            .filter(|id| Some(id.as_str()) != except)
            .collect();

        debug!(
            game_code = %game_code,
            event = event.name(),
            recipients = recipients.len(),
            "Broadcasting to room"
        );
        self.connections
            .send_to_connections(&recipients, &frame)
            .await;
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for RelayEngine {
    async fn handle_message(&self, connection_id: &str, message: String) {
        match ClientEvent::from_frame(&message) {
            Ok(event) => self.handle_event(connection_id, event).await,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse client frame"
                );
            }
        }
    }
}
