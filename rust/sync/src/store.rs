//! Versioned room documents and their change fan-out.

use std::collections::HashMap;
use std::sync::RwLock;

use cardroom_engine::action::{GameKind, GameState};
use cardroom_engine::errors::GameError;

use crate::errors::SyncError;
use crate::events::{EventBus, RoomSubscription};
use crate::room::{
    generate_room_code, timestamp, RosterEntry, RoomCode, RoomState, RoomStatus, Version,
    MAX_ROSTER,
};
use crate::settings::SyncSettings;

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(RoomState),
    /// Someone else committed first; `current` is the version now stored.
    Conflict { current: Version },
}

/// The operations a client needs from whatever holds the shared room
/// document.
///
/// Implementations must deliver every committed change to subscribers
/// in commit order.
pub trait RoomStore: Send + Sync {
    fn current_room_state(&self, room_code: &str) -> Result<RoomState, SyncError>;

    fn subscribe_to_changes(&self, room_code: &str) -> Result<RoomSubscription, SyncError>;

    /// Replaces the room's game with `game` only if the stored version is
    /// still `expected`.
    fn commit_if_version_matches(
        &self,
        room_code: &str,
        game: GameState,
        expected: Version,
    ) -> Result<CommitOutcome, SyncError>;
}

/// Process-local [`RoomStore`] with room lifecycle management.
#[derive(Debug)]
pub struct InMemoryRoomStore {
    rooms: RwLock<HashMap<RoomCode, RoomState>>,
    event_bus: EventBus,
}

impl Default for InMemoryRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::with_settings(&SyncSettings::default())
    }

    pub fn with_settings(settings: &SyncSettings) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            event_bus: EventBus::with_buffer(settings.event_buffer),
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn active_rooms(&self) -> Result<Vec<RoomCode>, SyncError> {
        let guard = self.rooms.read().map_err(|_| SyncError::StoragePoisoned)?;
        let mut codes: Vec<_> = guard.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }

    pub fn create_room(&self, host_id: &str) -> Result<RoomState, SyncError> {
        let mut guard = self.rooms.write().map_err(|_| SyncError::StoragePoisoned)?;
        let mut code = generate_room_code();
        while guard.contains_key(&code) {
            code = generate_room_code();
        }
        let room = RoomState::new(code.clone(), host_id.to_string());
        guard.insert(code.clone(), room.clone());

        tracing::info!(room_code = %code, player_id = %host_id, "room created");
        Ok(room)
    }

    pub fn join_room(&self, room_code: &str, player_id: &str) -> Result<RoomState, SyncError> {
        self.mutate(room_code, |room| {
            if room.has_player(player_id) {
                return Ok(false);
            }
            if room.status != RoomStatus::Lobby {
                return Err(SyncError::NotReady(format!(
                    "room {} is no longer accepting players",
                    room.room_code
                )));
            }
            if room.roster.len() >= MAX_ROSTER {
                return Err(SyncError::RosterFull(room.room_code.clone()));
            }
            room.roster.push(RosterEntry {
                player_id: player_id.to_string(),
                ready: false,
                joined_at: timestamp(),
            });
            tracing::info!(room_code = %room.room_code, player_id = %player_id, "player joined");
            Ok(true)
        })
    }

    pub fn set_ready(
        &self,
        room_code: &str,
        player_id: &str,
        ready: bool,
    ) -> Result<RoomState, SyncError> {
        self.mutate(room_code, |room| {
            let entry = room
                .roster
                .iter_mut()
                .find(|e| e.player_id == player_id)
                .ok_or_else(|| GameError::PlayerNotInGame(player_id.to_string()))?;
            if entry.ready == ready {
                return Ok(false);
            }
            entry.ready = ready;
            Ok(true)
        })
    }

    /// Deals a new game of `kind` to the roster once everyone is ready.
    pub fn start_game(
        &self,
        room_code: &str,
        kind: GameKind,
        seed: u64,
    ) -> Result<RoomState, SyncError> {
        let roster = self.current_room_state(room_code)?.player_ids();
        let game = GameState::new_game(kind, roster, seed)?;
        self.start_prepared_game(room_code, game)
    }

    /// Starts the room with an already dealt `game`. Its players must be
    /// exactly the room's roster.
    pub fn start_prepared_game(
        &self,
        room_code: &str,
        game: GameState,
    ) -> Result<RoomState, SyncError> {
        self.mutate(room_code, move |room| {
            if room.status != RoomStatus::Lobby {
                return Err(SyncError::NotReady(format!(
                    "room {} already started",
                    room.room_code
                )));
            }
            if room.roster.len() < 2 {
                return Err(SyncError::NotReady("at least two players are needed".into()));
            }
            if !room.all_ready() {
                return Err(SyncError::NotReady("not every player is ready".into()));
            }
            if game.players() != room.player_ids().as_slice() {
                return Err(SyncError::NotReady(
                    "game players do not match the roster".into(),
                ));
            }
            tracing::info!(
                room_code = %room.room_code,
                game = ?game.kind(),
                players = room.roster.len(),
                "game started"
            );
            room.status = RoomStatus::Playing;
            room.game = Some(game);
            Ok(true)
        })
    }

    /// Removes `player_id`, handing host duty to the next player and the
    /// turn to the next seat. The room is destroyed when nobody is left, in
    /// which case `None` is returned.
    pub fn leave_room(
        &self,
        room_code: &str,
        player_id: &str,
    ) -> Result<Option<RoomState>, SyncError> {
        let mut guard = self.rooms.write().map_err(|_| SyncError::StoragePoisoned)?;
        let room = guard
            .get(room_code)
            .ok_or_else(|| SyncError::RoomNotFound(room_code.to_string()))?;
        if !room.has_player(player_id) {
            return Err(GameError::PlayerNotInGame(player_id.to_string()).into());
        }

        let mut next = room.clone();
        next.roster.retain(|e| e.player_id != player_id);
        if next.roster.is_empty() {
            guard.remove(room_code);
            self.event_bus.drop_room(room_code);
            tracing::info!(room_code = %room_code, "room destroyed");
            return Ok(None);
        }
        if next.host_id == player_id {
            next.host_id = next.roster[0].player_id.clone();
            tracing::info!(room_code = %room_code, host_id = %next.host_id, "host migrated");
        }
        if let Some(game) = &next.game {
            match game.remove_player(player_id) {
                Ok(game) => next.game = Some(game),
                Err(GameError::PlayerNotInGame(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(room_code = %room_code, player_id = %player_id, "player left");
        Ok(Some(Self::commit_locked(&mut guard, &self.event_bus, next)))
    }

    /// Marks the room closed and ends every change stream.
    pub fn close_room(&self, room_code: &str) -> Result<RoomState, SyncError> {
        let state = self.mutate(room_code, |room| {
            if room.status == RoomStatus::Closed {
                return Ok(false);
            }
            room.status = RoomStatus::Closed;
            Ok(true)
        })?;
        self.event_bus.drop_room(room_code);
        tracing::info!(room_code = %room_code, version = state.version, "room closed");
        Ok(state)
    }

    /// Applies `f` under the write lock. When `f` reports a change the
    /// version is bumped and the new document broadcast before the lock is
    /// released.
    fn mutate<F>(&self, room_code: &str, f: F) -> Result<RoomState, SyncError>
    where
        F: FnOnce(&mut RoomState) -> Result<bool, SyncError>,
    {
        let mut guard = self.rooms.write().map_err(|_| SyncError::StoragePoisoned)?;
        let room = guard
            .get(room_code)
            .ok_or_else(|| SyncError::RoomNotFound(room_code.to_string()))?;
        let mut next = room.clone();
        if !f(&mut next)? {
            return Ok(next);
        }
        Ok(Self::commit_locked(&mut guard, &self.event_bus, next))
    }

    fn commit_locked(
        rooms: &mut HashMap<RoomCode, RoomState>,
        bus: &EventBus,
        mut next: RoomState,
    ) -> RoomState {
        next.version += 1;
        next.updated_at = timestamp();
        rooms.insert(next.room_code.clone(), next.clone());
        bus.broadcast(&next);
        next
    }
}

impl RoomStore for InMemoryRoomStore {
    fn current_room_state(&self, room_code: &str) -> Result<RoomState, SyncError> {
        let guard = self.rooms.read().map_err(|_| SyncError::StoragePoisoned)?;
        guard
            .get(room_code)
            .cloned()
            .ok_or_else(|| SyncError::RoomNotFound(room_code.to_string()))
    }

    fn subscribe_to_changes(&self, room_code: &str) -> Result<RoomSubscription, SyncError> {
        // hold the read lock so no commit slips between the check and the
        // registration
        let guard = self.rooms.read().map_err(|_| SyncError::StoragePoisoned)?;
        match guard.get(room_code) {
            None => Err(SyncError::RoomNotFound(room_code.to_string())),
            Some(room) if room.status == RoomStatus::Closed => {
                Err(SyncError::RoomClosed(room_code.to_string()))
            }
            Some(_) => Ok(self.event_bus.subscribe(room_code.to_string())),
        }
    }

    fn commit_if_version_matches(
        &self,
        room_code: &str,
        game: GameState,
        expected: Version,
    ) -> Result<CommitOutcome, SyncError> {
        let mut guard = self.rooms.write().map_err(|_| SyncError::StoragePoisoned)?;
        let room = guard
            .get(room_code)
            .ok_or_else(|| SyncError::RoomNotFound(room_code.to_string()))?;
        match room.status {
            RoomStatus::Closed => return Err(SyncError::RoomClosed(room_code.to_string())),
            RoomStatus::Lobby => {
                return Err(GameError::RoomNotPlayable("game has not started".into()).into())
            }
            RoomStatus::Playing => {}
        }
        if room.version != expected {
            tracing::debug!(
                room_code = %room_code,
                expected,
                version = room.version,
                "conditional commit rejected"
            );
            return Ok(CommitOutcome::Conflict {
                current: room.version,
            });
        }
        let mut next = room.clone();
        next.game = Some(game);
        let committed = Self::commit_locked(&mut guard, &self.event_bus, next);
        Ok(CommitOutcome::Committed(committed))
    }
}
