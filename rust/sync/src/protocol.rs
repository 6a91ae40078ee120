//! Optimistic commit protocol.
//!
//! An action moves through
//! `Proposed → Validated → Committed | Conflicted → Retried → ... → Committed | Rejected`.
//! Candidates are computed by the pure rule engine against a snapshot and
//! written with a conditional commit; a conflict re-fetches the room and
//! validates the same action again, up to a bounded number of attempts.

use std::sync::Arc;

use cardroom_engine::action::{self, Action};
use cardroom_engine::errors::GameError;
use cardroom_engine::player::PlayerId;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;

use crate::errors::SyncError;
use crate::events::RoomSubscription;
use crate::room::{RoomCode, RoomState, Version};
use crate::settings::SyncSettings;
use crate::store::{CommitOutcome, RoomStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPhase {
    Proposed,
    Validated,
    Committed,
    Conflicted,
    Retried,
    Rejected,
}

/// What a successful submission went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// Version produced by the commit
    pub version: Version,
    /// Conditional writes attempted, 1 when there was no conflict
    pub attempts: u32,
    pub phases: Vec<ActionPhase>,
}

impl CommitReceipt {
    pub fn conflicts(&self) -> usize {
        self.phases
            .iter()
            .filter(|p| **p == ActionPhase::Conflicted)
            .count()
    }
}

/// Validates `action` against `snapshot` and commits it, retrying against
/// fresh state on conflict.
///
/// Any engine refusal against the caller's own snapshot is returned as
/// [`SyncError::Game`]. After a conflict, a rule violation or a game that
/// is no longer playable fails with [`SyncError::StaleAction`], as does an
/// action that exhausts `max_attempts`. Other refusals, such as the player
/// having left, stay [`SyncError::Game`].
pub fn commit_with_retry(
    store: &dyn RoomStore,
    snapshot: &RoomState,
    player_id: &str,
    action: &Action,
    max_attempts: u32,
) -> Result<CommitReceipt, SyncError> {
    let room_code = snapshot.room_code.as_str();
    let mut phases = vec![ActionPhase::Proposed];
    let mut base = snapshot.clone();
    let max_attempts = max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let game = base
            .game
            .as_ref()
            .ok_or_else(|| GameError::RoomNotPlayable("no game in progress".into()))?;
        let candidate = match action::apply(game, player_id, action) {
            Ok(candidate) => candidate,
            Err(e) => {
                phases.push(ActionPhase::Rejected);
                tracing::debug!(
                    room_code = %room_code,
                    player_id = %player_id,
                    version = base.version,
                    attempt,
                    error = %e,
                    "action rejected by rules"
                );
                // a lost race only makes the action stale when the newer
                // state turned it illegal or ended the game
                let lost_race = attempt > 1
                    && (e.is_rule_violation() || matches!(e, GameError::RoomNotPlayable(_)));
                if !lost_race {
                    return Err(SyncError::Game(e));
                }
                return Err(SyncError::StaleAction {
                    attempts: attempt,
                    reason: e.to_string(),
                });
            }
        };
        phases.push(ActionPhase::Validated);

        match store.commit_if_version_matches(room_code, candidate, base.version)? {
            CommitOutcome::Committed(state) => {
                phases.push(ActionPhase::Committed);
                tracing::debug!(
                    room_code = %room_code,
                    player_id = %player_id,
                    version = state.version,
                    attempt,
                    "action committed"
                );
                return Ok(CommitReceipt {
                    version: state.version,
                    attempts: attempt,
                    phases,
                });
            }
            CommitOutcome::Conflict { current } => {
                phases.push(ActionPhase::Conflicted);
                tracing::warn!(
                    room_code = %room_code,
                    player_id = %player_id,
                    version = base.version,
                    current,
                    attempt,
                    "commit conflict, revalidating against fresh state"
                );
                if attempt == max_attempts {
                    break;
                }
                base = store.current_room_state(room_code)?;
                phases.push(ActionPhase::Retried);
            }
        }
    }

    phases.push(ActionPhase::Rejected);
    tracing::warn!(
        room_code = %room_code,
        player_id = %player_id,
        version = base.version,
        attempts = max_attempts,
        "retry budget exhausted"
    );
    Err(SyncError::StaleAction {
        attempts: max_attempts,
        reason: "retry budget exhausted".into(),
    })
}

/// One participant's view of a room.
///
/// The committed result of [`SyncClient::submit`] is never written into
/// `last_known` directly; it arrives through the change stream like
/// everybody else's.
pub struct SyncClient {
    store: Arc<dyn RoomStore>,
    room_code: RoomCode,
    player_id: PlayerId,
    settings: SyncSettings,
    subscription: RoomSubscription,
    last_known: RoomState,
    disconnected: bool,
}

impl SyncClient {
    /// Subscribes first and fetches second, so no commit falls between the
    /// snapshot and the stream.
    pub fn connect(
        store: Arc<dyn RoomStore>,
        room_code: &str,
        player_id: &str,
        settings: SyncSettings,
    ) -> Result<Self, SyncError> {
        let subscription = store.subscribe_to_changes(room_code)?;
        let last_known = store.current_room_state(room_code)?;
        tracing::debug!(
            room_code = %room_code,
            player_id = %player_id,
            version = last_known.version,
            "client connected"
        );
        Ok(Self {
            store,
            room_code: room_code.to_string(),
            player_id: player_id.to_string(),
            settings,
            subscription,
            last_known,
            disconnected: false,
        })
    }

    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn last_known(&self) -> &RoomState {
        &self.last_known
    }

    /// True once the change stream has ended.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Waits for the next change newer than `last_known`. Returns `None`
    /// once the stream has ended.
    pub async fn next_change(&mut self) -> Option<RoomState> {
        if self.disconnected {
            return None;
        }
        while let Some(state) = self.subscription.next().await {
            if self.observe(state) {
                return Some(self.last_known.clone());
            }
        }
        self.disconnected = true;
        tracing::warn!(
            room_code = %self.room_code,
            player_id = %self.player_id,
            version = self.last_known.version,
            "change stream ended"
        );
        None
    }

    /// Applies every change already buffered without waiting. Returns how
    /// many were new.
    pub fn poll_changes(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.subscription.try_recv() {
                Ok(state) => {
                    if self.observe(state) {
                        applied += 1;
                    }
                }
                Err(tokio::sync::mpsc::error::TryRecvError::Empty) => break,
                Err(tokio::sync::mpsc::error::TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
        applied
    }

    /// Re-subscribes and refetches after the stream was lost.
    pub fn resync(&mut self) -> Result<&RoomState, SyncError> {
        self.subscription = self.store.subscribe_to_changes(&self.room_code)?;
        let current = self.store.current_room_state(&self.room_code)?;
        self.observe(current);
        self.disconnected = false;
        tracing::info!(
            room_code = %self.room_code,
            player_id = %self.player_id,
            version = self.last_known.version,
            "client resynchronised"
        );
        Ok(&self.last_known)
    }

    /// Submits `action` as this client's player.
    pub fn submit(&mut self, action: &Action) -> Result<CommitReceipt, SyncError> {
        let player = self.player_id.clone();
        self.submit_for(&player, action)
    }

    /// Submits `action` on behalf of `player_id`; the turn timer uses this
    /// to act for a player who ran out of time.
    pub fn submit_for(
        &mut self,
        player_id: &str,
        action: &Action,
    ) -> Result<CommitReceipt, SyncError> {
        tracing::debug!(
            room_code = %self.room_code,
            player_id = %player_id,
            version = self.last_known.version,
            action = ?action,
            "action proposed"
        );
        commit_with_retry(
            self.store.as_ref(),
            &self.last_known,
            player_id,
            action,
            self.settings.max_commit_retries,
        )
    }

    /// Adopts `state` if it is newer than what we hold. Duplicates and
    /// reordered deliveries are ignored.
    fn observe(&mut self, state: RoomState) -> bool {
        if state.version <= self.last_known.version {
            return false;
        }
        self.last_known = state;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRoomStore;
    use cardroom_engine::action::GameKind;

    fn playing_room(kind: GameKind) -> (Arc<InMemoryRoomStore>, RoomCode) {
        let store = Arc::new(InMemoryRoomStore::new());
        let code = store.create_room("a").unwrap().room_code;
        store.join_room(&code, "b").unwrap();
        store.set_ready(&code, "a", true).unwrap();
        store.set_ready(&code, "b", true).unwrap();
        store.start_game(&code, kind, 21).unwrap();
        (store, code)
    }

    #[test]
    fn clean_commit_takes_one_attempt() {
        let (store, code) = playing_room(GameKind::ColorClash);
        let snapshot = store.current_room_state(&code).unwrap();
        let receipt = commit_with_retry(store.as_ref(), &snapshot, "a", &Action::Draw, 5).unwrap();
        assert_eq!(receipt.attempts, 1);
        assert_eq!(receipt.version, snapshot.version + 1);
        assert_eq!(
            receipt.phases,
            vec![
                ActionPhase::Proposed,
                ActionPhase::Validated,
                ActionPhase::Committed
            ]
        );
    }

    #[test]
    fn rule_violation_is_not_retried() {
        let (store, code) = playing_room(GameKind::ColorClash);
        let snapshot = store.current_room_state(&code).unwrap();
        let err = commit_with_retry(store.as_ref(), &snapshot, "b", &Action::Draw, 5).unwrap_err();
        assert!(matches!(err, SyncError::Game(GameError::OutOfTurn { .. })));
        assert_eq!(store.current_room_state(&code).unwrap().version, snapshot.version);
    }

    #[tokio::test]
    async fn submitted_state_arrives_through_the_stream() {
        let (store, code) = playing_room(GameKind::Flip21);
        let mut client = SyncClient::connect(store.clone(), &code, "a", SyncSettings::default()).unwrap();
        let before = client.last_known().version;
        let Some(current) = client.last_known().game.as_ref().and_then(|g| g.current_player().cloned()) else {
            return;
        };

        let receipt = client.submit_for(&current, &Action::Stand).unwrap();
        assert_eq!(client.last_known().version, before);

        let change = client.next_change().await.expect("change");
        assert_eq!(change.version, receipt.version);
        assert_eq!(client.last_known().version, receipt.version);
    }
}
