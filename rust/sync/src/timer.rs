//! Advisory turn deadlines.
//!
//! The timer holds no privileges: when a turn runs out it submits the
//! engine's timeout action through the same commit path as a player would,
//! and losing that race to the player is normal.

use std::time::Duration;

use cardroom_engine::action::{self, Action, GameKind};
use cardroom_engine::player::PlayerId;
use tokio::time::{timeout_at, Instant};

use crate::errors::SyncError;
use crate::protocol::{CommitReceipt, SyncClient};
use crate::room::{RoomState, Version};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadlineOutcome {
    /// The turn moved on before the deadline
    Advanced { version: Version },
    /// The deadline passed and the timeout action was committed
    TimedOut {
        player_id: PlayerId,
        action: Action,
        receipt: CommitReceipt,
    },
    /// The deadline passed but another commit got there first
    Superseded { player_id: PlayerId },
    /// Nobody holds the turn
    Idle,
    /// The change stream ended
    Disconnected,
}

fn turn_holder(state: &RoomState) -> Option<PlayerId> {
    state.game.as_ref()?.current_player().cloned()
}

/// Gives the current turn holder `limit` to act.
///
/// Changes that leave the same player on turn (a Color Clash draw, a Flip21
/// hit) do not restart the clock.
pub async fn enforce_turn_deadline(
    client: &mut SyncClient,
    limit: Duration,
) -> Result<DeadlineOutcome, SyncError> {
    client.poll_changes();
    let Some(holder) = turn_holder(client.last_known()) else {
        return Ok(DeadlineOutcome::Idle);
    };
    let deadline = Instant::now() + limit;

    loop {
        match timeout_at(deadline, client.next_change()).await {
            Ok(Some(state)) => {
                if turn_holder(&state).as_ref() != Some(&holder) {
                    return Ok(DeadlineOutcome::Advanced {
                        version: state.version,
                    });
                }
            }
            Ok(None) => return Ok(DeadlineOutcome::Disconnected),
            Err(_elapsed) => break,
        }
    }

    let snapshot = client.last_known();
    let Some((player_id, timeout_action)) = snapshot.game.as_ref().and_then(action::timeout_action)
    else {
        return Ok(DeadlineOutcome::Idle);
    };
    tracing::info!(
        room_code = %snapshot.room_code,
        player_id = %player_id,
        version = snapshot.version,
        action = ?timeout_action,
        "turn deadline expired"
    );

    match client.submit_for(&player_id, &timeout_action) {
        Ok(receipt) => Ok(DeadlineOutcome::TimedOut {
            player_id,
            action: timeout_action,
            receipt,
        }),
        Err(e @ (SyncError::StaleAction { .. } | SyncError::Game(_))) => {
            e.log(client.room_code());
            Ok(DeadlineOutcome::Superseded { player_id })
        }
        Err(e) => {
            e.log(client.room_code());
            Err(e)
        }
    }
}

/// Enforces deadlines turn after turn until the game ends or the stream is
/// lost. Returns how many turns timed out.
pub async fn run_turn_timer(mut client: SyncClient) -> Result<u32, SyncError> {
    let limit = client.settings().turn_timeout();
    let mut expired = 0;
    loop {
        match enforce_turn_deadline(&mut client, limit).await? {
            DeadlineOutcome::TimedOut { .. } => expired += 1,
            DeadlineOutcome::Advanced { .. } | DeadlineOutcome::Superseded { .. } => {}
            DeadlineOutcome::Disconnected => return Ok(expired),
            DeadlineOutcome::Idle => {
                let over = client.last_known().game.as_ref().map_or(true, |g| {
                    g.kind() == GameKind::ColorClash && g.is_finished()
                });
                if over || client.next_change().await.is_none() {
                    return Ok(expired);
                }
            }
        }
    }
}
