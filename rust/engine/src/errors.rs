use thiserror::Error;

use crate::player::PlayerId;

/// Failures returned by the rule engines.
///
/// Every engine call is all-or-nothing: when one of these is returned the
/// input state is untouched and no candidate state exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("It's not player {actual}'s turn (expected player {expected})")]
    OutOfTurn { expected: PlayerId, actual: PlayerId },
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Wild cards need exactly one concrete color choice")]
    InvalidColorChoice,
    #[error("No cards left in the draw pile or the discard pile")]
    DeckExhausted,
    #[error("Player {0} is not part of this game")]
    PlayerNotInGame(PlayerId),
    #[error("Game is not playable: {0}")]
    RoomNotPlayable(String),
}

impl GameError {
    /// Rule violations are deterministic for a given snapshot; retrying them
    /// against the same state can never succeed.
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            GameError::IllegalMove(_) | GameError::InvalidColorChoice | GameError::OutOfTurn { .. }
        )
    }
}
