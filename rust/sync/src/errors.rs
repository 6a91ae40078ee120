/// Error handling for the room synchronization layer
///
/// This module provides:
/// - The `SyncError` type returned by stores and clients
/// - Stable machine-readable error codes
/// - Severity classification for logging
use cardroom_engine::errors::GameError;
use thiserror::Error;

use crate::room::RoomCode;

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Player or caller mistakes - expected, normal operation
    Client,
    /// Unexpected failures that need investigation
    Server,
    /// Critical errors - system integrity at risk
    Critical,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Game(#[from] GameError),
    /// Lost an optimistic race and the action is no longer valid, or the
    /// retry budget ran out.
    #[error("action went stale after {attempts} attempt(s): {reason}")]
    StaleAction { attempts: u32, reason: String },
    #[error("Room not found: {0}")]
    RoomNotFound(RoomCode),
    #[error("Room closed: {0}")]
    RoomClosed(RoomCode),
    #[error("Room is full: {0}")]
    RosterFull(RoomCode),
    #[error("Room not ready: {0}")]
    NotReady(String),
    #[error("Room storage poisoned")]
    StoragePoisoned,
}

impl SyncError {
    /// Get the error code string (machine-readable)
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::Game(e) => match e {
                GameError::OutOfTurn { .. } => "out_of_turn",
                GameError::IllegalMove(_) => "illegal_move",
                GameError::InvalidColorChoice => "invalid_color_choice",
                GameError::DeckExhausted => "deck_exhausted",
                GameError::PlayerNotInGame(_) => "player_not_in_game",
                GameError::RoomNotPlayable(_) => "room_not_playable",
            },
            SyncError::StaleAction { .. } => "stale_action",
            SyncError::RoomNotFound(_) => "room_not_found",
            SyncError::RoomClosed(_) => "room_closed",
            SyncError::RosterFull(_) => "roster_full",
            SyncError::NotReady(_) => "not_ready",
            SyncError::StoragePoisoned => "room_storage_error",
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SyncError::StoragePoisoned => ErrorSeverity::Critical,
            SyncError::Game(GameError::DeckExhausted) => ErrorSeverity::Server,
            _ => ErrorSeverity::Client,
        }
    }

    /// Log through `tracing` at the level matching the severity.
    pub fn log(&self, room_code: &str) {
        match self.severity() {
            ErrorSeverity::Client => {
                tracing::info!(room_code = %room_code, error = self.error_code(), "{self}")
            }
            ErrorSeverity::Server => {
                tracing::error!(room_code = %room_code, error = self.error_code(), "{self}")
            }
            ErrorSeverity::Critical => {
                tracing::error!(
                    room_code = %room_code,
                    error = self.error_code(),
                    critical = true,
                    "{self}"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_errors_keep_their_own_codes() {
        let err: SyncError = GameError::InvalidColorChoice.into();
        assert_eq!(err.error_code(), "invalid_color_choice");
        assert_eq!(err.severity(), ErrorSeverity::Client);
        assert_eq!(err.to_string(), GameError::InvalidColorChoice.to_string());
    }

    #[test]
    fn log_level_follows_severity() {
        use crate::logging::TestLogSubscriber;
        use tracing::Level;

        let logs = TestLogSubscriber::new();
        logs.capture(|| {
            SyncError::RoomClosed("ABC123".into()).log("ABC123");
            SyncError::StoragePoisoned.log("ABC123");
        });
        let entries = logs.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, Level::INFO);
        assert_eq!(entries[0].field("error"), Some("room_closed"));
        assert_eq!(entries[0].field("room_code"), Some("ABC123"));
        assert_eq!(entries[1].level, Level::ERROR);
        assert_eq!(entries[1].field("critical"), Some("true"));
    }

    #[test]
    fn error_severity_classification() {
        assert_eq!(SyncError::StoragePoisoned.severity(), ErrorSeverity::Critical);
        assert_eq!(
            SyncError::from(GameError::DeckExhausted).severity(),
            ErrorSeverity::Server
        );
        let stale = SyncError::StaleAction {
            attempts: 2,
            reason: "turn moved on".into(),
        };
        assert_eq!(stale.severity(), ErrorSeverity::Client);
        assert_eq!(stale.error_code(), "stale_action");
        assert!(stale.to_string().contains("2 attempt(s)"));
    }
}
