//! Error type shared by every command handler.

use std::fmt;

use cardroom_engine::errors::GameError;
use cardroom_sync::SyncError;

/// Anything that makes a command fail. Every variant maps to exit code 2.
#[derive(Debug)]
pub enum CliError {
    /// stdout/stderr or output file failures
    Io(std::io::Error),

    /// Arguments that parse but make no sense together
    InvalidInput(String),

    Config(String),

    /// A rule engine refusal outside the normal flow of play
    Engine(GameError),

    /// Room store or commit protocol failure
    Sync(SyncError),

    /// A simulated game broke an invariant
    Invariant(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Engine(e) => write!(f, "Engine error: {}", e),
            CliError::Sync(e) => write!(f, "Sync error [{}]: {}", e.error_code(), e),
            CliError::Invariant(msg) => write!(f, "Invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            CliError::Engine(e) => Some(e),
            CliError::Sync(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::Io(error)
    }
}

impl From<GameError> for CliError {
    fn from(error: GameError) -> Self {
        CliError::Engine(error)
    }
}

impl From<SyncError> for CliError {
    fn from(error: SyncError) -> Self {
        CliError::Sync(error)
    }
}
