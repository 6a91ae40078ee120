use serde::{Deserialize, Serialize};

/// Opaque player identifier handed out by the room layer.
pub type PlayerId = String;

/// Per-player status within a Flip21 round.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    /// Still taking turns
    Active,
    /// Stood (or reached 21) and waits for the dealer
    Locked,
    /// Hand value went over 21
    Busted,
}

impl SeatStatus {
    pub fn is_active(self) -> bool {
        self == SeatStatus::Active
    }
}

/// Outcome of one Flip21 round from a player's point of view.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundResult {
    Win,
    Loss,
    Push,
}
