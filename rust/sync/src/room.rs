use cardroom_engine::action::GameState;
use cardroom_engine::player::PlayerId;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RoomCode = String;

/// Opaque token that increases on every committed mutation of a room.
pub type Version = u64;

/// Players a single room admits.
pub const MAX_ROSTER: usize = 10;

const ROOM_CODE_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Lobby,
    Playing,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: PlayerId,
    pub ready: bool,
    /// RFC3339
    pub joined_at: String,
}

/// The shared, versioned room document every client observes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomState {
    pub room_code: RoomCode,
    pub host_id: PlayerId,
    pub roster: Vec<RosterEntry>,
    pub status: RoomStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<GameState>,
    pub version: Version,
    pub updated_at: String,
}

impl RoomState {
    pub(crate) fn new(room_code: RoomCode, host_id: PlayerId) -> Self {
        let now = timestamp();
        Self {
            room_code,
            roster: vec![RosterEntry {
                player_id: host_id.clone(),
                ready: false,
                joined_at: now.clone(),
            }],
            host_id,
            status: RoomStatus::Lobby,
            game: None,
            version: 1,
            updated_at: now,
        }
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.roster.iter().map(|e| e.player_id.clone()).collect()
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.roster.iter().any(|e| e.player_id == player_id)
    }

    pub fn all_ready(&self) -> bool {
        self.roster.iter().all(|e| e.ready)
    }

    pub fn is_playing(&self) -> bool {
        self.status == RoomStatus::Playing && self.game.is_some()
    }
}

pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Short upper-case code players type to join a room.
pub fn generate_room_code() -> RoomCode {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_ascii_digit())
        .take(ROOM_CODE_LEN)
        .collect::<String>()
        .to_ascii_uppercase()
}
