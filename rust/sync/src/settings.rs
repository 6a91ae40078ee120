use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::events::DEFAULT_EVENT_BUFFER;

pub const MAX_COMMIT_RETRIES_LIMIT: u32 = 32;

/// Tuning for the commit protocol, the turn timer and change fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncSettings {
    /// Commit attempts per action before giving up (1-32)
    pub max_commit_retries: u32,
    /// Advisory per-turn deadline in seconds
    pub turn_timeout_secs: u64,
    /// Changes buffered per subscriber before it is disconnected
    pub event_buffer: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_commit_retries: 5,
            turn_timeout_secs: 30,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl SyncSettings {
    /// Validate settings values
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_commit_retries == 0 || self.max_commit_retries > MAX_COMMIT_RETRIES_LIMIT {
            return Err(SettingsError::InvalidValue(format!(
                "max_commit_retries must be between 1 and {MAX_COMMIT_RETRIES_LIMIT}"
            )));
        }

        if self.turn_timeout_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "turn_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer == 0 {
            return Err(SettingsError::InvalidValue(
                "event_buffer must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = SyncSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.turn_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn validates_retry_range() {
        let settings = SyncSettings {
            max_commit_retries: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = SyncSettings {
            max_commit_retries: 33,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = SyncSettings {
            max_commit_retries: 1,
            ..Default::default()
        };
        assert!(settings.validate().is_ok());

        let settings = SyncSettings {
            max_commit_retries: 32,
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validates_timeout_and_buffer_positive() {
        let settings = SyncSettings {
            turn_timeout_secs: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = SyncSettings {
            event_buffer: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: SyncSettings = serde_json::from_str(r#"{"max_commit_retries": 9}"#).unwrap();
        assert_eq!(settings.max_commit_retries, 9);
        assert_eq!(settings.turn_timeout_secs, 30);
        assert_eq!(settings.event_buffer, DEFAULT_EVENT_BUFFER);
    }
}
