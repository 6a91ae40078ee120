use serde::{Deserialize, Serialize};

use crate::action::{Action, GameKind};
use crate::player::PlayerId;

/// One committed action, as written to the JSONL action log.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Unique identifier (format: ROOMCODE-NNNNNN, the document version)
    pub record_id: String,
    pub room_code: String,
    pub game: GameKind,
    /// Document version produced by this action
    pub version: u64,
    pub player_id: PlayerId,
    pub action: Action,
    /// Commit attempts it took, 1 when there was no conflict
    pub attempts: u32,
    /// Timestamp when the action was committed (RFC3339 format)
    #[serde(default)]
    pub ts: Option<String>,
    /// Additional metadata (extensible JSON object)
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

pub fn format_record_id(room_code: &str, version: u64) -> String {
    format!("{}-{:06}", room_code, version)
}

use chrono::{SecondsFormat, Utc};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct ActionLogger {
    writer: Option<BufWriter<File>>,
    written: usize,
}

impl ActionLogger {
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let f = File::create(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(f)),
            written: 0,
        })
    }

    /// Logger that counts records without writing them anywhere.
    pub fn discard() -> Self {
        Self {
            writer: None,
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write(&mut self, record: &ActionRecord) -> std::io::Result<()> {
        // inject timestamp if missing
        let mut rec = record.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        let line = serde_json::to_string(&rec).map_err(std::io::Error::other)?;
        if let Some(w) = &mut self.writer {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
            w.flush()?;
        }
        self.written += 1;
        Ok(())
    }
}
