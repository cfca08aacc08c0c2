use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::assets::{ImageAsset, SlotRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Generate,
    Studio,
}

/// One line of a session's `events.jsonl`. The variant name becomes `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted {
        mode: SessionMode,
        provider: String,
    },
    SlotSelected {
        slot: SlotRole,
        mime_type: String,
        bytes: usize,
    },
    SlotCleared {
        slot: SlotRole,
    },
    GenerationStarted {
        ticket: u64,
    },
    GenerationSucceeded {
        mime_type: String,
    },
    GenerationFailed {
        error: String,
    },
    DownloadWritten {
        path: PathBuf,
    },
}

impl SessionEvent {
    pub fn slot_selected(slot: SlotRole, asset: &ImageAsset) -> Self {
        SessionEvent::SlotSelected {
            slot,
            mime_type: asset.mime_type().to_string(),
            bytes: asset.byte_len(),
        }
    }
}

/// Appends session events as compact JSON lines, stamped with the session id
/// and an RFC 3339 timestamp.
#[derive(Debug)]
pub struct EventWriter {
    path: PathBuf,
    session_id: String,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            session_id: session_id.into(),
        }
    }

    pub fn emit(&self, event: &SessionEvent) -> Result<Value> {
        let Value::Object(mut record) = serde_json::to_value(event)? else {
            bail!("session event did not serialize to an object");
        };
        record.insert(
            "session_id".to_string(),
            Value::String(self.session_id.clone()),
        );
        record.insert("ts".to_string(), Value::String(now_utc_iso()));

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        writeln!(file, "{}", serde_json::to_string(&record)?)?;

        Ok(Value::Object(record))
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
