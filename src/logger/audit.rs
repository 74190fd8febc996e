//! JSONL audit trail: one self-contained JSON line per mutating admin operation.
//!
//! Lines are assembled in memory and written with a single `write_all` so a
//! concurrent `tail -f` never sees a partial record. Write failures degrade the
//! writer (primary file, then discard) and are reported through `tracing`; the
//! admin operation that produced the record is never failed by the audit trail.
//!
//! Secrets never reach this file: records carry identifiers only.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::config::LoggingConfig;
use crate::core::errors::{Result, VgwError};

/// Mutating operations recorded in the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    UserCreate,
    UserUpdate,
    UserDelete,
    BucketCreate,
    BucketDelete,
    OwnerChange,
    PolicySet,
    PolicyRemove,
    Provision,
}

/// One audit line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub ts: String,
    pub event: AuditEvent,
    /// Access key or bucket name the operation targeted.
    pub target: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AuditRecord {
    /// Build a record stamped with the current UTC time from an operation outcome.
    pub fn from_outcome<T>(event: AuditEvent, target: &str, outcome: &Result<T>) -> Self {
        let (ok, error_code, error_message) = match outcome {
            Ok(_) => (true, None, None),
            Err(err) => (false, Some(err.code().to_string()), Some(err.message())),
        };
        Self {
            ts: format_utc_now(),
            event,
            target: target.to_string(),
            ok,
            error_code,
            error_message,
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Discard,
}

/// Append-only audit writer with single-generation rotation.
pub struct AuditLog {
    path: Option<PathBuf>,
    max_bytes: u64,
    file: Option<File>,
    state: WriterState,
    bytes_written: u64,
}

impl AuditLog {
    /// Open (or create) the audit file named by the logging config.
    pub fn open(config: &LoggingConfig) -> Self {
        let mut log = Self {
            path: Some(config.audit_log.clone()),
            max_bytes: config.audit_max_bytes,
            file: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        log.try_open();
        log
    }

    /// A writer that drops every record.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            path: None,
            max_bytes: u64::MAX,
            file: None,
            state: WriterState::Discard,
            bytes_written: 0,
        }
    }

    /// Current degradation state.
    pub const fn state(&self) -> &'static str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Discard => "discard",
        }
    }

    /// Append one record.
    pub fn record(&mut self, record: &AuditRecord) {
        if self.state == WriterState::Discard {
            return;
        }
        let line = match serde_json::to_string(record) {
            Ok(json) => format!("{json}\n"),
            Err(error) => {
                warn!(%error, "audit record serialization failed");
                return;
            }
        };

        if self.bytes_written + line.len() as u64 > self.max_bytes {
            self.rotate();
        }

        let written = self
            .file
            .as_mut()
            .is_some_and(|file| file.write_all(line.as_bytes()).is_ok());
        if written {
            self.bytes_written += line.len() as u64;
        } else {
            self.degrade("write failed");
        }
    }

    fn try_open(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };
        match open_append(&path) {
            Ok((file, size)) => {
                self.file = Some(file);
                self.state = WriterState::Normal;
                self.bytes_written = size;
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "audit log unavailable; records will be dropped");
                self.state = WriterState::Discard;
            }
        }
    }

    fn rotate(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };
        self.file = None;
        let _ = rename(&path, rotated_name(&path));
        match open_append(&path) {
            Ok((file, _)) => {
                self.file = Some(file);
                self.bytes_written = 0;
            }
            Err(_) => self.degrade("reopen after rotation failed"),
        }
    }

    fn degrade(&mut self, reason: &str) {
        self.file = None;
        self.state = WriterState::Discard;
        warn!(reason, "audit log degraded to discard");
    }
}

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| VgwError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| VgwError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// `audit.jsonl` → `audit.jsonl.1`.
fn rotated_name(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".1");
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
