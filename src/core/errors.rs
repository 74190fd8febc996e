//! VGW-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, VgwError>;

/// Top-level error type for the gateway manager.
#[derive(Debug, Error)]
pub enum VgwError {
    #[error("[VGW-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[VGW-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[VGW-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[VGW-1101] {details}")]
    Validation { details: String },

    #[error("[VGW-2001] {command} failed (exit {status}): {output}")]
    Subprocess {
        command: String,
        status: String,
        output: String,
    },

    #[error("[VGW-2101] API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("[VGW-2102] failed to send request: {details}")]
    Transport { details: String },

    #[error("[VGW-2201] failed to parse {context}: {details}")]
    Parse {
        context: &'static str,
        details: String,
    },

    #[error("[VGW-2301] {kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("[VGW-2401] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[VGW-2501] error listing buckets: ZFS({dataset}) API({api})")]
    ListFailed { dataset: String, api: String },

    #[error("[VGW-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[VGW-3101] failed to {step}: {}", source.message())]
    Step {
        step: &'static str,
        #[source]
        source: Box<Self>,
    },
}

impl VgwError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "VGW-1001",
            Self::MissingConfig { .. } => "VGW-1002",
            Self::ConfigParse { .. } => "VGW-1003",
            Self::Validation { .. } => "VGW-1101",
            Self::Subprocess { .. } => "VGW-2001",
            Self::Api { .. } => "VGW-2101",
            Self::Transport { .. } => "VGW-2102",
            Self::Parse { .. } => "VGW-2201",
            Self::NotFound { .. } => "VGW-2301",
            Self::Serialization { .. } => "VGW-2401",
            Self::ListFailed { .. } => "VGW-2501",
            Self::Io { .. } => "VGW-3001",
            Self::Step { .. } => "VGW-3101",
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Input rejected before any mutation.
    #[must_use]
    pub fn validation(details: impl Into<String>) -> Self {
        Self::Validation {
            details: details.into(),
        }
    }

    /// Wrap a failure with the workflow step that produced it.
    #[must_use]
    pub fn at_step(self, step: &'static str) -> Self {
        Self::Step {
            step,
            source: Box::new(self),
        }
    }

    /// Error text without the `[VGW-xxxx]` prefix, for operator-facing messages.
    #[must_use]
    pub fn message(&self) -> String {
        let rendered = self.to_string();
        match rendered.split_once("] ") {
            Some((prefix, rest)) if prefix.starts_with("[VGW-") => rest.to_string(),
            _ => rendered,
        }
    }

    /// The gateway answered "no policy attached" rather than failing outright.
    #[must_use]
    pub fn is_policy_not_found(&self) -> bool {
        let rendered = self.to_string();
        rendered.contains("404") || rendered.contains("NoSuchBucketPolicy")
    }

    /// The dataset tool refused to destroy a dataset that is still in use.
    #[must_use]
    pub fn is_busy_or_not_empty(&self) -> bool {
        let rendered = self.to_string();
        rendered.contains("dataset is busy") || rendered.contains("not empty")
    }
}

impl From<serde_json::Error> for VgwError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for VgwError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<reqwest::Error> for VgwError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport {
            details: value.to_string(),
        }
    }
}

impl From<quick_xml::Error> for VgwError {
    fn from(value: quick_xml::Error) -> Self {
        Self::Parse {
            context: "xml",
            details: value.to_string(),
        }
    }
}
