//! Diagnostic `tracing` subscriber setup for the binary.
//!
//! One-shot commands log to stderr. The interactive session owns the terminal,
//! so its diagnostics go to a file or nowhere.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::core::errors::{Result, VgwError};

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "VGW_LOG";

/// Where diagnostic output should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSink<'a> {
    Stderr,
    File(&'a Path),
    Discard,
}

/// Build the filter: `VGW_LOG` wins, otherwise `debug` when verbose, else `warn`.
#[must_use]
pub fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "vgw_manager=debug,warn"
        } else {
            "warn"
        })
    })
}

/// Install the global subscriber. Safe to call once per process.
pub fn init(sink: DiagnosticSink<'_>, verbose: bool) -> Result<()> {
    let filter = build_filter(verbose);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match sink {
        DiagnosticSink::Stderr => builder.with_writer(std::io::stderr).try_init(),
        DiagnosticSink::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| VgwError::io(parent, source))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| VgwError::io(path, source))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        DiagnosticSink::Discard => builder.with_writer(std::io::sink).try_init(),
    };

    // A second init (tests, embedded use) keeps the first subscriber.
    if let Err(error) = installed {
        tracing::debug!(%error, "tracing subscriber already installed");
    }
    Ok(())
}
