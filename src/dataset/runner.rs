//! Subprocess seam: run a program, get its exit status and output.

#![allow(missing_docs)]

use std::process::Command;

use tracing::debug;

use crate::core::errors::{Result, VgwError};

/// Captured result of one finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit code as text, or `signal` when the process was killed.
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout followed by stderr, trimmed (what an operator would see in a shell).
    #[must_use]
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        text.push_str(self.stdout.trim_end());
        if !self.stdout.trim().is_empty() && !self.stderr.trim().is_empty() {
            text.push('\n');
        }
        text.push_str(self.stderr.trim_end());
        text.trim().to_string()
    }

    /// Convert a non-zero exit into a `Subprocess` error carrying the combined output.
    pub fn into_result(self, program: &str, args: &[String]) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(VgwError::Subprocess {
                command: render_command(program, args),
                status: self.status.clone(),
                output: self.combined(),
            })
        }
    }
}

/// Runs external programs to completion. Blocking, no timeout.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!(command = %render_command(program, args), "spawning");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| VgwError::io(program, source))?;
        let status = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |code| code.to_string());
        debug!(program, status = %status, "finished");
        Ok(CommandOutput {
            success: output.status.success(),
            status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// `zfs list -H ...` style rendering for messages.
#[must_use]
pub fn render_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_joins_both_streams() {
        let out = CommandOutput {
            success: false,
            status: "1".into(),
            stdout: "partial\n".into(),
            stderr: "cannot create 'tank/b': dataset already exists\n".into(),
        };
        assert_eq!(
            out.combined(),
            "partial\ncannot create 'tank/b': dataset already exists"
        );
    }

    #[test]
    fn failure_becomes_subprocess_error() {
        let out = CommandOutput {
            success: false,
            status: "2".into(),
            stdout: String::new(),
            stderr: "cannot destroy: dataset is busy".into(),
        };
        let err = out
            .into_result("zfs", &["destroy".to_string(), "-r".to_string(), "tank/b".to_string()])
            .unwrap_err();
        assert_eq!(err.code(), "VGW-2001");
        let text = err.to_string();
        assert!(text.contains("zfs destroy -r tank/b failed (exit 2)"), "{text}");
        assert!(err.is_busy_or_not_empty());
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_output() {
        let out = SystemRunner
            .run("sh", &["-c".to_string(), "echo hi; echo oops >&2; exit 3".to_string()])
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.status, "3");
        assert_eq!(out.stdout.trim(), "hi");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn missing_program_is_io_error() {
        let err = SystemRunner
            .run("definitely-not-a-real-binary-vgw", &[])
            .unwrap_err();
        assert!(matches!(err, VgwError::Io { .. }));
    }
}
