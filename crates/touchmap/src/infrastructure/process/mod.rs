//! Process infrastructure: one-shot command execution and consumer spawning.
//!
//! - [`CommandRunner`] runs a short-lived tool (`xrandr`, `xinput`,
//!   `udevadm`) to completion and returns its stdout.  Discovery depends on
//!   this trait so tests can feed canned output.
//! - [`spawner::TokioProcessSpawner`] implements the launch use case's
//!   `ProcessSpawner` seam on top of `tokio::process`.

use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use touchmap_core::PreconditionFailure;

pub mod spawner;

/// Error type for external command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started at all (e.g. not installed).
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully.
    #[error("{program} exited with {}: {stderr}", describe_status(.status))]
    Failed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Runs external commands to completion.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` and returns its trimmed stdout.
    ///
    /// When `elevated` is set and the process is not already root, the
    /// command is wrapped in `sudo -S`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the program cannot be started or exits
    /// with a non-zero status.
    fn run(&self, program: &str, args: &[String], elevated: bool) -> Result<String, CommandError>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String], elevated: bool) -> Result<String, CommandError> {
        let argv = build_argv(program, args, elevated && !is_root());
        debug!("executing: {}", argv.join(" "));

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .output()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(CommandError::Failed {
                program: program.to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Full argument vector, with the `sudo -S` prefix when requested.
fn build_argv(program: &str, args: &[String], sudo: bool) -> Vec<String> {
    let mut argv = Vec::with_capacity(args.len() + 3);
    if sudo {
        argv.push("sudo".to_string());
        argv.push("-S".to_string());
    }
    argv.push(program.to_string());
    argv.extend(args.iter().cloned());
    argv
}

#[cfg(target_os = "linux")]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(target_os = "linux"))]
fn is_root() -> bool {
    false
}

/// Checks that the per-monitor consumer binary exists before any discovery.
///
/// # Errors
///
/// Returns [`PreconditionFailure::ConsumerMissing`] when `path` is not a file.
pub fn ensure_consumer_exists(path: &Path) -> Result<(), PreconditionFailure> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PreconditionFailure::ConsumerMissing(path.to_path_buf()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
