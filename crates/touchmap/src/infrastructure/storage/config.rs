//! TOML configuration for a mapping session.
//!
//! Read from `--config <PATH>` when given, otherwise from
//! `$XDG_CONFIG_HOME/touchmap/config.toml` (falling back to
//! `~/.config/touchmap/config.toml`).  A missing file is not an error: every
//! field has a default, so a fresh machine with four `DP-*` outputs works
//! without any configuration.
//!
//! ```toml
//! [session]
//! round_timeout_secs = 60
//! poll_slice_ms = 1000
//! max_consecutive_read_failures = 3
//! log_level = "info"
//!
//! [[session.slots]]
//! slot = 1
//! monitor = "DP-3"
//!
//! [consumer]
//! app_path = "/usr/local/bin/drawing_app"
//! use_sudo_for_discovery = true
//! invert = true
//! ```
//!
//! Fields annotated with `#[serde(default = "some_fn")]` take the value of
//! `some_fn()` when absent, so older or partial files keep working.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use touchmap_core::{BindingError, PrioritySlot, SlotBindings};

use crate::application::assign_touch::AssignmentSettings;
use crate::application::launch_consumers::ConsumerSettings;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `[[session.slots]]` table is not a valid slot → monitor mapping.
    #[error("invalid slot bindings: {0}")]
    InvalidBindings(#[from] BindingError),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub consumer: ConsumerConfig,
}

/// Assignment session settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Seconds each slot waits for a touch before it is left unfilled.
    #[serde(default = "default_round_timeout_secs")]
    pub round_timeout_secs: u64,
    /// Longest single wait on the devices, in milliseconds.  Ctrl-C is
    /// noticed at this granularity.
    #[serde(default = "default_poll_slice_ms")]
    pub poll_slice_ms: u64,
    /// Back-to-back read failures before a device is dropped.  `0` never drops.
    #[serde(default = "default_max_consecutive_read_failures")]
    pub max_consecutive_read_failures: u32,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Slot → monitor table, in any order.
    #[serde(default = "default_slots")]
    pub slots: Vec<SlotEntry>,
}

/// One `[[session.slots]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotEntry {
    pub slot: PrioritySlot,
    pub monitor: String,
}

/// Per-monitor consumer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Binary started once per pairing.
    #[serde(default = "default_app_path")]
    pub app_path: PathBuf,
    /// Run `udevadm` through `sudo -S` during discovery.
    #[serde(default = "default_true")]
    pub use_sudo_for_discovery: bool,
    /// Pass `--invert` to every consumer.
    #[serde(default = "default_true")]
    pub invert: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_round_timeout_secs() -> u64 {
    60
}
fn default_poll_slice_ms() -> u64 {
    1000
}
fn default_max_consecutive_read_failures() -> u32 {
    3
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_app_path() -> PathBuf {
    PathBuf::from("/usr/local/bin/drawing_app")
}

/// Slots 1-4 bound to `DP-3`, `DP-2`, `DP-1`, `DP-4`.
fn default_slots() -> Vec<SlotEntry> {
    ["DP-3", "DP-2", "DP-1", "DP-4"]
        .iter()
        .zip(1u8..)
        .filter_map(|(monitor, n)| {
            PrioritySlot::new(n).map(|slot| SlotEntry {
                slot,
                monitor: (*monitor).to_string(),
            })
        })
        .collect()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            round_timeout_secs: default_round_timeout_secs(),
            poll_slice_ms: default_poll_slice_ms(),
            max_consecutive_read_failures: default_max_consecutive_read_failures(),
            log_level: default_log_level(),
            slots: default_slots(),
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            app_path: default_app_path(),
            use_sudo_for_discovery: default_true(),
            invert: default_true(),
        }
    }
}

impl AppConfig {
    /// Validates the slot table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBindings`] for an empty table, duplicate
    /// slots or monitors, or a gap in the slot numbering.
    pub fn slot_bindings(&self) -> Result<SlotBindings, ConfigError> {
        let entries = self
            .session
            .slots
            .iter()
            .map(|entry| (entry.slot, entry.monitor.clone()));
        Ok(SlotBindings::new(entries)?)
    }

    /// Engine settings.  A zero poll slice is raised to one millisecond.
    pub fn assignment_settings(&self) -> AssignmentSettings {
        AssignmentSettings {
            round_timeout: Duration::from_secs(self.session.round_timeout_secs),
            poll_slice: Duration::from_millis(self.session.poll_slice_ms.max(1)),
            max_consecutive_read_failures: self.session.max_consecutive_read_failures,
        }
    }

    /// Launcher settings.
    pub fn consumer_settings(&self) -> ConsumerSettings {
        ConsumerSettings {
            app_path: self.consumer.app_path.clone(),
            invert: self.consumer.invert,
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Resolves the default config file path.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if neither `XDG_CONFIG_HOME`
/// nor `HOME` is set.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the config from `path`, or from [`config_file_path`] when `None`.
///
/// A file that does not exist yields `AppConfig::default()`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// `$XDG_CONFIG_HOME/touchmap` or `~/.config/touchmap`.
fn platform_config_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join("touchmap"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
