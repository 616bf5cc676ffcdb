//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML configuration from an explicit path
//! or the XDG config directory, and supplies defaults when no file exists.

pub mod config;
