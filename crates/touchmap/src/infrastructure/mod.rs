//! Infrastructure layer.
//!
//! Contains OS-facing adapters: evdev touch sources, `xrandr` and
//! `xinput`/`udevadm` discovery, process execution, and config file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `touchmap_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod display;
pub mod input_devices;
pub mod process;
pub mod storage;
pub mod touch_source;
