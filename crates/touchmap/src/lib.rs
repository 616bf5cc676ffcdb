//! touchmap library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does touchmap do? (for beginners)
//!
//! A kiosk with several touch monitors has no reliable way to know which
//! touch panel sits on top of which display.  touchmap finds out by asking:
//!
//! 1. It discovers the connected monitors (`xrandr`) and the touch-capable
//!    input devices (`xinput` + `udevadm`).
//! 2. For each priority slot in turn it waits for somebody to tap the screen
//!    bound to that slot, and attributes the tap to the device that produced
//!    it.
//! 3. It routes each paired device to its monitor and starts one consumer
//!    application per monitor.

pub mod application;
pub mod infrastructure;
pub mod session;
