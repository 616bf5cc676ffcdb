//! Touch source infrastructure: device handles and the event multiplexer.
//!
//! On Linux, each candidate is opened through evdev (`/dev/input/eventN`) in
//! non-blocking mode, and readiness across all open devices is multiplexed
//! with `poll(2)`.  The engine in `application::assign_touch` only sees the
//! [`DeviceOpener`], [`TouchDevice`] and [`Multiplexer`] traits.
//!
//! # Platform implementations
//!
//! | Module  | OS    | API used                                  |
//! |---------|-------|-------------------------------------------|
//! | `linux` | Linux | `evdev::Device` + `fcntl(O_NONBLOCK)` + `poll(2)` |
//!
//! # Testability
//!
//! [`mock::ScriptedTouchBus`] is always compiled (not guarded by `#[cfg]`) so
//! unit and integration tests on any platform can script device activity
//! against a simulated clock.
//!
//! [`DeviceOpener`]: crate::application::assign_touch::DeviceOpener
//! [`TouchDevice`]: crate::application::assign_touch::TouchDevice
//! [`Multiplexer`]: crate::application::assign_touch::Multiplexer

pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

/// Re-export the evdev opener as `NativeDeviceOpener` on Linux.
#[cfg(target_os = "linux")]
pub use linux::EvdevOpener as NativeDeviceOpener;

/// Re-export the `poll(2)` multiplexer as `NativeMultiplexer` on Linux.
#[cfg(target_os = "linux")]
pub use linux::PollMultiplexer as NativeMultiplexer;
