//! # touchmap-core
//!
//! Shared library for the touch-to-monitor mapper containing the domain
//! entities (monitors, candidate devices, priority slots, pairings) and the
//! touch classifier.
//!
//! This crate has zero dependencies on OS APIs, device nodes, or processes.
//!
//! # Architecture overview (for beginners)
//!
//! A machine has several touchscreens and several monitors, but nothing tells
//! us which panel is glued to which display.  The mapper asks a person to tap
//! each screen in a fixed order ("slot 1 first, then slot 2, ...") and pairs
//! the device that produced each tap with the monitor bound to that slot.
//!
//! This crate (`touchmap-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – Pure data: `Monitor`, `CandidateDevice`, `PrioritySlot`,
//!   the validated slot → monitor table (`SlotBindings`) and the outcome of a
//!   session (`Pairing`, `AssignmentResult`).
//!
//! - **`input`** – The raw event type read from a device and the classifier
//!   that decides whether an event is a touch-down.

pub mod domain;
pub mod input;

pub use domain::assignment::{AssignmentError, AssignmentResult, Pairing, PreconditionFailure};
pub use domain::device::CandidateDevice;
pub use domain::monitor::{Monitor, MonitorGeometry, MonitorSet};
pub use domain::slot::{BindingError, PrioritySlot, SlotBindings, SlotTarget};
pub use input::classify::{classify, TouchClass};
pub use input::event::RawEvent;
