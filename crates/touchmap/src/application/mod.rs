//! Application layer use cases.
//!
//! Use cases in this layer orchestrate domain objects through traits and
//! contain no OS calls of their own; the infrastructure layer supplies the
//! evdev devices, `poll(2)` multiplexer and process spawner.
//!
//! # Sub-modules
//!
//! - **`assign_touch`** – The round-robin engine.  For each priority slot in
//!   order it waits for the first touch-down on any still-unassigned device
//!   and pairs that device with the slot's monitor.
//!
//! - **`launch_consumers`** – Turns each pairing into an
//!   `xinput map-to-output` call plus one consumer process, then waits for
//!   every consumer to exit.

pub mod assign_touch;
pub mod launch_consumers;
