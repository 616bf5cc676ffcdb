//! Domain entities for the touch-to-monitor mapper.
//!
//! This module contains pure business data with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer of the workspace.  Domain code has **no** imports from
//! OS APIs, device drivers, or process management, so it compiles and tests
//! on any platform without any external setup.  Discovery and the assignment
//! engine live in the `touchmap` crate and depend on these types, never the
//! other way round.

/// Session outcome: pairings, unfilled slots, and session-level errors.
pub mod assignment;

/// Candidate input devices supplied by device discovery.
pub mod device;

/// Connected monitors and their geometry.
pub mod monitor;

/// Priority slots and the validated slot → monitor table.
pub mod slot;
