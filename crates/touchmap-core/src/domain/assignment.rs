//! Session outcome: pairings, unfilled slots, and session-level errors.
//!
//! An [`AssignmentResult`] is built incrementally by the assignment engine,
//! one round at a time, and then handed to the launch step.  It upholds two
//! invariants that downstream code relies on:
//!
//! - Pairings are stored in strictly increasing [`PrioritySlot`] order.
//! - No [`CandidateDevice`] appears in more than one pairing.

use std::path::PathBuf;

use thiserror::Error;

use super::device::CandidateDevice;
use super::monitor::Monitor;
use super::slot::PrioritySlot;

/// Failures detected before the engine starts.  All of them are fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionFailure {
    /// One or more bound monitors are not connected.
    #[error("missing monitors: {}; available: {}", format_missing(.missing), .available.join(", "))]
    MissingMonitors {
        missing: Vec<(PrioritySlot, String)>,
        available: Vec<String>,
    },

    /// Device discovery found no touch-capable device at all.
    #[error("no touch-capable input devices found")]
    NoDevices,

    /// The per-monitor consumer binary does not exist.
    #[error("consumer application not found at {}", .0.display())]
    ConsumerMissing(PathBuf),
}

fn format_missing(missing: &[(PrioritySlot, String)]) -> String {
    missing
        .iter()
        .map(|(slot, name)| format!("{slot} -> {name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Session-level errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionFailure),

    /// Every round ended without a pairing.
    #[error("no touch was attributed to any priority slot")]
    EmptyResult,

    /// The session was interrupted before all slots were attempted.
    #[error("assignment cancelled after {paired} pairing(s)")]
    Cancelled { paired: usize },
}

/// One completed round: the device that touched first during `slot`'s round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub slot: PrioritySlot,
    pub monitor: Monitor,
    pub device: CandidateDevice,
}

/// The ordered outcome of a whole session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    pairings: Vec<Pairing>,
    unfilled: Vec<PrioritySlot>,
    cancelled: bool,
}

impl AssignmentResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the pairing for a completed round.
    ///
    /// Callers run rounds in ascending slot order and remove the winning
    /// device from the pool, so both invariants hold by construction; they are
    /// re-checked in debug builds.
    pub fn record_pairing(&mut self, pairing: Pairing) {
        debug_assert!(
            self.last_slot().map_or(true, |last| last < pairing.slot),
            "pairings must be recorded in increasing slot order"
        );
        debug_assert!(
            !self.pairings.iter().any(|p| p.device.id() == pairing.device.id()),
            "a device can only be paired once"
        );
        self.pairings.push(pairing);
    }

    /// Records that `slot`'s round ended without a winner.
    pub fn record_unfilled(&mut self, slot: PrioritySlot) {
        self.unfilled.push(slot);
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    fn last_slot(&self) -> Option<PrioritySlot> {
        let paired = self.pairings.last().map(|p| p.slot);
        let unfilled = self.unfilled.last().copied();
        paired.max(unfilled)
    }

    /// Pairings in slot order.
    pub fn pairings(&self) -> &[Pairing] {
        &self.pairings
    }

    /// Slots whose round timed out, ran out of devices, or was skipped.
    pub fn unfilled(&self) -> &[PrioritySlot] {
        &self.unfilled
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_empty(&self) -> bool {
        self.pairings.is_empty()
    }

    /// Returns the pairings if the session completed with at least one.
    ///
    /// # Errors
    ///
    /// - [`AssignmentError::Cancelled`] if the session was interrupted.
    /// - [`AssignmentError::EmptyResult`] if no round produced a pairing.
    pub fn into_pairings(self) -> Result<Vec<Pairing>, AssignmentError> {
        if self.cancelled {
            return Err(AssignmentError::Cancelled {
                paired: self.pairings.len(),
            });
        }
        if self.pairings.is_empty() {
            return Err(AssignmentError::EmptyResult);
        }
        Ok(self.pairings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::monitor::MonitorGeometry;

    fn slot(n: u8) -> PrioritySlot {
        PrioritySlot::new(n).unwrap()
    }

    fn pairing(n: u8, monitor: &str, node: &str) -> Pairing {
        Pairing {
            slot: slot(n),
            monitor: Monitor::new(
                monitor,
                MonitorGeometry {
                    width: 1080,
                    height: 1920,
                    x_offset: 0,
                    y_offset: 0,
                },
            ),
            device: CandidateDevice::new("panel", "11", node),
        }
    }

    #[test]
    fn test_result_keeps_pairings_and_unfilled_slots() {
        // Arrange
        let mut result = AssignmentResult::new();

        // Act
        result.record_pairing(pairing(1, "DP-3", "/dev/input/event5"));
        result.record_unfilled(slot(2));
        result.record_pairing(pairing(3, "DP-1", "/dev/input/event6"));

        // Assert
        assert_eq!(result.pairings().len(), 2);
        assert_eq!(result.unfilled(), &[slot(2)]);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_into_pairings_on_empty_result_is_empty_result_error() {
        let mut result = AssignmentResult::new();
        result.record_unfilled(slot(1));

        assert_eq!(result.into_pairings(), Err(AssignmentError::EmptyResult));
    }

    #[test]
    fn test_into_pairings_on_cancelled_session_reports_partial_count() {
        let mut result = AssignmentResult::new();
        result.record_pairing(pairing(1, "DP-3", "/dev/input/event5"));
        result.mark_cancelled();

        assert_eq!(
            result.into_pairings(),
            Err(AssignmentError::Cancelled { paired: 1 })
        );
    }

    #[test]
    fn test_into_pairings_returns_pairings_in_slot_order() {
        let mut result = AssignmentResult::new();
        result.record_pairing(pairing(1, "DP-3", "/dev/input/event5"));
        result.record_pairing(pairing(2, "DP-2", "/dev/input/event6"));

        let pairings = result.into_pairings().expect("non-empty");
        let slots: Vec<u8> = pairings.iter().map(|p| p.slot.get()).collect();
        assert_eq!(slots, vec![1, 2]);
    }

    #[test]
    fn test_missing_monitors_message_lists_bindings() {
        let err = PreconditionFailure::MissingMonitors {
            missing: vec![(slot(4), "DP-4".to_string())],
            available: vec!["DP-1".to_string(), "DP-2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "missing monitors: slot 4 -> DP-4; available: DP-1, DP-2"
        );
    }
}
