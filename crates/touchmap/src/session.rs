//! Session setup and reporting shared by the binary and the pipeline tests.
//!
//! [`discover_session`] runs monitor and device discovery and checks the
//! preconditions the assignment engine relies on.  Both discovery backends
//! shell out and block, so the binary calls it from a blocking task.

use thiserror::Error;
use tracing::info;

use touchmap_core::{AssignmentResult, CandidateDevice, PreconditionFailure, SlotBindings, SlotTarget};

use crate::infrastructure::display::{DisplayError, MonitorDiscovery};
use crate::infrastructure::input_devices::{DeviceDiscovery, DeviceDiscoveryError};

/// Error type for session setup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Devices(#[from] DeviceDiscoveryError),

    #[error(transparent)]
    Precondition(#[from] PreconditionFailure),
}

/// Everything the assignment engine needs for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInputs {
    /// Resolved slots in ascending order.
    pub targets: Vec<SlotTarget>,
    /// Touch devices in discovery order.
    pub candidates: Vec<CandidateDevice>,
}

/// Discovers monitors and touch devices and resolves the slot bindings.
///
/// # Errors
///
/// - [`SetupError::Display`] / [`SetupError::Devices`] when a discovery
///   backend cannot run at all.
/// - [`PreconditionFailure::MissingMonitors`] when a bound monitor is not
///   connected.
/// - [`PreconditionFailure::NoDevices`] when no touch device was found.
pub fn discover_session(
    monitors: &dyn MonitorDiscovery,
    devices: &dyn DeviceDiscovery,
    bindings: &SlotBindings,
) -> Result<SessionInputs, SetupError> {
    let connected = monitors.discover_monitors()?;
    info!("found {} connected monitor(s)", connected.len());
    let targets = bindings.resolve(&connected)?;

    let candidates = devices.discover_devices()?;
    if candidates.is_empty() {
        return Err(PreconditionFailure::NoDevices.into());
    }
    info!("found {} touch device(s)", candidates.len());
    for candidate in &candidates {
        info!("  {candidate}");
    }

    Ok(SessionInputs { targets, candidates })
}

/// One line per slot outcome: paired slots first, then unfilled ones.
///
/// Unfilled slots are listed even when nothing was paired, so a session
/// where every round timed out still says which monitors went untouched.
pub fn mapping_report(result: &AssignmentResult) -> Vec<String> {
    let paired = result.pairings().iter().map(|pairing| {
        format!(
            "{}: {} -> {}",
            pairing.slot, pairing.device.name, pairing.monitor.name
        )
    });
    let unfilled = result.unfilled().iter().map(|slot| format!("{slot}: (no touch)"));
    paired.chain(unfilled).collect()
}
