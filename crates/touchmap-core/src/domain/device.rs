//! Candidate input device supplied by device discovery.

use std::fmt;
use std::path::{Path, PathBuf};

/// A touch-capable input source eligible for assignment.
///
/// The engine treats this as an opaque token: it opens `event_node` to listen
/// for touches and hands the whole record back inside a
/// [`Pairing`](super::assignment::Pairing).  `control_id` is only consumed by
/// the output-mapping step after the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateDevice {
    /// Human-readable device name, e.g. `"ILITEK ILITEK-TP"`.
    pub name: String,
    /// Identifier used by the display server to route this device's input
    /// (the X input device id).
    pub control_id: String,
    /// Kernel event node, e.g. `/dev/input/event7`.  Unique per device.
    pub event_node: PathBuf,
}

impl CandidateDevice {
    pub fn new(
        name: impl Into<String>,
        control_id: impl Into<String>,
        event_node: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            control_id: control_id.into(),
            event_node: event_node.into(),
        }
    }

    /// Identity of the device within a session.
    pub fn id(&self) -> &Path {
        &self.event_node
    }
}

impl fmt::Display for CandidateDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.event_node.display())
    }
}
