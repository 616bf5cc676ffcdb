//! Priority slots and the slot → monitor binding table.
//!
//! A session runs one round per [`PrioritySlot`], in ascending order.  Each
//! slot is bound at configuration time to exactly one monitor name; the
//! binding is injective (two slots never share a monitor).  [`SlotBindings`]
//! enforces that at construction so the engine can simply assume it.

use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroU8;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::assignment::PreconditionFailure;
use super::monitor::{Monitor, MonitorSet};

/// Errors that can occur when building a [`SlotBindings`] table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    /// Slot numbers start at 1.
    #[error("priority slot numbers start at 1")]
    ZeroSlot,

    /// The table contains no slots at all.
    #[error("at least one priority slot must be bound")]
    Empty,

    /// The same slot number appears twice.
    #[error("{0} is bound more than once")]
    DuplicateSlot(PrioritySlot),

    /// Two slots point at the same monitor.
    #[error("monitor {monitor} is bound to both {first} and {second}")]
    DuplicateMonitor {
        monitor: String,
        first: PrioritySlot,
        second: PrioritySlot,
    },

    /// Slots must be numbered 1..=N without holes.
    #[error("priority slots must be contiguous from 1; {0} is missing")]
    Gap(PrioritySlot),
}

/// One of the N sequential assignment rounds, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PrioritySlot(NonZeroU8);

impl PrioritySlot {
    /// Returns `None` for 0.
    pub fn new(n: u8) -> Option<Self> {
        NonZeroU8::new(n).map(Self)
    }

    pub fn get(self) -> u8 {
        self.0.get()
    }
}

impl TryFrom<u8> for PrioritySlot {
    type Error = BindingError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::new(n).ok_or(BindingError::ZeroSlot)
    }
}

impl From<PrioritySlot> for u8 {
    fn from(slot: PrioritySlot) -> Self {
        slot.get()
    }
}

impl fmt::Display for PrioritySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

/// A priority slot resolved against the discovered monitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTarget {
    pub slot: PrioritySlot,
    pub monitor: Monitor,
}

/// Immutable, validated slot → monitor-name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBindings {
    /// Sorted by slot; index `i` holds slot `i + 1`.
    entries: Vec<(PrioritySlot, String)>,
}

impl SlotBindings {
    /// Validates and builds the table.
    ///
    /// # Errors
    ///
    /// Returns a [`BindingError`] when the table is empty, a slot or monitor
    /// is repeated, or the slot numbers are not exactly `1..=N`.
    pub fn new<I, S>(entries: I) -> Result<Self, BindingError>
    where
        I: IntoIterator<Item = (PrioritySlot, S)>,
        S: Into<String>,
    {
        let mut entries: Vec<(PrioritySlot, String)> = entries
            .into_iter()
            .map(|(slot, monitor)| (slot, monitor.into()))
            .collect();
        if entries.is_empty() {
            return Err(BindingError::Empty);
        }
        entries.sort_by_key(|(slot, _)| *slot);

        let mut seen_monitors: Vec<(&str, PrioritySlot)> = Vec::with_capacity(entries.len());
        let mut seen_slots = HashSet::with_capacity(entries.len());
        for (slot, monitor) in &entries {
            if !seen_slots.insert(*slot) {
                return Err(BindingError::DuplicateSlot(*slot));
            }
            if let Some((_, first)) = seen_monitors.iter().find(|(m, _)| *m == monitor.as_str()) {
                return Err(BindingError::DuplicateMonitor {
                    monitor: monitor.clone(),
                    first: *first,
                    second: *slot,
                });
            }
            seen_monitors.push((monitor.as_str(), *slot));
        }

        for (index, (slot, _)) in entries.iter().enumerate() {
            let expected = index + 1;
            if usize::from(slot.get()) != expected {
                // Sorted and duplicate-free, so the first mismatch names the hole.
                let missing = u8::try_from(expected)
                    .ok()
                    .and_then(PrioritySlot::new)
                    .unwrap_or(*slot);
                return Err(BindingError::Gap(missing));
            }
        }

        Ok(Self { entries })
    }

    /// Number of slots (N).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Monitor name bound to `slot`.
    pub fn monitor_for(&self, slot: PrioritySlot) -> Option<&str> {
        self.entries
            .get(usize::from(slot.get()) - 1)
            .map(|(_, name)| name.as_str())
    }

    /// Iterates `(slot, monitor name)` in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (PrioritySlot, &str)> {
        self.entries.iter().map(|(slot, name)| (*slot, name.as_str()))
    }

    /// Resolves every binding against the discovered monitors.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionFailure::MissingMonitors`] listing every binding
    /// whose monitor is not connected, together with the names that are.
    pub fn resolve(&self, monitors: &MonitorSet) -> Result<Vec<SlotTarget>, PreconditionFailure> {
        let mut targets = Vec::with_capacity(self.entries.len());
        let mut missing = Vec::new();
        for (slot, name) in self.iter() {
            match monitors.get(name) {
                Some(monitor) => targets.push(SlotTarget {
                    slot,
                    monitor: monitor.clone(),
                }),
                None => missing.push((slot, name.to_string())),
            }
        }

        if missing.is_empty() {
            Ok(targets)
        } else {
            Err(PreconditionFailure::MissingMonitors {
                missing,
                available: monitors.names(),
            })
        }
    }
}
