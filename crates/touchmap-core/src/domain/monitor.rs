//! Monitor domain entity.
//!
//! A [`Monitor`] is a connected display output as reported by monitor
//! discovery.  Monitors are immutable once discovered: the engine only reads
//! the name (for pairing and output mapping) and the horizontal offset (which
//! the per-monitor consumer needs to translate touch coordinates).

use std::collections::BTreeMap;
use std::fmt;

/// Size and position of a monitor in the X screen coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorGeometry {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// X coordinate of the top-left corner.
    pub x_offset: i32,
    /// Y coordinate of the top-left corner.
    pub y_offset: i32,
}

/// A connected display output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    /// Output name, e.g. `"DP-1"` or `"HDMI-0"`.
    pub name: String,
    pub geometry: MonitorGeometry,
}

impl Monitor {
    pub fn new(name: impl Into<String>, geometry: MonitorGeometry) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    /// Horizontal offset handed to the consumer process.
    pub fn x_offset(&self) -> i32 {
        self.geometry.x_offset
    }
}

impl fmt::Display for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.geometry;
        write!(
            f,
            "{} ({}x{}+{}+{})",
            self.name, g.width, g.height, g.x_offset, g.y_offset
        )
    }
}

/// Name-keyed collection of discovered monitors.
///
/// Backed by a `BTreeMap` so iteration (and therefore every log line listing
/// the available outputs) is in stable name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorSet {
    monitors: BTreeMap<String, Monitor>,
}

impl MonitorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a monitor, replacing any previous entry with the same name.
    pub fn insert(&mut self, monitor: Monitor) {
        self.monitors.insert(monitor.name.clone(), monitor);
    }

    pub fn get(&self, name: &str) -> Option<&Monitor> {
        self.monitors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.monitors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monitor> {
        self.monitors.values()
    }

    /// Output names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.monitors.keys().cloned().collect()
    }
}

impl FromIterator<Monitor> for MonitorSet {
    fn from_iter<I: IntoIterator<Item = Monitor>>(iter: I) -> Self {
        let mut set = MonitorSet::new();
        for monitor in iter {
            set.insert(monitor);
        }
        set
    }
}
