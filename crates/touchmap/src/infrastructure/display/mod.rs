//! Monitor discovery: which outputs are connected and where they sit.
//!
//! The X server is queried with `xrandr`; every connected output with an
//! active mode becomes a [`Monitor`] keyed by its output name (`DP-1`,
//! `HDMI-2`, ...).  The slot bindings are later resolved against this set.
//!
//! [`MockMonitorDiscovery`] is always compiled so tests can supply a fixed
//! layout without an X server.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use touchmap_core::{Monitor, MonitorGeometry, MonitorSet};

use crate::infrastructure::process::{CommandError, CommandRunner};

/// Error type for monitor discovery.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// `xrandr` could not be run, usually because no X display is reachable.
    #[error("cannot query monitors (is X11 running?): {0}")]
    Command(#[from] CommandError),
}

/// Enumerates connected monitors.
pub trait MonitorDiscovery: Send + Sync {
    /// Returns every connected output that has an active mode.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError`] if the display server cannot be queried.
    fn discover_monitors(&self) -> Result<MonitorSet, DisplayError>;
}

/// [`MonitorDiscovery`] backed by `xrandr`.
pub struct XrandrMonitorDiscovery {
    runner: Arc<dyn CommandRunner>,
}

impl XrandrMonitorDiscovery {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl MonitorDiscovery for XrandrMonitorDiscovery {
    fn discover_monitors(&self) -> Result<MonitorSet, DisplayError> {
        let output = self.runner.run("xrandr", &[], false)?;
        let monitors = parse_xrandr(&output);
        debug!("xrandr reported {} connected monitor(s)", monitors.len());
        Ok(monitors)
    }
}

/// Parses `xrandr` output.
///
/// Only lines of the form `<name> connected [primary] <W>x<H>+<X>+<Y> ...`
/// produce a monitor.  Mode lines, disconnected outputs, and connected
/// outputs that are switched off are ignored.
pub fn parse_xrandr(output: &str) -> MonitorSet {
    output.lines().filter_map(parse_output_line).collect()
}

fn parse_output_line(line: &str) -> Option<Monitor> {
    let mut tokens = line.split_whitespace();
    let name = tokens.next()?;
    if tokens.next()? != "connected" {
        return None;
    }
    let mut geometry = tokens.next()?;
    if geometry == "primary" {
        geometry = tokens.next()?;
    }
    Some(Monitor::new(name, parse_geometry(geometry)?))
}

/// Parses `WxH+X+Y`.  Negative offsets appear as `+-X`.
fn parse_geometry(token: &str) -> Option<MonitorGeometry> {
    let (width, rest) = token.split_once('x')?;
    let (height, offsets) = rest.split_at(rest.find(['+', '-'])?);
    let (x_offset, offsets) = take_offset(offsets)?;
    let (y_offset, offsets) = take_offset(offsets)?;
    if !offsets.is_empty() {
        return None;
    }

    Some(MonitorGeometry {
        width: width.parse().ok()?,
        height: height.parse().ok()?,
        x_offset,
        y_offset,
    })
}

/// Splits one signed offset off the front of `s`.
fn take_offset(s: &str) -> Option<(i32, &str)> {
    let body = s.strip_prefix('+').unwrap_or(s);
    let digits_start = usize::from(body.starts_with('-'));
    let end = body[digits_start..]
        .find(['+', '-'])
        .map_or(body.len(), |i| i + digits_start);
    Some((body[..end].parse().ok()?, &body[end..]))
}

// ── Mock implementation (always compiled for tests) ───────────────────────────

/// A fixed monitor layout.
pub struct MockMonitorDiscovery {
    pub monitors: MonitorSet,
}

impl MockMonitorDiscovery {
    /// Four 1080x1920 portrait panels side by side, `DP-3` leftmost.
    pub fn quad_portrait() -> Self {
        let names = ["DP-3", "DP-2", "DP-1", "DP-4"];
        Self {
            monitors: names
                .iter()
                .zip(0..)
                .map(|(name, i)| {
                    Monitor::new(
                        *name,
                        MonitorGeometry {
                            width: 1080,
                            height: 1920,
                            x_offset: i * 1080,
                            y_offset: 0,
                        },
                    )
                })
                .collect(),
        }
    }

    /// A single 1920x1080 monitor on `HDMI-1`.
    pub fn single_1080p() -> Self {
        Self {
            monitors: std::iter::once(Monitor::new(
                "HDMI-1",
                MonitorGeometry {
                    width: 1920,
                    height: 1080,
                    x_offset: 0,
                    y_offset: 0,
                },
            ))
            .collect(),
        }
    }
}

impl MonitorDiscovery for MockMonitorDiscovery {
    fn discover_monitors(&self) -> Result<MonitorSet, DisplayError> {
        Ok(self.monitors.clone())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
