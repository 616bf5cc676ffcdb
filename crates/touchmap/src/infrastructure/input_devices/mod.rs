//! Touch device discovery through the X input layer and udev.
//!
//! Discovery is three steps per device:
//!
//! 1. `xinput list` names every slave pointer and its X input id.
//! 2. `xinput list-props <id>` reveals the kernel event node
//!    (`Device Node (NNN): "/dev/input/eventN"`).
//! 3. `udevadm info -q property -n <node>` decides whether the node is a
//!    touchscreen or tablet.
//!
//! A device that fails any step is skipped; only a failing `xinput list`
//! aborts discovery.  The X input id is kept on the candidate because the
//! launcher later needs it for `xinput map-to-output`.
//!
//! Some drivers (xf86-input-wacom) register several X devices, e.g. stylus
//! and eraser, on one event node.  Only the first of those in list order
//! becomes a candidate.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use touchmap_core::CandidateDevice;

use crate::infrastructure::process::{CommandError, CommandRunner};

/// Error type for device discovery.
#[derive(Debug, Error)]
pub enum DeviceDiscoveryError {
    /// `xinput list` itself failed.
    #[error("cannot list input devices: {0}")]
    Command(#[from] CommandError),
}

/// Enumerates touch-capable input devices.
pub trait DeviceDiscovery: Send + Sync {
    /// Returns the candidates in discovery order.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceDiscoveryError`] if the device list cannot be read at
    /// all.  Per-device failures are skipped, not reported.
    fn discover_devices(&self) -> Result<Vec<CandidateDevice>, DeviceDiscoveryError>;
}

/// [`DeviceDiscovery`] backed by `xinput` and `udevadm`.
pub struct XinputDeviceDiscovery {
    runner: Arc<dyn CommandRunner>,
    /// Run `udevadm` through sudo when not already root.
    elevate_udev: bool,
}

impl XinputDeviceDiscovery {
    pub fn new(runner: Arc<dyn CommandRunner>, elevate_udev: bool) -> Self {
        Self {
            runner,
            elevate_udev,
        }
    }

    fn inspect(&self, name: &str, control_id: &str) -> Result<Option<CandidateDevice>, CommandError> {
        let props = self
            .runner
            .run("xinput", &["list-props".to_string(), control_id.to_string()], false)?;
        let Some(node) = parse_device_node(&props) else {
            debug!("{name} (id {control_id}) has no event node");
            return Ok(None);
        };

        let udev = self.runner.run(
            "udevadm",
            &[
                "info".to_string(),
                "-q".to_string(),
                "property".to_string(),
                "-n".to_string(),
                node.display().to_string(),
            ],
            self.elevate_udev,
        )?;
        if !is_touch_capable(&udev) {
            debug!("{name} ({}) is not a touch device", node.display());
            return Ok(None);
        }
        Ok(Some(CandidateDevice::new(name, control_id, node)))
    }
}

impl DeviceDiscovery for XinputDeviceDiscovery {
    fn discover_devices(&self) -> Result<Vec<CandidateDevice>, DeviceDiscoveryError> {
        let listing = self.runner.run("xinput", &["list".to_string()], false)?;

        let mut candidates = Vec::new();
        let mut seen_nodes = HashSet::new();
        for (name, control_id) in parse_xinput_list(&listing) {
            match self.inspect(&name, &control_id) {
                Ok(Some(candidate)) if !seen_nodes.insert(candidate.event_node.clone()) => {
                    debug!("{candidate} shares its event node with an earlier device, skipping");
                }
                Ok(Some(candidate)) => {
                    debug!("touch candidate: {candidate}");
                    candidates.push(candidate);
                }
                Ok(None) => {}
                Err(e) => debug!("skipping {name} (id {control_id}): {e}"),
            }
        }
        Ok(candidates)
    }
}

/// Extracts `(name, id)` for every slave pointer in `xinput list` output.
pub fn parse_xinput_list(output: &str) -> Vec<(String, String)> {
    output.lines().filter_map(parse_pointer_line).collect()
}

fn parse_pointer_line(line: &str) -> Option<(String, String)> {
    let (head, tail) = line.split_once("id=")?;
    let id: String = tail.chars().take_while(char::is_ascii_digit).collect();
    if id.is_empty() {
        return None;
    }

    let role = tail[id.len()..].split_whitespace().collect::<Vec<_>>().join(" ");
    if !role.starts_with("[slave pointer") {
        return None;
    }

    // Strip the tree-drawing prefix (`⎜   ↳ `).
    let name = head
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), id))
}

/// Finds the `Device Node` property in `xinput list-props` output.
pub fn parse_device_node(props: &str) -> Option<PathBuf> {
    props
        .lines()
        .filter(|line| line.trim_start().starts_with("Device Node ("))
        .find_map(|line| {
            let (_, quoted) = line.split_once('"')?;
            let (node, _) = quoted.split_once('"')?;
            node.starts_with("/dev/input/event").then(|| PathBuf::from(node))
        })
}

/// True when udev tags the node as a touchscreen or tablet.
pub fn is_touch_capable(udev_properties: &str) -> bool {
    udev_properties
        .lines()
        .map(str::trim)
        .any(|line| line == "ID_INPUT_TOUCHSCREEN=1" || line == "ID_INPUT_TABLET=1")
}

// ── Mock implementation (always compiled for tests) ───────────────────────────

/// A fixed list of candidates.
pub struct MockDeviceDiscovery {
    pub devices: Vec<CandidateDevice>,
}

impl MockDeviceDiscovery {
    /// `count` identical panels on consecutive event nodes, ids from 11.
    pub fn touch_panels(count: usize) -> Self {
        Self {
            devices: (0..count)
                .map(|i| {
                    CandidateDevice::new(
                        format!("ILITEK ILITEK-TP #{}", i + 1),
                        (11 + i).to_string(),
                        format!("/dev/input/event{}", 5 + i),
                    )
                })
                .collect(),
        }
    }
}

impl DeviceDiscovery for MockDeviceDiscovery {
    fn discover_devices(&self) -> Result<Vec<CandidateDevice>, DeviceDiscoveryError> {
        Ok(self.devices.clone())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::process::MockCommandRunner;

    const XINPUT_LIST: &str = "\
⎡ Virtual core pointer                    \tid=2\t[master pointer  (3)]
⎜   ↳ Virtual core XTEST pointer              \tid=4\t[slave  pointer  (2)]
⎜   ↳ ILITEK ILITEK-TP                        \tid=11\t[slave  pointer  (2)]
⎜   ↳ Wacom One Pen Display 13 Pen stylus     \tid=12\t[slave  pointer  (2)]
⎜   ↳ Logitech USB Optical Mouse              \tid=13\t[slave  pointer  (2)]
⎣ Virtual core keyboard                   \tid=3\t[master keyboard (2)]
    ↳ Virtual core XTEST keyboard             \tid=5\t[slave  keyboard (3)]
    ↳ Power Button                            \tid=6\t[slave  keyboard (3)]
";

    fn props_with_node(node: &str) -> String {
        format!(
            "Device 'x':\n\tDevice Enabled (187):\t1\n\tDevice Node (310):\t\"{node}\"\n\tDevice Product ID (311):\t8746, 1\n"
        )
    }

    // ── Parsers ───────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_xinput_list_keeps_only_slave_pointers() {
        // Act
        let pointers = parse_xinput_list(XINPUT_LIST);

        // Assert
        let ids: Vec<&str> = pointers.iter().map(|(_, id)| id.as_str()).collect();
        assert_eq!(ids, vec!["4", "11", "12", "13"]);
    }

    #[test]
    fn test_parse_xinput_list_strips_tree_prefix_from_names() {
        let pointers = parse_xinput_list(XINPUT_LIST);
        assert_eq!(pointers[1].0, "ILITEK ILITEK-TP");
        assert_eq!(pointers[2].0, "Wacom One Pen Display 13 Pen stylus");
    }

    #[test]
    fn test_parse_device_node_finds_event_path() {
        let props = props_with_node("/dev/input/event7");
        assert_eq!(parse_device_node(&props), Some(PathBuf::from("/dev/input/event7")));
    }

    #[test]
    fn test_parse_device_node_absent_for_virtual_devices() {
        let props = "Device 'Virtual core XTEST pointer':\n\tDevice Enabled (187):\t1\n\tXTEST Device (313):\t1\n";
        assert_eq!(parse_device_node(props), None);
    }

    #[test]
    fn test_is_touch_capable_accepts_touchscreen_and_tablet() {
        assert!(is_touch_capable("ID_INPUT=1\nID_INPUT_TOUCHSCREEN=1\n"));
        assert!(is_touch_capable("ID_INPUT=1\nID_INPUT_TABLET=1\n"));
    }

    #[test]
    fn test_is_touch_capable_rejects_mouse() {
        assert!(!is_touch_capable("ID_INPUT=1\nID_INPUT_MOUSE=1\nID_INPUT_TOUCHSCREEN=0\n"));
    }

    // ── XinputDeviceDiscovery with a mocked runner ────────────────────────────

    fn udev_for(node: &str) -> &'static str {
        match node {
            "/dev/input/event5" => "ID_INPUT=1\nID_INPUT_TOUCHSCREEN=1\n",
            "/dev/input/event6" => "ID_INPUT=1\nID_INPUT_TABLET=1\n",
            _ => "ID_INPUT=1\nID_INPUT_MOUSE=1\n",
        }
    }

    fn scripted_runner() -> MockCommandRunner {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|program, args, _| program == "xinput" && args.len() == 1)
            .returning(|_, _, _| Ok(XINPUT_LIST.to_string()));
        runner
            .expect_run()
            .withf(|program, args, _| program == "xinput" && args.first().is_some_and(|a| a == "list-props"))
            .returning(|_, args, _| match args[1].as_str() {
                "4" => Ok("Device 'Virtual core XTEST pointer':\n\tXTEST Device (313):\t1\n".to_string()),
                "11" => Ok(props_with_node("/dev/input/event5")),
                "12" => Ok(props_with_node("/dev/input/event6")),
                _ => Ok(props_with_node("/dev/input/event9")),
            });
        runner
            .expect_run()
            .withf(|program, _, elevated| program == "udevadm" && *elevated)
            .returning(|_, args, _| Ok(udev_for(&args[4]).to_string()));
        runner
    }

    #[test]
    fn test_discovery_returns_touch_devices_in_list_order() {
        // Arrange
        let discovery = XinputDeviceDiscovery::new(Arc::new(scripted_runner()), true);

        // Act
        let devices = discovery.discover_devices().expect("discover");

        // Assert
        assert_eq!(
            devices,
            vec![
                CandidateDevice::new("ILITEK ILITEK-TP", "11", "/dev/input/event5"),
                CandidateDevice::new("Wacom One Pen Display 13 Pen stylus", "12", "/dev/input/event6"),
            ]
        );
    }

    #[test]
    fn test_discovery_skips_device_whose_lookup_fails() {
        // Arrange: list-props for id 11 fails; the tablet is still found.
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|program, args, _| program == "xinput" && args.len() == 1)
            .returning(|_, _, _| Ok(XINPUT_LIST.to_string()));
        runner
            .expect_run()
            .withf(|program, args, _| program == "xinput" && args.len() == 2)
            .returning(|program, args, _| {
                if args[1] == "11" {
                    Err(CommandError::Failed {
                        program: program.to_string(),
                        status: Some(1),
                        stderr: "unable to find device 11".to_string(),
                    })
                } else if args[1] == "12" {
                    Ok(props_with_node("/dev/input/event6"))
                } else {
                    Ok(String::new())
                }
            });
        runner
            .expect_run()
            .withf(|program, _, _| program == "udevadm")
            .returning(|_, args, _| Ok(udev_for(&args[4]).to_string()));
        let discovery = XinputDeviceDiscovery::new(Arc::new(runner), false);

        // Act
        let devices = discovery.discover_devices().expect("discover");

        // Assert
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].control_id, "12");
    }

    #[test]
    fn test_discovery_keeps_first_device_on_a_shared_event_node() {
        // Arrange: ids 12 and 13 are two X devices on the same tablet node.
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|program, args, _| program == "xinput" && args.len() == 1)
            .returning(|_, _, _| Ok(XINPUT_LIST.to_string()));
        runner
            .expect_run()
            .withf(|program, args, _| program == "xinput" && args.len() == 2)
            .returning(|_, args, _| match args[1].as_str() {
                "12" | "13" => Ok(props_with_node("/dev/input/event6")),
                _ => Ok(String::new()),
            });
        runner
            .expect_run()
            .withf(|program, _, _| program == "udevadm")
            .returning(|_, args, _| Ok(udev_for(&args[4]).to_string()));
        let discovery = XinputDeviceDiscovery::new(Arc::new(runner), false);

        // Act
        let devices = discovery.discover_devices().expect("discover");

        // Assert
        assert_eq!(
            devices,
            vec![CandidateDevice::new(
                "Wacom One Pen Display 13 Pen stylus",
                "12",
                "/dev/input/event6"
            )]
        );
    }

    #[test]
    fn test_discovery_fails_when_xinput_list_fails() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|program, _, _| {
            Err(CommandError::Spawn {
                program: program.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        });
        let discovery = XinputDeviceDiscovery::new(Arc::new(runner), true);

        assert!(matches!(
            discovery.discover_devices(),
            Err(DeviceDiscoveryError::Command(_))
        ));
    }

    #[test]
    fn test_mock_touch_panels_have_distinct_nodes() {
        let devices = MockDeviceDiscovery::touch_panels(3)
            .discover_devices()
            .expect("mock never fails");
        assert_eq!(devices[2].event_node, PathBuf::from("/dev/input/event7"));
    }
}
