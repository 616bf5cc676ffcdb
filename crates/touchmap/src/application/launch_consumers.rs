//! LaunchConsumersUseCase: hands each pairing to its per-monitor consumer.
//!
//! For every pairing, in slot order:
//!
//! 1. Route the device's input to the paired monitor
//!    (`xinput map-to-output <control_id> <monitor>`), so absolute touch
//!    coordinates land on the right output.
//! 2. Start one consumer process for that monitor, telling it which event node
//!    to read and the monitor's horizontal offset.
//!
//! A failure for one pairing is logged and the remaining pairings still
//! launch.  Once everything is started, [`LaunchConsumersUseCase::wait_all`]
//! blocks until every consumer has exited.
//!
//! # Architecture
//!
//! The argument construction ([`plan_launch`]) is a pure function.  Process
//! creation sits behind the [`ProcessSpawner`] trait; the Tokio
//! implementation lives in `infrastructure::process::spawner`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use touchmap_core::{Pairing, PrioritySlot};

/// Error type for launching commands.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited unsuccessfully ({status:?})")]
    Failed { program: String, status: Option<i32> },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// A fully specified command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables on top of the inherited environment.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// The command as it would be typed in a shell, for logging.
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How the per-monitor consumer is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerSettings {
    /// Absolute path of the consumer binary.
    pub app_path: PathBuf,
    /// Pass `--invert` to the consumer.
    pub invert: bool,
}

/// X session variables forwarded to every consumer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionEnv {
    pub display: Option<String>,
    pub xauthority: Option<String>,
    pub home: Option<PathBuf>,
}

impl SessionEnv {
    /// Captures the current process environment.
    pub fn from_process() -> Self {
        Self {
            display: std::env::var("DISPLAY").ok(),
            xauthority: std::env::var("XAUTHORITY").ok(),
            home: std::env::var_os("HOME").map(PathBuf::from),
        }
    }

    /// `DISPLAY`, defaulting to `:0`.
    fn display(&self) -> String {
        self.display.clone().unwrap_or_else(|| ":0".to_string())
    }

    /// `XAUTHORITY`, defaulting to `~/.Xauthority`.
    fn xauthority(&self) -> Option<String> {
        self.xauthority.clone().or_else(|| {
            self.home
                .as_ref()
                .map(|home| home.join(".Xauthority").display().to_string())
        })
    }
}

/// Everything needed to bring up one pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub slot: PrioritySlot,
    pub device_name: String,
    pub monitor_name: String,
    pub map_to_output: CommandSpec,
    pub consumer: CommandSpec,
}

/// Builds the launch plan for `pairing`.
pub fn plan_launch(pairing: &Pairing, consumer: &ConsumerSettings, env: &SessionEnv) -> LaunchPlan {
    let map_to_output = CommandSpec {
        program: "xinput".to_string(),
        args: vec![
            "map-to-output".to_string(),
            pairing.device.control_id.clone(),
            pairing.monitor.name.clone(),
        ],
        env: Vec::new(),
    };

    let mut args = vec![
        "--input".to_string(),
        pairing.device.event_node.display().to_string(),
        "--x-offset".to_string(),
        pairing.monitor.x_offset().to_string(),
    ];
    if consumer.invert {
        args.push("--invert".to_string());
    }

    let mut vars = vec![("DISPLAY".to_string(), env.display())];
    if let Some(xauthority) = env.xauthority() {
        vars.push(("XAUTHORITY".to_string(), xauthority));
    }

    LaunchPlan {
        slot: pairing.slot,
        device_name: pairing.device.name.clone(),
        monitor_name: pairing.monitor.name.clone(),
        map_to_output,
        consumer: CommandSpec {
            program: consumer.app_path.display().to_string(),
            args,
            env: vars,
        },
    }
}

/// A started, long-running process.
#[async_trait]
pub trait RunningProcess: Send {
    /// OS process id, if still known.
    fn pid(&self) -> Option<u32>;

    /// Waits for the process to exit and returns its exit code (`None` when
    /// killed by a signal).
    async fn wait(&mut self) -> Result<Option<i32>, LaunchError>;
}

/// Creates processes.
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// Runs `spec` to completion.
    async fn run(&self, spec: &CommandSpec) -> Result<(), LaunchError>;

    /// Starts `spec` without waiting for it.
    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn RunningProcess>, LaunchError>;
}

/// A consumer that was started successfully.
pub struct LaunchedConsumer {
    pub slot: PrioritySlot,
    pub monitor_name: String,
    pub process: Box<dyn RunningProcess>,
}

impl std::fmt::Debug for LaunchedConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchedConsumer")
            .field("slot", &self.slot)
            .field("monitor_name", &self.monitor_name)
            .field("pid", &self.process.pid())
            .finish()
    }
}

/// How one consumer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerExit {
    pub slot: PrioritySlot,
    /// `Ok(code)` on a normal or signalled exit, `Err(message)` if waiting failed.
    pub status: Result<Option<i32>, String>,
}

/// The launch use case.
pub struct LaunchConsumersUseCase {
    spawner: Arc<dyn ProcessSpawner>,
}

impl LaunchConsumersUseCase {
    pub fn new(spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self { spawner }
    }

    /// Maps and starts every plan, in order.
    ///
    /// A pairing whose output mapping fails is not started: its consumer
    /// would receive coordinates for the wrong monitor.
    pub async fn launch_all(&self, plans: &[LaunchPlan]) -> Vec<LaunchedConsumer> {
        let mut launched = Vec::with_capacity(plans.len());
        for plan in plans {
            if let Err(e) = self.spawner.run(&plan.map_to_output).await {
                error!(
                    "{}: could not map {} to {}: {e}",
                    plan.slot, plan.device_name, plan.monitor_name
                );
                continue;
            }

            match self.spawner.spawn(&plan.consumer).await {
                Ok(process) => {
                    info!(
                        "{}: launched consumer on {} (pid {})",
                        plan.slot,
                        plan.monitor_name,
                        process.pid().map_or_else(|| "unknown".to_string(), |p| p.to_string())
                    );
                    launched.push(LaunchedConsumer {
                        slot: plan.slot,
                        monitor_name: plan.monitor_name.clone(),
                        process,
                    });
                }
                Err(e) => error!("{}: failed to launch consumer: {e}", plan.slot),
            }
        }
        launched
    }

    /// Waits for every launched consumer to exit.
    pub async fn wait_all(&self, launched: Vec<LaunchedConsumer>) -> Vec<ConsumerExit> {
        let mut exits = Vec::with_capacity(launched.len());
        for mut consumer in launched {
            let status = match consumer.process.wait().await {
                Ok(code) => {
                    info!(
                        "{}: consumer on {} exited (code {})",
                        consumer.slot,
                        consumer.monitor_name,
                        code.map_or_else(|| "signal".to_string(), |c| c.to_string())
                    );
                    Ok(code)
                }
                Err(e) => {
                    error!("{}: error waiting for consumer: {e}", consumer.slot);
                    Err(e.to_string())
                }
            };
            exits.push(ConsumerExit {
                slot: consumer.slot,
                status,
            });
        }
        exits
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use touchmap_core::{CandidateDevice, Monitor, MonitorGeometry};

    fn pairing(slot: u8, monitor: &str, x_offset: i32, control_id: &str, node: &str) -> Pairing {
        Pairing {
            slot: PrioritySlot::new(slot).unwrap(),
            monitor: Monitor::new(
                monitor,
                MonitorGeometry {
                    width: 1080,
                    height: 1920,
                    x_offset,
                    y_offset: 0,
                },
            ),
            device: CandidateDevice::new("ILITEK ILITEK-TP", control_id, node),
        }
    }

    fn consumer(invert: bool) -> ConsumerSettings {
        ConsumerSettings {
            app_path: PathBuf::from("/opt/drawing/drawing_app"),
            invert,
        }
    }

    // ── plan_launch ───────────────────────────────────────────────────────────

    #[test]
    fn test_plan_maps_device_to_monitor() {
        // Arrange
        let p = pairing(2, "DP-2", 1080, "14", "/dev/input/event7");

        // Act
        let plan = plan_launch(&p, &consumer(true), &SessionEnv::default());

        // Assert
        assert_eq!(plan.map_to_output.display_line(), "xinput map-to-output 14 DP-2");
    }

    #[test]
    fn test_plan_passes_input_node_and_x_offset() {
        let p = pairing(3, "DP-1", 2160, "15", "/dev/input/event8");

        let plan = plan_launch(&p, &consumer(true), &SessionEnv::default());

        assert_eq!(
            plan.consumer.display_line(),
            "/opt/drawing/drawing_app --input /dev/input/event8 --x-offset 2160 --invert"
        );
    }

    #[test]
    fn test_plan_omits_invert_when_disabled() {
        let p = pairing(1, "DP-3", 0, "11", "/dev/input/event5");

        let plan = plan_launch(&p, &consumer(false), &SessionEnv::default());

        assert!(!plan.consumer.args.contains(&"--invert".to_string()));
    }

    #[test]
    fn test_plan_env_defaults_display_and_xauthority() {
        let p = pairing(1, "DP-3", 0, "11", "/dev/input/event5");
        let env = SessionEnv {
            display: None,
            xauthority: None,
            home: Some(PathBuf::from("/home/kiosk")),
        };

        let plan = plan_launch(&p, &consumer(true), &env);

        assert_eq!(
            plan.consumer.env,
            vec![
                ("DISPLAY".to_string(), ":0".to_string()),
                ("XAUTHORITY".to_string(), "/home/kiosk/.Xauthority".to_string()),
            ]
        );
    }

    #[test]
    fn test_plan_env_prefers_inherited_values() {
        let p = pairing(1, "DP-3", 0, "11", "/dev/input/event5");
        let env = SessionEnv {
            display: Some(":1".to_string()),
            xauthority: Some("/run/user/1000/gdm/Xauthority".to_string()),
            home: Some(PathBuf::from("/home/kiosk")),
        };

        let plan = plan_launch(&p, &consumer(true), &env);

        assert_eq!(plan.consumer.env[0].1, ":1");
        assert_eq!(plan.consumer.env[1].1, "/run/user/1000/gdm/Xauthority");
    }

    // ── Use case with a recording spawner ─────────────────────────────────────

    struct FakeProcess {
        pid: u32,
        exit: Option<i32>,
    }

    #[async_trait]
    impl RunningProcess for FakeProcess {
        fn pid(&self) -> Option<u32> {
            Some(self.pid)
        }

        async fn wait(&mut self) -> Result<Option<i32>, LaunchError> {
            Ok(self.exit)
        }
    }

    #[derive(Default)]
    struct RecordingSpawner {
        ran: Mutex<Vec<String>>,
        spawned: Mutex<Vec<String>>,
        failing_map: Option<String>,
    }

    #[async_trait]
    impl ProcessSpawner for RecordingSpawner {
        async fn run(&self, spec: &CommandSpec) -> Result<(), LaunchError> {
            self.ran.lock().unwrap().push(spec.display_line());
            if self.failing_map.as_deref().is_some_and(|m| spec.args.iter().any(|a| a == m)) {
                return Err(LaunchError::Failed {
                    program: spec.program.clone(),
                    status: Some(1),
                });
            }
            Ok(())
        }

        async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn RunningProcess>, LaunchError> {
            let mut spawned = self.spawned.lock().unwrap();
            spawned.push(spec.display_line());
            Ok(Box::new(FakeProcess {
                pid: 1000 + spawned.len() as u32,
                exit: Some(0),
            }))
        }
    }

    fn plans() -> Vec<LaunchPlan> {
        vec![
            plan_launch(
                &pairing(1, "DP-3", 0, "11", "/dev/input/event5"),
                &consumer(true),
                &SessionEnv::default(),
            ),
            plan_launch(
                &pairing(2, "DP-2", 1080, "12", "/dev/input/event6"),
                &consumer(true),
                &SessionEnv::default(),
            ),
        ]
    }

    #[tokio::test]
    async fn test_launch_all_maps_then_spawns_each_pairing() {
        // Arrange
        let spawner = Arc::new(RecordingSpawner::default());
        let uc = LaunchConsumersUseCase::new(spawner.clone());

        // Act
        let launched = uc.launch_all(&plans()).await;

        // Assert
        assert_eq!(launched.len(), 2);
        assert_eq!(
            *spawner.ran.lock().unwrap(),
            vec!["xinput map-to-output 11 DP-3", "xinput map-to-output 12 DP-2"]
        );
        assert_eq!(spawner.spawned.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_mapping_skips_only_that_consumer() {
        // Arrange
        let spawner = Arc::new(RecordingSpawner {
            failing_map: Some("DP-3".to_string()),
            ..RecordingSpawner::default()
        });
        let uc = LaunchConsumersUseCase::new(spawner.clone());

        // Act
        let launched = uc.launch_all(&plans()).await;

        // Assert
        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].monitor_name, "DP-2");
    }

    #[test]
    fn test_launch_all_without_plans_spawns_nothing() {
        let spawner = Arc::new(RecordingSpawner::default());
        let uc = LaunchConsumersUseCase::new(spawner.clone());

        let launched = tokio_test::block_on(uc.launch_all(&[]));

        assert!(launched.is_empty());
        assert!(spawner.ran.lock().unwrap().is_empty());
        assert!(spawner.spawned.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wait_all_collects_exit_codes_in_slot_order() {
        let spawner = Arc::new(RecordingSpawner::default());
        let uc = LaunchConsumersUseCase::new(spawner);
        let launched = uc.launch_all(&plans()).await;

        let exits = uc.wait_all(launched).await;

        let slots: Vec<u8> = exits.iter().map(|e| e.slot.get()).collect();
        assert_eq!(slots, vec![1, 2]);
        assert!(exits.iter().all(|e| e.status == Ok(Some(0))));
    }
}
