//! touchmap entry point.
//!
//! Pairs each touchscreen with the monitor it is mounted on by asking a
//! person to tap the screens in priority-slot order, then launches one
//! consumer application per monitor.
//!
//! # Usage
//!
//! ```text
//! touchmap [OPTIONS]
//!
//! Options:
//!   --config <PATH>      Config file [default: $XDG_CONFIG_HOME/touchmap/config.toml]
//!   --timeout <SECS>     Per-slot touch timeout, overrides the config
//!   --dry-run            Print the mapping and exit without launching
//!   --log-level <LEVEL>  Log level when RUST_LOG is unset
//! ```
//!
//! # Flow
//!
//! ```text
//! load config
//!  └─ consumer binary exists?          (PreconditionFailure::ConsumerMissing)
//!  └─ xrandr → monitors → resolve slots (PreconditionFailure::MissingMonitors)
//!  └─ xinput + udevadm → candidates     (PreconditionFailure::NoDevices)
//!     (both on a blocking thread)
//!  └─ TouchAssigner::run                (blocking thread, Ctrl-C cancels)
//!  └─ print mapping
//!  └─ map-to-output + launch consumers, wait for all to exit
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use touchmap::application::assign_touch::CancelToken;
use touchmap::application::launch_consumers::{plan_launch, LaunchConsumersUseCase, SessionEnv};
use touchmap::infrastructure::display::XrandrMonitorDiscovery;
use touchmap::infrastructure::input_devices::XinputDeviceDiscovery;
use touchmap::infrastructure::process::spawner::TokioProcessSpawner;
use touchmap::infrastructure::process::{ensure_consumer_exists, SystemCommandRunner};
use touchmap::infrastructure::storage::config::load_config;
use touchmap::session::{discover_session, mapping_report};
use touchmap_core::AssignmentResult;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Interactive touchscreen-to-monitor mapper.
#[derive(Debug, Parser)]
#[command(
    name = "touchmap",
    about = "Pair touchscreens with monitors by tapping them in order, then launch one app per monitor",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "TOUCHMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds to wait for a touch in each slot.
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the final mapping without mapping inputs or launching consumers.
    #[arg(long)]
    dry_run: bool,

    /// Log level used when `RUST_LOG` is unset (overrides the config).
    #[arg(long, env = "TOUCHMAP_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(secs) = cli.timeout {
        config.session.round_timeout_secs = secs;
    }

    // Initialise structured logging.  `RUST_LOG` wins over the configured level.
    let level = cli.log_level.as_deref().unwrap_or(&config.session.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    info!("touchmap starting");

    // ── Preconditions ─────────────────────────────────────────────────────────
    let consumer = config.consumer_settings();
    ensure_consumer_exists(&consumer.app_path)?;

    let bindings = config.slot_bindings()?;
    let runner = Arc::new(SystemCommandRunner::new());

    let monitor_discovery = XrandrMonitorDiscovery::new(runner.clone());
    let device_discovery = XinputDeviceDiscovery::new(runner, config.consumer.use_sudo_for_discovery);

    // xrandr, xinput and udevadm are blocking child processes.
    let inputs = tokio::task::spawn_blocking(move || {
        discover_session(&monitor_discovery, &device_discovery, &bindings)
    })
    .await
    .context("discovery panicked")??;
    let (targets, candidates) = (inputs.targets, inputs.candidates);

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let cancel = CancelToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping session");
            cancel_clone.cancel();
        }
    });

    // ── Assignment session ────────────────────────────────────────────────────
    let settings = config.assignment_settings();
    let result = tokio::task::spawn_blocking(move || run_session(settings, &targets, &candidates, &cancel))
        .await
        .context("assignment session panicked")??;

    print_mapping(&result);
    let pairings = result.into_pairings()?;

    if cli.dry_run {
        info!("dry run: not launching consumers");
        return Ok(());
    }

    // ── Launch ────────────────────────────────────────────────────────────────
    let env = SessionEnv::from_process();
    let plans: Vec<_> = pairings
        .iter()
        .map(|pairing| plan_launch(pairing, &consumer, &env))
        .collect();

    let launcher = LaunchConsumersUseCase::new(Arc::new(TokioProcessSpawner::new()));
    let launched = launcher.launch_all(&plans).await;
    if launched.is_empty() {
        warn!("no consumers were launched");
        return Ok(());
    }

    info!("waiting for all consumers to exit");
    launcher.wait_all(launched).await;

    info!("touchmap finished");
    Ok(())
}

#[cfg(target_os = "linux")]
fn run_session(
    settings: touchmap::application::assign_touch::AssignmentSettings,
    targets: &[touchmap_core::SlotTarget],
    candidates: &[touchmap_core::CandidateDevice],
    cancel: &CancelToken,
) -> anyhow::Result<AssignmentResult> {
    use touchmap::application::assign_touch::{SystemClock, TouchAssigner};
    use touchmap::infrastructure::touch_source::{NativeDeviceOpener, NativeMultiplexer};

    let mut assigner = TouchAssigner::new(
        NativeDeviceOpener::new(),
        NativeMultiplexer::new(),
        SystemClock,
        settings,
    );
    Ok(assigner.run(targets, candidates, cancel))
}

#[cfg(not(target_os = "linux"))]
fn run_session(
    _settings: touchmap::application::assign_touch::AssignmentSettings,
    _targets: &[touchmap_core::SlotTarget],
    _candidates: &[touchmap_core::CandidateDevice],
    _cancel: &CancelToken,
) -> anyhow::Result<AssignmentResult> {
    anyhow::bail!("touch listening requires Linux evdev")
}

fn print_mapping(result: &AssignmentResult) {
    let lines = mapping_report(result);
    if lines.is_empty() {
        return;
    }
    println!("\nFinal mapping:");
    for line in lines {
        println!("  {line}");
    }
}
