//! AssignTouchUseCase: the round-robin touch-to-monitor assignment engine.
//!
//! For each priority slot in turn the engine waits for somebody to tap the
//! monitor bound to that slot.  The first device to report a touch-down wins
//! the slot, is removed from the pool, and can never win again.
//!
//! # Session state machine
//!
//! ```text
//! Init ──► Round(1) ──► Round(2) ──► ... ──► Round(N) ──► Terminal
//!   │         │  ▲
//!   │         └──┘  poll slice (≤ poll_slice, ≤ time left)
//!   └─ open every candidate; unreachable ones are skipped
//! ```
//!
//! - **Init**: open a [`TouchDevice`] for each candidate.  Devices that cannot
//!   be opened are dropped from the pool with a warning.
//! - **Round(slot)**: drain stale events from every pooled device, then poll
//!   in slices until a touch-down arrives, the round timeout elapses, or the
//!   session is cancelled.
//! - **Terminal**: every handle still in the pool is closed by the pool's
//!   `Drop`, whichever way the session ended.
//!
//! # Architecture
//!
//! This use case depends only on traits (`DeviceOpener`, `TouchDevice`,
//! `Multiplexer`, `Clock`) and domain types.  The evdev/`poll(2)`
//! implementations and the scripted test doubles live in
//! `infrastructure::touch_source`.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use touchmap_core::{classify, AssignmentResult, CandidateDevice, Pairing, RawEvent, SlotTarget};

/// Default time a person gets to tap the screen for one slot.
pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(60);

/// Default upper bound on a single multiplexer wait.
pub const DEFAULT_POLL_SLICE: Duration = Duration::from_secs(1);

/// Default number of back-to-back read failures after which a device is dropped.
pub const DEFAULT_MAX_CONSECUTIVE_READ_FAILURES: u32 = 3;

/// A pollable descriptor as understood by the [`Multiplexer`].
pub type RawDescriptor = i32;

// ── Seams ────────────────────────────────────────────────────────────────────

/// Result of a device read that is allowed to fail softly.
///
/// A `SoftFail` never aborts the session: the engine treats the device as
/// having produced nothing this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceRead<T> {
    Ok(T),
    SoftFail(String),
}

/// Why a candidate could not be opened.  Never fatal to the session.
#[derive(Debug, Error)]
pub enum DeviceUnreachable {
    #[error("{}: permission denied", .0.display())]
    PermissionDenied(PathBuf),

    #[error("{}: no such device node", .0.display())]
    NotFound(PathBuf),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeviceUnreachable {
    /// Maps an I/O error from opening `path` onto the matching variant.
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => DeviceUnreachable::PermissionDenied(path),
            std::io::ErrorKind::NotFound => DeviceUnreachable::NotFound(path),
            _ => DeviceUnreachable::Io { path, source },
        }
    }
}

/// Error type for a multiplexer wait.
#[derive(Debug, Error)]
pub enum MultiplexError {
    #[error("wait on input devices failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One open, readable input source.
pub trait TouchDevice {
    /// Descriptor to hand to the [`Multiplexer`].
    fn descriptor(&self) -> RawDescriptor;

    /// Reads and discards every event already queued, without blocking.
    ///
    /// Returns the number of discarded events.  Calling it twice with no new
    /// input in between leaves nothing to read either time.
    fn drain_pending(&mut self) -> DeviceRead<usize>;

    /// Reads the events currently available, without blocking.
    ///
    /// An empty batch is a valid answer (e.g. a spurious wake-up).
    fn read_ready(&mut self) -> DeviceRead<Vec<RawEvent>>;

    /// Releases the device.  Idempotent.
    fn close(&mut self);
}

/// Opens candidate devices.
pub trait DeviceOpener {
    type Device: TouchDevice;

    /// Opens `candidate` for non-blocking reads.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceUnreachable`] when the node is missing or unreadable.
    fn open(&mut self, candidate: &CandidateDevice) -> Result<Self::Device, DeviceUnreachable>;
}

/// Waits for any of a set of descriptors to become readable.
pub trait Multiplexer {
    /// Blocks until at least one descriptor is readable or `timeout` elapses.
    ///
    /// Returns the indices (into `descriptors`) of the ready descriptors in
    /// ascending order; an empty vector means the wait timed out or was
    /// interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`MultiplexError`] if the underlying wait fails.
    fn wait(
        &mut self,
        descriptors: &[RawDescriptor],
        timeout: Duration,
    ) -> Result<Vec<usize>, MultiplexError>;
}

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Blocks the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock [`Clock`] backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Cooperative cancellation flag checked between poll slices.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

// ── Settings ─────────────────────────────────────────────────────────────────

/// Timing and error-tolerance knobs for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentSettings {
    /// Time allowed for each slot's round.
    pub round_timeout: Duration,
    /// Upper bound on one multiplexer wait; cancellation is noticed at this
    /// granularity.
    pub poll_slice: Duration,
    /// Back-to-back read failures after which a device leaves the pool.
    /// `0` keeps failing devices forever.
    pub max_consecutive_read_failures: u32,
}

impl Default for AssignmentSettings {
    fn default() -> Self {
        Self {
            round_timeout: DEFAULT_ROUND_TIMEOUT,
            poll_slice: DEFAULT_POLL_SLICE,
            max_consecutive_read_failures: DEFAULT_MAX_CONSECUTIVE_READ_FAILURES,
        }
    }
}

// ── Device pool ──────────────────────────────────────────────────────────────

struct PoolMember<D: TouchDevice> {
    candidate: CandidateDevice,
    device: D,
    consecutive_failures: u32,
}

/// Round state: the devices still eligible to win a slot.
///
/// Members keep the order the candidates were supplied in; that order is the
/// tie-break when several devices are ready in the same wake-up.  The pool
/// only ever shrinks, and dropping it closes whatever is left.
struct DevicePool<D: TouchDevice> {
    members: Vec<PoolMember<D>>,
}

impl<D: TouchDevice> DevicePool<D> {
    fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    fn push(&mut self, candidate: CandidateDevice, device: D) {
        self.members.push(PoolMember {
            candidate,
            device,
            consecutive_failures: 0,
        });
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn descriptors(&self) -> Vec<RawDescriptor> {
        self.members.iter().map(|m| m.device.descriptor()).collect()
    }

    /// Flushes events queued before the round started.
    fn drain_all(&mut self) {
        for member in &mut self.members {
            match member.device.drain_pending() {
                DeviceRead::Ok(0) => {}
                DeviceRead::Ok(n) => debug!("discarded {n} stale event(s) from {}", member.candidate),
                DeviceRead::SoftFail(reason) => {
                    warn!("could not drain {}: {reason}", member.candidate)
                }
            }
        }
    }

    /// Removes and closes the member at `index`, returning its candidate.
    fn remove(&mut self, index: usize) -> CandidateDevice {
        let mut member = self.members.remove(index);
        member.device.close();
        member.candidate
    }
}

impl<D: TouchDevice> Drop for DevicePool<D> {
    fn drop(&mut self) {
        for member in &mut self.members {
            member.device.close();
        }
    }
}

// ── Use case ─────────────────────────────────────────────────────────────────

/// How a single round ended.
#[derive(Debug, PartialEq, Eq)]
enum RoundOutcome {
    Won(CandidateDevice),
    TimedOut,
    Cancelled,
}

/// The round-robin assignment engine.
pub struct TouchAssigner<O, M, C> {
    opener: O,
    multiplexer: M,
    clock: C,
    settings: AssignmentSettings,
}

impl<O, M, C> fmt::Debug for TouchAssigner<O, M, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouchAssigner")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<O, M, C> TouchAssigner<O, M, C>
where
    O: DeviceOpener,
    M: Multiplexer,
    C: Clock,
{
    /// Creates an engine from its collaborators.
    pub fn new(opener: O, multiplexer: M, clock: C, settings: AssignmentSettings) -> Self {
        Self {
            opener,
            multiplexer,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &AssignmentSettings {
        &self.settings
    }

    /// Runs one full session.
    ///
    /// `targets` must be in ascending slot order (as produced by
    /// `SlotBindings::resolve`).  `candidates` order is the tie-break order.
    ///
    /// The session itself never fails: unreachable devices, read errors and
    /// timeouts only leave slots unfilled.  Deciding what an empty or
    /// cancelled result means is up to the caller.
    pub fn run(
        &mut self,
        targets: &[SlotTarget],
        candidates: &[CandidateDevice],
        cancel: &CancelToken,
    ) -> AssignmentResult {
        let mut pool = self.open_pool(candidates);
        let mut result = AssignmentResult::new();

        for target in targets {
            if cancel.is_cancelled() {
                result.mark_cancelled();
                break;
            }

            if pool.is_empty() {
                info!(
                    "{} ({}): no devices left to assign",
                    target.slot, target.monitor.name
                );
                result.record_unfilled(target.slot);
                continue;
            }

            info!(
                "{} (monitor {}): tap the screen now, listening on {} device(s)",
                target.slot,
                target.monitor.name,
                pool.len()
            );
            pool.drain_all();

            match self.run_round(&mut pool, cancel) {
                RoundOutcome::Won(device) => {
                    info!("{}: touch detected from {device}", target.slot);
                    result.record_pairing(Pairing {
                        slot: target.slot,
                        monitor: target.monitor.clone(),
                        device,
                    });
                }
                RoundOutcome::TimedOut => {
                    warn!("{}: no touch detected for monitor {}", target.slot, target.monitor.name);
                    result.record_unfilled(target.slot);
                }
                RoundOutcome::Cancelled => {
                    warn!("{}: session cancelled", target.slot);
                    result.mark_cancelled();
                    break;
                }
            }
        }

        // `pool` drops here and closes every remaining handle.
        result
    }

    fn open_pool(&mut self, candidates: &[CandidateDevice]) -> DevicePool<O::Device> {
        let mut pool = DevicePool::new();
        let mut seen = HashSet::new();
        for candidate in candidates {
            if !seen.insert(candidate.id()) {
                warn!("skipping {}: {} is already in the pool", candidate.name, candidate.id().display());
                continue;
            }
            match self.opener.open(candidate) {
                Ok(device) => {
                    debug!("opened {candidate}");
                    pool.push(candidate.clone(), device);
                }
                Err(e) => warn!("skipping {}: {e}", candidate.name),
            }
        }
        if pool.is_empty() {
            warn!("no accessible touchscreen devices");
        }
        pool
    }

    fn run_round(&mut self, pool: &mut DevicePool<O::Device>, cancel: &CancelToken) -> RoundOutcome {
        let deadline = self.clock.now() + self.settings.round_timeout;

        loop {
            if cancel.is_cancelled() {
                return RoundOutcome::Cancelled;
            }
            let now = self.clock.now();
            if now >= deadline || pool.is_empty() {
                return RoundOutcome::TimedOut;
            }

            let slice = (deadline - now).min(self.settings.poll_slice);
            let descriptors = pool.descriptors();
            let ready = match self.multiplexer.wait(&descriptors, slice) {
                Ok(ready) => ready,
                Err(e) => {
                    // Sit out the slice so a persistent error cannot spin.
                    warn!("{e}");
                    self.clock.sleep(slice);
                    continue;
                }
            };

            if let Some(winner) = self.scan_ready(pool, &ready) {
                return RoundOutcome::Won(winner);
            }
        }
    }

    /// Reads every ready device in pool order and resolves the winner, if any.
    ///
    /// Devices that have failed too often in a row are dropped here as well.
    fn scan_ready(&self, pool: &mut DevicePool<O::Device>, ready: &[usize]) -> Option<CandidateDevice> {
        let max_failures = self.settings.max_consecutive_read_failures;
        let mut winner = None;
        let mut exhausted = Vec::new();

        for &index in ready {
            let Some(member) = pool.members.get_mut(index) else {
                continue;
            };
            match member.device.read_ready() {
                DeviceRead::Ok(events) => {
                    member.consecutive_failures = 0;
                    if events.iter().any(|event| classify(event).is_touch_down()) {
                        winner = Some(index);
                        break;
                    }
                }
                DeviceRead::SoftFail(reason) => {
                    member.consecutive_failures += 1;
                    warn!(
                        "read from {} failed ({} in a row): {reason}",
                        member.candidate, member.consecutive_failures
                    );
                    if max_failures > 0 && member.consecutive_failures >= max_failures {
                        exhausted.push(index);
                    }
                }
            }
        }

        // Every exhausted index precedes the winner, so removing the winner
        // first leaves them valid.
        let won = winner.map(|index| pool.remove(index));
        for index in exhausted.into_iter().rev() {
            let dropped = pool.remove(index);
            warn!("dropping {dropped} after repeated read failures");
        }
        won
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::touch_source::mock::ScriptedTouchBus;
    use touchmap_core::input::event::codes;
    use touchmap_core::{Monitor, MonitorGeometry, PrioritySlot};

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn target(n: u8, name: &str) -> SlotTarget {
        SlotTarget {
            slot: PrioritySlot::new(n).unwrap(),
            monitor: Monitor::new(
                name,
                MonitorGeometry {
                    width: 1080,
                    height: 1920,
                    x_offset: 1080 * (i32::from(n) - 1),
                    y_offset: 0,
                },
            ),
        }
    }

    fn device(n: u8) -> CandidateDevice {
        CandidateDevice::new(format!("panel-{n}"), format!("{}", 10 + n), format!("/dev/input/event{n}"))
    }

    fn settings(round_timeout: u64) -> AssignmentSettings {
        AssignmentSettings {
            round_timeout: secs(round_timeout),
            ..AssignmentSettings::default()
        }
    }

    fn engine(
        bus: &ScriptedTouchBus,
        settings: AssignmentSettings,
    ) -> TouchAssigner<
        crate::infrastructure::touch_source::mock::ScriptedOpener,
        crate::infrastructure::touch_source::mock::ScriptedMultiplexer,
        crate::infrastructure::touch_source::mock::ManualClock,
    > {
        TouchAssigner::new(bus.opener(), bus.multiplexer(), bus.clock(), settings)
    }

    #[test]
    fn test_first_touch_wins_slot() {
        // Arrange
        let bus = ScriptedTouchBus::new();
        let (d1, d2) = (device(1), device(2));
        bus.add_device(&d1);
        bus.add_device(&d2);
        bus.touch_at(secs(3), &d2);
        bus.touch_at(secs(5), &d1);
        let mut uc = engine(&bus, settings(60));

        // Act
        let result = uc.run(&[target(1, "DP-3")], &[d1, d2.clone()], &CancelToken::new());

        // Assert
        assert_eq!(result.pairings().len(), 1);
        assert_eq!(result.pairings()[0].device, d2);
        assert_eq!(result.pairings()[0].monitor.name, "DP-3");
    }

    #[test]
    fn test_release_and_motion_do_not_win() {
        // Arrange
        let bus = ScriptedTouchBus::new();
        let d1 = device(1);
        bus.add_device(&d1);
        bus.event_at(secs(1), &d1, RawEvent::abs(codes::ABS_MT_POSITION_X, 300));
        bus.event_at(secs(2), &d1, RawEvent::key(codes::BTN_TOUCH, codes::KEY_RELEASED));
        let mut uc = engine(&bus, settings(10));

        // Act
        let result = uc.run(&[target(1, "DP-3")], &[d1], &CancelToken::new());

        // Assert
        assert!(result.pairings().is_empty());
        assert_eq!(result.unfilled(), &[PrioritySlot::new(1).unwrap()]);
        assert_eq!(bus.clock().elapsed(), secs(10), "round must run to its timeout");
    }

    #[test]
    fn test_wait_never_exceeds_poll_slice() {
        // Arrange
        let bus = ScriptedTouchBus::new();
        let d1 = device(1);
        bus.add_device(&d1);
        let mut uc = engine(
            &bus,
            AssignmentSettings {
                round_timeout: Duration::from_millis(2500),
                poll_slice: secs(1),
                max_consecutive_read_failures: 3,
            },
        );

        // Act
        uc.run(&[target(1, "DP-3")], &[d1], &CancelToken::new());

        // Assert – 1s, 1s, then the 0.5s remainder
        assert_eq!(
            bus.wait_timeouts(),
            vec![secs(1), secs(1), Duration::from_millis(500)]
        );
    }

    #[test]
    fn test_stale_touch_is_drained_before_round() {
        // Arrange
        let bus = ScriptedTouchBus::new();
        let (d1, d2) = (device(1), device(2));
        bus.add_device(&d1);
        bus.add_device(&d2);
        bus.queue_pending(&d1, &[RawEvent::key(codes::BTN_TOUCH, 1)]);
        bus.touch_at(secs(4), &d2);
        let mut uc = engine(&bus, settings(60));

        // Act
        let result = uc.run(&[target(1, "DP-3")], &[d1, d2.clone()], &CancelToken::new());

        // Assert
        assert_eq!(result.pairings()[0].device, d2);
    }

    #[test]
    fn test_same_wakeup_tie_goes_to_earlier_pool_member() {
        // Arrange
        let bus = ScriptedTouchBus::new();
        let (d1, d2) = (device(1), device(2));
        bus.add_device(&d1);
        bus.add_device(&d2);
        bus.touch_at(secs(2), &d2);
        bus.touch_at(secs(2), &d1);
        let mut uc = engine(&bus, settings(60));

        // Act
        let result = uc.run(&[target(1, "DP-3")], &[d1.clone(), d2], &CancelToken::new());

        // Assert
        assert_eq!(result.pairings()[0].device, d1);
    }

    #[test]
    fn test_unreachable_device_is_skipped() {
        // Arrange
        let bus = ScriptedTouchBus::new();
        let (d1, d2) = (device(1), device(2));
        bus.add_unreadable_device(&d1);
        bus.add_device(&d2);
        bus.touch_at(secs(1), &d2);
        let mut uc = engine(&bus, settings(60));

        // Act
        let result = uc.run(&[target(1, "DP-3")], &[d1.clone(), d2.clone()], &CancelToken::new());

        // Assert
        assert_eq!(result.pairings()[0].device, d2);
        assert_eq!(bus.open_count(&d1), 0);
    }

    #[test]
    fn test_transient_read_failure_keeps_device_in_pool() {
        // Arrange
        let bus = ScriptedTouchBus::new();
        let d1 = device(1);
        bus.add_device(&d1);
        bus.fail_read_at(secs(1), &d1);
        bus.touch_at(secs(2), &d1);
        let mut uc = engine(&bus, settings(60));

        // Act
        let result = uc.run(&[target(1, "DP-3")], &[d1.clone()], &CancelToken::new());

        // Assert
        assert_eq!(result.pairings().len(), 1);
        assert_eq!(result.pairings()[0].device, d1);
    }

    #[test]
    fn test_persistently_failing_device_is_dropped() {
        // Arrange
        let bus = ScriptedTouchBus::new();
        let (d1, d2) = (device(1), device(2));
        bus.add_device(&d1);
        bus.add_device(&d2);
        for _ in 0..3 {
            bus.fail_read_at(secs(1), &d1);
        }
        // d1 would have touched later, but it is gone by then.
        bus.touch_at(secs(2), &d1);
        bus.touch_at(secs(3), &d2);
        let mut uc = engine(&bus, settings(60));

        // Act
        let result = uc.run(
            &[target(1, "DP-3"), target(2, "DP-2")],
            &[d1.clone(), d2.clone()],
            &CancelToken::new(),
        );

        // Assert
        assert_eq!(result.pairings().len(), 1);
        assert_eq!(result.pairings()[0].device, d2);
        assert_eq!(bus.close_count(&d1), 1);
        assert_eq!(result.unfilled(), &[PrioritySlot::new(2).unwrap()]);
    }

    #[test]
    fn test_cancel_before_start_attempts_nothing_and_closes_handles() {
        // Arrange
        let bus = ScriptedTouchBus::new();
        let d1 = device(1);
        bus.add_device(&d1);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut uc = engine(&bus, settings(60));

        // Act
        let result = uc.run(&[target(1, "DP-3")], &[d1], &cancel);

        // Assert
        assert!(result.is_cancelled());
        assert!(result.pairings().is_empty());
        assert!(result.unfilled().is_empty());
        assert_eq!(bus.open_handles(), 0);
    }

    #[test]
    fn test_multiplexer_error_does_not_abort_round() {
        // Arrange
        let bus = ScriptedTouchBus::new();
        let d1 = device(1);
        bus.add_device(&d1);
        bus.fail_next_wait();
        bus.touch_at(secs(2), &d1);
        let mut uc = engine(&bus, settings(60));

        // Act
        let result = uc.run(&[target(1, "DP-3")], &[d1.clone()], &CancelToken::new());

        // Assert
        assert_eq!(result.pairings()[0].device, d1);
    }

    #[test]
    fn test_persistent_multiplexer_error_waits_out_each_slice() {
        // Arrange: every wait fails for the whole round.
        let bus = ScriptedTouchBus::new();
        let d1 = device(1);
        bus.add_device(&d1);
        bus.fail_waits(u32::MAX);
        let mut uc = engine(&bus, settings(10));

        // Act
        let result = uc.run(&[target(1, "DP-3")], &[d1], &CancelToken::new());

        // Assert
        assert_eq!(result.unfilled().len(), 1);
        assert_eq!(bus.wait_timeouts().len(), 10);
        assert_eq!(bus.clock().elapsed(), secs(10));
    }

    #[test]
    fn test_duplicate_event_node_is_opened_once() {
        // Arrange: two X devices on one node, e.g. a pen stylus and eraser.
        let bus = ScriptedTouchBus::new();
        let stylus = device(1);
        let eraser = CandidateDevice::new("eraser", "99", stylus.event_node.clone());
        bus.add_device(&stylus);
        bus.touch_at(secs(1), &stylus);
        bus.touch_at(secs(2), &stylus);
        let mut uc = engine(&bus, settings(5));

        // Act
        let result = uc.run(
            &[target(1, "DP-3"), target(2, "DP-2")],
            &[stylus.clone(), eraser],
            &CancelToken::new(),
        );

        // Assert
        assert_eq!(result.pairings().len(), 1);
        assert_eq!(result.pairings()[0].device, stylus);
        assert_eq!(result.unfilled().len(), 1);
        assert_eq!(bus.open_count(&stylus), 1);
        assert_eq!(bus.open_handles(), 0);
    }

    #[test]
    fn test_device_unreachable_maps_io_error_kinds() {
        let path = PathBuf::from("/dev/input/event9");
        let denied = DeviceUnreachable::from_io(
            path.clone(),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        let missing = DeviceUnreachable::from_io(
            path.clone(),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(denied, DeviceUnreachable::PermissionDenied(_)));
        assert!(matches!(missing, DeviceUnreachable::NotFound(_)));
        assert_eq!(denied.to_string(), "/dev/input/event9: permission denied");
    }

    #[test]
    fn test_default_settings_match_interactive_session() {
        let s = AssignmentSettings::default();
        assert_eq!(s.round_timeout, secs(60));
        assert_eq!(s.poll_slice, secs(1));
        assert_eq!(s.max_consecutive_read_failures, 3);
    }
}
