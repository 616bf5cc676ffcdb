//! Scripted touch devices for unit and integration testing.
//!
//! Allows tests to describe *when* each device reports *what*, and then run
//! the assignment engine against that script without real device nodes and
//! without real waiting.  Time is simulated by a [`ManualClock`]: whenever the
//! engine waits and nothing is ready, the multiplexer jumps the clock forward
//! to the next scripted event (or to the end of the wait).
//!
//! The bus also records every open, close, and wait so tests can assert on
//! resource cleanup and on the polling pattern.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use touchmap_core::input::event::codes;
use touchmap_core::{CandidateDevice, RawEvent};

use crate::application::assign_touch::{
    CancelToken, Clock, DeviceOpener, DeviceRead, DeviceUnreachable, MultiplexError, Multiplexer,
    RawDescriptor, TouchDevice,
};

/// First descriptor handed out; keeps scripted descriptors clear of stdio.
const FIRST_DESCRIPTOR: RawDescriptor = 100;

// ── Clock ─────────────────────────────────────────────────────────────────────

/// A [`Clock`] that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }

    /// Moves the clock to `at`; never moves backwards.
    pub fn advance_to(&self, at: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        if at > *offset {
            *offset = at;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

// ── Bus state ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Scripted {
    Event(RawEvent),
    ReadFailure,
}

#[derive(Debug)]
struct ScriptEntry {
    at: Duration,
    descriptor: RawDescriptor,
    action: Scripted,
}

#[derive(Debug)]
struct DeviceState {
    descriptor: RawDescriptor,
    node: PathBuf,
    readable: bool,
    is_open: bool,
    queue: VecDeque<RawEvent>,
    pending_failures: u32,
    open_count: u32,
    close_count: u32,
}

impl DeviceState {
    fn is_ready(&self) -> bool {
        self.is_open && (!self.queue.is_empty() || self.pending_failures > 0)
    }
}

#[derive(Debug, Default)]
struct BusState {
    devices: Vec<DeviceState>,
    /// Kept sorted by `at`; entries with equal times keep insertion order.
    script: Vec<ScriptEntry>,
    cancel_at: Option<(Duration, CancelToken)>,
    failing_waits: u32,
    wait_timeouts: Vec<Duration>,
}

impl BusState {
    fn device(&self, descriptor: RawDescriptor) -> Option<&DeviceState> {
        self.devices.iter().find(|d| d.descriptor == descriptor)
    }

    fn device_mut(&mut self, descriptor: RawDescriptor) -> Option<&mut DeviceState> {
        self.devices.iter_mut().find(|d| d.descriptor == descriptor)
    }

    fn descriptor_of(&self, node: &Path) -> RawDescriptor {
        self.devices
            .iter()
            .find(|d| d.node == node)
            .map(|d| d.descriptor)
            .unwrap_or_else(|| panic!("device {} was never added to the bus", node.display()))
    }

    /// Applies every scripted action due at or before `now`.
    fn deliver_until(&mut self, now: Duration) {
        let due = self.script.iter().take_while(|e| e.at <= now).count();
        let entries: Vec<ScriptEntry> = self.script.drain(..due).collect();
        for entry in entries {
            if let Some(device) = self.device_mut(entry.descriptor) {
                match entry.action {
                    Scripted::Event(event) => device.queue.push_back(event),
                    Scripted::ReadFailure => device.pending_failures += 1,
                }
            }
        }
        if let Some((at, token)) = &self.cancel_at {
            if *at <= now {
                token.cancel();
            }
        }
    }

    fn ready_indices(&self, descriptors: &[RawDescriptor]) -> Vec<usize> {
        descriptors
            .iter()
            .enumerate()
            .filter(|(_, d)| self.device(**d).is_some_and(DeviceState::is_ready))
            .map(|(i, _)| i)
            .collect()
    }

    /// Earliest moment in `(now, limit]` at which something can wake the wait.
    fn next_wakeup(&self, descriptors: &[RawDescriptor], now: Duration, limit: Duration) -> Option<Duration> {
        let scripted = self
            .script
            .iter()
            .filter(|e| e.at > now && e.at <= limit && descriptors.contains(&e.descriptor))
            .map(|e| e.at)
            .next();
        let cancel = self
            .cancel_at
            .as_ref()
            .map(|(at, _)| *at)
            .filter(|at| *at > now && *at <= limit);
        match (scripted, cancel) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

// ── Bus ───────────────────────────────────────────────────────────────────────

/// A scripted set of touch devices sharing one simulated clock.
///
/// # Example
///
/// ```ignore
/// let bus = ScriptedTouchBus::new();
/// bus.add_device(&panel);
/// bus.touch_at(Duration::from_secs(3), &panel);
/// let mut engine = TouchAssigner::new(bus.opener(), bus.multiplexer(), bus.clock(), settings);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedTouchBus {
    state: Arc<Mutex<BusState>>,
    clock: ManualClock,
}

impl ScriptedTouchBus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState::default())),
            clock: ManualClock::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_device(&self, candidate: &CandidateDevice, readable: bool) -> RawDescriptor {
        let mut state = self.lock();
        let descriptor = FIRST_DESCRIPTOR + state.devices.len() as RawDescriptor;
        state.devices.push(DeviceState {
            descriptor,
            node: candidate.event_node.clone(),
            readable,
            is_open: false,
            queue: VecDeque::new(),
            pending_failures: 0,
            open_count: 0,
            close_count: 0,
        });
        descriptor
    }

    /// Registers a device that can be opened.
    pub fn add_device(&self, candidate: &CandidateDevice) -> RawDescriptor {
        self.insert_device(candidate, true)
    }

    /// Registers a device whose node exists but is not readable.
    pub fn add_unreadable_device(&self, candidate: &CandidateDevice) -> RawDescriptor {
        self.insert_device(candidate, false)
    }

    fn schedule(&self, at: Duration, candidate: &CandidateDevice, action: Scripted) {
        let mut state = self.lock();
        let descriptor = state.descriptor_of(&candidate.event_node);
        let position = state.script.partition_point(|e| e.at <= at);
        state.script.insert(
            position,
            ScriptEntry {
                at,
                descriptor,
                action,
            },
        );
    }

    /// Schedules a raw event.
    pub fn event_at(&self, at: Duration, candidate: &CandidateDevice, event: RawEvent) {
        self.schedule(at, candidate, Scripted::Event(event));
    }

    /// Schedules a finger touch-down followed by its frame separator.
    pub fn touch_at(&self, at: Duration, candidate: &CandidateDevice) {
        self.event_at(at, candidate, RawEvent::key(codes::BTN_TOUCH, codes::KEY_PRESSED));
        self.event_at(at, candidate, RawEvent::syn_report());
    }

    /// Makes one read at or after `at` fail softly.
    pub fn fail_read_at(&self, at: Duration, candidate: &CandidateDevice) {
        self.schedule(at, candidate, Scripted::ReadFailure);
    }

    /// Puts events in the device's queue as if they arrived before the session.
    pub fn queue_pending(&self, candidate: &CandidateDevice, events: &[RawEvent]) {
        let mut state = self.lock();
        let descriptor = state.descriptor_of(&candidate.event_node);
        if let Some(device) = state.device_mut(descriptor) {
            device.queue.extend(events.iter().copied());
        }
    }

    /// Fires `token` at `at`, interrupting any wait in progress.
    pub fn cancel_at(&self, at: Duration, token: &CancelToken) {
        self.lock().cancel_at = Some((at, token.clone()));
    }

    /// Makes the next multiplexer wait return an error.
    pub fn fail_next_wait(&self) {
        self.fail_waits(1);
    }

    /// Makes the next `count` multiplexer waits return an error.
    pub fn fail_waits(&self, count: u32) {
        self.lock().failing_waits = count;
    }

    pub fn opener(&self) -> ScriptedOpener {
        ScriptedOpener { bus: self.clone() }
    }

    pub fn multiplexer(&self) -> ScriptedMultiplexer {
        ScriptedMultiplexer { bus: self.clone() }
    }

    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    // ── Inspection ───────────────────────────────────────────────────────────

    /// Number of handles currently open across all devices.
    pub fn open_handles(&self) -> usize {
        self.lock().devices.iter().filter(|d| d.is_open).count()
    }

    pub fn open_count(&self, candidate: &CandidateDevice) -> u32 {
        let state = self.lock();
        let descriptor = state.descriptor_of(&candidate.event_node);
        state.device(descriptor).map_or(0, |d| d.open_count)
    }

    pub fn close_count(&self, candidate: &CandidateDevice) -> u32 {
        let state = self.lock();
        let descriptor = state.descriptor_of(&candidate.event_node);
        state.device(descriptor).map_or(0, |d| d.close_count)
    }

    /// Events waiting to be read from `candidate`.
    pub fn queued(&self, candidate: &CandidateDevice) -> usize {
        let state = self.lock();
        let descriptor = state.descriptor_of(&candidate.event_node);
        state.device(descriptor).map_or(0, |d| d.queue.len())
    }

    /// Timeouts passed to every multiplexer wait, in call order.
    pub fn wait_timeouts(&self) -> Vec<Duration> {
        self.lock().wait_timeouts.clone()
    }
}

impl Default for ScriptedTouchBus {
    fn default() -> Self {
        Self::new()
    }
}

// ── Opener ────────────────────────────────────────────────────────────────────

/// [`DeviceOpener`] over a [`ScriptedTouchBus`].
#[derive(Debug, Clone)]
pub struct ScriptedOpener {
    bus: ScriptedTouchBus,
}

impl DeviceOpener for ScriptedOpener {
    type Device = ScriptedDevice;

    fn open(&mut self, candidate: &CandidateDevice) -> Result<ScriptedDevice, DeviceUnreachable> {
        let mut state = self.bus.lock();
        let device = state
            .devices
            .iter_mut()
            .find(|d| d.node == candidate.event_node)
            .ok_or_else(|| DeviceUnreachable::NotFound(candidate.event_node.clone()))?;
        if !device.readable {
            return Err(DeviceUnreachable::PermissionDenied(candidate.event_node.clone()));
        }
        device.is_open = true;
        device.open_count += 1;
        Ok(ScriptedDevice {
            descriptor: device.descriptor,
            bus: self.bus.clone(),
            closed: false,
        })
    }
}

// ── Device ────────────────────────────────────────────────────────────────────

/// One open handle on a scripted device.
#[derive(Debug)]
pub struct ScriptedDevice {
    descriptor: RawDescriptor,
    bus: ScriptedTouchBus,
    closed: bool,
}

impl TouchDevice for ScriptedDevice {
    fn descriptor(&self) -> RawDescriptor {
        self.descriptor
    }

    fn drain_pending(&mut self) -> DeviceRead<usize> {
        if self.closed {
            return DeviceRead::SoftFail("drain after close".to_string());
        }
        let now = self.bus.clock.elapsed();
        let mut state = self.bus.lock();
        state.deliver_until(now);
        match state.device_mut(self.descriptor) {
            Some(device) => {
                let drained = device.queue.len();
                device.queue.clear();
                DeviceRead::Ok(drained)
            }
            None => DeviceRead::SoftFail("device vanished".to_string()),
        }
    }

    fn read_ready(&mut self) -> DeviceRead<Vec<RawEvent>> {
        if self.closed {
            return DeviceRead::SoftFail("read after close".to_string());
        }
        let mut state = self.bus.lock();
        match state.device_mut(self.descriptor) {
            Some(device) if device.pending_failures > 0 => {
                device.pending_failures -= 1;
                DeviceRead::SoftFail("scripted read failure".to_string())
            }
            Some(device) => DeviceRead::Ok(device.queue.drain(..).collect()),
            None => DeviceRead::SoftFail("device vanished".to_string()),
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let mut state = self.bus.lock();
        if let Some(device) = state.device_mut(self.descriptor) {
            device.is_open = false;
            device.close_count += 1;
        }
    }
}

// ── Multiplexer ───────────────────────────────────────────────────────────────

/// [`Multiplexer`] over a [`ScriptedTouchBus`] that advances the shared clock
/// instead of sleeping.
#[derive(Debug, Clone)]
pub struct ScriptedMultiplexer {
    bus: ScriptedTouchBus,
}

impl Multiplexer for ScriptedMultiplexer {
    fn wait(
        &mut self,
        descriptors: &[RawDescriptor],
        timeout: Duration,
    ) -> Result<Vec<usize>, MultiplexError> {
        let clock = &self.bus.clock;
        let mut state = self.bus.lock();
        state.wait_timeouts.push(timeout);
        if state.failing_waits > 0 {
            state.failing_waits -= 1;
            return Err(MultiplexError::Io(std::io::Error::other("scripted wait failure")));
        }

        let now = clock.elapsed();
        state.deliver_until(now);
        let ready = state.ready_indices(descriptors);
        if !ready.is_empty() {
            return Ok(ready);
        }

        let limit = now + timeout;
        let wake_at = state.next_wakeup(descriptors, now, limit).unwrap_or(limit);
        clock.advance_to(wake_at);
        state.deliver_until(wake_at);
        Ok(state.ready_indices(descriptors))
    }
}
