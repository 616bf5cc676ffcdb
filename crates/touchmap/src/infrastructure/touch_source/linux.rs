//! Linux touch source via evdev and `poll(2)`.
//!
//! Each candidate's event node is opened with the `evdev` crate and switched
//! to `O_NONBLOCK`, so `fetch_events` returns `WouldBlock` instead of parking
//! the thread once the kernel queue is empty.  [`PollMultiplexer`] waits on
//! the raw descriptors of every pooled device at once.
//!
//! # Permissions
//!
//! Reading `/dev/input/event*` needs root or membership of the `input`
//! group.  Nodes the current user cannot read are rejected before open, so
//! they show up as [`DeviceUnreachable::PermissionDenied`] and are skipped.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use touchmap_core::{CandidateDevice, RawEvent};

use crate::application::assign_touch::{
    DeviceOpener, DeviceRead, DeviceUnreachable, MultiplexError, Multiplexer, RawDescriptor,
    TouchDevice,
};

// ── Opener ────────────────────────────────────────────────────────────────────

/// Opens candidates as evdev devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvdevOpener;

impl EvdevOpener {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceOpener for EvdevOpener {
    type Device = EvdevTouchDevice;

    fn open(&mut self, candidate: &CandidateDevice) -> Result<EvdevTouchDevice, DeviceUnreachable> {
        let path = candidate.event_node.clone();
        if !is_readable(&path) {
            return Err(if path.exists() {
                DeviceUnreachable::PermissionDenied(path)
            } else {
                DeviceUnreachable::NotFound(path)
            });
        }

        let device = evdev::Device::open(&path)
            .map_err(|e| DeviceUnreachable::from_io(path.clone(), e))?;
        set_nonblocking(&device).map_err(|e| DeviceUnreachable::from_io(path.clone(), e))?;
        debug!(
            "opened {} ({})",
            path.display(),
            device.name().unwrap_or("unnamed device")
        );

        Ok(EvdevTouchDevice {
            device: Some(device),
            path,
        })
    }
}

/// Mirrors `access(path, R_OK)`.
fn is_readable(path: &Path) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: `c_path` is a valid NUL-terminated string for the duration of the call.
    unsafe { libc::access(c_path.as_ptr(), libc::R_OK) == 0 }
}

fn set_nonblocking(device: &evdev::Device) -> io::Result<()> {
    let fd = device.as_raw_fd();

    // Preserve existing flags; just OR in O_NONBLOCK.
    // SAFETY: `fd` is owned by `device`, which outlives both calls.
    let current = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if current < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above.
    let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, current | libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

// ── Device ────────────────────────────────────────────────────────────────────

/// An open, non-blocking evdev device.
#[derive(Debug)]
pub struct EvdevTouchDevice {
    /// `None` once closed; dropping the `evdev::Device` closes the descriptor.
    device: Option<evdev::Device>,
    path: PathBuf,
}

impl EvdevTouchDevice {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads one batch.  `Ok(None)` means the kernel queue is empty.
    fn fetch_batch(&mut self) -> io::Result<Option<Vec<RawEvent>>> {
        let Some(device) = self.device.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "device is closed"));
        };
        match device.fetch_events() {
            Ok(events) => Ok(Some(
                events
                    .map(|e| RawEvent::new(e.event_type().0, e.code(), e.value()))
                    .collect(),
            )),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl TouchDevice for EvdevTouchDevice {
    fn descriptor(&self) -> RawDescriptor {
        self.device.as_ref().map_or(-1, AsRawFd::as_raw_fd)
    }

    fn drain_pending(&mut self) -> DeviceRead<usize> {
        let mut drained = 0;
        loop {
            match self.fetch_batch() {
                Ok(Some(batch)) if !batch.is_empty() => drained += batch.len(),
                Ok(_) => return DeviceRead::Ok(drained),
                Err(e) => return DeviceRead::SoftFail(e.to_string()),
            }
        }
    }

    fn read_ready(&mut self) -> DeviceRead<Vec<RawEvent>> {
        match self.fetch_batch() {
            Ok(batch) => DeviceRead::Ok(batch.unwrap_or_default()),
            Err(e) => DeviceRead::SoftFail(e.to_string()),
        }
    }

    fn close(&mut self) {
        if self.device.take().is_some() {
            debug!("closed {}", self.path.display());
        }
    }
}

// ── Multiplexer ───────────────────────────────────────────────────────────────

/// [`Multiplexer`] backed by `poll(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PollMultiplexer;

impl PollMultiplexer {
    pub fn new() -> Self {
        Self
    }
}

/// Rounds up so a sub-millisecond remainder does not become a busy `poll(.., 0)`.
fn timeout_millis(timeout: Duration) -> libc::c_int {
    let millis = timeout.as_micros().div_ceil(1000);
    libc::c_int::try_from(millis).unwrap_or(libc::c_int::MAX)
}

impl Multiplexer for PollMultiplexer {
    fn wait(
        &mut self,
        descriptors: &[RawDescriptor],
        timeout: Duration,
    ) -> Result<Vec<usize>, MultiplexError> {
        let mut pollfds: Vec<libc::pollfd> = descriptors
            .iter()
            .map(|fd| libc::pollfd {
                fd: *fd,
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();

        // SAFETY: `pollfds` is a live, correctly sized buffer for the whole call.
        let rc = unsafe {
            libc::poll(
                pollfds.as_mut_ptr(),
                pollfds.len() as libc::nfds_t,
                timeout_millis(timeout),
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                // A signal arrived; let the caller check for cancellation.
                return Ok(Vec::new());
            }
            return Err(MultiplexError::Io(err));
        }

        // Errors and hang-ups count as ready so the next read reports them.
        let ready_mask = libc::POLLIN | libc::POLLERR | libc::POLLHUP | libc::POLLNVAL;
        Ok(pollfds
            .iter()
            .enumerate()
            .filter(|(_, pfd)| pfd.revents & ready_mask != 0)
            .map(|(i, _)| i)
            .collect())
    }
}
