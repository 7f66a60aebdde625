//! libseat session
//!
//! Opens evdev nodes for the libinput backend without root and performs
//! VT switches through seatd or logind.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::os::fd::{AsFd, AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use libseat::{Seat, SeatEvent, SeatRef};
use log::{debug, info, warn};

use super::VtSwitcher;

/// Session activation change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Our VT became active, devices are usable again
    Enable,
    /// Another VT took over, device fds are revoked
    Disable,
}

/// Input device fd handed out by the session
pub struct SeatDevice {
    pub path: String,
    /// Dup of the seat's fd, owned by the caller
    pub fd: OwnedFd,
}

#[derive(Default)]
struct Activation {
    active: bool,
    pending: VecDeque<SessionEvent>,
}

pub struct SeatSession {
    seat: Seat,
    activation: Rc<RefCell<Activation>>,
    /// Seat-side handles by path, closed on `close_device` and drop
    devices: HashMap<String, libseat::Device>,
}

impl SeatSession {
    pub fn open() -> Result<Self> {
        let activation = Rc::new(RefCell::new(Activation::default()));
        let shared = activation.clone();

        let mut seat = Seat::open(move |seat_ref: &mut SeatRef, event: SeatEvent| {
            let mut activation = shared.borrow_mut();
            let event = match event {
                SeatEvent::Enable => {
                    activation.active = true;
                    SessionEvent::Enable
                }
                SeatEvent::Disable => {
                    activation.active = false;
                    // libseat waits for the acknowledgement before switching
                    if let Err(e) = seat_ref.disable() {
                        warn!("libseat: disable not acknowledged: {}", e);
                    }
                    SessionEvent::Disable
                }
            };
            debug!("libseat: {:?}", event);
            activation.pending.push_back(event);
        })
        .context("Failed to open libseat session")?;

        info!("libseat: seat '{}' opened", seat.name());

        Ok(Self {
            seat,
            activation,
            devices: HashMap::new(),
        })
    }

    pub fn is_active(&self) -> bool {
        self.activation.borrow().active
    }

    /// Fd to poll for session events
    pub fn get_fd(&mut self) -> Result<RawFd> {
        let fd = self.seat.get_fd().context("Failed to get seat fd")?;
        Ok(fd.as_raw_fd())
    }

    /// Read queued seat messages; true when any were handled
    pub fn dispatch(&mut self) -> Result<bool> {
        let count = self
            .seat
            .dispatch(0)
            .context("Failed to dispatch seat events")?;
        Ok(count > 0)
    }

    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.activation.borrow_mut().pending.pop_front()
    }

    /// Open an evdev node through the seat
    pub fn open_device<P: AsRef<Path>>(&mut self, path: P) -> Result<SeatDevice> {
        let path = path.as_ref().to_string_lossy().to_string();
        let device = self
            .seat
            .open_device(&path)
            .with_context(|| format!("Seat refused {}", path))?;

        // the seat keeps its fd, the caller gets a dup it may close
        let raw = device.as_fd().as_raw_fd();
        let dup = nix::unistd::dup(raw).context("Failed to dup device fd")?;
        let fd = unsafe { OwnedFd::from_raw_fd(dup) };
        debug!("libseat: {} opened", path);

        if let Some(old) = self.devices.insert(path.clone(), device) {
            self.release(&path, old);
        }
        Ok(SeatDevice { path, fd })
    }

    pub fn close_device(&mut self, device: SeatDevice) {
        if let Some(handle) = self.devices.remove(&device.path) {
            self.release(&device.path, handle);
        }
    }

    fn release(&mut self, path: &str, handle: libseat::Device) {
        match self.seat.close_device(handle) {
            Ok(()) => debug!("libseat: {} closed", path),
            Err(e) => warn!("libseat: closing {} failed: {}", path, e),
        }
    }

    pub fn open_device_count(&self) -> usize {
        self.devices.len()
    }
}

impl VtSwitcher for SeatSession {
    fn switch_vt(&mut self, vt: u32) -> Result<()> {
        let session = i32::try_from(vt).context("VT number out of range")?;
        info!("libseat: switching to VT {}", vt);
        self.seat
            .switch_session(session)
            .with_context(|| format!("Failed to switch to VT {}", vt))?;
        Ok(())
    }
}

/// The libinput backend and the platform share one session
impl VtSwitcher for Rc<RefCell<SeatSession>> {
    fn switch_vt(&mut self, vt: u32) -> Result<()> {
        self.borrow_mut().switch_vt(vt)
    }
}

impl Drop for SeatSession {
    fn drop(&mut self) {
        let paths: Vec<String> = self.devices.keys().cloned().collect();
        for path in paths {
            if let Some(handle) = self.devices.remove(&path) {
                self.release(&path, handle);
            }
        }
        info!("libseat: session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs seatd or logind and seat permissions
    #[test]
    #[ignore]
    fn test_open_session() {
        let session = SeatSession::open();
        assert!(session.is_ok(), "Failed to open seat session");
        let session = session.unwrap();
        assert_eq!(session.open_device_count(), 0);
    }
}
