//! Session management
//!
//! VT switching goes through a `VtSwitcher`. With the `seatd` feature the
//! libseat session implements it and also opens input devices for the
//! libinput backend.

#[cfg(all(target_os = "linux", feature = "seatd"))]
pub mod seatd;

#[cfg(all(target_os = "linux", feature = "seatd"))]
pub use seatd::{SeatDevice, SeatSession, SessionEvent};

use anyhow::Result;

/// Switches the active virtual terminal
pub trait VtSwitcher {
    fn switch_vt(&mut self, vt: u32) -> Result<()>;
}
