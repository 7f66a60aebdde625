//! Key repeat timer
//!
//! Armed by the keyboard repeat spy, driven by `tick`. Time is the event
//! clock in milliseconds.

use crate::device::DeviceId;
use crate::seat::RepeatInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    device: Option<DeviceId>,
    keycode: u32,
    /// When the next repeat is due
    due_msec: u32,
}

#[derive(Debug)]
pub struct KeyRepeat {
    info: RepeatInfo,
    pending: Option<Pending>,
}

impl KeyRepeat {
    pub fn new(info: RepeatInfo) -> Self {
        Self {
            info,
            pending: None,
        }
    }

    pub fn info(&self) -> RepeatInfo {
        self.info
    }

    /// New repeat settings; a running repeat is stopped
    pub fn set_info(&mut self, info: RepeatInfo) {
        self.info = info;
        self.pending = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.info.rate > 0
    }

    pub fn arm(&mut self, device: Option<DeviceId>, keycode: u32, now_msec: u32) {
        if !self.is_enabled() {
            return;
        }
        self.pending = Some(Pending {
            device,
            keycode,
            due_msec: now_msec.wrapping_add(self.info.delay_ms),
        });
    }

    pub fn disarm(&mut self) {
        self.pending = None;
    }

    /// Key currently repeating
    pub fn key(&self) -> Option<(Option<DeviceId>, u32)> {
        self.pending.map(|p| (p.device, p.keycode))
    }

    /// Returns the key if a repeat is due and schedules the next one
    ///
    /// At most one repeat is produced per call, a late tick does not
    /// produce a burst.
    pub fn tick(&mut self, now_msec: u32) -> Option<(Option<DeviceId>, u32)> {
        let rate = self.info.rate;
        let pending = self.pending.as_mut()?;
        // signed distance handles clock wrap
        if (now_msec.wrapping_sub(pending.due_msec) as i32) < 0 {
            return None;
        }
        let interval = (1000 / rate.max(1)).max(1);
        pending.due_msec = now_msec.wrapping_add(interval);
        Some((pending.device, pending.keycode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_then_rate() {
        let mut repeat = KeyRepeat::new(RepeatInfo {
            rate: 25,
            delay_ms: 600,
        });
        repeat.arm(None, 30, 1_000);
        assert_eq!(repeat.tick(1_599), None);
        assert_eq!(repeat.tick(1_600), Some((None, 30)));
        assert_eq!(repeat.tick(1_620), None);
        assert_eq!(repeat.tick(1_640), Some((None, 30)));
        repeat.disarm();
        assert_eq!(repeat.tick(5_000), None);
    }

    #[test]
    fn test_zero_rate_never_arms() {
        let mut repeat = KeyRepeat::new(RepeatInfo {
            rate: 0,
            delay_ms: 600,
        });
        repeat.arm(None, 30, 0);
        assert_eq!(repeat.key(), None);
        assert_eq!(repeat.tick(10_000), None);
    }
}
