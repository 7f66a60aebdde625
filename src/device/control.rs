//! Device control layer
//!
//! Capability flags and the backend hook used to apply enable/disable and
//! LED changes to real hardware.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// What a device can do beyond emitting events
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        const SUPPORTS_DISABLE      = 0b0000_0001;
        const TOUCHPAD              = 0b0000_0010;
        const ALPHANUMERIC_KEYBOARD = 0b0000_0100;
        const TABLET_MODE_SWITCH    = 0b0000_1000;
        const LID_SWITCH            = 0b0001_0000;
        const LEDS                  = 0b0010_0000;
    }
}

bitflags! {
    /// Keyboard indicator LEDs
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Leds: u32 {
        const NUM_LOCK    = 0b001;
        const CAPS_LOCK   = 0b010;
        const SCROLL_LOCK = 0b100;
    }
}

/// Backend side of a control: applies state to the physical device
pub trait ControlHandle {
    /// Returns false when the backend refused the change
    fn set_enabled(&mut self, enabled: bool) -> bool;

    fn set_leds(&mut self, _leds: Leds) {}
}

pub struct DeviceControl {
    caps: Capabilities,
    enabled: bool,
    leds: Leds,
    handle: Option<Box<dyn ControlHandle>>,
}

impl DeviceControl {
    /// Control without a backend hook (state is tracked only)
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            enabled: true,
            leds: Leds::empty(),
            handle: None,
        }
    }

    pub fn with_handle(caps: Capabilities, handle: Box<dyn ControlHandle>) -> Self {
        Self {
            handle: Some(handle),
            ..Self::new(caps)
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn supports(&self, caps: Capabilities) -> bool {
        self.caps.contains(caps)
    }

    pub fn is_touchpad(&self) -> bool {
        self.caps.contains(Capabilities::TOUCHPAD)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn leds(&self) -> Leds {
        self.leds
    }

    /// Apply enabled state. Callers check `SUPPORTS_DISABLE` first.
    ///
    /// Returns true when the state actually changed.
    pub(crate) fn apply_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        if let Some(handle) = self.handle.as_mut() {
            if !handle.set_enabled(enabled) {
                return false;
            }
        }
        self.enabled = enabled;
        true
    }

    pub(crate) fn apply_leds(&mut self, leds: Leds) {
        if !self.caps.contains(Capabilities::LEDS) || self.leds == leds {
            return;
        }
        self.leds = leds;
        if let Some(handle) = self.handle.as_mut() {
            handle.set_leds(leds);
        }
    }
}

impl fmt::Debug for DeviceControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceControl")
            .field("caps", &self.caps)
            .field("enabled", &self.enabled)
            .field("leds", &self.leds)
            .field("has_handle", &self.handle.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Refusing(Rc<RefCell<Vec<bool>>>);

    impl ControlHandle for Refusing {
        fn set_enabled(&mut self, enabled: bool) -> bool {
            self.0.borrow_mut().push(enabled);
            false
        }
    }

    #[test]
    fn test_refused_change_keeps_state() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut control = DeviceControl::with_handle(
            Capabilities::SUPPORTS_DISABLE | Capabilities::TOUCHPAD,
            Box::new(Refusing(calls.clone())),
        );
        assert!(!control.apply_enabled(false));
        assert!(control.is_enabled());
        assert_eq!(*calls.borrow(), vec![false]);
    }

    #[test]
    fn test_leds_need_capability() {
        let mut control = DeviceControl::new(Capabilities::ALPHANUMERIC_KEYBOARD);
        control.apply_leds(Leds::NUM_LOCK);
        assert_eq!(control.leds(), Leds::empty());

        let mut control = DeviceControl::new(Capabilities::LEDS);
        control.apply_leds(Leds::NUM_LOCK | Leds::CAPS_LOCK);
        assert_eq!(control.leds(), Leds::NUM_LOCK | Leds::CAPS_LOCK);
    }
}
