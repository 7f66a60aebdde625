//! Device registry
//!
//! Devices live in an arena addressed by generation-checked handles.
//! Removing a device bumps its slot generation, so every handle still held
//! elsewhere (redirect lists, pending events, controls) stops resolving
//! instead of aliasing whatever device reuses the slot.

pub mod control;

use log::{debug, info};
use std::fmt;

pub use control::{Capabilities, ControlHandle, DeviceControl, Leds};

use crate::error::{InputError, InputResult};

/// Checked handle to a registered device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId {
    index: u32,
    generation: u32,
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Keyboard,
    Pointer,
    Touch,
    Switch,
    Tablet,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 5] = [
        DeviceKind::Keyboard,
        DeviceKind::Pointer,
        DeviceKind::Touch,
        DeviceKind::Switch,
        DeviceKind::Tablet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DeviceKind::Keyboard => "keyboard",
            DeviceKind::Pointer => "pointer",
            DeviceKind::Touch => "touch",
            DeviceKind::Switch => "switch",
            DeviceKind::Tablet => "tablet",
        }
    }
}

#[derive(Debug)]
pub struct Device {
    name: String,
    kind: DeviceKind,
    /// Backend that created the device ("libinput", "legacy", "fake")
    backend: &'static str,
    /// Backend-native key (sysname, XI device id, fake client id)
    native: String,
    control: Option<DeviceControl>,
    last_time_msec: Option<u32>,
}

impl Device {
    pub fn new(
        kind: DeviceKind,
        name: impl Into<String>,
        backend: &'static str,
        native: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            backend,
            native: native.into(),
            control: None,
            last_time_msec: None,
        }
    }

    pub fn with_control(mut self, control: DeviceControl) -> Self {
        self.control = Some(control);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub fn native(&self) -> &str {
        &self.native
    }

    pub fn control(&self) -> Option<&DeviceControl> {
        self.control.as_ref()
    }

    pub fn control_mut(&mut self) -> Option<&mut DeviceControl> {
        self.control.as_mut()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.control
            .as_ref()
            .map(|c| c.capabilities())
            .unwrap_or_default()
    }
}

struct Slot {
    generation: u32,
    device: Option<Device>,
}

/// Arena of live devices for one platform
#[derive(Default)]
pub struct DeviceRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, device: Device) -> DeviceId {
        info!(
            "Device added: {} ({}, {})",
            device.name,
            device.kind.name(),
            device.backend
        );
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.device = Some(device);
            return DeviceId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            device: Some(device),
        });
        DeviceId {
            index,
            generation: 0,
        }
    }

    /// Free the slot; the handle and all its copies become stale
    pub fn remove(&mut self, id: DeviceId) -> Option<Device> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let device = slot.device.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        info!("Device removed: {} ({})", device.name, device.kind.name());
        Some(device)
    }

    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.device.as_ref()
    }

    pub fn get_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.device.as_mut()
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, &Device)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.device.as_ref().map(|device| {
                (
                    DeviceId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    device,
                )
            })
        })
    }

    pub fn of_kind(&self, kind: DeviceKind) -> impl Iterator<Item = (DeviceId, &Device)> {
        self.iter().filter(move |(_, d)| d.kind == kind)
    }

    /// Clamp a timestamp so one device's stream never goes backwards
    pub fn stamp(&mut self, id: DeviceId, time_msec: u32) -> InputResult<u32> {
        let device = self.get_mut(id).ok_or(InputError::StaleDevice(id))?;
        let time = match device.last_time_msec {
            Some(last) if time_msec < last => {
                debug!(
                    "{}: timestamp went backwards ({} < {}), clamping",
                    device.name, time_msec, last
                );
                last
            }
            _ => time_msec,
        };
        device.last_time_msec = Some(time);
        Ok(time)
    }

    /// Enable or disable a device through its control
    ///
    /// Returns whether the state changed.
    pub fn set_enabled(&mut self, id: DeviceId, enabled: bool) -> InputResult<bool> {
        let device = self.get_mut(id).ok_or(InputError::StaleDevice(id))?;
        match device.control.as_mut() {
            Some(control) if control.supports(Capabilities::SUPPORTS_DISABLE) => {
                Ok(control.apply_enabled(enabled))
            }
            _ => Err(InputError::Unsupported {
                device: id,
                capability: "disable",
            }),
        }
    }

    /// Push the LED state to every keyboard control that has LEDs
    pub fn update_keyboard_leds(&mut self, leds: Leds) {
        for slot in self.slots.iter_mut() {
            if let Some(device) = slot.device.as_mut() {
                if device.kind != DeviceKind::Keyboard {
                    continue;
                }
                if let Some(control) = device.control.as_mut() {
                    control.apply_leds(leds);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyboard(name: &str) -> Device {
        Device::new(DeviceKind::Keyboard, name, "test", name)
    }

    #[test]
    fn test_removed_handle_never_resolves_again() {
        let mut registry = DeviceRegistry::new();
        let a = registry.insert(keyboard("a"));
        assert!(registry.remove(a).is_some());
        assert!(registry.get(a).is_none());

        // slot is reused with a new generation
        let b = registry.insert(keyboard("b"));
        assert_ne!(a, b);
        assert!(registry.get(a).is_none());
        assert_eq!(registry.get(b).map(|d| d.name()), Some("b"));
        assert!(registry.remove(a).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_of_kind_filters() {
        let mut registry = DeviceRegistry::new();
        registry.insert(keyboard("kbd"));
        registry.insert(Device::new(DeviceKind::Pointer, "mouse", "test", "m"));
        registry.insert(Device::new(DeviceKind::Touch, "screen", "test", "t"));

        let pointers: Vec<_> = registry
            .of_kind(DeviceKind::Pointer)
            .map(|(_, d)| d.name().to_string())
            .collect();
        assert_eq!(pointers, vec!["mouse"]);
        assert_eq!(registry.iter().count(), 3);
    }

    #[test]
    fn test_stamp_clamps_backwards_time() {
        let mut registry = DeviceRegistry::new();
        let id = registry.insert(keyboard("kbd"));
        assert_eq!(registry.stamp(id, 100), Ok(100));
        assert_eq!(registry.stamp(id, 90), Ok(100));
        assert_eq!(registry.stamp(id, 120), Ok(120));

        registry.remove(id);
        assert_eq!(registry.stamp(id, 130), Err(InputError::StaleDevice(id)));
    }

    #[test]
    fn test_disable_without_capability_is_unsupported() {
        let mut registry = DeviceRegistry::new();
        let plain = registry.insert(
            Device::new(DeviceKind::Pointer, "mouse", "test", "m")
                .with_control(DeviceControl::new(Capabilities::empty())),
        );
        assert!(matches!(
            registry.set_enabled(plain, false),
            Err(InputError::Unsupported { .. })
        ));

        let pad = registry.insert(
            Device::new(DeviceKind::Pointer, "touchpad", "test", "tp").with_control(
                DeviceControl::new(Capabilities::SUPPORTS_DISABLE | Capabilities::TOUCHPAD),
            ),
        );
        assert_eq!(registry.set_enabled(pad, false), Ok(true));
        assert_eq!(registry.set_enabled(pad, false), Ok(false));
    }
}
