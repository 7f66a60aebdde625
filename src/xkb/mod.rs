//! Keyboard mapping
//!
//! `Xkb` owns one default keyboard plus one per keyboard device. The
//! keyboard that last produced a key event is the primary one; layout
//! notifications are only raised for it.

pub mod keyboard;
pub mod keycodes;
pub mod keymap;
pub mod layout_manager;
pub mod policy;

use bitflags::bitflags;
use log::{debug, info, warn};
use std::collections::HashMap;

pub use keyboard::Keyboard;
pub use keymap::{Keymap, KeymapFactory, ModifierState, RuleNames, XkbFactory, XkbKeymap};
pub use layout_manager::LayoutManager;
pub use policy::{LayoutPolicy, PolicyKind, WindowInfo, WindowType};

use crate::device::DeviceId;
use crate::error::InputResult;

bitflags! {
    /// Keyboard modifier flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const SHIFT  = 0b0000_0001;
        const CAPS   = 0b0000_0010;
        const CTRL   = 0b0000_0100;
        const ALT    = 0b0000_1000;
        const LOGO   = 0b0001_0000;
        const NUM    = 0b0010_0000;
        /// Last key came from the keypad
        const KEYPAD = 0b0100_0000;
    }
}

impl Modifiers {
    /// Modifiers that take part in shortcut matching
    pub const SHORTCUT_MASK: Modifiers = Modifiers::SHIFT
        .union(Modifiers::CTRL)
        .union(Modifiers::ALT)
        .union(Modifiers::LOGO);
}

/// NumLock handling when the first keymap is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumLock {
    On,
    Off,
    #[default]
    Leave,
}

impl NumLock {
    /// Config value: 0 = on, 1 = off, anything else = leave
    pub fn from_config(value: i64) -> Self {
        match value {
            0 => NumLock::On,
            1 => NumLock::Off,
            _ => NumLock::Leave,
        }
    }
}

/// Keymap settings shared by all keyboards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeymapSettings {
    pub names: RuleNames,
    /// Configured short layout names, one per layout in `names`
    pub layouts: Vec<String>,
    pub num_lock: NumLock,
}

pub struct Xkb {
    factory: Box<dyn KeymapFactory>,
    settings: KeymapSettings,
    default_keyboard: Keyboard,
    keyboards: HashMap<DeviceId, Keyboard>,
    last_used: Option<DeviceId>,
}

impl Xkb {
    pub fn new(factory: Box<dyn KeymapFactory>) -> Self {
        Self {
            factory,
            settings: KeymapSettings::default(),
            default_keyboard: Keyboard::new(),
            keyboards: HashMap::new(),
            last_used: None,
        }
    }

    pub fn settings(&self) -> &KeymapSettings {
        &self.settings
    }

    /// Recompile every keyboard from new settings
    ///
    /// On a compile failure the previous keymaps stay installed.
    pub fn reconfigure(&mut self, settings: KeymapSettings) -> InputResult<()> {
        let keymap = self.factory.compile(&settings.names)?;
        info!(
            "Keymap reconfigured: {} layout(s) [{}]",
            keymap.layout_count(),
            settings.layouts.join(",")
        );
        self.default_keyboard
            .update_keymap(keymap, settings.layouts.clone(), settings.num_lock);

        for (id, keyboard) in self.keyboards.iter_mut() {
            match self.factory.compile(&settings.names) {
                Ok(keymap) => {
                    keyboard.update_keymap(keymap, settings.layouts.clone(), settings.num_lock)
                }
                Err(e) => warn!("Keymap for keyboard {} not updated: {}", id, e),
            }
        }
        self.settings = settings;
        Ok(())
    }

    /// Create the mapping state for a new keyboard device
    pub fn add_keyboard(&mut self, id: DeviceId) {
        let mut keyboard = Keyboard::new();
        match self.factory.compile(&self.settings.names) {
            Ok(keymap) => keyboard.update_keymap(
                keymap,
                self.settings.layouts.clone(),
                self.settings.num_lock,
            ),
            Err(e) => warn!("Keyboard {} has no keymap: {}", id, e),
        }
        // new keyboards start on the layout the user currently sees
        let layout = self.primary().layout();
        if layout != 0 {
            let _ = keyboard.switch_to_layout(layout);
        }
        debug!("xkb keyboard created for {}", id);
        self.keyboards.insert(id, keyboard);
    }

    pub fn remove_keyboard(&mut self, id: DeviceId) {
        if self.keyboards.remove(&id).is_some() {
            debug!("xkb keyboard dropped for {}", id);
        }
        if self.last_used == Some(id) {
            self.last_used = None;
        }
    }

    /// Record the device that produced the latest key event
    pub fn mark_used(&mut self, id: Option<DeviceId>) {
        if let Some(id) = id {
            if self.keyboards.contains_key(&id) {
                self.last_used = Some(id);
            }
        }
    }

    pub fn is_primary(&self, id: Option<DeviceId>) -> bool {
        match self.last_used {
            Some(last) => id == Some(last),
            None => id.map_or(true, |id| !self.keyboards.contains_key(&id)),
        }
    }

    /// Keyboard that events from `device` update; unknown or synthetic
    /// sources fall back to the default keyboard
    pub fn keyboard(&self, device: Option<DeviceId>) -> &Keyboard {
        device
            .and_then(|id| self.keyboards.get(&id))
            .unwrap_or(&self.default_keyboard)
    }

    pub fn keyboard_mut(&mut self, device: Option<DeviceId>) -> &mut Keyboard {
        match device {
            Some(id) if self.keyboards.contains_key(&id) => {
                self.keyboards.get_mut(&id).unwrap_or(&mut self.default_keyboard)
            }
            _ => &mut self.default_keyboard,
        }
    }

    pub fn primary(&self) -> &Keyboard {
        self.keyboard(self.last_used)
    }

    pub fn primary_mut(&mut self) -> &mut Keyboard {
        let last = self.last_used;
        self.keyboard_mut(last)
    }

    /// Apply a layout switch to the primary keyboard and mirror the result
    /// on every other keyboard
    ///
    /// Returns the primary's layout before and after the switch.
    pub fn switch_layout<F>(&mut self, switch: F) -> InputResult<(u32, u32)>
    where
        F: FnOnce(&mut Keyboard) -> InputResult<()>,
    {
        let primary = self.primary_mut();
        let previous = primary.layout();
        switch(primary)?;
        let current = primary.layout();
        if current != previous {
            self.sync_layout(current);
        }
        Ok((previous, current))
    }

    fn sync_layout(&mut self, layout: u32) {
        let last = self.last_used;
        if last.is_some() {
            let _ = self.default_keyboard.switch_to_layout(layout);
        }
        for (id, keyboard) in self.keyboards.iter_mut() {
            if Some(*id) != last && keyboard.layout() != layout {
                let _ = keyboard.switch_to_layout(layout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, DeviceKind, DeviceRegistry};
    use crate::event::KeyState;
    use crate::testing::FakeKeymapFactory;
    use crate::xkb::keycodes::KEY_LEFTCTRL;

    fn settings(layouts: &[&str]) -> KeymapSettings {
        KeymapSettings {
            names: RuleNames {
                layout: layouts.join(","),
                ..Default::default()
            },
            layouts: layouts.iter().map(|s| s.to_string()).collect(),
            num_lock: NumLock::Leave,
        }
    }

    #[test]
    fn test_num_lock_from_config() {
        assert_eq!(NumLock::from_config(0), NumLock::On);
        assert_eq!(NumLock::from_config(1), NumLock::Off);
        assert_eq!(NumLock::from_config(2), NumLock::Leave);
        assert_eq!(NumLock::from_config(-3), NumLock::Leave);
    }

    #[test]
    fn test_primary_follows_last_used() {
        let mut registry = DeviceRegistry::new();
        let a = registry.insert(Device::new(DeviceKind::Keyboard, "a", "test", "a"));
        let b = registry.insert(Device::new(DeviceKind::Keyboard, "b", "test", "b"));

        let mut xkb = Xkb::new(Box::new(FakeKeymapFactory));
        xkb.reconfigure(settings(&["us", "de"])).unwrap();
        xkb.add_keyboard(a);
        xkb.add_keyboard(b);
        assert!(xkb.is_primary(None));

        xkb.mark_used(Some(b));
        xkb.keyboard_mut(Some(b))
            .update_key(KEY_LEFTCTRL, KeyState::Pressed);
        assert!(xkb.is_primary(Some(b)));
        assert!(!xkb.is_primary(Some(a)));
        assert!(xkb.primary().modifiers().contains(Modifiers::CTRL));

        xkb.remove_keyboard(b);
        assert!(xkb.is_primary(None));
    }

    #[test]
    fn test_switch_mirrors_to_all_keyboards() {
        let mut registry = DeviceRegistry::new();
        let a = registry.insert(Device::new(DeviceKind::Keyboard, "a", "test", "a"));

        let mut xkb = Xkb::new(Box::new(FakeKeymapFactory));
        xkb.reconfigure(settings(&["us", "de", "fr"])).unwrap();
        xkb.add_keyboard(a);

        let (prev, cur) = xkb.switch_layout(|k| k.switch_to_layout(2)).unwrap();
        assert_eq!((prev, cur), (0, 2));
        assert_eq!(xkb.keyboard(Some(a)).layout(), 2);

        assert!(xkb.switch_layout(|k| k.switch_to_layout(7)).is_err());
        assert_eq!(xkb.primary().layout(), 2);
    }

    #[test]
    fn test_failed_reconfigure_keeps_keymap() {
        let mut xkb = Xkb::new(Box::new(FakeKeymapFactory));
        xkb.reconfigure(settings(&["us", "de"])).unwrap();
        let mut broken = settings(&["us"]);
        broken.names.layout = "invalid".into();
        assert!(xkb.reconfigure(broken).is_err());
        assert_eq!(xkb.primary().layouts_count(), 2);
    }
}
