//! Keyboard mapping engine
//!
//! One `Keyboard` per keyboard device (plus the default one). Holds the
//! compiled keymap, the effective layout, modifier flags and LEDs.

use log::{debug, info};

use super::keymap::{Keymap, ModifierState};
use super::{Modifiers, NumLock};
use crate::device::Leds;
use crate::error::{InputError, InputResult};
use crate::event::KeyState;
use crate::xkb::keycodes::{is_keypad_keysym, is_letter_keysym};

pub struct Keyboard {
    keymap: Option<Box<dyn Keymap>>,
    /// Short layout names as configured ("de", "us", "de(neo)")
    layouts: Vec<String>,
    layout: u32,
    state: ModifierState,
    modifiers: Modifiers,
    consumed: Modifiers,
    /// Keysym of the last pressed key
    keysym: u32,
    leds: Leds,
    startup_num_lock_done: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            keymap: None,
            layouts: Vec::new(),
            layout: 0,
            state: ModifierState::default(),
            modifiers: Modifiers::empty(),
            consumed: Modifiers::empty(),
            keysym: 0,
            leds: Leds::empty(),
            startup_num_lock_done: false,
        }
    }

    /// Install a freshly compiled keymap
    ///
    /// Modifier and layout state start over from the new keymap. The startup
    /// NumLock setting is applied the first time a keymap is installed.
    pub fn update_keymap(&mut self, keymap: Box<dyn Keymap>, layouts: Vec<String>, num_lock: NumLock) {
        self.keymap = Some(keymap);
        self.layouts = layouts;
        self.evaluate_startup_num_lock(num_lock);
        self.update_modifiers();
    }

    pub fn has_keymap(&self) -> bool {
        self.keymap.is_some()
    }

    fn evaluate_startup_num_lock(&mut self, setting: NumLock) {
        if self.startup_num_lock_done {
            return;
        }
        self.startup_num_lock_done = true;

        let Some(keymap) = self.keymap.as_mut() else {
            return;
        };
        let mask = keymap.num_lock_mask();
        if mask == 0 || setting == NumLock::Leave {
            return;
        }

        let mut state = keymap.modifier_state();
        let active = state.locked & mask != 0;
        let wanted = setting == NumLock::On;
        if active == wanted {
            return;
        }

        if wanted {
            state.locked |= mask;
        } else {
            state.locked &= !mask;
        }
        keymap.update_mask(state);
        info!("NumLock {} on startup", if wanted { "enabled" } else { "disabled" });
    }

    /// Feed a key transition from a device
    pub fn update_key(&mut self, keycode: u32, state: KeyState) {
        let Some(keymap) = self.keymap.as_mut() else {
            return;
        };
        keymap.update_key(keycode, state);
        if state == KeyState::Pressed {
            self.keysym = keymap.keysym(keycode);
        }
        self.update_modifiers();
        self.update_consumed_modifiers(keycode);
    }

    /// Overwrite the serialized state (backends that track modifiers)
    pub fn update_modifier_state(&mut self, state: ModifierState) {
        let Some(keymap) = self.keymap.as_mut() else {
            return;
        };
        keymap.update_mask(state);
        self.update_modifiers();
    }

    fn update_modifiers(&mut self) {
        let Some(keymap) = self.keymap.as_ref() else {
            return;
        };
        let active = keymap.active_modifiers();
        let mut mods = active & !Modifiers::KEYPAD;
        if active.contains(Modifiers::CAPS) {
            mods |= Modifiers::SHIFT;
        }
        if is_keypad_keysym(self.keysym) {
            mods |= Modifiers::KEYPAD;
        }
        self.modifiers = mods;

        let leds = keymap.leds();
        if leds != self.leds {
            debug!("keyboard LEDs changed: {:?}", leds);
            self.leds = leds;
        }

        self.state = keymap.modifier_state();
        self.layout = self.state.layout;
    }

    fn update_consumed_modifiers(&mut self, keycode: u32) {
        if let Some(keymap) = self.keymap.as_ref() {
            self.consumed = keymap.consumed_modifiers(keycode) & Modifiers::SHORTCUT_MASK;
        }
    }

    /// Modifiers a global shortcut has to match exactly
    ///
    /// Active minus consumed, except that a Shift consumed only to produce
    /// an uppercase letter still counts (Shift+W must be bindable).
    pub fn modifiers_relevant_for_shortcuts(&self) -> Modifiers {
        let Some(keymap) = self.keymap.as_ref() else {
            return Modifiers::empty();
        };
        let mods = keymap.active_modifiers() & Modifiers::SHORTCUT_MASK;

        let mut consumed = self.consumed;
        if mods.contains(Modifiers::SHIFT)
            && consumed == Modifiers::SHIFT
            && is_letter_keysym(self.keysym)
        {
            consumed = Modifiers::empty();
        }
        mods & !consumed
    }

    pub fn should_key_repeat(&self, keycode: u32) -> bool {
        self.keymap
            .as_ref()
            .map(|k| k.key_repeats(keycode))
            .unwrap_or(false)
    }

    /// Keysym a key would produce in the current state
    pub fn to_keysym(&self, keycode: u32) -> u32 {
        self.keymap
            .as_ref()
            .map(|k| k.keysym(keycode))
            .unwrap_or(0)
    }

    pub fn keysym(&self) -> u32 {
        self.keysym
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn consumed_modifiers(&self) -> Modifiers {
        self.consumed
    }

    pub fn modifier_state(&self) -> ModifierState {
        self.state
    }

    pub fn leds(&self) -> Leds {
        self.leds
    }

    pub fn layout(&self) -> u32 {
        self.layout
    }

    pub fn layouts_count(&self) -> u32 {
        self.keymap.as_ref().map(|k| k.layout_count()).unwrap_or(0)
    }

    /// Display name of the active layout
    pub fn layout_name(&self) -> String {
        self.layout_name_from_index(self.layout).unwrap_or_default()
    }

    pub fn layout_name_from_index(&self, index: u32) -> Option<String> {
        self.keymap.as_ref()?.layout_name(index)
    }

    pub fn layout_short_name_from_index(&self, index: u32) -> Option<&str> {
        self.layouts.get(index as usize).map(String::as_str)
    }

    pub fn keymap_text(&self) -> Option<String> {
        self.keymap.as_ref()?.to_text()
    }

    /// Lock the given layout; a switch to the current layout succeeds silently
    pub fn switch_to_layout(&mut self, index: u32) -> InputResult<()> {
        let count = self.layouts_count();
        if index >= count {
            return Err(InputError::InvalidLayout { index, count });
        }
        if let Some(keymap) = self.keymap.as_mut() {
            let mut state = keymap.modifier_state();
            state.layout = index;
            keymap.update_mask(state);
        }
        self.update_modifiers();
        Ok(())
    }

    pub fn switch_to_next_layout(&mut self) -> InputResult<()> {
        let count = self.layouts_count();
        if count == 0 {
            return Err(InputError::InvalidLayout { index: 0, count });
        }
        self.switch_to_layout((self.layout + 1) % count)
    }

    pub fn switch_to_previous_layout(&mut self) -> InputResult<()> {
        let count = self.layouts_count();
        if count == 0 {
            return Err(InputError::InvalidLayout { index: 0, count });
        }
        let previous = if self.layout == 0 {
            count - 1
        } else {
            self.layout - 1
        };
        self.switch_to_layout(previous)
    }

    /// Resolve a layout by display name or configured short name
    pub fn layout_index_by_name(&self, name: &str) -> Option<u32> {
        (0..self.layouts_count()).find(|&i| {
            self.layout_name_from_index(i).as_deref() == Some(name)
                || self.layout_short_name_from_index(i) == Some(name)
        })
    }

    pub fn switch_to_layout_by_name(&mut self, name: &str) -> InputResult<()> {
        let index = self
            .layout_index_by_name(name)
            .ok_or_else(|| InputError::UnknownLayout(name.to_string()))?;
        self.switch_to_layout(index)
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeKeymap;
    use crate::xkb::keycodes::*;

    fn keyboard(layouts: &[&str]) -> Keyboard {
        let mut kbd = Keyboard::new();
        kbd.update_keymap(
            Box::new(FakeKeymap::new(layouts)),
            layouts.iter().map(|s| s.to_string()).collect(),
            NumLock::Leave,
        );
        kbd
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let mut kbd = keyboard(&["us", "de", "fr"]);
        kbd.switch_to_previous_layout().unwrap();
        assert_eq!(kbd.layout(), 2);
        kbd.switch_to_next_layout().unwrap();
        assert_eq!(kbd.layout(), 0);
        kbd.switch_to_next_layout().unwrap();
        assert_eq!(kbd.layout(), 1);
    }

    #[test]
    fn test_out_of_range_switch_is_rejected() {
        let mut kbd = keyboard(&["us", "de"]);
        kbd.switch_to_layout(1).unwrap();
        assert_eq!(
            kbd.switch_to_layout(2),
            Err(InputError::InvalidLayout { index: 2, count: 2 })
        );
        assert_eq!(kbd.layout(), 1);
        // self switch is fine
        assert!(kbd.switch_to_layout(1).is_ok());
    }

    #[test]
    fn test_no_keymap_rejects_switches() {
        let mut kbd = Keyboard::new();
        assert!(kbd.switch_to_next_layout().is_err());
        assert!(kbd.switch_to_layout(0).is_err());
        assert_eq!(kbd.layouts_count(), 0);
    }

    #[test]
    fn test_switch_by_name() {
        let mut kbd = keyboard(&["us", "de"]);
        kbd.switch_to_layout_by_name("de").unwrap();
        assert_eq!(kbd.layout(), 1);
        assert_eq!(kbd.layout_name(), "Layout de");
        kbd.switch_to_layout_by_name("Layout us").unwrap();
        assert_eq!(kbd.layout(), 0);
        assert_eq!(
            kbd.switch_to_layout_by_name("xx"),
            Err(InputError::UnknownLayout("xx".into()))
        );
    }

    #[test]
    fn test_switch_keeps_modifiers() {
        let mut kbd = keyboard(&["us", "de"]);
        kbd.update_key(KEY_LEFTCTRL, KeyState::Pressed);
        kbd.switch_to_layout(1).unwrap();
        assert!(kbd.modifiers().contains(Modifiers::CTRL));
    }

    #[test]
    fn test_shift_letter_stays_relevant() {
        let mut kbd = keyboard(&["us"]);
        kbd.update_key(KEY_LEFTSHIFT, KeyState::Pressed);
        kbd.update_key(KEY_W, KeyState::Pressed);
        assert_eq!(kbd.keysym(), 'W' as u32);
        assert_eq!(kbd.modifiers_relevant_for_shortcuts(), Modifiers::SHIFT);
    }

    #[test]
    fn test_shift_digit_is_consumed() {
        let mut kbd = keyboard(&["us"]);
        kbd.update_key(KEY_LEFTSHIFT, KeyState::Pressed);
        kbd.update_key(KEY_1, KeyState::Pressed);
        assert_eq!(kbd.modifiers_relevant_for_shortcuts(), Modifiers::empty());
    }

    #[test]
    fn test_caps_implies_shift_flag() {
        let mut kbd = keyboard(&["us"]);
        kbd.update_key(KEY_CAPSLOCK, KeyState::Pressed);
        kbd.update_key(KEY_CAPSLOCK, KeyState::Released);
        assert!(kbd.modifiers().contains(Modifiers::SHIFT | Modifiers::CAPS));
        assert!(kbd.leds().contains(Leds::CAPS_LOCK));
    }

    #[test]
    fn test_keypad_flag() {
        let mut kbd = keyboard(&["us"]);
        kbd.update_key(KEY_KP1, KeyState::Pressed);
        assert!(kbd.modifiers().contains(Modifiers::KEYPAD));
        kbd.update_key(KEY_KP1, KeyState::Released);
        kbd.update_key(KEY_W, KeyState::Pressed);
        assert!(!kbd.modifiers().contains(Modifiers::KEYPAD));
    }

    #[test]
    fn test_startup_num_lock_applied_once() {
        let mut kbd = Keyboard::new();
        kbd.update_keymap(Box::new(FakeKeymap::new(&["us"])), vec![], NumLock::On);
        assert!(kbd.modifiers().contains(Modifiers::NUM));
        assert!(kbd.leds().contains(Leds::NUM_LOCK));

        // second keymap keeps whatever the user did
        kbd.update_keymap(Box::new(FakeKeymap::new(&["us"])), vec![], NumLock::On);
        assert!(!kbd.modifiers().contains(Modifiers::NUM));
    }

    #[test]
    fn test_repeat_follows_keymap() {
        let kbd = keyboard(&["us"]);
        assert!(kbd.should_key_repeat(KEY_W));
        assert!(!kbd.should_key_repeat(KEY_LEFTSHIFT));
        assert!(!Keyboard::new().should_key_repeat(KEY_W));
    }
}
