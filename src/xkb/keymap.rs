//! Keymap library boundary
//!
//! `Keymap` is the narrow surface the mapping engine needs from a keymap
//! plus its state object. `XkbKeymap` implements it with xkbcommon.

use log::{debug, info};
use xkbcommon::xkb;

use super::Modifiers;
use crate::device::Leds;
use crate::error::{InputError, InputResult};
use crate::event::KeyState;

/// Serialized modifier and group state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierState {
    pub depressed: u32,
    pub latched: u32,
    pub locked: u32,
    pub layout: u32,
}

/// RMLVO names a keymap is compiled from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleNames {
    pub rules: String,
    pub model: String,
    pub layout: String,
    pub variant: String,
    pub options: String,
}

pub trait Keymap {
    fn layout_count(&self) -> u32;

    /// Display name of a layout ("German", "English (US)")
    fn layout_name(&self, index: u32) -> Option<String>;

    /// Feed a key transition, keycode in evdev numbering
    fn update_key(&mut self, keycode: u32, state: KeyState);

    /// Overwrite modifier masks and the locked layout
    fn update_mask(&mut self, state: ModifierState);

    fn modifier_state(&self) -> ModifierState;

    fn active_modifiers(&self) -> Modifiers;

    /// Modifiers consumed by translating `keycode` in the current state
    fn consumed_modifiers(&self, keycode: u32) -> Modifiers;

    fn leds(&self) -> Leds;

    fn keysym(&self, keycode: u32) -> u32;

    fn key_repeats(&self, keycode: u32) -> bool;

    /// Modifier mask bit for NumLock, 0 when the keymap has none
    fn num_lock_mask(&self) -> u32;

    /// Text form handed to clients
    fn to_text(&self) -> Option<String> {
        None
    }
}

/// Compiles keymaps for new keyboards and on reconfigure
pub trait KeymapFactory {
    fn compile(&self, names: &RuleNames) -> InputResult<Box<dyn Keymap>>;
}

/// xkbcommon keymap + state
pub struct XkbKeymap {
    keymap: xkb::Keymap,
    state: xkb::State,
    mods: [(Modifiers, xkb::ModIndex); 6],
    leds: [(Leds, xkb::LedIndex); 3],
}

impl XkbKeymap {
    pub fn new(context: &xkb::Context, names: &RuleNames) -> InputResult<Self> {
        let options = if names.options.is_empty() {
            None
        } else {
            Some(names.options.clone())
        };

        let keymap = xkb::Keymap::new_from_names(
            context,
            &names.rules,
            &names.model,
            &names.layout,
            &names.variant,
            options,
            xkb::COMPILE_NO_FLAGS,
        )
        .ok_or_else(|| {
            InputError::Keymap(format!(
                "failed to compile keymap (model={}, layout={}, variant={}, options={})",
                names.model, names.layout, names.variant, names.options
            ))
        })?;

        let state = xkb::State::new(&keymap);
        let mods = [
            (Modifiers::SHIFT, keymap.mod_get_index(xkb::MOD_NAME_SHIFT)),
            (Modifiers::CAPS, keymap.mod_get_index(xkb::MOD_NAME_CAPS)),
            (Modifiers::CTRL, keymap.mod_get_index(xkb::MOD_NAME_CTRL)),
            (Modifiers::ALT, keymap.mod_get_index(xkb::MOD_NAME_ALT)),
            (Modifiers::LOGO, keymap.mod_get_index(xkb::MOD_NAME_LOGO)),
            (Modifiers::NUM, keymap.mod_get_index(xkb::MOD_NAME_NUM)),
        ];
        let leds = [
            (Leds::NUM_LOCK, keymap.led_get_index(xkb::LED_NAME_NUM)),
            (Leds::CAPS_LOCK, keymap.led_get_index(xkb::LED_NAME_CAPS)),
            (Leds::SCROLL_LOCK, keymap.led_get_index(xkb::LED_NAME_SCROLL)),
        ];

        info!(
            "xkb keymap compiled (layout={}, {} layouts)",
            if names.layout.is_empty() { "default" } else { &names.layout },
            keymap.num_layouts()
        );

        Ok(Self {
            keymap,
            state,
            mods,
            leds,
        })
    }

    fn xkb_keycode(keycode: u32) -> xkb::Keycode {
        // evdev keycode -> xkb keycode (evdev + 8)
        xkb::Keycode::new(keycode + 8)
    }
}

impl Keymap for XkbKeymap {
    fn layout_count(&self) -> u32 {
        self.keymap.num_layouts()
    }

    fn layout_name(&self, index: u32) -> Option<String> {
        if index >= self.keymap.num_layouts() {
            return None;
        }
        Some(self.keymap.layout_get_name(index).to_string())
    }

    fn update_key(&mut self, keycode: u32, state: KeyState) {
        let direction = match state {
            KeyState::Pressed => xkb::KeyDirection::Down,
            KeyState::Released => xkb::KeyDirection::Up,
        };
        self.state.update_key(Self::xkb_keycode(keycode), direction);
    }

    fn update_mask(&mut self, mods: ModifierState) {
        self.state
            .update_mask(mods.depressed, mods.latched, mods.locked, 0, 0, mods.layout);
    }

    fn modifier_state(&self) -> ModifierState {
        ModifierState {
            depressed: self.state.serialize_mods(xkb::STATE_MODS_DEPRESSED),
            latched: self.state.serialize_mods(xkb::STATE_MODS_LATCHED),
            locked: self.state.serialize_mods(xkb::STATE_MODS_LOCKED),
            layout: self.state.serialize_layout(xkb::STATE_LAYOUT_EFFECTIVE),
        }
    }

    fn active_modifiers(&self) -> Modifiers {
        self.mods
            .iter()
            .filter(|(_, index)| *index != xkb::MOD_INVALID)
            .filter(|(_, index)| {
                self.state
                    .mod_index_is_active(*index, xkb::STATE_MODS_EFFECTIVE)
            })
            .fold(Modifiers::empty(), |acc, (flag, _)| acc | *flag)
    }

    fn consumed_modifiers(&self, keycode: u32) -> Modifiers {
        let code = Self::xkb_keycode(keycode);
        self.mods
            .iter()
            .filter(|(_, index)| *index != xkb::MOD_INVALID)
            .filter(|(_, index)| self.state.mod_index_is_consumed(code, *index))
            .fold(Modifiers::empty(), |acc, (flag, _)| acc | *flag)
    }

    fn leds(&self) -> Leds {
        self.leds
            .iter()
            .filter(|(_, index)| *index != xkb::LED_INVALID)
            .filter(|(_, index)| self.state.led_index_is_active(*index))
            .fold(Leds::empty(), |acc, (flag, _)| acc | *flag)
    }

    fn keysym(&self, keycode: u32) -> u32 {
        self.state.key_get_one_sym(Self::xkb_keycode(keycode)).raw()
    }

    fn key_repeats(&self, keycode: u32) -> bool {
        self.keymap.key_repeats(Self::xkb_keycode(keycode))
    }

    fn num_lock_mask(&self) -> u32 {
        let index = self.mods[5].1;
        if index == xkb::MOD_INVALID {
            debug!("keymap has no NumLock modifier");
            return 0;
        }
        1 << index
    }

    fn to_text(&self) -> Option<String> {
        Some(self.keymap.get_as_string(xkb::KEYMAP_FORMAT_TEXT_V1))
    }
}

/// Factory sharing one xkbcommon context between keyboards
pub struct XkbFactory {
    context: xkb::Context,
}

impl XkbFactory {
    pub fn new() -> Self {
        Self {
            context: xkb::Context::new(xkb::CONTEXT_NO_FLAGS),
        }
    }
}

impl Default for XkbFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl KeymapFactory for XkbFactory {
    fn compile(&self, names: &RuleNames) -> InputResult<Box<dyn Keymap>> {
        Ok(Box::new(XkbKeymap::new(&self.context, names)?))
    }
}
