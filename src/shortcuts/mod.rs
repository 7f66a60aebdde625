//! Global shortcut matching
//!
//! Triggers are matched exactly: the modifier set must be identical to the
//! registered one. Matching only yields an action id; what an action does is
//! decided by whoever handles it after dispatch.

pub mod gestures;

use bitflags::bitflags;
use log::{debug, info};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::fmt;

pub use gestures::SwipeRecognizer;

use crate::config::ParsedKeybind;
use crate::constants::LONG_PRESS_MS;
use crate::error::{InputError, InputResult};
use crate::event::{AxisOrientation, Point};
use crate::xkb::keycodes::{normalize_keysym, BTN_EXTRA, BTN_LEFT, BTN_MIDDLE, BTN_RIGHT, BTN_SIDE};
use crate::xkb::Modifiers;

pub type ActionId = SmolStr;

bitflags! {
    /// Pointer buttons a shortcut can hold
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PointerButtons: u32 {
        const LEFT   = 0b0_0001;
        const RIGHT  = 0b0_0010;
        const MIDDLE = 0b0_0100;
        const SIDE   = 0b0_1000;
        const EXTRA  = 0b1_0000;
    }
}

impl PointerButtons {
    /// Flag of an evdev button code
    pub fn from_code(code: u32) -> Option<Self> {
        let flag = match code {
            BTN_LEFT => Self::LEFT,
            BTN_RIGHT => Self::RIGHT,
            BTN_MIDDLE => Self::MIDDLE,
            BTN_SIDE => Self::SIDE,
            BTN_EXTRA => Self::EXTRA,
            _ => return None,
        };
        Some(flag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Key { mods: Modifiers, keysym: u32 },
    PointerButton { mods: Modifiers, buttons: PointerButtons },
    Axis { mods: Modifiers, direction: Direction },
    Swipe { fingers: u32, direction: Direction },
    LongPress { mods: Modifiers, keysym: u32 },
}

impl Trigger {
    /// Key trigger with the keysym folded to its case-insensitive form
    pub fn key(mods: Modifiers, keysym: u32) -> Self {
        Trigger::Key {
            mods: mods & Modifiers::SHORTCUT_MASK,
            keysym: normalize_keysym(keysym),
        }
    }

    fn normalized(self) -> Self {
        match self {
            Trigger::Key { mods, keysym } => Trigger::key(mods, keysym),
            Trigger::LongPress { mods, keysym } => Trigger::LongPress {
                mods: mods & Modifiers::SHORTCUT_MASK,
                keysym: normalize_keysym(keysym),
            },
            Trigger::PointerButton { mods, buttons } => Trigger::PointerButton {
                mods: mods & Modifiers::SHORTCUT_MASK,
                buttons,
            },
            Trigger::Axis { mods, direction } => Trigger::Axis {
                mods: mods & Modifiers::SHORTCUT_MASK,
                direction,
            },
            swipe @ Trigger::Swipe { .. } => swipe,
        }
    }
}

impl From<ParsedKeybind> for Trigger {
    fn from(keybind: ParsedKeybind) -> Self {
        Trigger::key(keybind.mods, keybind.keysym)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Key { mods, keysym } => write!(f, "key {:?}+{:#x}", mods, keysym),
            Trigger::PointerButton { mods, buttons } => {
                write!(f, "button {:?}+{:?}", mods, buttons)
            }
            Trigger::Axis { mods, direction } => write!(f, "axis {:?}+{:?}", mods, direction),
            Trigger::Swipe { fingers, direction } => {
                write!(f, "swipe {} fingers {:?}", fingers, direction)
            }
            Trigger::LongPress { mods, keysym } => {
                write!(f, "long press {:?}+{:#x}", mods, keysym)
            }
        }
    }
}

/// Pending long press of a key
#[derive(Debug, Clone, Copy)]
struct LongPress {
    mods: Modifiers,
    keysym: u32,
    since_msec: u32,
}

#[derive(Default)]
pub struct GlobalShortcuts {
    bindings: HashMap<Trigger, ActionId>,
    swipe: SwipeRecognizer,
    long_press: Option<LongPress>,
}

impl GlobalShortcuts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a trigger to an action
    ///
    /// Rebinding a trigger to another action replaces it and returns the
    /// previous action. Registering the identical pair again is refused.
    pub fn register(
        &mut self,
        trigger: Trigger,
        action: impl Into<ActionId>,
    ) -> InputResult<Option<ActionId>> {
        let trigger = trigger.normalized();
        let action = action.into();
        if self.bindings.get(&trigger) == Some(&action) {
            return Err(InputError::DuplicateShortcut {
                trigger: trigger.to_string(),
                action: action.to_string(),
            });
        }
        debug!("shortcut {} -> {}", trigger, action);
        let previous = self.bindings.insert(trigger, action);
        if let Some(previous) = previous.as_ref() {
            info!("Shortcut {} rebound from {}", trigger, previous);
        }
        Ok(previous)
    }

    pub fn unregister(&mut self, trigger: Trigger) -> Option<ActionId> {
        self.bindings.remove(&trigger.normalized())
    }

    /// Remove every trigger bound to `action`, returns how many
    pub fn unregister_action(&mut self, action: &str) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|_, a| a.as_str() != action);
        before - self.bindings.len()
    }

    pub fn action_for(&self, trigger: Trigger) -> Option<&ActionId> {
        self.bindings.get(&trigger.normalized())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn process_key(&self, mods: Modifiers, keysym: u32) -> Option<ActionId> {
        self.action_for(Trigger::key(mods, keysym)).cloned()
    }

    /// Button shortcuts need at least one modifier
    pub fn process_pointer_pressed(
        &self,
        mods: Modifiers,
        buttons: PointerButtons,
    ) -> Option<ActionId> {
        if mods.is_empty() {
            return None;
        }
        self.action_for(Trigger::PointerButton { mods, buttons })
            .cloned()
    }

    pub fn process_axis(
        &self,
        mods: Modifiers,
        orientation: AxisOrientation,
        delta: f64,
    ) -> Option<ActionId> {
        if mods.is_empty() || delta == 0.0 {
            return None;
        }
        let direction = match orientation {
            AxisOrientation::Vertical if delta < 0.0 => Direction::Up,
            AxisOrientation::Vertical => Direction::Down,
            AxisOrientation::Horizontal if delta < 0.0 => Direction::Left,
            AxisOrientation::Horizontal => Direction::Right,
        };
        self.action_for(Trigger::Axis { mods, direction }).cloned()
    }

    pub fn process_swipe_begin(&mut self, fingers: u32) {
        self.swipe.begin(fingers);
    }

    pub fn process_swipe_update(&mut self, delta: Point) {
        self.swipe.update(delta);
    }

    pub fn process_swipe_cancel(&mut self) {
        self.swipe.cancel();
    }

    pub fn process_swipe_end(&mut self) -> Option<ActionId> {
        let (fingers, direction) = self.swipe.end()?;
        self.action_for(Trigger::Swipe { fingers, direction })
            .cloned()
    }

    /// Start the long-press timer for a held key
    pub fn arm_long_press(&mut self, mods: Modifiers, keysym: u32, now_msec: u32) {
        self.long_press = Some(LongPress {
            mods,
            keysym,
            since_msec: now_msec,
        });
    }

    pub fn is_long_press_armed(&self) -> bool {
        self.long_press.is_some()
    }

    /// Stop the timer; returns whether it was still running
    pub fn disarm_long_press(&mut self) -> bool {
        self.long_press.take().is_some()
    }

    /// Fire the long press once its hold time has passed
    pub fn tick(&mut self, now_msec: u32) -> Option<ActionId> {
        let pending = self.long_press?;
        // signed distance: a tick from before the press never fires
        let held = now_msec.wrapping_sub(pending.since_msec) as i32;
        if held < LONG_PRESS_MS as i32 {
            return None;
        }
        self.long_press = None;
        debug!("long press expired for {:#x}", pending.keysym);
        self.action_for(Trigger::LongPress {
            mods: pending.mods,
            keysym: pending.keysym,
        })
        .cloned()
    }
}
