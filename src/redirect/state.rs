//! Dispatch state owned by one platform
//!
//! Updated by the redirect before filters run and handed to every filter
//! and spy through the dispatch context.

use log::debug;
use std::collections::{BTreeSet, HashMap};

use super::repeat::KeyRepeat;
use super::touch::TouchIds;
use crate::constants::{
    DEFAULT_OUTPUT_HEIGHT, DEFAULT_OUTPUT_WIDTH, DEFAULT_REPEAT_DELAY_MS, DEFAULT_REPEAT_RATE,
};
use crate::device::{Capabilities, DeviceId, DeviceKind};
use crate::event::{ButtonState, Point};
use crate::seat::{RepeatInfo, SeatCapabilities};
use crate::shortcuts::PointerButtons;
use crate::xkb::Modifiers;

/// Tablet mode as published on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabletMode {
    pub available: bool,
    pub active: bool,
}

pub struct RedirectState {
    pointer_pos: Point,
    output_size: Point,
    pressed_buttons: BTreeSet<u32>,
    /// Modifiers of the keyboard that produced the last key event
    pub modifiers: Modifiers,
    pub touch_ids: TouchIds,
    touch_positions: HashMap<i32, Point>,
    /// Touch point pressed on a decoration
    pub decoration_press_id: Option<i32>,
    /// Touch point pressed on a compositor-owned window
    pub internal_press_id: Option<i32>,
    /// Touch point driving a touch drag
    pub drag_touch_id: Option<i32>,
    pub repeat: KeyRepeat,
    devices: HashMap<DeviceKind, Vec<DeviceId>>,
    tablet_mode_switches: Vec<DeviceId>,
    tablet_switch_on: bool,
}

impl RedirectState {
    pub fn new() -> Self {
        Self {
            pointer_pos: Point::default(),
            output_size: Point::new(DEFAULT_OUTPUT_WIDTH, DEFAULT_OUTPUT_HEIGHT),
            pressed_buttons: BTreeSet::new(),
            modifiers: Modifiers::empty(),
            touch_ids: TouchIds::new(),
            touch_positions: HashMap::new(),
            decoration_press_id: None,
            internal_press_id: None,
            drag_touch_id: None,
            repeat: KeyRepeat::new(RepeatInfo {
                rate: DEFAULT_REPEAT_RATE,
                delay_ms: DEFAULT_REPEAT_DELAY_MS,
            }),
            devices: HashMap::new(),
            tablet_mode_switches: Vec::new(),
            tablet_switch_on: false,
        }
    }

    // === Pointer ===

    pub fn pointer_pos(&self) -> Point {
        self.pointer_pos
    }

    pub fn output_size(&self) -> Point {
        self.output_size
    }

    /// Resize the output; the pointer is pulled back inside
    pub fn set_output_size(&mut self, width: f64, height: f64) {
        self.output_size = Point::new(width.max(1.0), height.max(1.0));
        self.pointer_pos = self.clamp(self.pointer_pos);
    }

    fn clamp(&self, pos: Point) -> Point {
        Point::new(
            pos.x.clamp(0.0, self.output_size.x - 1.0),
            pos.y.clamp(0.0, self.output_size.y - 1.0),
        )
    }

    /// Move the pointer by a delta, returns the new position
    pub fn move_pointer(&mut self, delta: Point) -> Point {
        self.warp_pointer(self.pointer_pos + delta)
    }

    pub fn warp_pointer(&mut self, pos: Point) -> Point {
        self.pointer_pos = self.clamp(pos);
        self.pointer_pos
    }

    /// Map a 0..1 position onto the output
    pub fn to_output(&self, normalized: Point) -> Point {
        Point::new(
            normalized.x * self.output_size.x,
            normalized.y * self.output_size.y,
        )
    }

    pub fn update_button(&mut self, button: u32, state: ButtonState) {
        match state {
            ButtonState::Pressed => self.pressed_buttons.insert(button),
            ButtonState::Released => self.pressed_buttons.remove(&button),
        };
    }

    pub fn is_button_pressed(&self, button: u32) -> bool {
        self.pressed_buttons.contains(&button)
    }

    pub fn any_button_pressed(&self) -> bool {
        !self.pressed_buttons.is_empty()
    }

    /// Pressed buttons a shortcut can refer to
    pub fn pressed_buttons(&self) -> PointerButtons {
        self.pressed_buttons
            .iter()
            .filter_map(|b| PointerButtons::from_code(*b))
            .fold(PointerButtons::empty(), |acc, b| acc | b)
    }

    // === Touch ===

    pub fn set_touch_pos(&mut self, id: i32, pos: Point) {
        self.touch_positions.insert(id, pos);
    }

    /// Last known position of a touch point
    pub fn touch_pos(&self, id: i32) -> Option<Point> {
        self.touch_positions.get(&id).copied()
    }

    pub fn touch_released(&mut self, id: i32) {
        self.touch_positions.remove(&id);
    }

    /// Forget every touch point and claim
    pub fn cancel_touches(&mut self) {
        self.touch_ids.clear();
        self.touch_positions.clear();
        self.decoration_press_id = None;
        self.internal_press_id = None;
        self.drag_touch_id = None;
    }

    // === Devices ===

    /// Track a device in its class list
    ///
    /// Returns the new seat capabilities when they changed.
    pub fn device_added(
        &mut self,
        id: DeviceId,
        kind: DeviceKind,
        caps: Capabilities,
    ) -> Option<SeatCapabilities> {
        let before = self.capabilities();
        let list = self.devices.entry(kind).or_default();
        if !list.contains(&id) {
            list.push(id);
        }
        if kind == DeviceKind::Switch && caps.contains(Capabilities::TABLET_MODE_SWITCH) {
            self.tablet_mode_switches.push(id);
        }
        let after = self.capabilities();
        (after != before).then_some(after)
    }

    pub fn device_removed(&mut self, id: DeviceId) -> Option<SeatCapabilities> {
        let before = self.capabilities();
        for list in self.devices.values_mut() {
            list.retain(|d| *d != id);
        }
        let had_switch = !self.tablet_mode_switches.is_empty();
        self.tablet_mode_switches.retain(|d| *d != id);
        if matches!(self.repeat.key(), Some((Some(device), _)) if device == id) {
            debug!("repeating key's device {} removed", id);
            self.repeat.disarm();
        }
        if had_switch && self.tablet_mode_switches.is_empty() {
            debug!("last tablet mode switch removed");
            self.tablet_switch_on = false;
        }
        let after = self.capabilities();
        (after != before).then_some(after)
    }

    pub fn devices_of(&self, kind: DeviceKind) -> &[DeviceId] {
        self.devices.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, kind: DeviceKind) -> bool {
        !self.devices_of(kind).is_empty()
    }

    pub fn capabilities(&self) -> SeatCapabilities {
        let mut caps = SeatCapabilities::empty();
        caps.set(SeatCapabilities::KEYBOARD, self.has(DeviceKind::Keyboard));
        caps.set(SeatCapabilities::POINTER, self.has(DeviceKind::Pointer));
        caps.set(SeatCapabilities::TOUCH, self.has(DeviceKind::Touch));
        caps
    }

    // === Tablet mode ===

    pub fn has_tablet_mode_switch(&self) -> bool {
        !self.tablet_mode_switches.is_empty()
    }

    pub fn is_tablet_mode_switch(&self, id: Option<DeviceId>) -> bool {
        id.map_or(false, |id| self.tablet_mode_switches.contains(&id))
    }

    pub fn set_tablet_switch(&mut self, on: bool) {
        self.tablet_switch_on = on;
    }

    /// A switch decides once present; otherwise touch-only means tablet
    pub fn tablet_mode(&self) -> TabletMode {
        let has_touch = self.has(DeviceKind::Touch);
        if self.has_tablet_mode_switch() {
            TabletMode {
                available: true,
                active: self.tablet_switch_on,
            }
        } else {
            TabletMode {
                available: has_touch,
                active: has_touch && !self.has(DeviceKind::Pointer),
            }
        }
    }
}

impl Default for RedirectState {
    fn default() -> Self {
        Self::new()
    }
}
