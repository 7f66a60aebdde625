//! Test doubles shared by the unit tests

use std::cell::{RefCell, RefMut};
use std::collections::HashSet;
use std::rc::Rc;

use crate::device::Leds;
use crate::error::{InputError, InputResult};
use crate::event::{AxisEvent, Event, KeyEvent, KeyState, Point};
use crate::redirect::{Context, RedirectState, Request};
use crate::seat::{DragState, RepeatInfo, Seat, SeatCapabilities, SurfaceId};
use crate::shell::{MouseCommand, Popup, Shell, WindowId, WindowRef};
use crate::shortcuts::GlobalShortcuts;
use crate::xkb::keycodes::*;
use crate::xkb::{Keyboard, Keymap, KeymapFactory, ModifierState, Modifiers, NumLock, RuleNames};

const SHIFT_BIT: u32 = 1 << 0;
const CAPS_BIT: u32 = 1 << 1;
const CTRL_BIT: u32 = 1 << 2;
const ALT_BIT: u32 = 1 << 3;
const NUM_BIT: u32 = 1 << 4;
const LOGO_BIT: u32 = 1 << 6;

/// Small US-like keymap with named layouts
pub struct FakeKeymap {
    layouts: Vec<String>,
    state: ModifierState,
    pressed: HashSet<u32>,
}

impl FakeKeymap {
    pub fn new(layouts: &[&str]) -> Self {
        Self {
            layouts: layouts.iter().map(|s| s.to_string()).collect(),
            state: ModifierState::default(),
            pressed: HashSet::new(),
        }
    }

    fn depressed_bit(keycode: u32) -> u32 {
        match keycode {
            KEY_LEFTSHIFT | KEY_RIGHTSHIFT => SHIFT_BIT,
            KEY_LEFTCTRL | KEY_RIGHTCTRL => CTRL_BIT,
            KEY_LEFTALT | KEY_RIGHTALT => ALT_BIT,
            KEY_LEFTMETA | KEY_RIGHTMETA => LOGO_BIT,
            _ => 0,
        }
    }

    fn effective(&self) -> u32 {
        self.state.depressed | self.state.latched | self.state.locked
    }

    fn letter(keycode: u32) -> Option<u8> {
        match keycode {
            KEY_Q => Some(b'q'),
            KEY_W => Some(b'w'),
            KEY_A => Some(b'a'),
            KEY_K => Some(b'k'),
            _ => None,
        }
    }
}

impl Keymap for FakeKeymap {
    fn layout_count(&self) -> u32 {
        self.layouts.len().max(1) as u32
    }

    fn layout_name(&self, index: u32) -> Option<String> {
        if self.layouts.is_empty() && index == 0 {
            return Some("Layout us".into());
        }
        self.layouts
            .get(index as usize)
            .map(|name| format!("Layout {}", name))
    }

    fn update_key(&mut self, keycode: u32, state: KeyState) {
        let bit = Self::depressed_bit(keycode);
        match state {
            KeyState::Pressed => {
                self.pressed.insert(keycode);
                self.state.depressed |= bit;
                match keycode {
                    KEY_CAPSLOCK => self.state.locked ^= CAPS_BIT,
                    KEY_NUMLOCK => self.state.locked ^= NUM_BIT,
                    _ => {}
                }
            }
            KeyState::Released => {
                self.pressed.remove(&keycode);
                let still_held = self
                    .pressed
                    .iter()
                    .any(|k| Self::depressed_bit(*k) == bit);
                if !still_held {
                    self.state.depressed &= !bit;
                }
            }
        }
    }

    fn update_mask(&mut self, state: ModifierState) {
        self.state = state;
    }

    fn modifier_state(&self) -> ModifierState {
        self.state
    }

    fn active_modifiers(&self) -> Modifiers {
        let mask = self.effective();
        let mut mods = Modifiers::empty();
        for (bit, flag) in [
            (SHIFT_BIT, Modifiers::SHIFT),
            (CAPS_BIT, Modifiers::CAPS),
            (CTRL_BIT, Modifiers::CTRL),
            (ALT_BIT, Modifiers::ALT),
            (NUM_BIT, Modifiers::NUM),
            (LOGO_BIT, Modifiers::LOGO),
        ] {
            if mask & bit != 0 {
                mods |= flag;
            }
        }
        mods
    }

    fn consumed_modifiers(&self, keycode: u32) -> Modifiers {
        let printable = Self::letter(keycode).is_some() || (KEY_1..=KEY_0).contains(&keycode);
        if printable && self.effective() & SHIFT_BIT != 0 {
            Modifiers::SHIFT
        } else {
            Modifiers::empty()
        }
    }

    fn leds(&self) -> Leds {
        let mut leds = Leds::empty();
        if self.state.locked & NUM_BIT != 0 {
            leds |= Leds::NUM_LOCK;
        }
        if self.state.locked & CAPS_BIT != 0 {
            leds |= Leds::CAPS_LOCK;
        }
        leds
    }

    fn keysym(&self, keycode: u32) -> u32 {
        let mask = self.effective();
        let ctrl_alt = mask & (CTRL_BIT | ALT_BIT) == CTRL_BIT | ALT_BIT;
        if let Some(c) = Self::letter(keycode) {
            let upper = (mask & SHIFT_BIT != 0) != (mask & CAPS_BIT != 0);
            return if upper {
                c.to_ascii_uppercase() as u32
            } else {
                c as u32
            };
        }
        match keycode {
            KEY_1..=KEY_0 if mask & SHIFT_BIT != 0 => 0x21,
            KEY_1 => '1' as u32,
            KEY_ESC => KEY_SYM_ESCAPE,
            KEY_ENTER => KEY_SYM_RETURN,
            KEY_SPACE => KEY_SYM_SPACE,
            KEY_TAB => 0xff09,
            KEY_BACKSPACE if ctrl_alt => KEY_SYM_TERMINATE_SERVER,
            KEY_BACKSPACE => KEY_SYM_BACKSPACE,
            KEY_LEFTSHIFT => 0xffe1,
            KEY_LEFTCTRL => 0xffe3,
            KEY_LEFTALT => 0xffe9,
            KEY_LEFTMETA => KEY_SYM_SUPER_L,
            KEY_RIGHTMETA => KEY_SYM_SUPER_R,
            KEY_POWER => KEY_SYM_POWER_OFF,
            KEY_KP1 if mask & NUM_BIT != 0 => 0xffb1,
            KEY_KP1 => 0xff9c,
            _ => match function_key_number(keycode) {
                Some(n) => KEY_SYM_F1 + n - 1,
                None => 0,
            },
        }
    }

    fn key_repeats(&self, keycode: u32) -> bool {
        Self::depressed_bit(keycode) == 0
            && !matches!(keycode, KEY_CAPSLOCK | KEY_NUMLOCK | KEY_POWER)
    }

    fn num_lock_mask(&self) -> u32 {
        NUM_BIT
    }
}

/// Compiles `FakeKeymap`s from the comma separated layout list;
/// the layout name "invalid" fails
pub struct FakeKeymapFactory;

impl KeymapFactory for FakeKeymapFactory {
    fn compile(&self, names: &RuleNames) -> InputResult<Box<dyn Keymap>> {
        if names.layout.split(',').any(|l| l == "invalid") {
            return Err(InputError::Keymap(format!("bad layout {}", names.layout)));
        }
        let layouts: Vec<&str> = names.layout.split(',').filter(|l| !l.is_empty()).collect();
        Ok(Box::new(FakeKeymap::new(&layouts)))
    }
}

/// Touch call received by the recording seat
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchCall {
    Down { protocol: i32, pos: Point },
    Motion { protocol: i32, pos: Point },
    Up { protocol: i32 },
    Cancel,
    Frame,
}

/// What the recording seat saw
#[derive(Debug, Default)]
pub struct SeatLog {
    pub forwarded: Vec<Event>,
    pub unhandled: Vec<Event>,
    pub touches: Vec<TouchCall>,
    pub focus: Vec<Option<SurfaceId>>,
    pub drag_targets: Vec<Point>,
    pub repeat_info: Option<RepeatInfo>,
    pub capabilities: SeatCapabilities,
    pub modifiers: Vec<ModifierState>,
    pub keymaps: usize,
    next_protocol_id: i32,
}

/// Seat that records everything and answers from settable state
#[derive(Clone, Default)]
pub struct RecordingSeat {
    pub log: Rc<RefCell<SeatLog>>,
    pub drag: Rc<RefCell<DragState>>,
}

impl RecordingSeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forwarded(&self) -> Vec<Event> {
        self.log.borrow().forwarded.clone()
    }

    pub fn unhandled(&self) -> Vec<Event> {
        self.log.borrow().unhandled.clone()
    }

    pub fn touches(&self) -> Vec<TouchCall> {
        self.log.borrow().touches.clone()
    }

    pub fn set_drag(&self, drag: DragState) {
        *self.drag.borrow_mut() = drag;
    }
}

impl Seat for RecordingSeat {
    fn forward(&mut self, event: &Event) {
        self.log.borrow_mut().forwarded.push(*event);
    }

    fn unhandled(&mut self, event: &Event) {
        self.log.borrow_mut().unhandled.push(*event);
    }

    fn touch_down(&mut self, pos: Point, _time_msec: u32) -> i32 {
        let mut log = self.log.borrow_mut();
        log.next_protocol_id += 1;
        let protocol = log.next_protocol_id;
        log.touches.push(TouchCall::Down { protocol, pos });
        protocol
    }

    fn touch_motion(&mut self, protocol: i32, pos: Point, _time_msec: u32) {
        self.log
            .borrow_mut()
            .touches
            .push(TouchCall::Motion { protocol, pos });
    }

    fn touch_up(&mut self, protocol: i32, _time_msec: u32) {
        self.log.borrow_mut().touches.push(TouchCall::Up { protocol });
    }

    fn touch_cancel(&mut self) {
        self.log.borrow_mut().touches.push(TouchCall::Cancel);
    }

    fn touch_frame(&mut self) {
        self.log.borrow_mut().touches.push(TouchCall::Frame);
    }

    fn set_focus(&mut self, surface: Option<SurfaceId>) {
        self.log.borrow_mut().focus.push(surface);
    }

    fn set_capabilities(&mut self, caps: SeatCapabilities) {
        self.log.borrow_mut().capabilities = caps;
    }

    fn set_repeat_info(&mut self, info: RepeatInfo) {
        self.log.borrow_mut().repeat_info = Some(info);
    }

    fn set_keymap(&mut self, _keymap: &str) {
        self.log.borrow_mut().keymaps += 1;
    }

    fn update_modifiers(&mut self, state: ModifierState) {
        self.log.borrow_mut().modifiers.push(state);
    }

    fn drag(&self) -> DragState {
        *self.drag.borrow()
    }

    fn update_drag_target(&mut self, pos: Point) {
        self.log.borrow_mut().drag_targets.push(pos);
    }
}

/// Shell answers and recorded calls
#[derive(Debug, Default)]
pub struct ShellScript {
    pub locked: bool,
    pub lock_surface: Option<SurfaceId>,
    pub popup: Option<Popup>,
    pub popups_cancelled: usize,
    /// Window under every position
    pub window: Option<WindowRef>,
    pub selecting: bool,
    /// Some(pos) for an accepted selection, None for a cancelled one
    pub selections: Vec<Option<Point>>,
    pub edge_fires: bool,
    pub edge_motions: usize,
    pub effects_grab: bool,
    pub effect_consumes: bool,
    pub effect_events: Vec<&'static str>,
    pub move_resize: bool,
    pub move_resize_updates: Vec<Point>,
    pub move_resize_finished: usize,
    pub move_resize_keys: usize,
    pub tabbox: bool,
    pub tabbox_keys: usize,
    pub tabbox_axes: usize,
    pub tabbox_closed: usize,
    pub decoration: Option<WindowId>,
    pub decoration_events: Vec<&'static str>,
    pub internal_window: Option<WindowId>,
    pub internal_focus: Option<WindowId>,
    pub internal_events: Vec<&'static str>,
    pub mouse_commands: Vec<(WindowId, MouseCommand)>,
    pub pass_click: bool,
    pub cursor_hidden: Vec<bool>,
}

/// Scriptable shell; clones share the script
#[derive(Clone, Default)]
pub struct ScriptedShell {
    script: Rc<RefCell<ShellScript>>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self) -> RefMut<'_, ShellScript> {
        self.script.borrow_mut()
    }
}

impl Shell for ScriptedShell {
    fn is_screen_locked(&self) -> bool {
        self.script.borrow().locked
    }

    fn lock_screen_surface_at(&self, _pos: Point) -> Option<SurfaceId> {
        self.script.borrow().lock_surface
    }

    fn lock_screen_focus(&self) -> Option<SurfaceId> {
        self.script.borrow().lock_surface
    }

    fn topmost_popup(&self) -> Option<Popup> {
        self.script.borrow().popup
    }

    fn cancel_popups(&mut self) {
        let mut script = self.script();
        script.popup = None;
        script.popups_cancelled += 1;
    }

    fn window_at(&self, _pos: Point) -> Option<WindowRef> {
        self.script.borrow().window
    }

    fn is_selecting_window(&self) -> bool {
        self.script.borrow().selecting
    }

    fn accept_window_selection(&mut self, pos: Point) {
        let mut script = self.script();
        script.selecting = false;
        script.selections.push(Some(pos));
    }

    fn cancel_window_selection(&mut self) {
        let mut script = self.script();
        script.selecting = false;
        script.selections.push(None);
    }

    fn screen_edge_motion(&mut self, _pos: Point, _time_msec: u32) -> bool {
        let mut script = self.script();
        script.edge_motions += 1;
        script.edge_fires
    }

    fn effects_grab_active(&self) -> bool {
        self.script.borrow().effects_grab
    }

    fn effect_event(&mut self, event: &Event) -> bool {
        let mut script = self.script();
        script.effect_events.push(event.name());
        script.effect_consumes
    }

    fn move_resize_active(&self) -> bool {
        self.script.borrow().move_resize
    }

    fn move_resize_update(&mut self, pos: Point) {
        self.script().move_resize_updates.push(pos);
    }

    fn move_resize_finish(&mut self) {
        let mut script = self.script();
        script.move_resize = false;
        script.move_resize_finished += 1;
    }

    fn move_resize_key(&mut self, _event: &KeyEvent) {
        self.script().move_resize_keys += 1;
    }

    fn tabbox_grab_active(&self) -> bool {
        self.script.borrow().tabbox
    }

    fn tabbox_key(&mut self, _event: &KeyEvent) {
        self.script().tabbox_keys += 1;
    }

    fn tabbox_axis(&mut self, _event: &AxisEvent) {
        self.script().tabbox_axes += 1;
    }

    fn close_tabbox(&mut self) {
        let mut script = self.script();
        script.tabbox = false;
        script.tabbox_closed += 1;
    }

    fn decoration_at(&self, _pos: Point) -> Option<WindowId> {
        self.script.borrow().decoration
    }

    fn decoration_event(&mut self, _window: WindowId, event: &Event, _pos: Point) {
        self.script().decoration_events.push(event.name());
    }

    fn internal_window_at(&self, _pos: Point) -> Option<WindowId> {
        self.script.borrow().internal_window
    }

    fn internal_window_focus(&self) -> Option<WindowId> {
        self.script.borrow().internal_focus
    }

    fn internal_window_event(&mut self, _window: WindowId, event: &Event, _pos: Point) {
        self.script().internal_events.push(event.name());
    }

    fn run_mouse_command(&mut self, window: WindowId, command: MouseCommand, _pos: Point) -> bool {
        let mut script = self.script();
        script.mouse_commands.push((window, command));
        script.pass_click
    }

    fn set_cursor_hidden(&mut self, hidden: bool) {
        self.script().cursor_hidden.push(hidden);
    }
}

/// Owned pieces a filter or spy test borrows its `Context` from
pub struct ContextParts {
    pub state: RedirectState,
    pub keyboard: Keyboard,
    pub seat: RecordingSeat,
    pub shell: ScriptedShell,
    pub shortcuts: GlobalShortcuts,
    pub requests: Vec<Request>,
}

impl ContextParts {
    pub fn new() -> Self {
        let mut keyboard = Keyboard::new();
        keyboard.update_keymap(
            Box::new(FakeKeymap::new(&["us"])),
            vec!["us".to_string()],
            NumLock::Leave,
        );
        Self {
            state: RedirectState::new(),
            keyboard,
            seat: RecordingSeat::new(),
            shell: ScriptedShell::new(),
            shortcuts: GlobalShortcuts::new(),
            requests: Vec::new(),
        }
    }

    /// Feed a key to the keyboard as the redirect would before dispatch
    pub fn key(&mut self, keycode: u32, state: KeyState) -> KeyEvent {
        self.keyboard.update_key(keycode, state);
        self.state.modifiers = self.keyboard.modifiers();
        KeyEvent {
            base: crate::event::EventBase::new(None, 0),
            keycode,
            state,
        }
    }

    pub fn actions(&self) -> Vec<String> {
        self.requests
            .iter()
            .filter_map(|r| match r {
                Request::Action(a) => Some(a.to_string()),
                _ => None,
            })
            .collect()
    }
}

pub fn test_context(parts: &mut ContextParts) -> Context<'_> {
    Context {
        state: &mut parts.state,
        keyboard: &parts.keyboard,
        seat: &mut parts.seat,
        shell: &mut parts.shell,
        shortcuts: &mut parts.shortcuts,
        requests: &mut parts.requests,
    }
}

/// Platform wired to the recording seat and the fake keymap
pub fn test_platform() -> (crate::platform::Platform, RecordingSeat) {
    let seat = RecordingSeat::new();
    let parts = crate::platform::PlatformParts {
        keymaps: Box::new(FakeKeymapFactory),
        seat: Box::new(seat.clone()),
        shell: Box::new(ScriptedShell::new()),
        bus: Box::new(crate::bus::LocalBus::new()),
        vt: None,
    };
    let store = crate::config::ConfigStore::in_memory();
    (crate::platform::Platform::new(parts, store), seat)
}
