//! Keyboard spies

use log::{debug, trace};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::constants::ACTION_META_ONLY;
use crate::device::Leds;
use crate::event::*;
use crate::redirect::{Context, EventSpy, Request};
use crate::xkb::keycodes::is_meta_key;
use crate::xkb::ModifierState;

pub type KeyListener = Box<dyn FnMut(&KeyEvent)>;

/// Listener list shared between the platform and the key state spy
///
/// Listeners must not register further listeners from inside the callback.
#[derive(Clone, Default)]
pub struct KeyListeners(Rc<RefCell<Vec<KeyListener>>>);

impl KeyListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: impl FnMut(&KeyEvent) + 'static) {
        self.0.borrow_mut().push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    fn notify(&self, event: &KeyEvent) {
        for listener in self.0.borrow_mut().iter_mut() {
            listener(event);
        }
    }
}

/// Reports key presses and releases to the listeners
pub struct KeyStateSpy {
    listeners: KeyListeners,
}

impl KeyStateSpy {
    pub fn new(listeners: KeyListeners) -> Self {
        Self { listeners }
    }
}

impl EventSpy for KeyStateSpy {
    fn name(&self) -> &str {
        "key-state"
    }

    fn key(&mut self, _ctx: &mut Context<'_>, event: &KeyEvent) {
        self.listeners.notify(event);
    }
}

/// Pushes modifier changes to the seat and reports LED changes
#[derive(Default)]
pub struct ModifiersChangedSpy {
    state: ModifierState,
    leds: Leds,
}

impl ModifiersChangedSpy {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&mut self, ctx: &mut Context<'_>) {
        let state = ctx.keyboard.modifier_state();
        if state != self.state {
            trace!("modifiers changed: {:?}", state);
            self.state = state;
            ctx.seat.update_modifiers(state);
        }
        let leds = ctx.keyboard.leds();
        if leds != self.leds {
            self.leds = leds;
            ctx.request(Request::LedsChanged(leds));
        }
    }
}

impl EventSpy for ModifiersChangedSpy {
    fn name(&self) -> &str {
        "modifiers-changed"
    }

    fn key(&mut self, ctx: &mut Context<'_>, _event: &KeyEvent) {
        self.check(ctx);
    }

    fn modifiers(&mut self, ctx: &mut Context<'_>, _event: &ModifiersEvent) {
        self.check(ctx);
    }
}

/// Arms the key repeat timer for keys that repeat
pub struct KeyboardRepeatSpy;

impl EventSpy for KeyboardRepeatSpy {
    fn name(&self) -> &str {
        "keyboard-repeat"
    }

    fn key(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) {
        let source = (event.base.device, event.keycode);
        if event.is_press() {
            if ctx.keyboard.should_key_repeat(event.keycode) {
                ctx.state
                    .repeat
                    .arm(event.base.device, event.keycode, event.base.time_msec);
            } else {
                ctx.state.repeat.disarm();
            }
        } else if ctx.state.repeat.key() == Some(source) {
            ctx.state.repeat.disarm();
        }
    }
}

/// Meta pressed and released with nothing else in between
#[derive(Default)]
pub struct ModifierOnlySpy {
    pressed: BTreeSet<u32>,
    candidate: Option<u32>,
}

impl ModifierOnlySpy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSpy for ModifierOnlySpy {
    fn name(&self) -> &str {
        "modifier-only"
    }

    fn key(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) {
        if event.is_press() {
            let lone = self.pressed.is_empty() && !ctx.state.any_button_pressed();
            self.candidate = (lone && is_meta_key(event.keycode)).then_some(event.keycode);
            self.pressed.insert(event.keycode);
        } else {
            self.pressed.remove(&event.keycode);
            if self.candidate == Some(event.keycode) && self.pressed.is_empty() {
                debug!("modifier-only Meta");
                ctx.request(Request::Action(ACTION_META_ONLY.into()));
            }
            self.candidate = None;
        }
    }

    fn button(&mut self, _ctx: &mut Context<'_>, _event: &ButtonEvent) {
        self.candidate = None;
    }

    fn axis(&mut self, _ctx: &mut Context<'_>, _event: &AxisEvent) {
        self.candidate = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_context, ContextParts};
    use crate::xkb::keycodes::*;

    #[test]
    fn test_key_listeners_notified() {
        let listeners = KeyListeners::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        listeners.add(move |e: &KeyEvent| sink.borrow_mut().push((e.keycode, e.state)));
        let mut spy = KeyStateSpy::new(listeners.clone());

        let mut parts = ContextParts::new();
        let press = parts.key(KEY_A, KeyState::Pressed);
        spy.key(&mut test_context(&mut parts), &press);
        let release = parts.key(KEY_A, KeyState::Released);
        spy.key(&mut test_context(&mut parts), &release);
        assert_eq!(
            *seen.borrow(),
            vec![(KEY_A, KeyState::Pressed), (KEY_A, KeyState::Released)]
        );
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_modifier_and_led_changes_reported() {
        let mut parts = ContextParts::new();
        let mut spy = ModifiersChangedSpy::new();

        let a = parts.key(KEY_A, KeyState::Pressed);
        spy.key(&mut test_context(&mut parts), &a);
        assert!(parts.seat.log.borrow().modifiers.is_empty());

        let caps = parts.key(KEY_CAPSLOCK, KeyState::Pressed);
        spy.key(&mut test_context(&mut parts), &caps);
        assert_eq!(parts.seat.log.borrow().modifiers.len(), 1);
        assert!(matches!(
            parts.requests.as_slice(),
            [Request::LedsChanged(leds)] if *leds == Leds::CAPS_LOCK
        ));

        // release changes nothing
        let caps = parts.key(KEY_CAPSLOCK, KeyState::Released);
        spy.key(&mut test_context(&mut parts), &caps);
        assert_eq!(parts.requests.len(), 1);
    }

    #[test]
    fn test_repeat_armed_and_disarmed() {
        let mut parts = ContextParts::new();
        let mut spy = KeyboardRepeatSpy;

        let a = parts.key(KEY_A, KeyState::Pressed);
        spy.key(&mut test_context(&mut parts), &a);
        assert_eq!(parts.state.repeat.key(), Some((None, KEY_A)));

        // modifiers do not repeat and stop the running repeat
        let shift = parts.key(KEY_LEFTSHIFT, KeyState::Pressed);
        spy.key(&mut test_context(&mut parts), &shift);
        assert_eq!(parts.state.repeat.key(), None);

        let w = parts.key(KEY_W, KeyState::Pressed);
        spy.key(&mut test_context(&mut parts), &w);
        // releasing another key keeps it going
        let a = parts.key(KEY_A, KeyState::Released);
        spy.key(&mut test_context(&mut parts), &a);
        assert_eq!(parts.state.repeat.key(), Some((None, KEY_W)));
        let w = parts.key(KEY_W, KeyState::Released);
        spy.key(&mut test_context(&mut parts), &w);
        assert_eq!(parts.state.repeat.key(), None);
    }

    #[test]
    fn test_lone_meta_triggers_action() {
        let mut parts = ContextParts::new();
        let mut spy = ModifierOnlySpy::new();

        let meta = parts.key(KEY_LEFTMETA, KeyState::Pressed);
        spy.key(&mut test_context(&mut parts), &meta);
        let meta = parts.key(KEY_LEFTMETA, KeyState::Released);
        spy.key(&mut test_context(&mut parts), &meta);
        assert_eq!(parts.actions(), vec![ACTION_META_ONLY]);

        // Meta+A is a chord, not a lone press
        parts.requests.clear();
        for (code, state) in [
            (KEY_LEFTMETA, KeyState::Pressed),
            (KEY_A, KeyState::Pressed),
            (KEY_A, KeyState::Released),
            (KEY_LEFTMETA, KeyState::Released),
        ] {
            let event = parts.key(code, state);
            spy.key(&mut test_context(&mut parts), &event);
        }
        assert!(parts.requests.is_empty());
    }
}
