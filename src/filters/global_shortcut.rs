//! Global shortcut filter
//!
//! Feeds keys, buttons, axes and swipes to the matcher. A matched action
//! consumes the event and is queued for the platform. The power key is
//! special: its press only arms the long-press timer and the plain
//! shortcut fires on release.

use log::debug;

use crate::event::*;
use crate::redirect::{Context, EventFilter, Request};
use crate::shortcuts::ActionId;
use crate::xkb::keycodes::{KEY_POWER, KEY_SYM_POWER_OFF};
use crate::xkb::Modifiers;

pub struct GlobalShortcutFilter;

fn fire(ctx: &mut Context<'_>, action: Option<ActionId>) -> bool {
    match action {
        Some(action) => {
            debug!("shortcut matched: {}", action);
            ctx.request(Request::Action(action));
            true
        }
        None => false,
    }
}

impl EventFilter for GlobalShortcutFilter {
    fn name(&self) -> &str {
        "global-shortcut"
    }

    fn key(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) -> bool {
        let mods = ctx.keyboard.modifiers_relevant_for_shortcuts();
        if event.keycode == KEY_POWER {
            if event.is_press() {
                ctx.shortcuts
                    .arm_long_press(mods, KEY_SYM_POWER_OFF, event.base.time_msec);
                return true;
            }
            // a release after the long press fired is swallowed
            if ctx.shortcuts.disarm_long_press() {
                let action = ctx.shortcuts.process_key(mods, KEY_SYM_POWER_OFF);
                fire(ctx, action);
            }
            return true;
        }
        if !event.is_press() {
            return false;
        }
        let action = ctx.shortcuts.process_key(mods, ctx.keyboard.keysym());
        fire(ctx, action)
    }

    fn key_repeat(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) -> bool {
        if event.keycode == KEY_POWER {
            return false;
        }
        let mods = ctx.keyboard.modifiers_relevant_for_shortcuts();
        let keysym = ctx.keyboard.to_keysym(event.keycode);
        let action = ctx.shortcuts.process_key(mods, keysym);
        fire(ctx, action)
    }

    fn button(&mut self, ctx: &mut Context<'_>, event: &ButtonEvent) -> bool {
        if event.state != ButtonState::Pressed {
            return false;
        }
        let mods = ctx.keyboard.modifiers() & Modifiers::SHORTCUT_MASK;
        let buttons = ctx.state.pressed_buttons();
        let action = ctx.shortcuts.process_pointer_pressed(mods, buttons);
        fire(ctx, action)
    }

    fn axis(&mut self, ctx: &mut Context<'_>, event: &AxisEvent) -> bool {
        let mods = ctx.keyboard.modifiers() & Modifiers::SHORTCUT_MASK;
        let action = ctx
            .shortcuts
            .process_axis(mods, event.orientation, event.delta);
        let wheel = matches!(event.source, AxisSource::Wheel | AxisSource::WheelTilt);
        if wheel && event.delta_discrete == 0 {
            // between notches of a high-resolution wheel
            return action.is_some();
        }
        fire(ctx, action)
    }

    fn swipe_begin(&mut self, ctx: &mut Context<'_>, event: &SwipeBeginEvent) -> bool {
        ctx.shortcuts.process_swipe_begin(event.fingers);
        false
    }

    fn swipe_update(&mut self, ctx: &mut Context<'_>, event: &SwipeUpdateEvent) -> bool {
        ctx.shortcuts.process_swipe_update(event.delta);
        false
    }

    fn swipe_end(&mut self, ctx: &mut Context<'_>, event: &SwipeEndEvent) -> bool {
        if event.cancelled {
            ctx.shortcuts.process_swipe_cancel();
        } else if let Some(action) = ctx.shortcuts.process_swipe_end() {
            ctx.request(Request::Action(action));
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcuts::{Direction, PointerButtons, Trigger};
    use crate::testing::{test_context, ContextParts};
    use crate::xkb::keycodes::*;

    #[test]
    fn test_key_shortcut_consumes_press_only() {
        let mut parts = ContextParts::new();
        parts
            .shortcuts
            .register(Trigger::key(Modifiers::CTRL, 'k' as u32), "next")
            .unwrap();
        let mut filter = GlobalShortcutFilter;

        let plain = parts.key(KEY_K, KeyState::Pressed);
        assert!(!filter.key(&mut test_context(&mut parts), &plain));
        parts.key(KEY_K, KeyState::Released);

        parts.key(KEY_LEFTCTRL, KeyState::Pressed);
        let press = parts.key(KEY_K, KeyState::Pressed);
        assert!(filter.key(&mut test_context(&mut parts), &press));
        assert!(filter.key_repeat(&mut test_context(&mut parts), &press));
        let release = parts.key(KEY_K, KeyState::Released);
        assert!(!filter.key(&mut test_context(&mut parts), &release));
        assert_eq!(parts.actions(), vec!["next", "next"]);
    }

    #[test]
    fn test_power_key_short_and_long_press() {
        let mut parts = ContextParts::new();
        parts
            .shortcuts
            .register(Trigger::key(Modifiers::empty(), KEY_SYM_POWER_OFF), "short")
            .unwrap();
        parts
            .shortcuts
            .register(
                Trigger::LongPress {
                    mods: Modifiers::empty(),
                    keysym: KEY_SYM_POWER_OFF,
                },
                "long",
            )
            .unwrap();
        let mut filter = GlobalShortcutFilter;

        let press = parts.key(KEY_POWER, KeyState::Pressed);
        assert!(filter.key(&mut test_context(&mut parts), &press));
        assert!(parts.requests.is_empty());
        assert!(!filter.key_repeat(&mut test_context(&mut parts), &press));
        let release = parts.key(KEY_POWER, KeyState::Released);
        assert!(filter.key(&mut test_context(&mut parts), &release));
        assert_eq!(parts.actions(), vec!["short"]);

        parts.requests.clear();
        let press = parts.key(KEY_POWER, KeyState::Pressed);
        assert!(filter.key(&mut test_context(&mut parts), &press));
        assert_eq!(parts.shortcuts.tick(1000).as_deref(), Some("long"));
        let release = parts.key(KEY_POWER, KeyState::Released);
        assert!(filter.key(&mut test_context(&mut parts), &release));
        assert!(parts.requests.is_empty());
    }

    #[test]
    fn test_pointer_and_axis_shortcuts() {
        let mut parts = ContextParts::new();
        parts
            .shortcuts
            .register(
                Trigger::PointerButton {
                    mods: Modifiers::LOGO,
                    buttons: PointerButtons::LEFT,
                },
                "drag",
            )
            .unwrap();
        parts
            .shortcuts
            .register(
                Trigger::Axis {
                    mods: Modifiers::LOGO,
                    direction: Direction::Up,
                },
                "zoom-in",
            )
            .unwrap();
        let mut filter = GlobalShortcutFilter;
        parts.key(KEY_LEFTMETA, KeyState::Pressed);

        parts.state.update_button(BTN_LEFT, ButtonState::Pressed);
        let press = ButtonEvent {
            base: EventBase::new(None, 0),
            button: BTN_LEFT,
            state: ButtonState::Pressed,
        };
        assert!(filter.button(&mut test_context(&mut parts), &press));

        let mut axis = AxisEvent {
            base: EventBase::new(None, 0),
            source: AxisSource::Wheel,
            orientation: AxisOrientation::Vertical,
            delta: -15.0,
            delta_discrete: -1,
        };
        assert!(filter.axis(&mut test_context(&mut parts), &axis));
        axis.delta = 15.0;
        assert!(!filter.axis(&mut test_context(&mut parts), &axis));
        assert_eq!(parts.actions(), vec!["drag", "zoom-in"]);
    }

    #[test]
    fn test_axis_shortcut_fires_per_wheel_notch() {
        let mut parts = ContextParts::new();
        parts
            .shortcuts
            .register(
                Trigger::Axis {
                    mods: Modifiers::LOGO,
                    direction: Direction::Down,
                },
                "zoom-out",
            )
            .unwrap();
        let mut filter = GlobalShortcutFilter;
        parts.key(KEY_LEFTMETA, KeyState::Pressed);

        let mut axis = AxisEvent {
            base: EventBase::new(None, 0),
            source: AxisSource::Wheel,
            orientation: AxisOrientation::Vertical,
            delta: 3.75,
            delta_discrete: 0,
        };
        // partial notches are held back from the client but fire nothing
        for _ in 0..3 {
            assert!(filter.axis(&mut test_context(&mut parts), &axis));
        }
        assert!(parts.actions().is_empty());
        axis.delta_discrete = 1;
        assert!(filter.axis(&mut test_context(&mut parts), &axis));
        assert_eq!(parts.actions(), vec!["zoom-out"]);

        // no binding for the direction, the client gets it
        axis.delta = -3.75;
        axis.delta_discrete = 0;
        assert!(!filter.axis(&mut test_context(&mut parts), &axis));

        // touchpad scrolling has no notches
        axis.source = AxisSource::Finger;
        axis.delta = 2.0;
        assert!(filter.axis(&mut test_context(&mut parts), &axis));
        assert_eq!(parts.actions(), vec!["zoom-out", "zoom-out"]);
    }

    #[test]
    fn test_swipe_passes_through_and_fires_on_end() {
        let mut parts = ContextParts::new();
        parts
            .shortcuts
            .register(
                Trigger::Swipe {
                    fingers: 3,
                    direction: Direction::Up,
                },
                "overview",
            )
            .unwrap();
        let mut filter = GlobalShortcutFilter;
        let base = EventBase::new(None, 0);

        assert!(!filter.swipe_begin(
            &mut test_context(&mut parts),
            &SwipeBeginEvent { base, fingers: 3 }
        ));
        assert!(!filter.swipe_update(
            &mut test_context(&mut parts),
            &SwipeUpdateEvent {
                base,
                fingers: 3,
                delta: Point::new(1.0, -20.0)
            }
        ));
        assert!(!filter.swipe_end(
            &mut test_context(&mut parts),
            &SwipeEndEvent {
                base,
                cancelled: false
            }
        ));
        assert_eq!(parts.actions(), vec!["overview"]);

        filter.swipe_begin(&mut test_context(&mut parts), &SwipeBeginEvent { base, fingers: 3 });
        filter.swipe_update(
            &mut test_context(&mut parts),
            &SwipeUpdateEvent {
                base,
                fingers: 3,
                delta: Point::new(0.0, -20.0),
            },
        );
        filter.swipe_end(
            &mut test_context(&mut parts),
            &SwipeEndEvent {
                base,
                cancelled: true,
            },
        );
        assert_eq!(parts.actions().len(), 1);
    }
}
