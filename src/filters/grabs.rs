//! Filters for shell states that grab input
//!
//! Each one is inert until its shell state is active and then owns the
//! input classes it cares about.

use log::debug;

use super::{forward_touch_down, forward_touch_motion, forward_touch_up};
use crate::event::*;
use crate::redirect::{Context, EventFilter};
use crate::xkb::keycodes::*;
use crate::xkb::Modifiers;

/// Locked screen: input only reaches lock-screen and input-method surfaces
pub struct LockScreenFilter;

impl EventFilter for LockScreenFilter {
    fn name(&self) -> &str {
        "lock-screen"
    }

    fn key_repeat(&mut self, ctx: &mut Context<'_>, _event: &KeyEvent) -> bool {
        ctx.shell.is_screen_locked()
    }

    fn handle(&mut self, ctx: &mut Context<'_>, event: &Event) -> bool {
        if !ctx.shell.is_screen_locked() {
            return false;
        }
        let pointer = ctx.state.pointer_pos();
        match event {
            Event::Motion(_) | Event::Button(_) | Event::Axis(_) => {
                if ctx.shell.lock_screen_surface_at(pointer).is_some() {
                    ctx.seat.forward(event);
                }
            }
            Event::Key(_) => {
                let focus = ctx.shell.lock_screen_focus();
                ctx.seat.set_focus(focus);
                ctx.seat.forward(event);
            }
            Event::TouchDown(e) => {
                if ctx.shell.lock_screen_surface_at(e.pos).is_some() {
                    forward_touch_down(ctx, e);
                }
            }
            Event::TouchMotion(e) => {
                forward_touch_motion(ctx, e);
            }
            Event::TouchUp(e) => forward_touch_up(ctx, e),
            Event::TouchCancel(_) => ctx.seat.touch_cancel(),
            Event::TouchFrame(_) => ctx.seat.touch_frame(),
            // hardware switches keep working on a locked screen
            Event::SwitchToggle(_) | Event::Modifiers(_) | Event::MotionAbsolute(_) => {
                return false
            }
            _ => {}
        }
        true
    }
}

/// Open popups close on a click outside their client
pub struct PopupFilter;

impl EventFilter for PopupFilter {
    fn name(&self) -> &str {
        "popup"
    }

    fn button(&mut self, ctx: &mut Context<'_>, event: &ButtonEvent) -> bool {
        if event.state != ButtonState::Pressed {
            return false;
        }
        let Some(popup) = ctx.shell.topmost_popup() else {
            return false;
        };
        let outside = match ctx.shell.window_at(ctx.state.pointer_pos()) {
            None => true,
            Some(window) => window.client != popup.client || window.on_decoration,
        };
        if outside {
            debug!("press outside popup, cancelling popups");
            ctx.shell.cancel_popups();
        }
        outside
    }

    fn key(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) -> bool {
        let Some(surface) = ctx.shell.topmost_popup().and_then(|p| p.surface) else {
            return false;
        };
        ctx.seat.set_focus(Some(surface));
        ctx.seat.forward(&Event::Key(*event));
        true
    }

    fn key_repeat(&mut self, ctx: &mut Context<'_>, _event: &KeyEvent) -> bool {
        ctx.shell
            .topmost_popup()
            .map_or(false, |p| p.surface.is_some())
    }
}

/// Interactive window picking
pub struct WindowSelectorFilter;

impl EventFilter for WindowSelectorFilter {
    fn name(&self) -> &str {
        "window-selector"
    }

    fn key_repeat(&mut self, ctx: &mut Context<'_>, _event: &KeyEvent) -> bool {
        ctx.shell.is_selecting_window()
    }

    fn handle(&mut self, ctx: &mut Context<'_>, event: &Event) -> bool {
        if !ctx.shell.is_selecting_window() {
            return false;
        }
        let pointer = ctx.state.pointer_pos();
        match event {
            Event::Button(e) if e.state == ButtonState::Pressed => match e.button {
                BTN_LEFT => ctx.shell.accept_window_selection(pointer),
                BTN_RIGHT => ctx.shell.cancel_window_selection(),
                _ => {}
            },
            Event::Key(e) if e.is_press() => match ctx.keyboard.keysym() {
                KEY_SYM_RETURN | KEY_SYM_KP_ENTER | KEY_SYM_SPACE => {
                    ctx.shell.accept_window_selection(pointer)
                }
                KEY_SYM_ESCAPE => ctx.shell.cancel_window_selection(),
                _ => {}
            },
            Event::TouchDown(e) => ctx.shell.accept_window_selection(e.pos),
            Event::SwitchToggle(_) | Event::Modifiers(_) | Event::MotionAbsolute(_) => {
                return false
            }
            _ => {}
        }
        true
    }
}

pub struct ScreenEdgeFilter;

impl EventFilter for ScreenEdgeFilter {
    fn name(&self) -> &str {
        "screen-edge"
    }

    fn motion(&mut self, ctx: &mut Context<'_>, event: &MotionEvent) -> bool {
        let pos = ctx.state.pointer_pos();
        ctx.shell.screen_edge_motion(pos, event.base.time_msec)
    }
}

/// Effect holding an input grab decides on everything
pub struct EffectsFilter;

impl EventFilter for EffectsFilter {
    fn name(&self) -> &str {
        "effects"
    }

    fn key_repeat(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) -> bool {
        ctx.shell.effects_grab_active() && ctx.shell.effect_event(&Event::Key(*event))
    }

    fn handle(&mut self, ctx: &mut Context<'_>, event: &Event) -> bool {
        ctx.shell.effects_grab_active() && ctx.shell.effect_event(event)
    }
}

/// Interactive move or resize of a window
pub struct MoveResizeFilter;

impl EventFilter for MoveResizeFilter {
    fn name(&self) -> &str {
        "move-resize"
    }

    fn key_repeat(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) -> bool {
        if !ctx.shell.move_resize_active() {
            return false;
        }
        ctx.shell.move_resize_key(event);
        true
    }

    fn handle(&mut self, ctx: &mut Context<'_>, event: &Event) -> bool {
        if !ctx.shell.move_resize_active() {
            return false;
        }
        match event {
            Event::Motion(_) => {
                let pos = ctx.state.pointer_pos();
                ctx.shell.move_resize_update(pos);
            }
            Event::Button(e) => {
                if e.state == ButtonState::Released && !ctx.state.any_button_pressed() {
                    ctx.shell.move_resize_finish();
                }
            }
            Event::Axis(_) | Event::TouchDown(_) => {}
            Event::Key(e) => ctx.shell.move_resize_key(e),
            Event::TouchMotion(e) => ctx.shell.move_resize_update(e.pos),
            Event::TouchUp(_) => ctx.shell.move_resize_finish(),
            _ => return false,
        }
        true
    }
}

/// Window switcher
pub struct TabboxFilter;

impl EventFilter for TabboxFilter {
    fn name(&self) -> &str {
        "tabbox"
    }

    fn key(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) -> bool {
        if !ctx.shell.tabbox_grab_active() {
            return false;
        }
        ctx.shell.tabbox_key(event);
        let released_all =
            (ctx.keyboard.modifiers() & Modifiers::SHORTCUT_MASK).is_empty();
        if !event.is_press() && released_all {
            debug!("all modifiers released, closing tabbox");
            ctx.shell.close_tabbox();
        }
        true
    }

    fn key_repeat(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) -> bool {
        if !ctx.shell.tabbox_grab_active() {
            return false;
        }
        ctx.shell.tabbox_key(event);
        true
    }

    fn axis(&mut self, ctx: &mut Context<'_>, event: &AxisEvent) -> bool {
        if !ctx.shell.tabbox_grab_active() {
            return false;
        }
        ctx.shell.tabbox_axis(event);
        true
    }
}
