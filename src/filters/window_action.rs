//! Window commands bound to the command modifier
//!
//! Modifier plus left, middle or right button moves, raises/lowers or
//! resizes the window under the pointer; modifier plus wheel runs the wheel
//! command. A press on an inactive window activates it.

use log::debug;

use crate::event::*;
use crate::redirect::{Context, EventFilter};
use crate::shell::MouseCommand;
use crate::xkb::keycodes::{BTN_LEFT, BTN_MIDDLE, BTN_RIGHT};
use crate::xkb::Modifiers;

pub struct WindowActionFilter {
    command_modifier: Modifiers,
}

impl WindowActionFilter {
    pub fn new(command_modifier: Modifiers) -> Self {
        Self { command_modifier }
    }

    fn command_held(&self, ctx: &Context<'_>) -> bool {
        !self.command_modifier.is_empty()
            && ctx.keyboard.modifiers() & Modifiers::SHORTCUT_MASK == self.command_modifier
    }
}

impl Default for WindowActionFilter {
    fn default() -> Self {
        Self::new(Modifiers::LOGO)
    }
}

impl EventFilter for WindowActionFilter {
    fn name(&self) -> &str {
        "window-action"
    }

    fn button(&mut self, ctx: &mut Context<'_>, event: &ButtonEvent) -> bool {
        if event.state != ButtonState::Pressed {
            return false;
        }
        let pos = ctx.state.pointer_pos();
        let Some(window) = ctx.shell.window_at(pos) else {
            return false;
        };
        let command = if self.command_held(ctx) {
            match event.button {
                BTN_LEFT => MouseCommand::Move,
                BTN_MIDDLE => MouseCommand::RaiseLower,
                BTN_RIGHT => MouseCommand::Resize,
                _ => return false,
            }
        } else if !window.active {
            MouseCommand::ActivateAndPassClick
        } else {
            return false;
        };
        debug!("window {:?}: {:?}", window.id, command);
        !ctx.shell.run_mouse_command(window.id, command, pos)
    }

    fn axis(&mut self, ctx: &mut Context<'_>, event: &AxisEvent) -> bool {
        if event.orientation != AxisOrientation::Vertical
            || event.delta == 0.0
            || !self.command_held(ctx)
        {
            return false;
        }
        let pos = ctx.state.pointer_pos();
        let Some(window) = ctx.shell.window_at(pos) else {
            return false;
        };
        let command = if event.delta < 0.0 {
            MouseCommand::WheelUp
        } else {
            MouseCommand::WheelDown
        };
        !ctx.shell.run_mouse_command(window.id, command, pos)
    }

    fn touch_down(&mut self, ctx: &mut Context<'_>, event: &TouchDownEvent) -> bool {
        match ctx.shell.window_at(event.pos) {
            Some(window) if !window.active => !ctx.shell.run_mouse_command(
                window.id,
                MouseCommand::ActivateAndPassClick,
                event.pos,
            ),
            _ => false,
        }
    }
}
