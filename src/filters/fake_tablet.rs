//! Tablet tools as a pointer
//!
//! Without tablet protocol support the tool moves the pointer and its tip
//! acts as the left button.

use crate::event::*;
use crate::redirect::{Context, EventFilter, Request};
use crate::xkb::keycodes::BTN_LEFT;

pub struct FakeTabletFilter;

impl EventFilter for FakeTabletFilter {
    fn name(&self) -> &str {
        "fake-tablet"
    }

    fn tablet_tool(&mut self, ctx: &mut Context<'_>, event: &TabletToolEvent) -> bool {
        let delta = event.pos - ctx.state.pointer_pos();
        let motion = Event::Motion(MotionEvent {
            base: event.base,
            delta,
            unaccel_delta: delta,
        });
        match event.change {
            TabletToolChange::Axis | TabletToolChange::Proximity => {
                if event.in_proximity {
                    ctx.request(Request::Inject(motion));
                }
            }
            TabletToolChange::Tip => {
                ctx.request(Request::Inject(motion));
                let state = if event.tip_down {
                    ButtonState::Pressed
                } else {
                    ButtonState::Released
                };
                ctx.request(Request::Inject(Event::Button(ButtonEvent {
                    base: event.base,
                    button: BTN_LEFT,
                    state,
                })));
            }
            TabletToolChange::Button { .. } => {}
        }
        true
    }
}
