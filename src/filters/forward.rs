//! Last stop: hand the event to the focused client

use crate::event::Event;
use crate::redirect::{Context, EventFilter};

use super::{forward_touch_down, forward_touch_motion, forward_touch_up};

pub struct ForwardFilter;

impl EventFilter for ForwardFilter {
    fn name(&self) -> &str {
        "forward"
    }

    fn handle(&mut self, ctx: &mut Context<'_>, event: &Event) -> bool {
        match event {
            Event::Motion(_)
            | Event::Button(_)
            | Event::Axis(_)
            | Event::Key(_)
            | Event::SwipeBegin(_)
            | Event::SwipeUpdate(_)
            | Event::SwipeEnd(_)
            | Event::PinchBegin(_)
            | Event::PinchUpdate(_)
            | Event::PinchEnd(_) => ctx.seat.forward(event),
            Event::TouchDown(e) => forward_touch_down(ctx, e),
            Event::TouchMotion(e) => {
                forward_touch_motion(ctx, e);
            }
            Event::TouchUp(e) => forward_touch_up(ctx, e),
            Event::TouchCancel(_) => {
                ctx.state.touch_ids.clear();
                ctx.seat.touch_cancel();
            }
            Event::TouchFrame(_) => ctx.seat.touch_frame(),
            _ => return false,
        }
        true
    }
}
