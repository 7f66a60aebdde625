//! Hide the cursor while the user works with touch

use crate::event::*;
use crate::redirect::{Context, EventSpy};

#[derive(Default)]
pub struct TouchHideCursorSpy {
    hidden: bool,
}

impl TouchHideCursorSpy {
    pub fn new() -> Self {
        Self::default()
    }

    fn show(&mut self, ctx: &mut Context<'_>) {
        if self.hidden {
            self.hidden = false;
            ctx.shell.set_cursor_hidden(false);
        }
    }
}

impl EventSpy for TouchHideCursorSpy {
    fn name(&self) -> &str {
        "touch-hide-cursor"
    }

    fn touch_down(&mut self, ctx: &mut Context<'_>, _event: &TouchDownEvent) {
        if !self.hidden {
            self.hidden = true;
            ctx.shell.set_cursor_hidden(true);
        }
    }

    fn motion(&mut self, ctx: &mut Context<'_>, _event: &MotionEvent) {
        self.show(ctx);
    }

    fn button(&mut self, ctx: &mut Context<'_>, _event: &ButtonEvent) {
        self.show(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_context, ContextParts};

    #[test]
    fn test_touch_hides_motion_shows() {
        let mut parts = ContextParts::new();
        let mut spy = TouchHideCursorSpy::new();
        let base = EventBase::new(None, 0);
        let down = TouchDownEvent {
            base,
            id: 0,
            pos: Point::default(),
        };
        let motion = MotionEvent {
            base,
            delta: Point::new(1.0, 0.0),
            unaccel_delta: Point::new(1.0, 0.0),
        };

        spy.motion(&mut test_context(&mut parts), &motion);
        spy.touch_down(&mut test_context(&mut parts), &down);
        spy.touch_down(&mut test_context(&mut parts), &down);
        spy.motion(&mut test_context(&mut parts), &motion);
        spy.motion(&mut test_context(&mut parts), &motion);
        assert_eq!(parts.shell.script().cursor_hidden, vec![true, false]);
    }
}
