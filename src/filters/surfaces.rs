//! Server-side decorations and compositor-owned windows
//!
//! Both take pointer input over their surfaces and claim at most one touch
//! point at a time. While either claim is held, other touch points are
//! swallowed.

use log::trace;

use crate::event::*;
use crate::redirect::{Context, EventFilter, RedirectState};
use crate::shell::{Shell, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Decoration,
    InternalWindow,
}

impl Target {
    fn window_at(self, shell: &dyn Shell, pos: Point) -> Option<WindowId> {
        match self {
            Target::Decoration => shell.decoration_at(pos),
            Target::InternalWindow => shell.internal_window_at(pos),
        }
    }

    fn send(self, shell: &mut dyn Shell, window: WindowId, event: &Event, pos: Point) {
        match self {
            Target::Decoration => shell.decoration_event(window, event, pos),
            Target::InternalWindow => shell.internal_window_event(window, event, pos),
        }
    }

    fn claim(self, state: &mut RedirectState) -> &mut Option<i32> {
        match self {
            Target::Decoration => &mut state.decoration_press_id,
            Target::InternalWindow => &mut state.internal_press_id,
        }
    }
}

/// Pointer and touch routing shared by both filters
struct SurfaceInput {
    target: Target,
    /// Window the claimed touch point went down on
    touch_window: Option<WindowId>,
}

impl SurfaceInput {
    fn new(target: Target) -> Self {
        Self {
            target,
            touch_window: None,
        }
    }

    fn pointer(&mut self, ctx: &mut Context<'_>, event: &Event) -> bool {
        let pos = ctx.state.pointer_pos();
        match self.target.window_at(&*ctx.shell, pos) {
            Some(window) => {
                self.target.send(ctx.shell, window, event, pos);
                true
            }
            None => false,
        }
    }

    fn touch_down(&mut self, ctx: &mut Context<'_>, event: &TouchDownEvent) -> bool {
        // a sequence already going to clients keeps going there
        if !ctx.state.touch_ids.is_empty() {
            return false;
        }
        if ctx.state.decoration_press_id.is_some() || ctx.state.internal_press_id.is_some() {
            return true;
        }
        let Some(window) = self.target.window_at(&*ctx.shell, event.pos) else {
            return false;
        };
        trace!("touch {} claimed by {:?}", event.id, self.target);
        *self.target.claim(ctx.state) = Some(event.id);
        self.touch_window = Some(window);
        self.target
            .send(ctx.shell, window, &Event::TouchDown(*event), event.pos);
        true
    }

    fn touch_motion(&mut self, ctx: &mut Context<'_>, event: &TouchMotionEvent) -> bool {
        let Some(claimed) = *self.target.claim(ctx.state) else {
            return false;
        };
        if claimed == event.id {
            if let Some(window) = self.touch_window {
                self.target
                    .send(ctx.shell, window, &Event::TouchMotion(*event), event.pos);
            }
        }
        true
    }

    fn touch_up(&mut self, ctx: &mut Context<'_>, event: &TouchUpEvent) -> bool {
        let Some(claimed) = *self.target.claim(ctx.state) else {
            return false;
        };
        if claimed == event.id {
            let pos = ctx.state.touch_pos(event.id).unwrap_or_default();
            if let Some(window) = self.touch_window.take() {
                self.target
                    .send(ctx.shell, window, &Event::TouchUp(*event), pos);
            }
            *self.target.claim(ctx.state) = None;
        }
        true
    }

    /// The claim itself is dropped by the redirect once the chain ran
    fn touch_cancel(&mut self, ctx: &mut Context<'_>, event: &TouchCancelEvent) -> bool {
        if let Some(window) = self.touch_window.take() {
            trace!("touch on {:?} cancelled", self.target);
            let claimed = *self.target.claim(ctx.state);
            let pos = claimed
                .and_then(|id| ctx.state.touch_pos(id))
                .unwrap_or_default();
            self.target
                .send(ctx.shell, window, &Event::TouchCancel(*event), pos);
        }
        false
    }
}

pub struct DecorationFilter {
    input: SurfaceInput,
}

impl DecorationFilter {
    pub fn new() -> Self {
        Self {
            input: SurfaceInput::new(Target::Decoration),
        }
    }
}

impl Default for DecorationFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventFilter for DecorationFilter {
    fn name(&self) -> &str {
        "decoration"
    }

    fn motion(&mut self, ctx: &mut Context<'_>, event: &MotionEvent) -> bool {
        self.input.pointer(ctx, &Event::Motion(*event))
    }

    fn button(&mut self, ctx: &mut Context<'_>, event: &ButtonEvent) -> bool {
        self.input.pointer(ctx, &Event::Button(*event))
    }

    fn axis(&mut self, ctx: &mut Context<'_>, event: &AxisEvent) -> bool {
        self.input.pointer(ctx, &Event::Axis(*event))
    }

    fn touch_down(&mut self, ctx: &mut Context<'_>, event: &TouchDownEvent) -> bool {
        self.input.touch_down(ctx, event)
    }

    fn touch_motion(&mut self, ctx: &mut Context<'_>, event: &TouchMotionEvent) -> bool {
        self.input.touch_motion(ctx, event)
    }

    fn touch_up(&mut self, ctx: &mut Context<'_>, event: &TouchUpEvent) -> bool {
        self.input.touch_up(ctx, event)
    }

    fn touch_cancel(&mut self, ctx: &mut Context<'_>, event: &TouchCancelEvent) -> bool {
        self.input.touch_cancel(ctx, event)
    }
}

/// Compositor-owned windows also get keys while focused
pub struct InternalWindowFilter {
    input: SurfaceInput,
}

impl InternalWindowFilter {
    pub fn new() -> Self {
        Self {
            input: SurfaceInput::new(Target::InternalWindow),
        }
    }
}

impl Default for InternalWindowFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventFilter for InternalWindowFilter {
    fn name(&self) -> &str {
        "internal-window"
    }

    fn motion(&mut self, ctx: &mut Context<'_>, event: &MotionEvent) -> bool {
        self.input.pointer(ctx, &Event::Motion(*event))
    }

    fn button(&mut self, ctx: &mut Context<'_>, event: &ButtonEvent) -> bool {
        self.input.pointer(ctx, &Event::Button(*event))
    }

    fn axis(&mut self, ctx: &mut Context<'_>, event: &AxisEvent) -> bool {
        self.input.pointer(ctx, &Event::Axis(*event))
    }

    fn key(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) -> bool {
        let Some(window) = ctx.shell.internal_window_focus() else {
            return false;
        };
        let pos = ctx.state.pointer_pos();
        ctx.shell
            .internal_window_event(window, &Event::Key(*event), pos);
        true
    }

    fn key_repeat(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) -> bool {
        self.key(ctx, event)
    }

    fn touch_down(&mut self, ctx: &mut Context<'_>, event: &TouchDownEvent) -> bool {
        self.input.touch_down(ctx, event)
    }

    fn touch_motion(&mut self, ctx: &mut Context<'_>, event: &TouchMotionEvent) -> bool {
        self.input.touch_motion(ctx, event)
    }

    fn touch_up(&mut self, ctx: &mut Context<'_>, event: &TouchUpEvent) -> bool {
        self.input.touch_up(ctx, event)
    }

    fn touch_cancel(&mut self, ctx: &mut Context<'_>, event: &TouchCancelEvent) -> bool {
        self.input.touch_cancel(ctx, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_context, ContextParts};
    use crate::xkb::keycodes::{BTN_LEFT, KEY_A};

    fn down(id: i32) -> TouchDownEvent {
        TouchDownEvent {
            base: EventBase::new(None, 0),
            id,
            pos: Point::new(10.0, 10.0),
        }
    }

    fn motion(id: i32) -> TouchMotionEvent {
        TouchMotionEvent {
            base: EventBase::new(None, 1),
            id,
            pos: Point::new(12.0, 10.0),
        }
    }

    fn up(id: i32) -> TouchUpEvent {
        TouchUpEvent {
            base: EventBase::new(None, 2),
            id,
        }
    }

    #[test]
    fn test_pointer_over_decoration() {
        let mut parts = ContextParts::new();
        let mut filter = DecorationFilter::new();
        let press = ButtonEvent {
            base: EventBase::new(None, 0),
            button: BTN_LEFT,
            state: ButtonState::Pressed,
        };
        assert!(!filter.button(&mut test_context(&mut parts), &press));
        parts.shell.script().decoration = Some(WindowId(4));
        assert!(filter.button(&mut test_context(&mut parts), &press));
        assert_eq!(parts.shell.script().decoration_events, vec!["button"]);
    }

    #[test]
    fn test_decoration_touch_claim() {
        let mut parts = ContextParts::new();
        parts.shell.script().decoration = Some(WindowId(4));
        let mut filter = DecorationFilter::new();

        assert!(filter.touch_down(&mut test_context(&mut parts), &down(1)));
        assert_eq!(parts.state.decoration_press_id, Some(1));
        // second finger is swallowed without a mapping
        assert!(filter.touch_down(&mut test_context(&mut parts), &down(2)));
        assert!(parts.state.touch_ids.is_empty());
        assert!(filter.touch_motion(&mut test_context(&mut parts), &motion(2)));
        assert!(filter.touch_up(&mut test_context(&mut parts), &up(2)));
        assert_eq!(parts.state.decoration_press_id, Some(1));

        assert!(filter.touch_motion(&mut test_context(&mut parts), &motion(1)));
        assert!(filter.touch_up(&mut test_context(&mut parts), &up(1)));
        assert_eq!(parts.state.decoration_press_id, None);
        assert_eq!(
            parts.shell.script().decoration_events,
            vec!["touch-down", "touch-motion", "touch-up"]
        );
        assert!(!filter.touch_motion(&mut test_context(&mut parts), &motion(1)));
    }

    #[test]
    fn test_running_client_sequence_is_not_claimed() {
        let mut parts = ContextParts::new();
        parts.shell.script().decoration = Some(WindowId(4));
        parts.state.touch_ids.insert(0, 1);
        let mut filter = DecorationFilter::new();
        assert!(!filter.touch_down(&mut test_context(&mut parts), &down(1)));
        assert_eq!(parts.state.decoration_press_id, None);
    }

    #[test]
    fn test_internal_claim_blocks_decoration() {
        let mut parts = ContextParts::new();
        parts.shell.script().decoration = Some(WindowId(4));
        parts.state.internal_press_id = Some(9);
        let mut filter = DecorationFilter::new();
        assert!(filter.touch_down(&mut test_context(&mut parts), &down(1)));
        assert_eq!(parts.state.decoration_press_id, None);
        // motion of other ids is left to the claim holder
        assert!(!filter.touch_motion(&mut test_context(&mut parts), &motion(1)));
    }

    #[test]
    fn test_internal_window_keys_follow_focus() {
        let mut parts = ContextParts::new();
        let mut filter = InternalWindowFilter::new();
        let key = parts.key(KEY_A, KeyState::Pressed);
        assert!(!filter.key(&mut test_context(&mut parts), &key));
        parts.shell.script().internal_focus = Some(WindowId(2));
        assert!(filter.key(&mut test_context(&mut parts), &key));
        assert!(filter.key_repeat(&mut test_context(&mut parts), &key));
        assert_eq!(parts.shell.script().internal_events, vec!["key", "key"]);
    }

    #[test]
    fn test_touch_cancel_releases_window() {
        let mut parts = ContextParts::new();
        parts.shell.script().internal_window = Some(WindowId(6));
        let mut filter = InternalWindowFilter::new();

        assert!(filter.touch_down(&mut test_context(&mut parts), &down(1)));
        assert_eq!(filter.input.touch_window, Some(WindowId(6)));
        let cancel = TouchCancelEvent {
            base: EventBase::new(None, 3),
        };
        // the cancel still reaches the clients
        assert!(!filter.touch_cancel(&mut test_context(&mut parts), &cancel));
        assert_eq!(filter.input.touch_window, None);
        parts.state.cancel_touches();
        assert_eq!(
            parts.shell.script().internal_events,
            vec!["touch-down", "touch-cancel"]
        );

        // a later cancel with nothing claimed is passed on untouched
        assert!(!filter.touch_cancel(&mut test_context(&mut parts), &cancel));
        assert_eq!(parts.shell.script().internal_events.len(), 2);
        assert!(!filter.touch_motion(&mut test_context(&mut parts), &motion(1)));
    }
}
