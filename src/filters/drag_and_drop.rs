//! Drag-and-drop grab
//!
//! While the seat runs a pointer drag every pointer event belongs to the
//! drag. A touch drag is driven by the first touch point that moves; other
//! touch points are swallowed.

use log::trace;

use crate::event::*;
use crate::redirect::{Context, EventFilter};
use crate::seat::DragState;

pub struct DragAndDropFilter;

impl EventFilter for DragAndDropFilter {
    fn name(&self) -> &str {
        "drag-and-drop"
    }

    fn motion(&mut self, ctx: &mut Context<'_>, event: &MotionEvent) -> bool {
        match ctx.seat.drag() {
            DragState::None => false,
            DragState::Touch => true,
            DragState::Pointer => {
                ctx.seat.forward(&Event::Motion(*event));
                ctx.seat.update_drag_target(ctx.state.pointer_pos());
                true
            }
        }
    }

    fn button(&mut self, ctx: &mut Context<'_>, event: &ButtonEvent) -> bool {
        match ctx.seat.drag() {
            DragState::None => false,
            DragState::Touch => true,
            DragState::Pointer => {
                ctx.seat.forward(&Event::Button(*event));
                true
            }
        }
    }

    fn axis(&mut self, ctx: &mut Context<'_>, _event: &AxisEvent) -> bool {
        ctx.seat.drag() != DragState::None
    }

    fn touch_down(&mut self, ctx: &mut Context<'_>, event: &TouchDownEvent) -> bool {
        match ctx.seat.drag() {
            DragState::None => false,
            DragState::Pointer => true,
            DragState::Touch => {
                if ctx.state.drag_touch_id != Some(event.id) {
                    return true;
                }
                let protocol = ctx.seat.touch_down(event.pos, event.base.time_msec);
                ctx.state.touch_ids.insert(event.id, protocol);
                true
            }
        }
    }

    fn touch_motion(&mut self, ctx: &mut Context<'_>, event: &TouchMotionEvent) -> bool {
        match ctx.seat.drag() {
            DragState::None => false,
            DragState::Pointer => true,
            DragState::Touch => {
                let drag_id = *ctx.state.drag_touch_id.get_or_insert(event.id);
                if drag_id != event.id {
                    return true;
                }
                if let Some(protocol) = ctx.state.touch_ids.mapped(event.id) {
                    ctx.seat
                        .touch_motion(protocol, event.pos, event.base.time_msec);
                }
                ctx.seat.update_drag_target(event.pos);
                true
            }
        }
    }

    fn touch_up(&mut self, ctx: &mut Context<'_>, event: &TouchUpEvent) -> bool {
        if ctx.seat.drag() != DragState::Touch {
            return false;
        }
        if let Some(protocol) = ctx.state.touch_ids.remove(event.id) {
            ctx.seat.touch_up(protocol, event.base.time_msec);
        }
        if ctx.state.drag_touch_id == Some(event.id) {
            trace!("drag touch point {} lifted", event.id);
            ctx.state.drag_touch_id = None;
        }
        true
    }
}
