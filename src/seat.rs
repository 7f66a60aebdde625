//! Display-protocol seat boundary
//!
//! The seat is where consumed-by-forwarding events end up. It owns client
//! focus and protocol touch ids; the redirect only maps its internal touch
//! ids onto what the seat hands back.

use bitflags::bitflags;

use crate::event::{Event, Point};
use crate::xkb::ModifierState;

bitflags! {
    /// Device classes announced to clients
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SeatCapabilities: u32 {
        const POINTER  = 0b001;
        const KEYBOARD = 0b010;
        const TOUCH    = 0b100;
    }
}

/// Client surface handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Key repeat parameters sent to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatInfo {
    /// Repeats per second, 0 disables repeat
    pub rate: u32,
    pub delay_ms: u32,
}

/// Drag-and-drop operation in progress on the seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    None,
    Pointer,
    Touch,
}

pub trait Seat {
    /// Deliver a non-touch event to the focused client
    fn forward(&mut self, event: &Event);

    /// Default action for events no filter consumed
    fn unhandled(&mut self, _event: &Event) {}

    /// Start a protocol touch point, returns its protocol id
    fn touch_down(&mut self, _pos: Point, _time_msec: u32) -> i32 {
        0
    }

    fn touch_motion(&mut self, _protocol_id: i32, _pos: Point, _time_msec: u32) {}

    fn touch_up(&mut self, _protocol_id: i32, _time_msec: u32) {}

    fn touch_cancel(&mut self) {}

    fn touch_frame(&mut self) {}

    /// Keyboard focus
    fn set_focus(&mut self, _surface: Option<SurfaceId>) {}

    fn set_capabilities(&mut self, _caps: SeatCapabilities) {}

    fn set_repeat_info(&mut self, _info: RepeatInfo) {}

    fn set_keymap(&mut self, _keymap: &str) {}

    fn update_modifiers(&mut self, _state: ModifierState) {}

    fn drag(&self) -> DragState {
        DragState::None
    }

    /// Re-pick the drop target under the given position
    fn update_drag_target(&mut self, _pos: Point) {}
}
