//! Compositor collaborators queried by the filters
//!
//! Everything here is owned by other parts of the compositor (window
//! management, effects, lock screen). The filters only ask questions and
//! hand events over; every method has a passive default so a shell only
//! implements what it actually has.

use crate::event::{AxisEvent, Event, KeyEvent, Point};
use crate::seat::SurfaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

/// Client connection owning one or more windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

/// Window found under a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRef {
    pub id: WindowId,
    pub client: ClientId,
    pub surface: Option<SurfaceId>,
    pub active: bool,
    /// Position is on the server-side decoration, not the content
    pub on_decoration: bool,
}

/// Topmost popup holding an input grab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Popup {
    pub client: ClientId,
    pub surface: Option<SurfaceId>,
}

/// Window operation bound to a modifier + button or wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseCommand {
    Move,
    Resize,
    RaiseLower,
    WheelUp,
    WheelDown,
    /// Activate the window and let the click reach the client
    ActivateAndPassClick,
}

pub trait Shell {
    fn is_screen_locked(&self) -> bool {
        false
    }

    /// Lock-screen or input-method surface under `pos`
    fn lock_screen_surface_at(&self, _pos: Point) -> Option<SurfaceId> {
        None
    }

    /// Surface of the lock screen that takes keyboard input
    fn lock_screen_focus(&self) -> Option<SurfaceId> {
        None
    }

    fn topmost_popup(&self) -> Option<Popup> {
        None
    }

    fn cancel_popups(&mut self) {}

    fn window_at(&self, _pos: Point) -> Option<WindowRef> {
        None
    }

    fn is_selecting_window(&self) -> bool {
        false
    }

    fn accept_window_selection(&mut self, _pos: Point) {}

    fn cancel_window_selection(&mut self) {}

    /// Returns true when a reserved screen edge fired
    fn screen_edge_motion(&mut self, _pos: Point, _time_msec: u32) -> bool {
        false
    }

    fn effects_grab_active(&self) -> bool {
        false
    }

    /// Hand an event to the effect holding the grab
    fn effect_event(&mut self, _event: &Event) -> bool {
        false
    }

    fn move_resize_active(&self) -> bool {
        false
    }

    fn move_resize_update(&mut self, _pos: Point) {}

    fn move_resize_finish(&mut self) {}

    fn move_resize_key(&mut self, _event: &KeyEvent) {}

    fn tabbox_grab_active(&self) -> bool {
        false
    }

    fn tabbox_key(&mut self, _event: &KeyEvent) {}

    fn tabbox_axis(&mut self, _event: &AxisEvent) {}

    fn close_tabbox(&mut self) {}

    /// Window whose decoration is under `pos`
    fn decoration_at(&self, _pos: Point) -> Option<WindowId> {
        None
    }

    fn decoration_event(&mut self, _window: WindowId, _event: &Event, _pos: Point) {}

    /// Compositor-owned window under `pos`
    fn internal_window_at(&self, _pos: Point) -> Option<WindowId> {
        None
    }

    /// Compositor-owned window with keyboard focus
    fn internal_window_focus(&self) -> Option<WindowId> {
        None
    }

    fn internal_window_event(&mut self, _window: WindowId, _event: &Event, _pos: Point) {}

    /// Run a window command; returns true when the click should still
    /// reach the client
    fn run_mouse_command(&mut self, _window: WindowId, _command: MouseCommand, _pos: Point) -> bool {
        true
    }

    fn set_cursor_hidden(&mut self, _hidden: bool) {}
}

/// Shell without any collaborators
#[derive(Debug, Default)]
pub struct NullShell;

impl Shell for NullShell {}
