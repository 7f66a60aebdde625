//! Filter chain
//!
//! Spies see every event and cannot consume. Filters run in priority order
//! until one returns true. Both get a `Context` with the dispatch state and
//! the compositor collaborators; anything that has to happen after the event
//! (layout switches, actions, chain changes) is pushed as a `Request`.

use log::{debug, trace};

use super::state::RedirectState;
use crate::device::Leds;
use crate::event::*;
use crate::seat::Seat;
use crate::shell::Shell;
use crate::shortcuts::{ActionId, GlobalShortcuts};
use crate::xkb::Keyboard;

/// Work queued during dispatch, applied once the event is done
pub enum Request {
    SwitchVt(u32),
    Terminate,
    Action(ActionId),
    /// Dispatch another event after the current one
    Inject(Event),
    InstallFilter(Box<dyn EventFilter>, InstallPosition),
    UninstallFilter(String),
    InstallSpy(Box<dyn EventSpy>),
    LedsChanged(Leds),
    SetTabletMode(bool),
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::SwitchVt(vt) => write!(f, "SwitchVt({})", vt),
            Request::Terminate => write!(f, "Terminate"),
            Request::Action(action) => write!(f, "Action({})", action),
            Request::Inject(event) => write!(f, "Inject({})", event.name()),
            Request::InstallFilter(filter, position) => {
                write!(f, "InstallFilter({}, {:?})", filter.name(), position)
            }
            Request::UninstallFilter(name) => write!(f, "UninstallFilter({})", name),
            Request::InstallSpy(spy) => write!(f, "InstallSpy({})", spy.name()),
            Request::LedsChanged(leds) => write!(f, "LedsChanged({:?})", leds),
            Request::SetTabletMode(on) => write!(f, "SetTabletMode({})", on),
        }
    }
}

/// Everything a filter or spy may look at or drive
pub struct Context<'a> {
    pub state: &'a mut RedirectState,
    /// Keyboard of the event's device for key events, the primary one
    /// otherwise
    pub keyboard: &'a Keyboard,
    pub seat: &'a mut dyn Seat,
    pub shell: &'a mut dyn Shell,
    pub shortcuts: &'a mut GlobalShortcuts,
    pub requests: &'a mut Vec<Request>,
}

impl Context<'_> {
    pub fn request(&mut self, request: Request) {
        trace!("queued {:?}", request);
        self.requests.push(request);
    }
}

/// Event handler that may consume
///
/// Every callback defaults to "not consumed".
pub trait EventFilter {
    fn name(&self) -> &str;

    fn motion(&mut self, _ctx: &mut Context<'_>, _event: &MotionEvent) -> bool {
        false
    }
    fn button(&mut self, _ctx: &mut Context<'_>, _event: &ButtonEvent) -> bool {
        false
    }
    fn axis(&mut self, _ctx: &mut Context<'_>, _event: &AxisEvent) -> bool {
        false
    }
    fn key(&mut self, _ctx: &mut Context<'_>, _event: &KeyEvent) -> bool {
        false
    }
    fn key_repeat(&mut self, _ctx: &mut Context<'_>, _event: &KeyEvent) -> bool {
        false
    }
    fn touch_down(&mut self, _ctx: &mut Context<'_>, _event: &TouchDownEvent) -> bool {
        false
    }
    fn touch_motion(&mut self, _ctx: &mut Context<'_>, _event: &TouchMotionEvent) -> bool {
        false
    }
    fn touch_up(&mut self, _ctx: &mut Context<'_>, _event: &TouchUpEvent) -> bool {
        false
    }
    fn touch_cancel(&mut self, _ctx: &mut Context<'_>, _event: &TouchCancelEvent) -> bool {
        false
    }
    fn touch_frame(&mut self, _ctx: &mut Context<'_>, _event: &TouchFrameEvent) -> bool {
        false
    }
    fn swipe_begin(&mut self, _ctx: &mut Context<'_>, _event: &SwipeBeginEvent) -> bool {
        false
    }
    fn swipe_update(&mut self, _ctx: &mut Context<'_>, _event: &SwipeUpdateEvent) -> bool {
        false
    }
    fn swipe_end(&mut self, _ctx: &mut Context<'_>, _event: &SwipeEndEvent) -> bool {
        false
    }
    fn pinch_begin(&mut self, _ctx: &mut Context<'_>, _event: &PinchBeginEvent) -> bool {
        false
    }
    fn pinch_update(&mut self, _ctx: &mut Context<'_>, _event: &PinchUpdateEvent) -> bool {
        false
    }
    fn pinch_end(&mut self, _ctx: &mut Context<'_>, _event: &PinchEndEvent) -> bool {
        false
    }
    fn switch_toggle(&mut self, _ctx: &mut Context<'_>, _event: &SwitchToggleEvent) -> bool {
        false
    }
    fn tablet_tool(&mut self, _ctx: &mut Context<'_>, _event: &TabletToolEvent) -> bool {
        false
    }
    fn tablet_pad_button(&mut self, _ctx: &mut Context<'_>, _event: &TabletPadButtonEvent) -> bool {
        false
    }
    fn tablet_pad_strip(&mut self, _ctx: &mut Context<'_>, _event: &TabletPadStripEvent) -> bool {
        false
    }
    fn tablet_pad_ring(&mut self, _ctx: &mut Context<'_>, _event: &TabletPadRingEvent) -> bool {
        false
    }

    /// Route an event to its callback
    fn handle(&mut self, ctx: &mut Context<'_>, event: &Event) -> bool {
        match event {
            Event::Motion(e) => self.motion(ctx, e),
            Event::Button(e) => self.button(ctx, e),
            Event::Axis(e) => self.axis(ctx, e),
            Event::Key(e) => self.key(ctx, e),
            Event::TouchDown(e) => self.touch_down(ctx, e),
            Event::TouchMotion(e) => self.touch_motion(ctx, e),
            Event::TouchUp(e) => self.touch_up(ctx, e),
            Event::TouchCancel(e) => self.touch_cancel(ctx, e),
            Event::TouchFrame(e) => self.touch_frame(ctx, e),
            Event::SwipeBegin(e) => self.swipe_begin(ctx, e),
            Event::SwipeUpdate(e) => self.swipe_update(ctx, e),
            Event::SwipeEnd(e) => self.swipe_end(ctx, e),
            Event::PinchBegin(e) => self.pinch_begin(ctx, e),
            Event::PinchUpdate(e) => self.pinch_update(ctx, e),
            Event::PinchEnd(e) => self.pinch_end(ctx, e),
            Event::SwitchToggle(e) => self.switch_toggle(ctx, e),
            Event::TabletTool(e) => self.tablet_tool(ctx, e),
            Event::TabletPadButton(e) => self.tablet_pad_button(ctx, e),
            Event::TabletPadStrip(e) => self.tablet_pad_strip(ctx, e),
            Event::TabletPadRing(e) => self.tablet_pad_ring(ctx, e),
            // state-only events, absolute motion arrives converted
            Event::MotionAbsolute(_) | Event::Modifiers(_) => false,
        }
    }
}

/// Observer that sees every event
pub trait EventSpy {
    fn name(&self) -> &str;

    fn motion(&mut self, _ctx: &mut Context<'_>, _event: &MotionEvent) {}
    fn button(&mut self, _ctx: &mut Context<'_>, _event: &ButtonEvent) {}
    fn axis(&mut self, _ctx: &mut Context<'_>, _event: &AxisEvent) {}
    fn key(&mut self, _ctx: &mut Context<'_>, _event: &KeyEvent) {}
    fn key_repeat(&mut self, _ctx: &mut Context<'_>, _event: &KeyEvent) {}
    fn modifiers(&mut self, _ctx: &mut Context<'_>, _event: &ModifiersEvent) {}
    fn touch_down(&mut self, _ctx: &mut Context<'_>, _event: &TouchDownEvent) {}
    fn touch_motion(&mut self, _ctx: &mut Context<'_>, _event: &TouchMotionEvent) {}
    fn touch_up(&mut self, _ctx: &mut Context<'_>, _event: &TouchUpEvent) {}
    fn touch_cancel(&mut self, _ctx: &mut Context<'_>, _event: &TouchCancelEvent) {}
    fn touch_frame(&mut self, _ctx: &mut Context<'_>, _event: &TouchFrameEvent) {}
    fn swipe_begin(&mut self, _ctx: &mut Context<'_>, _event: &SwipeBeginEvent) {}
    fn swipe_update(&mut self, _ctx: &mut Context<'_>, _event: &SwipeUpdateEvent) {}
    fn swipe_end(&mut self, _ctx: &mut Context<'_>, _event: &SwipeEndEvent) {}
    fn pinch_begin(&mut self, _ctx: &mut Context<'_>, _event: &PinchBeginEvent) {}
    fn pinch_update(&mut self, _ctx: &mut Context<'_>, _event: &PinchUpdateEvent) {}
    fn pinch_end(&mut self, _ctx: &mut Context<'_>, _event: &PinchEndEvent) {}
    fn switch_toggle(&mut self, _ctx: &mut Context<'_>, _event: &SwitchToggleEvent) {}
    fn tablet_tool(&mut self, _ctx: &mut Context<'_>, _event: &TabletToolEvent) {}
    fn tablet_pad_button(&mut self, _ctx: &mut Context<'_>, _event: &TabletPadButtonEvent) {}
    fn tablet_pad_strip(&mut self, _ctx: &mut Context<'_>, _event: &TabletPadStripEvent) {}
    fn tablet_pad_ring(&mut self, _ctx: &mut Context<'_>, _event: &TabletPadRingEvent) {}

    fn handle(&mut self, ctx: &mut Context<'_>, event: &Event) {
        match event {
            Event::Motion(e) => self.motion(ctx, e),
            Event::Button(e) => self.button(ctx, e),
            Event::Axis(e) => self.axis(ctx, e),
            Event::Key(e) => self.key(ctx, e),
            Event::Modifiers(e) => self.modifiers(ctx, e),
            Event::TouchDown(e) => self.touch_down(ctx, e),
            Event::TouchMotion(e) => self.touch_motion(ctx, e),
            Event::TouchUp(e) => self.touch_up(ctx, e),
            Event::TouchCancel(e) => self.touch_cancel(ctx, e),
            Event::TouchFrame(e) => self.touch_frame(ctx, e),
            Event::SwipeBegin(e) => self.swipe_begin(ctx, e),
            Event::SwipeUpdate(e) => self.swipe_update(ctx, e),
            Event::SwipeEnd(e) => self.swipe_end(ctx, e),
            Event::PinchBegin(e) => self.pinch_begin(ctx, e),
            Event::PinchUpdate(e) => self.pinch_update(ctx, e),
            Event::PinchEnd(e) => self.pinch_end(ctx, e),
            Event::SwitchToggle(e) => self.switch_toggle(ctx, e),
            Event::TabletTool(e) => self.tablet_tool(ctx, e),
            Event::TabletPadButton(e) => self.tablet_pad_button(ctx, e),
            Event::TabletPadStrip(e) => self.tablet_pad_strip(ctx, e),
            Event::TabletPadRing(e) => self.tablet_pad_ring(ctx, e),
            Event::MotionAbsolute(_) => {}
        }
    }
}

/// Built-in filter positions, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterSlot {
    VirtualTerminal,
    TerminateServer,
    DragAndDrop,
    LockScreen,
    Popup,
    WindowSelector,
    ScreenEdge,
    Effects,
    MoveResize,
    Tabbox,
    GlobalShortcut,
    Decoration,
    InternalWindow,
    WindowAction,
    Forward,
    FakeTablet,
}

/// Where an external filter goes relative to a built-in slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPosition {
    Before(FilterSlot),
    After(FilterSlot),
}

impl Default for InstallPosition {
    fn default() -> Self {
        InstallPosition::Before(FilterSlot::Forward)
    }
}

/// Ordering key: slot, then before/builtin/after, then insertion order
type EntryKey = (FilterSlot, u8, u64);

const SUB_BEFORE: u8 = 0;
const SUB_BUILTIN: u8 = 1;
const SUB_AFTER: u8 = 2;

struct Entry {
    key: EntryKey,
    filter: Box<dyn EventFilter>,
}

#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Entry>,
    spies: Vec<Box<dyn EventSpy>>,
    next_seq: u64,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, slot: FilterSlot, sub: u8, filter: Box<dyn EventFilter>) {
        let key = (slot, sub, self.next_seq);
        self.next_seq += 1;
        debug!("filter {} installed at {:?}", filter.name(), slot);
        let index = self.filters.partition_point(|e| e.key < key);
        self.filters.insert(index, Entry { key, filter });
    }

    pub fn install_builtin(&mut self, slot: FilterSlot, filter: Box<dyn EventFilter>) {
        self.insert(slot, SUB_BUILTIN, filter);
    }

    pub fn install(&mut self, filter: Box<dyn EventFilter>, position: InstallPosition) {
        match position {
            InstallPosition::Before(slot) => self.insert(slot, SUB_BEFORE, filter),
            InstallPosition::After(slot) => self.insert(slot, SUB_AFTER, filter),
        }
    }

    /// Remove the first filter with that name
    pub fn uninstall(&mut self, name: &str) -> bool {
        match self.filters.iter().position(|e| e.filter.name() == name) {
            Some(index) => {
                self.filters.remove(index);
                debug!("filter {} uninstalled", name);
                true
            }
            None => false,
        }
    }

    pub fn install_spy(&mut self, spy: Box<dyn EventSpy>) {
        debug!("spy {} installed", spy.name());
        self.spies.push(spy);
    }

    pub fn uninstall_spy(&mut self, name: &str) -> bool {
        let before = self.spies.len();
        self.spies.retain(|s| s.name() != name);
        before != self.spies.len()
    }

    /// Filter names in dispatch order
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|e| e.filter.name()).collect()
    }

    pub fn spy_names(&self) -> Vec<&str> {
        self.spies.iter().map(|s| s.name()).collect()
    }

    /// Run spies, then filters until one consumes
    ///
    /// Returns whether the event was consumed.
    pub fn dispatch(&mut self, ctx: &mut Context<'_>, event: &Event) -> bool {
        for spy in self.spies.iter_mut() {
            spy.handle(ctx, event);
        }
        for entry in self.filters.iter_mut() {
            if entry.filter.handle(ctx, event) {
                trace!("{} consumed by {}", event.name(), entry.filter.name());
                return true;
            }
        }
        false
    }

    pub fn dispatch_key_repeat(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) -> bool {
        for spy in self.spies.iter_mut() {
            spy.key_repeat(ctx, event);
        }
        for entry in self.filters.iter_mut() {
            if entry.filter.key_repeat(ctx, event) {
                trace!("key repeat consumed by {}", entry.filter.name());
                return true;
            }
        }
        false
    }
}
