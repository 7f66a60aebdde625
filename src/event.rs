//! Normalized input events
//!
//! Every backend translates its native structs into these types before
//! anything reaches the redirect. Filters and spies only ever see this model.

use std::ops::{Add, Sub};

use log::warn;
use nix::time::{clock_gettime, ClockId};

use crate::device::{DeviceId, DeviceKind};

/// Current time on the clock libinput stamps its events with
pub fn monotonic_usec() -> u64 {
    match clock_gettime(ClockId::CLOCK_MONOTONIC) {
        Ok(ts) => ts.tv_sec() as u64 * 1_000_000 + ts.tv_nsec() as u64 / 1_000,
        Err(e) => {
            warn!("CLOCK_MONOTONIC unreadable: {}", e);
            0
        }
    }
}

/// Millisecond time comparable with `EventBase::time_msec`
///
/// Timers are driven with this so they run on the same clock as the
/// events that armed them.
pub fn monotonic_msec() -> u32 {
    (monotonic_usec() / 1_000) as u32
}

/// Position or delta in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Fields shared by every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventBase {
    /// Originating device, `None` for synthetic events
    pub device: Option<DeviceId>,
    /// Monotonic timestamp in milliseconds
    pub time_msec: u32,
    /// Microsecond timestamp when the backend provides one
    pub time_usec: Option<u64>,
}

impl EventBase {
    pub fn new(device: Option<DeviceId>, time_msec: u32) -> Self {
        Self {
            device,
            time_msec,
            time_usec: None,
        }
    }

    pub fn with_usec(device: Option<DeviceId>, time_usec: u64) -> Self {
        Self {
            device,
            time_msec: (time_usec / 1000) as u32,
            time_usec: Some(time_usec),
        }
    }

    /// Stamped with the current monotonic time
    pub fn now(device: Option<DeviceId>) -> Self {
        Self::with_usec(device, monotonic_usec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSource {
    Wheel,
    Finger,
    Continuous,
    WheelTilt,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKind {
    Lid,
    TabletMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionEvent {
    pub base: EventBase,
    pub delta: Point,
    pub unaccel_delta: Point,
}

/// Absolute motion, position normalized to 0..1 of the output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionAbsoluteEvent {
    pub base: EventBase,
    pub pos: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonEvent {
    pub base: EventBase,
    /// evdev button code (BTN_LEFT = 0x110, ...)
    pub button: u32,
    pub state: ButtonState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisEvent {
    pub base: EventBase,
    pub source: AxisSource,
    pub orientation: AxisOrientation,
    pub delta: f64,
    pub delta_discrete: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEvent {
    pub base: EventBase,
    /// evdev keycode (no xkb offset)
    pub keycode: u32,
    pub state: KeyState,
}

impl KeyEvent {
    pub fn is_press(&self) -> bool {
        self.state == KeyState::Pressed
    }
}

/// Serialized modifier masks from a backend that tracks them itself
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifiersEvent {
    pub base: EventBase,
    pub depressed: u32,
    pub latched: u32,
    pub locked: u32,
    pub group: u32,
}

/// Touch positions are normalized to 0..1 of the output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchDownEvent {
    pub base: EventBase,
    pub id: i32,
    pub pos: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchMotionEvent {
    pub base: EventBase,
    pub id: i32,
    pub pos: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchUpEvent {
    pub base: EventBase,
    pub id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchCancelEvent {
    pub base: EventBase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchFrameEvent {
    pub base: EventBase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeBeginEvent {
    pub base: EventBase,
    pub fingers: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeUpdateEvent {
    pub base: EventBase,
    pub fingers: u32,
    pub delta: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeEndEvent {
    pub base: EventBase,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchBeginEvent {
    pub base: EventBase,
    pub fingers: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchUpdateEvent {
    pub base: EventBase,
    pub fingers: u32,
    pub delta: Point,
    pub scale: f64,
    pub rotation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchEndEvent {
    pub base: EventBase,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchToggleEvent {
    pub base: EventBase,
    pub kind: SwitchKind,
    pub state: SwitchState,
}

/// What changed in a tablet tool event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabletToolChange {
    Axis,
    Proximity,
    Tip,
    Button { button: u32, state: ButtonState },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabletToolEvent {
    pub base: EventBase,
    pub change: TabletToolChange,
    /// Normalized to 0..1 of the output
    pub pos: Point,
    pub pressure: f64,
    pub tip_down: bool,
    pub in_proximity: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabletPadButtonEvent {
    pub base: EventBase,
    pub button: u32,
    pub state: ButtonState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabletPadStripEvent {
    pub base: EventBase,
    pub number: u32,
    pub position: f64,
    pub is_finger: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabletPadRingEvent {
    pub base: EventBase,
    pub number: u32,
    pub position: f64,
    pub is_finger: bool,
}

/// Backend-independent input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Motion(MotionEvent),
    MotionAbsolute(MotionAbsoluteEvent),
    Button(ButtonEvent),
    Axis(AxisEvent),
    Key(KeyEvent),
    Modifiers(ModifiersEvent),
    TouchDown(TouchDownEvent),
    TouchMotion(TouchMotionEvent),
    TouchUp(TouchUpEvent),
    TouchCancel(TouchCancelEvent),
    TouchFrame(TouchFrameEvent),
    SwipeBegin(SwipeBeginEvent),
    SwipeUpdate(SwipeUpdateEvent),
    SwipeEnd(SwipeEndEvent),
    PinchBegin(PinchBeginEvent),
    PinchUpdate(PinchUpdateEvent),
    PinchEnd(PinchEndEvent),
    SwitchToggle(SwitchToggleEvent),
    TabletTool(TabletToolEvent),
    TabletPadButton(TabletPadButtonEvent),
    TabletPadStrip(TabletPadStripEvent),
    TabletPadRing(TabletPadRingEvent),
}

impl Event {
    pub fn base(&self) -> &EventBase {
        match self {
            Event::Motion(e) => &e.base,
            Event::MotionAbsolute(e) => &e.base,
            Event::Button(e) => &e.base,
            Event::Axis(e) => &e.base,
            Event::Key(e) => &e.base,
            Event::Modifiers(e) => &e.base,
            Event::TouchDown(e) => &e.base,
            Event::TouchMotion(e) => &e.base,
            Event::TouchUp(e) => &e.base,
            Event::TouchCancel(e) => &e.base,
            Event::TouchFrame(e) => &e.base,
            Event::SwipeBegin(e) => &e.base,
            Event::SwipeUpdate(e) => &e.base,
            Event::SwipeEnd(e) => &e.base,
            Event::PinchBegin(e) => &e.base,
            Event::PinchUpdate(e) => &e.base,
            Event::PinchEnd(e) => &e.base,
            Event::SwitchToggle(e) => &e.base,
            Event::TabletTool(e) => &e.base,
            Event::TabletPadButton(e) => &e.base,
            Event::TabletPadStrip(e) => &e.base,
            Event::TabletPadRing(e) => &e.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut EventBase {
        match self {
            Event::Motion(e) => &mut e.base,
            Event::MotionAbsolute(e) => &mut e.base,
            Event::Button(e) => &mut e.base,
            Event::Axis(e) => &mut e.base,
            Event::Key(e) => &mut e.base,
            Event::Modifiers(e) => &mut e.base,
            Event::TouchDown(e) => &mut e.base,
            Event::TouchMotion(e) => &mut e.base,
            Event::TouchUp(e) => &mut e.base,
            Event::TouchCancel(e) => &mut e.base,
            Event::TouchFrame(e) => &mut e.base,
            Event::SwipeBegin(e) => &mut e.base,
            Event::SwipeUpdate(e) => &mut e.base,
            Event::SwipeEnd(e) => &mut e.base,
            Event::PinchBegin(e) => &mut e.base,
            Event::PinchUpdate(e) => &mut e.base,
            Event::PinchEnd(e) => &mut e.base,
            Event::SwitchToggle(e) => &mut e.base,
            Event::TabletTool(e) => &mut e.base,
            Event::TabletPadButton(e) => &mut e.base,
            Event::TabletPadStrip(e) => &mut e.base,
            Event::TabletPadRing(e) => &mut e.base,
        }
    }

    /// Device class that is expected to emit this event
    pub fn device_kind(&self) -> DeviceKind {
        match self {
            Event::Key(_) | Event::Modifiers(_) => DeviceKind::Keyboard,
            Event::Motion(_)
            | Event::MotionAbsolute(_)
            | Event::Button(_)
            | Event::Axis(_)
            | Event::SwipeBegin(_)
            | Event::SwipeUpdate(_)
            | Event::SwipeEnd(_)
            | Event::PinchBegin(_)
            | Event::PinchUpdate(_)
            | Event::PinchEnd(_) => DeviceKind::Pointer,
            Event::TouchDown(_)
            | Event::TouchMotion(_)
            | Event::TouchUp(_)
            | Event::TouchCancel(_)
            | Event::TouchFrame(_) => DeviceKind::Touch,
            Event::SwitchToggle(_) => DeviceKind::Switch,
            Event::TabletTool(_)
            | Event::TabletPadButton(_)
            | Event::TabletPadStrip(_)
            | Event::TabletPadRing(_) => DeviceKind::Tablet,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::Motion(_) => "motion",
            Event::MotionAbsolute(_) => "motion-absolute",
            Event::Button(_) => "button",
            Event::Axis(_) => "axis",
            Event::Key(_) => "key",
            Event::Modifiers(_) => "modifiers",
            Event::TouchDown(_) => "touch-down",
            Event::TouchMotion(_) => "touch-motion",
            Event::TouchUp(_) => "touch-up",
            Event::TouchCancel(_) => "touch-cancel",
            Event::TouchFrame(_) => "touch-frame",
            Event::SwipeBegin(_) => "swipe-begin",
            Event::SwipeUpdate(_) => "swipe-update",
            Event::SwipeEnd(_) => "swipe-end",
            Event::PinchBegin(_) => "pinch-begin",
            Event::PinchUpdate(_) => "pinch-update",
            Event::PinchEnd(_) => "pinch-end",
            Event::SwitchToggle(_) => "switch-toggle",
            Event::TabletTool(_) => "tablet-tool",
            Event::TabletPadButton(_) => "tablet-pad-button",
            Event::TabletPadStrip(_) => "tablet-pad-strip",
            Event::TabletPadRing(_) => "tablet-pad-ring",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usec_base_derives_msec() {
        let base = EventBase::with_usec(None, 12_345_678);
        assert_eq!(base.time_msec, 12_345);
        assert_eq!(base.time_usec, Some(12_345_678));
    }

    #[test]
    fn test_timer_clock_matches_event_stamps() {
        let before = monotonic_msec();
        let base = EventBase::now(None);
        let after = monotonic_msec();
        assert!(base.time_msec.wrapping_sub(before) as i32 >= 0);
        assert!(after.wrapping_sub(base.time_msec) as i32 >= 0);
        assert!(base.time_usec.is_some());
    }

    #[test]
    fn test_device_kind_by_variant() {
        let base = EventBase::new(None, 0);
        let key = Event::Key(KeyEvent {
            base,
            keycode: 30,
            state: KeyState::Pressed,
        });
        assert_eq!(key.device_kind(), DeviceKind::Keyboard);

        let swipe = Event::SwipeBegin(SwipeBeginEvent { base, fingers: 4 });
        assert_eq!(swipe.device_kind(), DeviceKind::Pointer);

        let frame = Event::TouchFrame(TouchFrameEvent { base });
        assert_eq!(frame.device_kind(), DeviceKind::Touch);
        assert_eq!(frame.name(), "touch-frame");
    }

    #[test]
    fn test_point_arithmetic() {
        let p = Point::new(1.0, 2.0) + Point::new(0.5, -1.0);
        assert_eq!(p, Point::new(1.5, 1.0));
        assert_eq!(p - Point::new(1.5, 1.0), Point::default());
    }
}
