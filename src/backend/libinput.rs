//! libinput backend
//!
//! Reads keyboards, pointers, touch screens, switches and tablets from
//! /dev/input/eventN through libinput's path backend. A udev monitor on the
//! `input` subsystem adds and removes devices at runtime.

use anyhow::{anyhow, Context, Result};
use input::event::gesture::{
    GestureEndEvent, GestureEvent, GestureEventCoordinates, GestureEventTrait,
    GesturePinchEvent, GesturePinchEventTrait, GestureSwipeEvent,
};
use input::event::keyboard::{KeyState as LiKeyState, KeyboardEvent, KeyboardEventTrait};
use input::event::pointer::{
    Axis, ButtonState as LiButtonState, PointerEvent, PointerEventTrait, PointerScrollEvent,
};
use input::event::switch::{Switch, SwitchEvent, SwitchEventTrait, SwitchState as LiSwitchState};
use input::event::tablet_pad::{
    RingAxisSource, StripAxisSource, TabletPadEvent, TabletPadEventTrait,
};
use input::event::tablet_tool::{
    ProximityState, TabletToolEvent as LiToolEvent, TabletToolEventTrait, TipState,
};
use input::event::touch::{TouchEvent, TouchEventPosition, TouchEventSlot, TouchEventTrait};
use input::event::{DeviceEvent, Event as LiEvent, EventTrait};
use input::{DeviceCapability, Led, Libinput, LibinputInterface, SendEventsMode};
use log::{debug, info, trace, warn};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};
use std::path::Path;

#[cfg(feature = "seatd")]
use std::cell::RefCell;
#[cfg(feature = "seatd")]
use std::rc::Rc;
#[cfg(feature = "seatd")]
use crate::session::SeatSession;

use super::{Backend, DeviceMap};
use crate::device::{Capabilities, ControlHandle, Device, DeviceControl, DeviceId, DeviceKind, Leds};
use crate::event::*;
use crate::platform::Platform;
use crate::xkb::keycodes::KEY_A;

const BACKEND: &str = "libinput";
const INPUT_DIR: &str = "/dev/input";

/// LibinputInterface opening device nodes directly
struct InputInterface;

impl LibinputInterface for InputInterface {
    fn open_restricted(&mut self, path: &Path, flags: i32) -> std::result::Result<OwnedFd, i32> {
        let f = OpenOptions::new()
            .read(true)
            .write((flags & libc::O_WRONLY != 0) || (flags & libc::O_RDWR != 0))
            .custom_flags(flags & !libc::O_WRONLY & !libc::O_RDWR & !libc::O_RDONLY)
            .open(path)
            .map_err(|e| {
                warn!("Cannot open device: {:?}: {}", path, e);
                e.raw_os_error().unwrap_or(-libc::ENOENT)
            })?;
        Ok(OwnedFd::from(f))
    }

    fn close_restricted(&mut self, fd: OwnedFd) {
        drop(fd);
    }
}

/// LibinputInterface opening device nodes through libseat
#[cfg(feature = "seatd")]
struct SeatInputInterface {
    session: Rc<RefCell<SeatSession>>,
}

#[cfg(feature = "seatd")]
impl LibinputInterface for SeatInputInterface {
    fn open_restricted(&mut self, path: &Path, _flags: i32) -> std::result::Result<OwnedFd, i32> {
        match self.session.borrow_mut().open_device(path) {
            Ok(device) => Ok(device.fd),
            Err(e) => {
                warn!("libseat: Cannot open device {:?}: {:#}", path, e);
                Err(-libc::EACCES)
            }
        }
    }

    fn close_restricted(&mut self, fd: OwnedFd) {
        drop(fd);
    }
}

/// Applies enable/disable and LEDs to a libinput device
struct LibinputControl {
    device: input::Device,
}

impl ControlHandle for LibinputControl {
    fn set_enabled(&mut self, enabled: bool) -> bool {
        let mode = if enabled {
            SendEventsMode::ENABLED
        } else {
            SendEventsMode::DISABLED
        };
        match self.device.config_send_events_set_mode(mode) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}: send events mode not applied: {:?}", self.device.sysname(), e);
                false
            }
        }
    }

    fn set_leds(&mut self, leds: Leds) {
        let mut led = Led::empty();
        led.set(Led::NUMLOCK, leds.contains(Leds::NUM_LOCK));
        led.set(Led::CAPSLOCK, leds.contains(Leds::CAPS_LOCK));
        led.set(Led::SCROLLLOCK, leds.contains(Leds::SCROLL_LOCK));
        self.device.led_update(led);
    }
}

/// Tip and proximity of a tablet tool between events
#[derive(Debug, Clone, Copy, Default)]
struct ToolState {
    tip_down: bool,
    in_proximity: bool,
}

pub struct LibinputBackend {
    input: Libinput,
    monitor: Option<udev::MonitorSocket>,
    devices: DeviceMap,
    /// Path-backend handles by sysname, needed for removal
    handles: HashMap<String, input::Device>,
    tools: HashMap<DeviceId, ToolState>,
    wheel: WheelNotches,
}

/// Whole wheel notches from high-resolution (v120) scroll values
///
/// A fraction of a notch is kept per device and axis until it adds up.
#[derive(Debug, Default)]
struct WheelNotches {
    partial: HashMap<(DeviceId, bool), f64>,
}

impl WheelNotches {
    fn feed(&mut self, id: DeviceId, vertical: bool, v120: f64) -> i32 {
        let acc = self.partial.entry((id, vertical)).or_insert(0.0);
        // reversing drops the unfinished notch
        if *acc != 0.0 && acc.signum() != v120.signum() {
            *acc = 0.0;
        }
        *acc += v120;
        let notches = (*acc / 120.0).trunc();
        *acc -= notches * 120.0;
        notches as i32
    }

    fn forget(&mut self, id: DeviceId) {
        self.partial.retain(|(device, _), _| *device != id);
    }
}

impl LibinputBackend {
    /// Open devices with plain open(2); needs read access to /dev/input
    pub fn open() -> Result<Self> {
        Self::from_context(Libinput::new_from_path(InputInterface))
    }

    /// Open devices through the libseat session (no root required)
    #[cfg(feature = "seatd")]
    pub fn open_with_seat(session: Rc<RefCell<SeatSession>>) -> Result<Self> {
        Self::from_context(Libinput::new_from_path(SeatInputInterface { session }))
    }

    fn from_context(input: Libinput) -> Result<Self> {
        let fd = input.as_raw_fd();
        let flags = nix::fcntl::fcntl(fd, nix::fcntl::FcntlArg::F_GETFL)
            .map_err(|e| anyhow!("F_GETFL failed: {}", e))?;
        let mut flags = nix::fcntl::OFlag::from_bits_truncate(flags);
        flags.insert(nix::fcntl::OFlag::O_NONBLOCK);
        nix::fcntl::fcntl(fd, nix::fcntl::FcntlArg::F_SETFL(flags))
            .map_err(|e| anyhow!("F_SETFL failed: {}", e))?;

        let monitor = match Self::hotplug_monitor() {
            Ok(socket) => Some(socket),
            Err(e) => {
                warn!("Input hotplug disabled: {:#}", e);
                None
            }
        };

        let mut backend = Self {
            input,
            monitor,
            devices: DeviceMap::new(),
            handles: HashMap::new(),
            tools: HashMap::new(),
            wheel: WheelNotches::default(),
        };

        let mut device_count = 0;
        for entry in std::fs::read_dir(INPUT_DIR).context("Cannot scan /dev/input")? {
            let path = entry?.path();
            if backend.add_path(&path) {
                device_count += 1;
            }
        }
        if device_count == 0 {
            return Err(anyhow!(
                "No input devices found. Check permissions for /dev/input/event*."
            ));
        }
        info!("libinput: {} input devices added", device_count);
        Ok(backend)
    }

    fn hotplug_monitor() -> Result<udev::MonitorSocket> {
        let socket = udev::MonitorBuilder::new()
            .context("Failed to create udev monitor builder")?
            .match_subsystem("input")
            .context("Failed to match input subsystem")?
            .listen()
            .context("Failed to start udev monitor")?;
        info!("Input hotplug monitor initialized");
        Ok(socket)
    }

    pub fn hotplug_fd(&self) -> Option<RawFd> {
        self.monitor.as_ref().map(|m| m.as_raw_fd())
    }

    /// Hand an event node to libinput
    fn add_path(&mut self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if !name.starts_with("event") || self.handles.contains_key(name) {
            return false;
        }
        let Some(path_str) = path.to_str() else {
            return false;
        };
        match self.input.path_add_device(path_str) {
            Some(device) => {
                debug!("Input device added: {}", path_str);
                self.handles.insert(name.to_string(), device);
                true
            }
            None => false,
        }
    }

    fn remove_sysname(&mut self, sysname: &str) {
        if let Some(device) = self.handles.remove(sysname) {
            debug!("Input device removed: {}", sysname);
            self.input.path_remove_device(device);
        }
    }

    /// Drain udev add/remove events
    fn poll_hotplug(&mut self) {
        let Some(monitor) = self.monitor.as_ref() else {
            return;
        };
        let mut added = Vec::new();
        let mut removed = Vec::new();
        for event in monitor.iter() {
            match event.event_type() {
                udev::EventType::Add => {
                    if let Some(node) = event.devnode() {
                        added.push(node.to_path_buf());
                    }
                }
                udev::EventType::Remove => {
                    removed.push(event.sysname().to_string_lossy().to_string());
                }
                _ => {}
            }
        }
        for path in added {
            self.add_path(&path);
        }
        for sysname in removed {
            self.remove_sysname(&sysname);
        }
    }

    fn device_added(&mut self, device: input::Device, platform: &mut Platform) {
        let sysname = device.sysname().to_string();
        let mut devices = Vec::new();
        for kind in device_kinds(&device) {
            let caps = capabilities(&device, kind);
            let control = DeviceControl::with_handle(
                caps,
                Box::new(LibinputControl {
                    device: device.clone(),
                }),
            );
            devices.push(Device::new(kind, device.name(), BACKEND, &sysname).with_control(control));
        }
        if devices.is_empty() {
            debug!("{} ({}) has no usable capability", device.name(), sysname);
            return;
        }
        self.devices.register(platform, &sysname, devices);
    }

    fn device_removed(&mut self, device: input::Device, platform: &mut Platform) {
        let sysname = device.sysname().to_string();
        if let Some(id) = self.devices.lookup(&sysname, DeviceKind::Tablet) {
            self.tools.remove(&id);
        }
        if let Some(id) = self.devices.lookup(&sysname, DeviceKind::Pointer) {
            self.wheel.forget(id);
        }
        self.devices.unregister(platform, &sysname);
    }

    fn id_for(&self, device: &input::Device, kind: DeviceKind) -> Option<DeviceId> {
        let id = self.devices.lookup(device.sysname(), kind);
        if id.is_none() {
            warn!(
                "libinput: {} event from unknown device {}",
                kind.name(),
                device.sysname()
            );
        }
        id
    }

    /// Normalize one libinput event; scroll events may yield one per axis
    fn translate(&mut self, event: LiEvent) -> Vec<Event> {
        match event {
            LiEvent::Keyboard(KeyboardEvent::Key(k)) => {
                let Some(id) = self.id_for(&k.device(), DeviceKind::Keyboard) else {
                    return Vec::new();
                };
                vec![Event::Key(KeyEvent {
                    base: EventBase::with_usec(Some(id), k.time_usec()),
                    keycode: k.key(),
                    state: match k.key_state() {
                        LiKeyState::Pressed => KeyState::Pressed,
                        LiKeyState::Released => KeyState::Released,
                    },
                })]
            }
            LiEvent::Pointer(p) => self.translate_pointer(p),
            LiEvent::Touch(t) => self.translate_touch(t),
            LiEvent::Gesture(g) => self.translate_gesture(g),
            LiEvent::Switch(SwitchEvent::Toggle(s)) => {
                let Some(id) = self.id_for(&s.device(), DeviceKind::Switch) else {
                    return Vec::new();
                };
                let kind = match s.switch() {
                    Some(Switch::Lid) => SwitchKind::Lid,
                    Some(Switch::TabletMode) => SwitchKind::TabletMode,
                    _ => return Vec::new(),
                };
                vec![Event::SwitchToggle(SwitchToggleEvent {
                    base: EventBase::with_usec(Some(id), s.time_usec()),
                    kind,
                    state: match s.switch_state() {
                        LiSwitchState::On => SwitchState::On,
                        LiSwitchState::Off => SwitchState::Off,
                    },
                })]
            }
            LiEvent::Tablet(t) => self.translate_tool(t),
            LiEvent::TabletPad(p) => self.translate_pad(p),
            other => {
                trace!("libinput: ignored {:?}", other);
                Vec::new()
            }
        }
    }

    fn translate_pointer(&mut self, event: PointerEvent) -> Vec<Event> {
        let Some(id) = self.id_for(&event.device(), DeviceKind::Pointer) else {
            return Vec::new();
        };
        let base = EventBase::with_usec(Some(id), event.time_usec());
        match event {
            PointerEvent::Motion(m) => vec![Event::Motion(MotionEvent {
                base,
                delta: Point::new(m.dx(), m.dy()),
                unaccel_delta: Point::new(m.dx_unaccelerated(), m.dy_unaccelerated()),
            })],
            PointerEvent::MotionAbsolute(m) => vec![Event::MotionAbsolute(MotionAbsoluteEvent {
                base,
                pos: Point::new(m.absolute_x_transformed(1), m.absolute_y_transformed(1)),
            })],
            PointerEvent::Button(b) => vec![Event::Button(ButtonEvent {
                base,
                button: b.button(),
                state: button_state(b.button_state()),
            })],
            PointerEvent::ScrollWheel(s) => {
                let mut notches = [0; 2];
                for (slot, axis) in [Axis::Vertical, Axis::Horizontal].into_iter().enumerate() {
                    if s.has_axis(axis) {
                        let vertical = matches!(axis, Axis::Vertical);
                        notches[slot] = self.wheel.feed(id, vertical, s.scroll_value_v120(axis));
                    }
                }
                scroll(base, &s, AxisSource::Wheel, |axis| match axis {
                    Axis::Vertical => notches[0],
                    Axis::Horizontal => notches[1],
                })
            }
            PointerEvent::ScrollFinger(s) => scroll(base, &s, AxisSource::Finger, |_| 0),
            PointerEvent::ScrollContinuous(s) => scroll(base, &s, AxisSource::Continuous, |_| 0),
            // legacy axis events duplicate the scroll events above
            _ => Vec::new(),
        }
    }

    fn translate_touch(&mut self, event: TouchEvent) -> Vec<Event> {
        let Some(id) = self.id_for(&event.device(), DeviceKind::Touch) else {
            return Vec::new();
        };
        let base = EventBase::with_usec(Some(id), event.time_usec());
        let event = match event {
            TouchEvent::Down(t) => Event::TouchDown(TouchDownEvent {
                base,
                id: t.seat_slot() as i32,
                pos: Point::new(t.x_transformed(1), t.y_transformed(1)),
            }),
            TouchEvent::Motion(t) => Event::TouchMotion(TouchMotionEvent {
                base,
                id: t.seat_slot() as i32,
                pos: Point::new(t.x_transformed(1), t.y_transformed(1)),
            }),
            TouchEvent::Up(t) => Event::TouchUp(TouchUpEvent {
                base,
                id: t.seat_slot() as i32,
            }),
            TouchEvent::Cancel(_) => Event::TouchCancel(TouchCancelEvent { base }),
            TouchEvent::Frame(_) => Event::TouchFrame(TouchFrameEvent { base }),
            _ => return Vec::new(),
        };
        vec![event]
    }

    fn translate_gesture(&mut self, event: GestureEvent) -> Vec<Event> {
        let Some(id) = self.id_for(&event.device(), DeviceKind::Pointer) else {
            return Vec::new();
        };
        let base = EventBase::with_usec(Some(id), event.time_usec());
        let event = match event {
            GestureEvent::Swipe(GestureSwipeEvent::Begin(g)) => Event::SwipeBegin(SwipeBeginEvent {
                base,
                fingers: g.finger_count() as u32,
            }),
            GestureEvent::Swipe(GestureSwipeEvent::Update(g)) => {
                Event::SwipeUpdate(SwipeUpdateEvent {
                    base,
                    fingers: g.finger_count() as u32,
                    delta: Point::new(g.dx(), g.dy()),
                })
            }
            GestureEvent::Swipe(GestureSwipeEvent::End(g)) => Event::SwipeEnd(SwipeEndEvent {
                base,
                cancelled: g.cancelled(),
            }),
            GestureEvent::Pinch(GesturePinchEvent::Begin(g)) => Event::PinchBegin(PinchBeginEvent {
                base,
                fingers: g.finger_count() as u32,
            }),
            GestureEvent::Pinch(GesturePinchEvent::Update(g)) => {
                Event::PinchUpdate(PinchUpdateEvent {
                    base,
                    fingers: g.finger_count() as u32,
                    delta: Point::new(g.dx(), g.dy()),
                    scale: g.scale(),
                    rotation: g.angle_delta(),
                })
            }
            GestureEvent::Pinch(GesturePinchEvent::End(g)) => Event::PinchEnd(PinchEndEvent {
                base,
                cancelled: g.cancelled(),
            }),
            _ => return Vec::new(),
        };
        vec![event]
    }

    fn translate_tool(&mut self, event: LiToolEvent) -> Vec<Event> {
        let Some(id) = self.id_for(&event.device(), DeviceKind::Tablet) else {
            return Vec::new();
        };
        let base = EventBase::with_usec(Some(id), event.time_usec());
        let pos = Point::new(event.x_transformed(1), event.y_transformed(1));
        let pressure = event.pressure();
        let tool = self.tools.entry(id).or_default();
        let change = match &event {
            LiToolEvent::Axis(_) => TabletToolChange::Axis,
            LiToolEvent::Proximity(p) => {
                tool.in_proximity = p.proximity_state() == ProximityState::In;
                TabletToolChange::Proximity
            }
            LiToolEvent::Tip(t) => {
                tool.tip_down = t.tip_state() == TipState::Down;
                TabletToolChange::Tip
            }
            LiToolEvent::Button(b) => TabletToolChange::Button {
                button: b.button(),
                state: button_state(b.button_state()),
            },
            _ => return Vec::new(),
        };
        vec![Event::TabletTool(TabletToolEvent {
            base,
            change,
            pos,
            pressure,
            tip_down: tool.tip_down,
            in_proximity: tool.in_proximity,
        })]
    }

    fn translate_pad(&mut self, event: TabletPadEvent) -> Vec<Event> {
        let Some(id) = self.id_for(&event.device(), DeviceKind::Tablet) else {
            return Vec::new();
        };
        let base = EventBase::with_usec(Some(id), event.time_usec());
        let event = match event {
            TabletPadEvent::Button(b) => Event::TabletPadButton(TabletPadButtonEvent {
                base,
                button: b.button_number(),
                state: button_state(b.button_state()),
            }),
            TabletPadEvent::Ring(r) => Event::TabletPadRing(TabletPadRingEvent {
                base,
                number: r.number(),
                position: r.position(),
                is_finger: r.source() == RingAxisSource::Finger,
            }),
            TabletPadEvent::Strip(s) => Event::TabletPadStrip(TabletPadStripEvent {
                base,
                number: s.number(),
                position: s.position(),
                is_finger: s.source() == StripAxisSource::Finger,
            }),
            _ => return Vec::new(),
        };
        vec![event]
    }
}

impl Backend for LibinputBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn fd(&self) -> Option<RawFd> {
        Some(self.input.as_raw_fd())
    }

    fn dispatch(&mut self, platform: &mut Platform) -> Result<()> {
        self.poll_hotplug();
        self.input.dispatch().context("libinput dispatch failed")?;

        while let Some(event) = self.input.next() {
            match event {
                LiEvent::Device(DeviceEvent::Added(e)) => self.device_added(e.device(), platform),
                LiEvent::Device(DeviceEvent::Removed(e)) => {
                    self.device_removed(e.device(), platform)
                }
                other => {
                    for event in self.translate(other) {
                        platform.process_event(event);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Kinds a libinput device registers as; tool and pad share `Tablet`
fn device_kinds(device: &input::Device) -> Vec<DeviceKind> {
    let mut kinds = Vec::new();
    for (capability, kind) in [
        (DeviceCapability::Keyboard, DeviceKind::Keyboard),
        (DeviceCapability::Pointer, DeviceKind::Pointer),
        (DeviceCapability::Touch, DeviceKind::Touch),
        (DeviceCapability::Switch, DeviceKind::Switch),
        (DeviceCapability::TabletTool, DeviceKind::Tablet),
        (DeviceCapability::TabletPad, DeviceKind::Tablet),
    ] {
        if device.has_capability(capability) && !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

fn capabilities(device: &input::Device, kind: DeviceKind) -> Capabilities {
    let mut caps = Capabilities::empty();
    caps.set(
        Capabilities::SUPPORTS_DISABLE,
        device
            .config_send_events_modes()
            .contains(SendEventsMode::DISABLED),
    );
    match kind {
        DeviceKind::Keyboard => {
            caps |= Capabilities::LEDS;
            caps.set(
                Capabilities::ALPHANUMERIC_KEYBOARD,
                matches!(device.keyboard_has_key(KEY_A), Ok(true)),
            );
        }
        DeviceKind::Pointer => {
            caps.set(Capabilities::TOUCHPAD, device.config_tap_finger_count() > 0);
        }
        DeviceKind::Switch => {
            caps.set(
                Capabilities::TABLET_MODE_SWITCH,
                matches!(device.switch_has_switch(Switch::TabletMode), Ok(true)),
            );
            caps.set(
                Capabilities::LID_SWITCH,
                matches!(device.switch_has_switch(Switch::Lid), Ok(true)),
            );
        }
        DeviceKind::Touch | DeviceKind::Tablet => {}
    }
    caps
}

fn button_state(state: LiButtonState) -> ButtonState {
    match state {
        LiButtonState::Pressed => ButtonState::Pressed,
        LiButtonState::Released => ButtonState::Released,
    }
}

/// One axis event per axis the scroll event carries
fn scroll<E: PointerScrollEvent>(
    base: EventBase,
    event: &E,
    source: AxisSource,
    discrete: impl Fn(Axis) -> i32,
) -> Vec<Event> {
    [
        (Axis::Vertical, AxisOrientation::Vertical),
        (Axis::Horizontal, AxisOrientation::Horizontal),
    ]
    .into_iter()
    .filter(|(axis, _)| event.has_axis(*axis))
    .map(|(axis, orientation)| {
        Event::Axis(AxisEvent {
            base,
            source,
            orientation,
            delta: event.scroll_value(axis),
            delta_discrete: discrete(axis),
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs readable /dev/input/event* nodes
    #[test]
    #[ignore]
    fn test_open_finds_devices() {
        let backend = LibinputBackend::open();
        assert!(backend.is_ok(), "No accessible input devices");
        assert!(backend.unwrap().fd().is_some());
    }

    #[test]
    fn test_wheel_fractions_add_up_to_notches() {
        let mut registry = crate::device::DeviceRegistry::new();
        let mouse = registry.insert(Device::new(DeviceKind::Pointer, "mouse", "libinput", "event4"));
        let mut wheel = WheelNotches::default();

        // classic wheel
        assert_eq!(wheel.feed(mouse, true, 120.0), 1);
        assert_eq!(wheel.feed(mouse, true, -240.0), -2);
        // high-resolution wheel, quarter notches
        assert_eq!(wheel.feed(mouse, true, 30.0), 0);
        assert_eq!(wheel.feed(mouse, true, 30.0), 0);
        assert_eq!(wheel.feed(mouse, false, 60.0), 0);
        assert_eq!(wheel.feed(mouse, true, 30.0), 0);
        assert_eq!(wheel.feed(mouse, true, 30.0), 1);
        // turning back starts a fresh notch
        assert_eq!(wheel.feed(mouse, true, 90.0), 0);
        assert_eq!(wheel.feed(mouse, true, -60.0), 0);
        assert_eq!(wheel.feed(mouse, true, -60.0), -1);

        assert_eq!(wheel.feed(mouse, false, 30.0), 0);
        wheel.forget(mouse);
        assert_eq!(wheel.feed(mouse, false, 60.0), 0);
        assert_eq!(wheel.feed(mouse, false, 30.0), 0);
    }
}
