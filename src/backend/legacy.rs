//! Legacy windowing-system input
//!
//! Consumes XInput2-shaped device hierarchy and raw events pushed by the
//! connection owner and turns them into devices and normalized events.

use std::collections::VecDeque;

use anyhow::Result;
use log::{debug, warn};

use super::{Backend, DeviceMap};
use crate::device::{Device, DeviceId, DeviceKind};
use crate::event::*;
use crate::platform::Platform;
use crate::xkb::keycodes::{BTN_EXTRA, BTN_LEFT, BTN_MIDDLE, BTN_RIGHT, BTN_SIDE};

const BACKEND: &str = "legacy";

/// X keycodes are evdev codes shifted by this
const X_KEYCODE_OFFSET: u32 = 8;

/// One wheel notch in axis units
const WHEEL_STEP: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XiDeviceUse {
    MasterPointer,
    MasterKeyboard,
    SlavePointer,
    SlaveKeyboard,
    FloatingSlave,
}

/// Entry of the XI device hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct XiDeviceInfo {
    pub deviceid: u16,
    pub name: String,
    pub use_: XiDeviceUse,
    /// Device has a direct touch class
    pub touch: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XiEvent {
    HierarchyChanged {
        added: Vec<XiDeviceInfo>,
        removed: Vec<u16>,
    },
    RawKeyPress {
        deviceid: u16,
        detail: u32,
        time: u32,
    },
    RawKeyRelease {
        deviceid: u16,
        detail: u32,
        time: u32,
    },
    ButtonPress {
        deviceid: u16,
        detail: u32,
        time: u32,
    },
    ButtonRelease {
        deviceid: u16,
        detail: u32,
        time: u32,
    },
    RawMotion {
        deviceid: u16,
        dx: f64,
        dy: f64,
        time: u32,
    },
    /// Touch positions are in root window pixels
    TouchBegin {
        deviceid: u16,
        touchid: u32,
        x: f64,
        y: f64,
        time: u32,
    },
    TouchUpdate {
        deviceid: u16,
        touchid: u32,
        x: f64,
        y: f64,
        time: u32,
    },
    TouchEnd {
        deviceid: u16,
        touchid: u32,
        time: u32,
    },
}

enum Translated {
    Button(u32),
    Axis(AxisOrientation, f64),
}

fn translate_button(detail: u32) -> Option<Translated> {
    Some(match detail {
        1 => Translated::Button(BTN_LEFT),
        2 => Translated::Button(BTN_MIDDLE),
        3 => Translated::Button(BTN_RIGHT),
        4 => Translated::Axis(AxisOrientation::Vertical, -1.0),
        5 => Translated::Axis(AxisOrientation::Vertical, 1.0),
        6 => Translated::Axis(AxisOrientation::Horizontal, -1.0),
        7 => Translated::Axis(AxisOrientation::Horizontal, 1.0),
        8 => Translated::Button(BTN_SIDE),
        9 => Translated::Button(BTN_EXTRA),
        _ => return None,
    })
}

pub struct LegacyBackend {
    queue: VecDeque<XiEvent>,
    devices: DeviceMap,
    /// Root window size, for normalizing touch positions
    width: f64,
    height: f64,
}

impl LegacyBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            devices: DeviceMap::new(),
            width: width.max(1) as f64,
            height: height.max(1) as f64,
        }
    }

    pub fn set_root_size(&mut self, width: u32, height: u32) {
        self.width = width.max(1) as f64;
        self.height = height.max(1) as f64;
    }

    /// Queue an event read from the connection
    pub fn push(&mut self, event: XiEvent) {
        self.queue.push_back(event);
    }

    fn hierarchy_changed(
        &mut self,
        platform: &mut Platform,
        added: Vec<XiDeviceInfo>,
        removed: Vec<u16>,
    ) {
        for deviceid in removed {
            self.devices.unregister(platform, &deviceid.to_string());
        }
        for info in added {
            let kinds: &[DeviceKind] = match (info.use_, info.touch) {
                (XiDeviceUse::SlaveKeyboard, _) => &[DeviceKind::Keyboard],
                (XiDeviceUse::SlavePointer, false) => &[DeviceKind::Pointer],
                (XiDeviceUse::SlavePointer, true) => &[DeviceKind::Pointer, DeviceKind::Touch],
                (use_, _) => {
                    debug!("Skipping {:?} device {} ({})", use_, info.deviceid, info.name);
                    continue;
                }
            };
            let native = info.deviceid.to_string();
            let devices = kinds
                .iter()
                .map(|kind| Device::new(*kind, info.name.clone(), BACKEND, native.clone()))
                .collect();
            self.devices.register(platform, &native, devices);
        }
    }

    fn id_for(&self, deviceid: u16, kind: DeviceKind) -> Option<DeviceId> {
        let id = self.devices.lookup(&deviceid.to_string(), kind);
        if id.is_none() {
            warn!("legacy: {} event from unknown device {}", kind.name(), deviceid);
        }
        id
    }

    fn normalize(&self, x: f64, y: f64) -> Point {
        Point::new(x / self.width, y / self.height)
    }

    fn translate(&self, event: XiEvent) -> Option<Event> {
        match event {
            XiEvent::HierarchyChanged { .. } => None,
            XiEvent::RawKeyPress {
                deviceid,
                detail,
                time,
            } => self.key(deviceid, detail, time, KeyState::Pressed),
            XiEvent::RawKeyRelease {
                deviceid,
                detail,
                time,
            } => self.key(deviceid, detail, time, KeyState::Released),
            XiEvent::ButtonPress {
                deviceid,
                detail,
                time,
            } => self.button(deviceid, detail, time, ButtonState::Pressed),
            XiEvent::ButtonRelease {
                deviceid,
                detail,
                time,
            } => self.button(deviceid, detail, time, ButtonState::Released),
            XiEvent::RawMotion {
                deviceid,
                dx,
                dy,
                time,
            } => {
                let id = self.id_for(deviceid, DeviceKind::Pointer)?;
                Some(Event::Motion(MotionEvent {
                    base: EventBase::new(Some(id), time),
                    delta: Point::new(dx, dy),
                    unaccel_delta: Point::new(dx, dy),
                }))
            }
            XiEvent::TouchBegin {
                deviceid,
                touchid,
                x,
                y,
                time,
            } => {
                let id = self.id_for(deviceid, DeviceKind::Touch)?;
                Some(Event::TouchDown(TouchDownEvent {
                    base: EventBase::new(Some(id), time),
                    id: touchid as i32,
                    pos: self.normalize(x, y),
                }))
            }
            XiEvent::TouchUpdate {
                deviceid,
                touchid,
                x,
                y,
                time,
            } => {
                let id = self.id_for(deviceid, DeviceKind::Touch)?;
                Some(Event::TouchMotion(TouchMotionEvent {
                    base: EventBase::new(Some(id), time),
                    id: touchid as i32,
                    pos: self.normalize(x, y),
                }))
            }
            XiEvent::TouchEnd {
                deviceid,
                touchid,
                time,
            } => {
                let id = self.id_for(deviceid, DeviceKind::Touch)?;
                Some(Event::TouchUp(TouchUpEvent {
                    base: EventBase::new(Some(id), time),
                    id: touchid as i32,
                }))
            }
        }
    }

    fn key(&self, deviceid: u16, detail: u32, time: u32, state: KeyState) -> Option<Event> {
        let id = self.id_for(deviceid, DeviceKind::Keyboard)?;
        let Some(keycode) = detail.checked_sub(X_KEYCODE_OFFSET) else {
            debug!("legacy: invalid X keycode {}", detail);
            return None;
        };
        Some(Event::Key(KeyEvent {
            base: EventBase::new(Some(id), time),
            keycode,
            state,
        }))
    }

    fn button(&self, deviceid: u16, detail: u32, time: u32, state: ButtonState) -> Option<Event> {
        let id = self.id_for(deviceid, DeviceKind::Pointer)?;
        let base = EventBase::new(Some(id), time);
        match translate_button(detail) {
            Some(Translated::Button(button)) => Some(Event::Button(ButtonEvent {
                base,
                button,
                state,
            })),
            // wheel "buttons" send press and release per notch
            Some(Translated::Axis(orientation, sign)) => match state {
                ButtonState::Pressed => Some(Event::Axis(AxisEvent {
                    base,
                    source: AxisSource::Wheel,
                    orientation,
                    delta: sign * WHEEL_STEP,
                    delta_discrete: sign as i32,
                })),
                ButtonState::Released => None,
            },
            None => {
                debug!("legacy: ignoring X button {}", detail);
                None
            }
        }
    }
}

impl Backend for LegacyBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn dispatch(&mut self, platform: &mut Platform) -> Result<()> {
        while let Some(event) = self.queue.pop_front() {
            match event {
                XiEvent::HierarchyChanged { added, removed } => {
                    self.hierarchy_changed(platform, added, removed)
                }
                other => {
                    if let Some(event) = self.translate(other) {
                        platform.process_event(event);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_platform;
    use crate::xkb::keycodes::KEY_A;

    fn info(deviceid: u16, use_: XiDeviceUse, touch: bool) -> XiDeviceInfo {
        XiDeviceInfo {
            deviceid,
            name: format!("xi {}", deviceid),
            use_,
            touch,
        }
    }

    fn hierarchy() -> XiEvent {
        XiEvent::HierarchyChanged {
            added: vec![
                info(2, XiDeviceUse::MasterPointer, false),
                info(3, XiDeviceUse::MasterKeyboard, false),
                info(8, XiDeviceUse::SlaveKeyboard, false),
                info(9, XiDeviceUse::SlavePointer, false),
                info(10, XiDeviceUse::SlavePointer, true),
            ],
            removed: vec![],
        }
    }

    #[test]
    fn test_masters_are_not_devices() {
        let (mut platform, _seat) = test_platform();
        let mut backend = LegacyBackend::new(1000, 500);
        backend.push(hierarchy());
        backend.dispatch(&mut platform).unwrap();
        assert_eq!(backend.devices.len(), 3);
        assert!(!backend.devices.contains("2"));
        assert!(!backend.devices.contains("3"));
        assert!(backend.devices.lookup("10", DeviceKind::Touch).is_some());
        assert_eq!(platform.devices().count(), 4);
    }

    #[test]
    fn test_keycodes_and_buttons_translated() {
        let (mut platform, seat) = test_platform();
        let mut backend = LegacyBackend::new(1000, 500);
        backend.push(hierarchy());
        backend.push(XiEvent::RawKeyPress {
            deviceid: 8,
            detail: KEY_A + 8,
            time: 1,
        });
        backend.push(XiEvent::ButtonPress {
            deviceid: 9,
            detail: 3,
            time: 2,
        });
        backend.push(XiEvent::ButtonPress {
            deviceid: 9,
            detail: 4,
            time: 3,
        });
        backend.push(XiEvent::ButtonRelease {
            deviceid: 9,
            detail: 4,
            time: 4,
        });
        backend.push(XiEvent::ButtonPress {
            deviceid: 9,
            detail: 12,
            time: 5,
        });
        backend.dispatch(&mut platform).unwrap();

        let forwarded = seat.forwarded();
        assert_eq!(forwarded.len(), 3);
        assert!(matches!(forwarded[0], Event::Key(KeyEvent { keycode: KEY_A, .. })));
        assert!(matches!(
            forwarded[1],
            Event::Button(ButtonEvent {
                button: BTN_RIGHT,
                state: ButtonState::Pressed,
                ..
            })
        ));
        match forwarded[2] {
            Event::Axis(a) => {
                assert_eq!(a.orientation, AxisOrientation::Vertical);
                assert_eq!(a.delta, -WHEEL_STEP);
                assert_eq!(a.delta_discrete, -1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_horizontal_scroll_buttons() {
        assert!(matches!(
            translate_button(7),
            Some(Translated::Axis(AxisOrientation::Horizontal, s)) if s > 0.0
        ));
        assert!(matches!(translate_button(8), Some(Translated::Button(BTN_SIDE))));
        assert!(translate_button(10).is_none());
    }

    #[test]
    fn test_touch_positions_normalized() {
        let backend = {
            let (mut platform, _seat) = test_platform();
            let mut backend = LegacyBackend::new(1000, 500);
            backend.push(hierarchy());
            backend.dispatch(&mut platform).unwrap();
            backend
        };
        match backend.translate(XiEvent::TouchBegin {
            deviceid: 10,
            touchid: 4,
            x: 500.0,
            y: 500.0,
            time: 0,
        }) {
            Some(Event::TouchDown(e)) => {
                assert_eq!(e.id, 4);
                assert_eq!(e.pos, Point::new(0.5, 1.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_removed_device_events_ignored() {
        let (mut platform, seat) = test_platform();
        let mut backend = LegacyBackend::new(1000, 500);
        backend.push(hierarchy());
        backend.push(XiEvent::HierarchyChanged {
            added: vec![],
            removed: vec![9],
        });
        backend.push(XiEvent::RawMotion {
            deviceid: 9,
            dx: 1.0,
            dy: 1.0,
            time: 0,
        });
        backend.dispatch(&mut platform).unwrap();
        assert!(seat.forwarded().is_empty());
        assert_eq!(platform.devices().count(), 3);
    }
}
