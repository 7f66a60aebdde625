//! Fake input for privileged clients
//!
//! Each client owns one synthetic device exposing pointer, keyboard and touch.
//! Requests queue up until `dispatch`, and are dropped while the client has
//! not authenticated.

use std::collections::{HashMap, VecDeque};

use anyhow::Result;
use log::{debug, info, warn};

use super::{Backend, DeviceMap};
use crate::device::{Device, DeviceKind};
use crate::event::*;
use crate::platform::Platform;

const BACKEND: &str = "fake";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FakeRequest {
    Authenticate,
    PointerMotion { delta: Point },
    /// Normalized 0..1 position on the output
    PointerMotionAbsolute { pos: Point },
    Button { button: u32, state: ButtonState },
    Axis { orientation: AxisOrientation, delta: f64 },
    TouchDown { id: i32, pos: Point },
    TouchMotion { id: i32, pos: Point },
    TouchUp { id: i32 },
    TouchCancel,
    TouchFrame,
    Key { keycode: u32, state: KeyState },
}

#[derive(Debug, Default)]
struct Client {
    authenticated: bool,
    has_device: bool,
}

fn native(client: u32) -> String {
    format!("fake-{}", client)
}

#[derive(Default)]
pub struct FakeInputBackend {
    clients: HashMap<u32, Client>,
    queue: VecDeque<(u32, FakeRequest)>,
    devices: DeviceMap,
    pending_create: Vec<u32>,
    pending_destroy: Vec<u32>,
}

impl FakeInputBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for the client's device; registered on the next dispatch
    pub fn create_device(&mut self, client: u32) {
        let entry = self.clients.entry(client).or_default();
        if entry.has_device {
            debug!("Fake input client {} already has a device", client);
            return;
        }
        entry.has_device = true;
        self.pending_create.push(client);
    }

    pub fn destroy_device(&mut self, client: u32) {
        if self.clients.remove(&client).is_some() {
            self.queue.retain(|(c, _)| *c != client);
            self.pending_create.retain(|c| *c != client);
            self.pending_destroy.push(client);
        }
    }

    pub fn request(&mut self, client: u32, request: FakeRequest) {
        if !self.clients.contains_key(&client) {
            warn!("Fake input request from client {} without a device", client);
            return;
        }
        self.queue.push_back((client, request));
    }

    pub fn is_authenticated(&self, client: u32) -> bool {
        self.clients.get(&client).is_some_and(|c| c.authenticated)
    }

    fn translate(&self, client: u32, request: FakeRequest) -> Option<Event> {
        let kind = match request {
            FakeRequest::Authenticate => return None,
            FakeRequest::Key { .. } => DeviceKind::Keyboard,
            FakeRequest::TouchDown { .. }
            | FakeRequest::TouchMotion { .. }
            | FakeRequest::TouchUp { .. }
            | FakeRequest::TouchCancel
            | FakeRequest::TouchFrame => DeviceKind::Touch,
            _ => DeviceKind::Pointer,
        };
        let Some(id) = self.devices.lookup(&native(client), kind) else {
            warn!("Fake input client {} has no {} device", client, kind.name());
            return None;
        };
        let base = EventBase::now(Some(id));
        Some(match request {
            FakeRequest::PointerMotion { delta } => Event::Motion(MotionEvent {
                base,
                delta,
                unaccel_delta: delta,
            }),
            FakeRequest::PointerMotionAbsolute { pos } => {
                Event::MotionAbsolute(MotionAbsoluteEvent { base, pos })
            }
            FakeRequest::Button { button, state } => {
                Event::Button(ButtonEvent { base, button, state })
            }
            FakeRequest::Axis { orientation, delta } => Event::Axis(AxisEvent {
                base,
                source: AxisSource::Unknown,
                orientation,
                delta,
                delta_discrete: 0,
            }),
            FakeRequest::TouchDown { id, pos } => {
                Event::TouchDown(TouchDownEvent { base, id, pos })
            }
            FakeRequest::TouchMotion { id, pos } => {
                Event::TouchMotion(TouchMotionEvent { base, id, pos })
            }
            FakeRequest::TouchUp { id } => Event::TouchUp(TouchUpEvent { base, id }),
            FakeRequest::TouchCancel => Event::TouchCancel(TouchCancelEvent { base }),
            FakeRequest::TouchFrame => Event::TouchFrame(TouchFrameEvent { base }),
            FakeRequest::Key { keycode, state } => Event::Key(KeyEvent {
                base,
                keycode,
                state,
            }),
            FakeRequest::Authenticate => return None,
        })
    }
}

impl Backend for FakeInputBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn dispatch(&mut self, platform: &mut Platform) -> Result<()> {
        for client in std::mem::take(&mut self.pending_destroy) {
            self.devices.unregister(platform, &native(client));
        }
        for client in std::mem::take(&mut self.pending_create) {
            let name = format!("Fake input client {}", client);
            let key = native(client);
            let devices = [DeviceKind::Pointer, DeviceKind::Keyboard, DeviceKind::Touch]
                .into_iter()
                .map(|kind| Device::new(kind, name.clone(), BACKEND, key.clone()))
                .collect();
            self.devices.register(platform, &key, devices);
            info!("{} created", name);
        }

        let mut warned = Vec::new();
        while let Some((client, request)) = self.queue.pop_front() {
            if request == FakeRequest::Authenticate {
                if let Some(c) = self.clients.get_mut(&client) {
                    c.authenticated = true;
                }
                continue;
            }
            if !self.is_authenticated(client) {
                if !warned.contains(&client) {
                    warn!("Ignoring fake input from unauthenticated client {}", client);
                    warned.push(client);
                }
                continue;
            }
            if let Some(event) = self.translate(client, request) {
                platform.process_event(event);
            }
        }
        Ok(())
    }
}
