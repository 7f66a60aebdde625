//! Redirect dispatcher
//!
//! Every normalized event goes through here: dispatch state is updated
//! first, then spies and filters see the event, and the seat's default
//! action runs when no filter consumed it.

pub mod chain;
pub mod repeat;
pub mod state;
pub mod touch;

use log::trace;

pub use chain::{Context, EventFilter, EventSpy, FilterChain, FilterSlot, InstallPosition, Request};
pub use repeat::KeyRepeat;
pub use state::{RedirectState, TabletMode};
pub use touch::TouchIds;

use crate::event::{Event, EventBase, KeyEvent, KeyState, MotionEvent};
use crate::seat::Seat;
use crate::shell::Shell;
use crate::shortcuts::GlobalShortcuts;
use crate::xkb::{Keyboard, ModifierState, Xkb};

#[derive(Default)]
pub struct Redirect {
    pub state: RedirectState,
    chain: FilterChain,
}

impl Redirect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut FilterChain {
        &mut self.chain
    }

    /// Dispatch one event
    ///
    /// Returns the requests filters and spies queued; chain changes among
    /// them are already applied.
    pub fn dispatch(
        &mut self,
        event: Event,
        xkb: &mut Xkb,
        seat: &mut dyn Seat,
        shell: &mut dyn Shell,
        shortcuts: &mut GlobalShortcuts,
    ) -> Vec<Request> {
        let event = self.prepare(event, xkb);
        let device = event.base().device;
        let keyboard: &Keyboard = match event {
            Event::Key(_) | Event::Modifiers(_) => xkb.keyboard(device),
            _ => xkb.primary(),
        };

        let mut requests = Vec::new();
        let mut ctx = Context {
            state: &mut self.state,
            keyboard,
            seat: &mut *seat,
            shell,
            shortcuts,
            requests: &mut requests,
        };
        let consumed = self.chain.dispatch(&mut ctx, &event);
        if !consumed {
            trace!("{} not consumed, default action", event.name());
            seat.unhandled(&event);
        }

        match event {
            Event::TouchUp(e) => self.state.touch_released(e.id),
            Event::TouchCancel(_) => self.state.cancel_touches(),
            _ => {}
        }
        self.apply_chain_requests(requests)
    }

    /// Drive the repeat timer
    ///
    /// A due repeat goes through the `key_repeat` callbacks; it has no
    /// default action.
    pub fn tick(
        &mut self,
        now_msec: u32,
        xkb: &Xkb,
        seat: &mut dyn Seat,
        shell: &mut dyn Shell,
        shortcuts: &mut GlobalShortcuts,
    ) -> Vec<Request> {
        let mut requests = Vec::new();
        if let Some((device, keycode)) = self.state.repeat.tick(now_msec) {
            let event = KeyEvent {
                base: EventBase::new(device, now_msec),
                keycode,
                state: KeyState::Pressed,
            };
            let mut ctx = Context {
                state: &mut self.state,
                keyboard: xkb.keyboard(device),
                seat,
                shell,
                shortcuts,
                requests: &mut requests,
            };
            if !self.chain.dispatch_key_repeat(&mut ctx, &event) {
                trace!("key repeat {} not consumed", keycode);
            }
        }
        self.apply_chain_requests(requests)
    }

    /// Apply queued chain changes, hand back everything else
    pub fn apply_chain_requests(&mut self, requests: Vec<Request>) -> Vec<Request> {
        let mut rest = Vec::with_capacity(requests.len());
        for request in requests {
            match request {
                Request::InstallFilter(filter, position) => self.chain.install(filter, position),
                Request::UninstallFilter(name) => {
                    self.chain.uninstall(&name);
                }
                Request::InstallSpy(spy) => self.chain.install_spy(spy),
                other => rest.push(other),
            }
        }
        rest
    }

    /// Update dispatch and keyboard state before filters run
    fn prepare(&mut self, event: Event, xkb: &mut Xkb) -> Event {
        let state = &mut self.state;
        match event {
            Event::Key(e) => {
                xkb.mark_used(e.base.device);
                let keyboard = xkb.keyboard_mut(e.base.device);
                keyboard.update_key(e.keycode, e.state);
                state.modifiers = keyboard.modifiers();
                event
            }
            Event::Modifiers(e) => {
                let keyboard = xkb.keyboard_mut(e.base.device);
                keyboard.update_modifier_state(ModifierState {
                    depressed: e.depressed,
                    latched: e.latched,
                    locked: e.locked,
                    layout: e.group,
                });
                state.modifiers = keyboard.modifiers();
                event
            }
            Event::Button(e) => {
                state.update_button(e.button, e.state);
                event
            }
            Event::Motion(e) => {
                state.move_pointer(e.delta);
                event
            }
            Event::MotionAbsolute(e) => {
                let old = state.pointer_pos();
                let new = state.warp_pointer(state.to_output(e.pos));
                let delta = new - old;
                Event::Motion(MotionEvent {
                    base: e.base,
                    delta,
                    unaccel_delta: delta,
                })
            }
            Event::TouchDown(mut e) => {
                e.pos = state.to_output(e.pos);
                state.set_touch_pos(e.id, e.pos);
                Event::TouchDown(e)
            }
            Event::TouchMotion(mut e) => {
                e.pos = state.to_output(e.pos);
                state.set_touch_pos(e.id, e.pos);
                Event::TouchMotion(e)
            }
            Event::TabletTool(mut e) => {
                e.pos = state.to_output(e.pos);
                Event::TabletTool(e)
            }
            _ => event,
        }
    }
}
