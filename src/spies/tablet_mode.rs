//! Tablet mode switch tracking

use log::info;

use crate::event::*;
use crate::redirect::{Context, EventSpy, Request};

pub struct TabletModeSpy;

impl EventSpy for TabletModeSpy {
    fn name(&self) -> &str {
        "tablet-mode"
    }

    fn switch_toggle(&mut self, ctx: &mut Context<'_>, event: &SwitchToggleEvent) {
        if event.kind != SwitchKind::TabletMode
            || !ctx.state.is_tablet_mode_switch(event.base.device)
        {
            return;
        }
        let on = event.state == SwitchState::On;
        info!("Tablet mode switch {}", if on { "on" } else { "off" });
        ctx.state.set_tablet_switch(on);
        ctx.request(Request::SetTabletMode(on));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Capabilities, Device, DeviceKind, DeviceRegistry};
    use crate::testing::{test_context, ContextParts};

    #[test]
    fn test_switch_drives_tablet_mode() {
        let mut registry = DeviceRegistry::new();
        let switch = registry.insert(Device::new(DeviceKind::Switch, "sw", "test", "sw"));
        let mut parts = ContextParts::new();
        let mut spy = TabletModeSpy;
        let toggle = SwitchToggleEvent {
            base: EventBase::new(Some(switch), 0),
            kind: SwitchKind::TabletMode,
            state: SwitchState::On,
        };

        // not a known tablet mode switch yet
        spy.switch_toggle(&mut test_context(&mut parts), &toggle);
        assert!(parts.requests.is_empty());

        parts
            .state
            .device_added(switch, DeviceKind::Switch, Capabilities::TABLET_MODE_SWITCH);
        spy.switch_toggle(&mut test_context(&mut parts), &toggle);
        assert!(matches!(parts.requests.as_slice(), [Request::SetTabletMode(true)]));
        assert!(parts.state.tablet_mode().active);
        assert!(parts.state.tablet_mode().available);
    }
}
