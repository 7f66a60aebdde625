//! Session-level key filters: VT switching and server termination

use log::{debug, info};

use crate::event::KeyEvent;
use crate::redirect::{Context, EventFilter, Request};
use crate::xkb::keycodes::{function_key_number, vt_from_keysym, KEY_SYM_TERMINATE_SERVER};
use crate::xkb::Modifiers;

/// XF86Switch_VT_n, or Ctrl+Alt+Fn on keymaps without VT keysyms
pub struct VirtualTerminalFilter;

impl EventFilter for VirtualTerminalFilter {
    fn name(&self) -> &str {
        "virtual-terminal"
    }

    fn key(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) -> bool {
        if !event.is_press() {
            return false;
        }
        let vt = vt_from_keysym(ctx.keyboard.keysym()).or_else(|| {
            let ctrl_alt = Modifiers::CTRL | Modifiers::ALT;
            if ctx.keyboard.modifiers().contains(ctrl_alt) {
                function_key_number(event.keycode)
            } else {
                None
            }
        });
        match vt {
            Some(vt) => {
                debug!("VT switch to {} requested", vt);
                ctx.request(Request::SwitchVt(vt));
                true
            }
            None => false,
        }
    }
}

pub struct TerminateServerFilter;

impl EventFilter for TerminateServerFilter {
    fn name(&self) -> &str {
        "terminate-server"
    }

    fn key(&mut self, ctx: &mut Context<'_>, event: &KeyEvent) -> bool {
        if event.is_press() && ctx.keyboard.keysym() == KEY_SYM_TERMINATE_SERVER {
            info!("Terminate_Server pressed");
            ctx.request(Request::Terminate);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::KeyState;
    use crate::testing::{test_context, ContextParts};
    use crate::xkb::keycodes::*;

    #[test]
    fn test_ctrl_alt_function_key_switches_vt() {
        let mut parts = ContextParts::new();
        let mut filter = VirtualTerminalFilter;
        parts.key(KEY_LEFTCTRL, KeyState::Pressed);
        parts.key(KEY_LEFTALT, KeyState::Pressed);
        let f2 = parts.key(KEY_F1 + 1, KeyState::Pressed);
        assert!(filter.key(&mut test_context(&mut parts), &f2));
        assert!(matches!(parts.requests.as_slice(), [Request::SwitchVt(2)]));

        let release = parts.key(KEY_F1 + 1, KeyState::Released);
        assert!(!filter.key(&mut test_context(&mut parts), &release));
    }

    #[test]
    fn test_plain_function_key_passes() {
        let mut parts = ContextParts::new();
        let mut filter = VirtualTerminalFilter;
        let f2 = parts.key(KEY_F1 + 1, KeyState::Pressed);
        assert!(!filter.key(&mut test_context(&mut parts), &f2));
        // repeats never switch
        assert!(!filter.key_repeat(&mut test_context(&mut parts), &f2));
        assert!(parts.requests.is_empty());
    }

    #[test]
    fn test_terminate_server() {
        let mut parts = ContextParts::new();
        let mut filter = TerminateServerFilter;
        let backspace = parts.key(KEY_BACKSPACE, KeyState::Pressed);
        assert!(!filter.key(&mut test_context(&mut parts), &backspace));

        parts.key(KEY_LEFTCTRL, KeyState::Pressed);
        parts.key(KEY_LEFTALT, KeyState::Pressed);
        let backspace = parts.key(KEY_BACKSPACE, KeyState::Pressed);
        assert!(filter.key(&mut test_context(&mut parts), &backspace));
        assert!(matches!(parts.requests.as_slice(), [Request::Terminate]));
    }
}
