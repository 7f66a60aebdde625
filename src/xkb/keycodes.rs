//! evdev keycode and keysym constants
//!
//! Consolidates the key constants the dispatch path matches on.
//! evdev codes are from <linux/input-event-codes.h>, keysyms from
//! <xkbcommon/xkbcommon-keysyms.h>.

// ============================================================================
// evdev Keys
// ============================================================================

pub const KEY_ESC: u32 = 1;
pub const KEY_1: u32 = 2;
pub const KEY_0: u32 = 11;
pub const KEY_BACKSPACE: u32 = 14;
pub const KEY_TAB: u32 = 15;
pub const KEY_Q: u32 = 16;
pub const KEY_W: u32 = 17;
pub const KEY_ENTER: u32 = 28;
pub const KEY_LEFTCTRL: u32 = 29;
pub const KEY_A: u32 = 30;
pub const KEY_K: u32 = 37;
pub const KEY_LEFTSHIFT: u32 = 42;
pub const KEY_RIGHTSHIFT: u32 = 54;
pub const KEY_LEFTALT: u32 = 56;
pub const KEY_SPACE: u32 = 57;
pub const KEY_CAPSLOCK: u32 = 58;
pub const KEY_F1: u32 = 59;
pub const KEY_F10: u32 = 68;
pub const KEY_NUMLOCK: u32 = 69;
pub const KEY_KP1: u32 = 79;
pub const KEY_F11: u32 = 87;
pub const KEY_F12: u32 = 88;
pub const KEY_RIGHTCTRL: u32 = 97;
pub const KEY_RIGHTALT: u32 = 100;
pub const KEY_POWER: u32 = 116;
pub const KEY_LEFTMETA: u32 = 125;
pub const KEY_RIGHTMETA: u32 = 126;

// ============================================================================
// Mouse Buttons (BTN_* from linux/input-event-codes.h)
// ============================================================================

pub const BTN_LEFT: u32 = 0x110;
pub const BTN_RIGHT: u32 = 0x111;
pub const BTN_MIDDLE: u32 = 0x112;
pub const BTN_SIDE: u32 = 0x113;
pub const BTN_EXTRA: u32 = 0x114;

// ============================================================================
// Keysyms
// ============================================================================

pub const KEY_SYM_SPACE: u32 = 0x0020;
pub const KEY_SYM_BACKSPACE: u32 = 0xff08;
pub const KEY_SYM_RETURN: u32 = 0xff0d;
pub const KEY_SYM_ESCAPE: u32 = 0xff1b;
pub const KEY_SYM_KP_SPACE: u32 = 0xff80;
pub const KEY_SYM_KP_ENTER: u32 = 0xff8d;
pub const KEY_SYM_KP_9: u32 = 0xffb9;
pub const KEY_SYM_F1: u32 = 0xffbe;
pub const KEY_SYM_F12: u32 = 0xffc9;
pub const KEY_SYM_META_L: u32 = 0xffe7;
pub const KEY_SYM_META_R: u32 = 0xffe8;
pub const KEY_SYM_SUPER_L: u32 = 0xffeb;
pub const KEY_SYM_SUPER_R: u32 = 0xffec;
pub const KEY_SYM_TERMINATE_SERVER: u32 = 0xfed5;
pub const KEY_SYM_SWITCH_VT_1: u32 = 0x1008_fe01;
pub const KEY_SYM_SWITCH_VT_12: u32 = 0x1008_fe0c;
pub const KEY_SYM_POWER_DOWN: u32 = 0x1008_ff21;
pub const KEY_SYM_POWER_OFF: u32 = 0x1008_ff2a;
pub const KEY_SYM_TOUCHPAD_TOGGLE: u32 = 0x1008_ffa9;
pub const KEY_SYM_TOUCHPAD_ON: u32 = 0x1008_ffb0;
pub const KEY_SYM_TOUCHPAD_OFF: u32 = 0x1008_ffb1;

// ============================================================================
// Helper Functions
// ============================================================================

/// Check if keycode is a Meta/Super key
#[inline]
pub const fn is_meta_key(keycode: u32) -> bool {
    keycode == KEY_LEFTMETA || keycode == KEY_RIGHTMETA
}

/// Convert function key code to function key number (1-12)
#[inline]
pub const fn function_key_number(keycode: u32) -> Option<u32> {
    match keycode {
        KEY_F1..=KEY_F10 => Some(keycode - KEY_F1 + 1),
        KEY_F11 => Some(11),
        KEY_F12 => Some(12),
        _ => None,
    }
}

/// VT number (1-12) of an XF86Switch_VT_n keysym
#[inline]
pub const fn vt_from_keysym(keysym: u32) -> Option<u32> {
    if keysym >= KEY_SYM_SWITCH_VT_1 && keysym <= KEY_SYM_SWITCH_VT_12 {
        Some(keysym - KEY_SYM_SWITCH_VT_1 + 1)
    } else {
        None
    }
}

#[inline]
pub const fn is_keypad_keysym(keysym: u32) -> bool {
    keysym >= KEY_SYM_KP_SPACE && keysym <= KEY_SYM_KP_9
}

/// Latin letter keysym (a-z, A-Z)
#[inline]
pub const fn is_letter_keysym(keysym: u32) -> bool {
    matches!(keysym, 0x41..=0x5a | 0x61..=0x7a)
}

/// Fold lowercase latin letters to uppercase so shortcuts ignore case
#[inline]
pub const fn normalize_keysym(keysym: u32) -> u32 {
    if keysym >= 0x61 && keysym <= 0x7a {
        keysym - 0x20
    } else {
        keysym
    }
}

/// Keysym of a key name as written in config key strings
///
/// Letters and digits map to their ASCII keysym, the rest to named keysyms.
pub fn keysym_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return Some(normalize_keysym(c as u32));
        }
    }
    let sym = match lower.as_str() {
        "space" => KEY_SYM_SPACE,
        "backspace" => KEY_SYM_BACKSPACE,
        "enter" | "return" => KEY_SYM_RETURN,
        "escape" | "esc" => KEY_SYM_ESCAPE,
        "tab" => 0xff09,
        "home" => 0xff50,
        "left" => 0xff51,
        "up" => 0xff52,
        "right" => 0xff53,
        "down" => 0xff54,
        "pageup" => 0xff55,
        "pagedown" => 0xff56,
        "end" => 0xff57,
        "print" | "printscreen" => 0xff61,
        "insert" | "ins" => 0xff63,
        "delete" | "del" => 0xffff,
        "plus" => 0x2b,
        "minus" => 0x2d,
        "poweroff" => KEY_SYM_POWER_OFF,
        "touchpadtoggle" => KEY_SYM_TOUCHPAD_TOGGLE,
        "touchpadon" => KEY_SYM_TOUCHPAD_ON,
        "touchpadoff" => KEY_SYM_TOUCHPAD_OFF,
        other => {
            let n: u32 = other.strip_prefix('f')?.parse().ok()?;
            if (1..=12).contains(&n) {
                KEY_SYM_F1 + n - 1
            } else {
                return None;
            }
        }
    };
    Some(sym)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_key_number() {
        assert_eq!(function_key_number(KEY_F1), Some(1));
        assert_eq!(function_key_number(KEY_F10), Some(10));
        assert_eq!(function_key_number(KEY_F12), Some(12));
        assert_eq!(function_key_number(KEY_ESC), None);
    }

    #[test]
    fn test_vt_keysyms() {
        assert_eq!(vt_from_keysym(KEY_SYM_SWITCH_VT_1), Some(1));
        assert_eq!(vt_from_keysym(KEY_SYM_SWITCH_VT_12), Some(12));
        assert_eq!(vt_from_keysym(KEY_SYM_SWITCH_VT_12 + 1), None);
    }

    #[test]
    fn test_keysym_from_name() {
        assert_eq!(keysym_from_name("k"), Some('K' as u32));
        assert_eq!(keysym_from_name("K"), Some('K' as u32));
        assert_eq!(keysym_from_name("1"), Some('1' as u32));
        assert_eq!(keysym_from_name("f3"), Some(KEY_SYM_F1 + 2));
        assert_eq!(keysym_from_name("Escape"), Some(KEY_SYM_ESCAPE));
        assert_eq!(keysym_from_name("f13"), None);
        assert_eq!(keysym_from_name("nonsense"), None);
    }
}
