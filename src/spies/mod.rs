//! Built-in event spies

pub mod keyboard;
pub mod tablet_mode;
pub mod touch_hide_cursor;

pub use keyboard::{
    KeyListener, KeyListeners, KeyStateSpy, KeyboardRepeatSpy, ModifierOnlySpy,
    ModifiersChangedSpy,
};
pub use tablet_mode::TabletModeSpy;
pub use touch_hide_cursor::TouchHideCursorSpy;

use crate::redirect::FilterChain;

pub fn install_defaults(chain: &mut FilterChain, listeners: &KeyListeners) {
    chain.install_spy(Box::new(KeyStateSpy::new(listeners.clone())));
    chain.install_spy(Box::new(ModifiersChangedSpy::new()));
    chain.install_spy(Box::new(KeyboardRepeatSpy));
    chain.install_spy(Box::new(ModifierOnlySpy::new()));
    chain.install_spy(Box::new(TouchHideCursorSpy::new()));
    chain.install_spy(Box::new(TabletModeSpy));
}
