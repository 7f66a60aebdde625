//! Built-in event filters
//!
//! `install_defaults` puts them into their slots of the canonical order.
//! Some are only installed when the compositor has what they drive.

pub mod drag_and_drop;
pub mod fake_tablet;
pub mod forward;
pub mod global_shortcut;
pub mod grabs;
pub mod surfaces;
pub mod system;
pub mod window_action;

pub use drag_and_drop::DragAndDropFilter;
pub use fake_tablet::FakeTabletFilter;
pub use forward::ForwardFilter;
pub use global_shortcut::GlobalShortcutFilter;
pub use grabs::{
    EffectsFilter, LockScreenFilter, MoveResizeFilter, PopupFilter, ScreenEdgeFilter,
    TabboxFilter, WindowSelectorFilter,
};
pub use surfaces::{DecorationFilter, InternalWindowFilter};
pub use system::{TerminateServerFilter, VirtualTerminalFilter};
pub use window_action::WindowActionFilter;

use crate::event::{TouchDownEvent, TouchMotionEvent, TouchUpEvent};
use crate::redirect::{Context, FilterChain, FilterSlot};
use crate::xkb::Modifiers;

#[derive(Debug, Clone, Copy)]
pub struct FilterOptions {
    /// A VT switcher is available
    pub has_session: bool,
    pub global_shortcuts: bool,
    /// Modifier for window commands
    pub command_modifier: Modifiers,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            has_session: false,
            global_shortcuts: true,
            command_modifier: Modifiers::LOGO,
        }
    }
}

pub fn install_defaults(chain: &mut FilterChain, options: &FilterOptions) {
    if options.has_session {
        chain.install_builtin(FilterSlot::VirtualTerminal, Box::new(VirtualTerminalFilter));
    }
    if options.global_shortcuts {
        chain.install_builtin(FilterSlot::TerminateServer, Box::new(TerminateServerFilter));
    }
    chain.install_builtin(FilterSlot::DragAndDrop, Box::new(DragAndDropFilter));
    chain.install_builtin(FilterSlot::LockScreen, Box::new(LockScreenFilter));
    chain.install_builtin(FilterSlot::Popup, Box::new(PopupFilter));
    chain.install_builtin(FilterSlot::WindowSelector, Box::new(WindowSelectorFilter));
    if options.global_shortcuts {
        chain.install_builtin(FilterSlot::ScreenEdge, Box::new(ScreenEdgeFilter));
    }
    chain.install_builtin(FilterSlot::Effects, Box::new(EffectsFilter));
    chain.install_builtin(FilterSlot::MoveResize, Box::new(MoveResizeFilter));
    chain.install_builtin(FilterSlot::Tabbox, Box::new(TabboxFilter));
    if options.global_shortcuts {
        chain.install_builtin(FilterSlot::GlobalShortcut, Box::new(GlobalShortcutFilter));
    }
    chain.install_builtin(FilterSlot::Decoration, Box::new(DecorationFilter::new()));
    chain.install_builtin(FilterSlot::InternalWindow, Box::new(InternalWindowFilter::new()));
    chain.install_builtin(
        FilterSlot::WindowAction,
        Box::new(WindowActionFilter::new(options.command_modifier)),
    );
    chain.install_builtin(FilterSlot::Forward, Box::new(ForwardFilter));
    chain.install_builtin(FilterSlot::FakeTablet, Box::new(FakeTabletFilter));
}

/// Start a client touch point and remember its protocol id
pub(crate) fn forward_touch_down(ctx: &mut Context<'_>, event: &TouchDownEvent) {
    let protocol = ctx.seat.touch_down(event.pos, event.base.time_msec);
    ctx.state.touch_ids.insert(event.id, protocol);
}

/// Returns false for points that never reached a client
pub(crate) fn forward_touch_motion(ctx: &mut Context<'_>, event: &TouchMotionEvent) -> bool {
    match ctx.state.touch_ids.mapped(event.id) {
        Some(protocol) => {
            ctx.seat
                .touch_motion(protocol, event.pos, event.base.time_msec);
            true
        }
        None => false,
    }
}

pub(crate) fn forward_touch_up(ctx: &mut Context<'_>, event: &TouchUpEvent) {
    if let Some(protocol) = ctx.state.touch_ids.remove(event.id) {
        ctx.seat.touch_up(protocol, event.base.time_msec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let mut chain = FilterChain::new();
        install_defaults(
            &mut chain,
            &FilterOptions {
                has_session: true,
                ..Default::default()
            },
        );
        assert_eq!(
            chain.names(),
            vec![
                "virtual-terminal",
                "terminate-server",
                "drag-and-drop",
                "lock-screen",
                "popup",
                "window-selector",
                "screen-edge",
                "effects",
                "move-resize",
                "tabbox",
                "global-shortcut",
                "decoration",
                "internal-window",
                "window-action",
                "forward",
                "fake-tablet",
            ]
        );
    }

    #[test]
    fn test_optional_filters() {
        let mut chain = FilterChain::new();
        install_defaults(
            &mut chain,
            &FilterOptions {
                has_session: false,
                global_shortcuts: false,
                command_modifier: Modifiers::ALT,
            },
        );
        let names = chain.names();
        assert_eq!(names.len(), 12);
        for missing in ["virtual-terminal", "terminate-server", "screen-edge", "global-shortcut"] {
            assert!(!names.contains(&missing));
        }
    }
}
