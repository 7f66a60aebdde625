//! Layout switching
//!
//! Drives layout changes on the primary keyboard, feeds them to the active
//! switch policy and announces them on the bus.

use log::{debug, info, warn};

use super::policy::{self, LayoutPolicy, PolicyKind, WindowInfo};
use super::Xkb;
use crate::bus::{LayoutInfo, NotificationBus};
use crate::config::ConfigStore;
use crate::error::InputResult;
use crate::shell::WindowId;

pub struct LayoutManager {
    policy: Box<dyn LayoutPolicy>,
    /// Layout last announced for the primary keyboard
    announced: u32,
}

impl LayoutManager {
    pub fn new() -> Self {
        Self {
            policy: policy::create(PolicyKind::Global),
            announced: 0,
        }
    }

    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    /// Apply new layouts and policy after `Xkb::reconfigure`
    ///
    /// The policy object is only replaced when its kind changed; the live
    /// layout index is never touched here.
    pub fn reconfigure(&mut self, kind: PolicyKind, xkb: &Xkb, bus: &mut dyn NotificationBus) {
        if self.policy.kind() != kind {
            info!("Layout policy: {} -> {}", self.policy.kind(), kind);
            self.policy = policy::create(kind);
        } else {
            self.policy.clear_cache();
        }

        let keyboard = xkb.primary();
        let count = keyboard.layouts_count();
        bus.set_layout_service(count > 1);

        let layouts = (0..count)
            .map(|i| LayoutInfo {
                short_name: keyboard
                    .layout_short_name_from_index(i)
                    .unwrap_or_default()
                    .to_string(),
                long_name: keyboard.layout_name_from_index(i).unwrap_or_default(),
            })
            .collect();
        bus.layout_list_changed(layouts);
        self.announced = keyboard.layout();
    }

    pub fn switch_to_layout(
        &mut self,
        xkb: &mut Xkb,
        bus: &mut dyn NotificationBus,
        index: u32,
    ) -> InputResult<()> {
        xkb.switch_layout(|k| k.switch_to_layout(index))?;
        self.check_layout_change(xkb, bus);
        Ok(())
    }

    pub fn switch_to_layout_by_name(
        &mut self,
        xkb: &mut Xkb,
        bus: &mut dyn NotificationBus,
        name: &str,
    ) -> InputResult<()> {
        xkb.switch_layout(|k| k.switch_to_layout_by_name(name))?;
        self.check_layout_change(xkb, bus);
        Ok(())
    }

    pub fn switch_to_next_layout(
        &mut self,
        xkb: &mut Xkb,
        bus: &mut dyn NotificationBus,
    ) -> InputResult<()> {
        xkb.switch_layout(|k| k.switch_to_next_layout())?;
        self.check_layout_change(xkb, bus);
        Ok(())
    }

    pub fn switch_to_previous_layout(
        &mut self,
        xkb: &mut Xkb,
        bus: &mut dyn NotificationBus,
    ) -> InputResult<()> {
        xkb.switch_layout(|k| k.switch_to_previous_layout())?;
        self.check_layout_change(xkb, bus);
        Ok(())
    }

    /// Announce the primary keyboard's layout if it differs from the last
    /// announced one
    ///
    /// Also called after key events, since keymap options can switch groups
    /// on their own.
    pub fn check_layout_change(&mut self, xkb: &Xkb, bus: &mut dyn NotificationBus) -> bool {
        let keyboard = xkb.primary();
        let current = keyboard.layout();
        if current == self.announced {
            return false;
        }
        debug!("Layout changed: {} -> {}", self.announced, current);
        self.announced = current;
        self.policy.layout_changed(current);
        bus.show_layout_osd(&keyboard.layout_name());
        bus.layout_changed(current);
        true
    }

    pub fn desktop_changed(&mut self, xkb: &mut Xkb, bus: &mut dyn NotificationBus, desktop: u32) {
        if let Some(index) = self.policy.desktop_changed(desktop) {
            self.restore(xkb, bus, index);
        }
    }

    pub fn desktop_removed(&mut self, desktop: u32) {
        self.policy.desktop_removed(desktop);
    }

    pub fn window_activated(
        &mut self,
        xkb: &mut Xkb,
        bus: &mut dyn NotificationBus,
        window: &WindowInfo,
    ) {
        if let Some(index) = self.policy.window_activated(window) {
            self.restore(xkb, bus, index);
        }
    }

    pub fn window_closed(&mut self, window: WindowId) {
        self.policy.window_closed(window);
    }

    /// Persist policy state; the caller syncs the store
    pub fn session_save(&self, xkb: &Xkb, store: &mut ConfigStore) {
        self.policy.save(store, xkb.primary().layout());
    }

    pub fn session_load(&mut self, xkb: &mut Xkb, bus: &mut dyn NotificationBus, store: &ConfigStore) {
        let count = xkb.primary().layouts_count();
        if let Some(index) = self.policy.load(store, count) {
            self.restore(xkb, bus, index);
        }
    }

    fn restore(&mut self, xkb: &mut Xkb, bus: &mut dyn NotificationBus, index: u32) {
        match xkb.switch_layout(|k| k.switch_to_layout(index)) {
            Ok(_) => {
                self.check_layout_change(xkb, bus);
            }
            Err(e) => warn!("Remembered layout not restored: {}", e),
        }
    }
}

impl Default for LayoutManager {
    fn default() -> Self {
        Self::new()
    }
}
