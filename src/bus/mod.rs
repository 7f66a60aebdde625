//! Notification bus boundary
//!
//! The layout service, OSD notifications and the tablet-mode properties are
//! published through a `NotificationBus`. The D-Bus implementation lives on
//! its own thread; `LocalBus` keeps everything in-process.

pub mod dbus;

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

pub use dbus::DbusBus;

/// Layout entry as listed on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutInfo {
    /// Configured name ("de(neo)")
    pub short_name: String,
    /// Name reported by the keymap ("German (Neo 2)")
    pub long_name: String,
}

/// Request coming in from bus clients
#[derive(Debug)]
pub enum BusRequest {
    /// Re-read the configuration and reconfigure layouts
    ReloadConfig,
    /// Switch the primary keyboard to `index`; the reply carries success
    SetLayout {
        index: u32,
        reply: Option<tokio::sync::oneshot::Sender<bool>>,
    },
}

pub trait NotificationBus {
    /// Export or withdraw the keyboard layout service
    fn set_layout_service(&mut self, enabled: bool);

    fn layout_changed(&mut self, index: u32);

    fn layout_list_changed(&mut self, layouts: Vec<LayoutInfo>);

    /// On-screen notification of the new layout
    fn show_layout_osd(&mut self, long_name: &str);

    fn tablet_mode_changed(&mut self, available: bool, active: bool);

    /// Drain requests received since the last call
    fn poll_requests(&mut self) -> Vec<BusRequest>;
}

/// Everything published on a `LocalBus`
#[derive(Debug, Default)]
pub struct BusLog {
    pub layout_service: bool,
    pub layout_changes: Vec<u32>,
    pub layout_lists: Vec<Vec<LayoutInfo>>,
    pub osd: Vec<String>,
    /// (available, active)
    pub tablet_mode: Vec<(bool, bool)>,
}

/// In-process bus
///
/// Clones share the same log and request queue, so a caller can keep a
/// handle after handing the bus to the platform.
#[derive(Clone, Default)]
pub struct LocalBus {
    log: Rc<RefCell<BusLog>>,
    pending: Rc<RefCell<VecDeque<BusRequest>>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Ref<'_, BusLog> {
        self.log.borrow()
    }

    /// Queue a request as if a bus client had sent it
    pub fn push_request(&self, request: BusRequest) {
        self.pending.borrow_mut().push_back(request);
    }
}

impl NotificationBus for LocalBus {
    fn set_layout_service(&mut self, enabled: bool) {
        self.log.borrow_mut().layout_service = enabled;
    }

    fn layout_changed(&mut self, index: u32) {
        self.log.borrow_mut().layout_changes.push(index);
    }

    fn layout_list_changed(&mut self, layouts: Vec<LayoutInfo>) {
        self.log.borrow_mut().layout_lists.push(layouts);
    }

    fn show_layout_osd(&mut self, long_name: &str) {
        self.log.borrow_mut().osd.push(long_name.to_string());
    }

    fn tablet_mode_changed(&mut self, available: bool, active: bool) {
        self.log.borrow_mut().tablet_mode.push((available, active));
    }

    fn poll_requests(&mut self) -> Vec<BusRequest> {
        self.pending.borrow_mut().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_bus_shares_state_between_clones() {
        let handle = LocalBus::new();
        let mut bus = handle.clone();
        bus.layout_changed(2);
        bus.set_layout_service(true);
        handle.push_request(BusRequest::ReloadConfig);

        assert_eq!(handle.log().layout_changes, vec![2]);
        assert!(handle.log().layout_service);
        let requests = bus.poll_requests();
        assert!(matches!(requests.as_slice(), [BusRequest::ReloadConfig]));
        assert!(bus.poll_requests().is_empty());
    }
}
