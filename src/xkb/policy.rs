//! Layout switching policies
//!
//! A policy remembers which layout belongs to a context (desktop, window,
//! application) and answers with the layout to restore when the context
//! changes. The layout manager applies the answer; a resulting change is
//! fed back through `layout_changed`.

use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigStore;
use crate::constants::{LAYOUT_ENTRY_PREFIX, LAYOUT_GROUP};
use crate::error::InputError;
use crate::shell::{ClientId, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolicyKind {
    #[default]
    Global,
    Desktop,
    Window,
    /// Per application, config name "WinClass"
    Application,
}

impl PolicyKind {
    /// Name used in config and in persisted entry keys
    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::Global => "Global",
            PolicyKind::Desktop => "Desktop",
            PolicyKind::Window => "Window",
            PolicyKind::Application => "WinClass",
        }
    }

    /// Parse a config value, falling back to Global for unknown names
    pub fn from_config(value: &str) -> Self {
        value.parse().unwrap_or_else(|e| {
            warn!("{}, using Global", e);
            PolicyKind::Global
        })
    }
}

impl FromStr for PolicyKind {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "global" => Ok(PolicyKind::Global),
            "desktop" => Ok(PolicyKind::Desktop),
            "window" => Ok(PolicyKind::Window),
            "winclass" => Ok(PolicyKind::Application),
            _ => Err(InputError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    #[default]
    Normal,
    Desktop,
    Dock,
}

/// What the policies need to know about a window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub client: ClientId,
    /// Desktop file name of the application, may be empty
    pub app_id: String,
    pub window_type: WindowType,
}

impl WindowInfo {
    fn is_special(&self) -> bool {
        matches!(self.window_type, WindowType::Desktop | WindowType::Dock)
    }
}

pub trait LayoutPolicy {
    fn kind(&self) -> PolicyKind;

    /// Forget every remembered context (layouts were reconfigured)
    fn clear_cache(&mut self) {}

    /// The effective layout changed to `index`
    fn layout_changed(&mut self, _index: u32) {}

    /// Current desktop changed; returns the layout to switch to
    fn desktop_changed(&mut self, _desktop: u32) -> Option<u32> {
        None
    }

    fn desktop_removed(&mut self, _desktop: u32) {}

    /// A window got activated; returns the layout to switch to
    fn window_activated(&mut self, _window: &WindowInfo) -> Option<u32> {
        None
    }

    fn window_closed(&mut self, _window: WindowId) {}

    /// Persist state on session save
    fn save(&self, _store: &mut ConfigStore, _current: u32) {}

    /// Restore state on session load; returns the layout to switch to
    fn load(&mut self, _store: &ConfigStore, _layouts_count: u32) -> Option<u32> {
        None
    }
}

pub fn create(kind: PolicyKind) -> Box<dyn LayoutPolicy> {
    debug!("Creating {} layout policy", kind);
    match kind {
        PolicyKind::Global => Box::new(GlobalPolicy),
        PolicyKind::Desktop => Box::new(DesktopPolicy::default()),
        PolicyKind::Window => Box::new(WindowPolicy::default()),
        PolicyKind::Application => Box::new(ApplicationPolicy::default()),
    }
}

/// Key prefix of persisted entries for a per-context policy
fn entry_key_prefix(kind: PolicyKind) -> String {
    format!("{}{}_", LAYOUT_ENTRY_PREFIX, kind.name())
}

/// Drop every persisted layout entry, whatever policy wrote it
fn clear_layouts(store: &mut ConfigStore) {
    for key in store.key_list(LAYOUT_GROUP) {
        if key.contains(LAYOUT_ENTRY_PREFIX) {
            store.delete_entry(LAYOUT_GROUP, &key);
        }
    }
}

pub struct GlobalPolicy;

impl GlobalPolicy {
    fn entry_key() -> String {
        format!("{}{}", LAYOUT_ENTRY_PREFIX, PolicyKind::Global.name())
    }
}

impl LayoutPolicy for GlobalPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Global
    }

    fn save(&self, store: &mut ConfigStore, current: u32) {
        clear_layouts(store);
        if current != 0 {
            store.write_entry(LAYOUT_GROUP, &Self::entry_key(), i64::from(current));
        }
    }

    fn load(&mut self, store: &ConfigStore, layouts_count: u32) -> Option<u32> {
        if layouts_count <= 1 {
            return None;
        }
        Some(
            store
                .read_entry(LAYOUT_GROUP, &Self::entry_key())
                .unwrap_or(0),
        )
    }
}

#[derive(Default)]
pub struct DesktopPolicy {
    layouts: HashMap<u32, u32>,
    current: Option<u32>,
}

impl LayoutPolicy for DesktopPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Desktop
    }

    fn clear_cache(&mut self) {
        self.layouts.clear();
    }

    fn layout_changed(&mut self, index: u32) {
        if let Some(desktop) = self.current {
            self.layouts.insert(desktop, index);
        }
    }

    fn desktop_changed(&mut self, desktop: u32) -> Option<u32> {
        self.current = Some(desktop);
        Some(self.layouts.get(&desktop).copied().unwrap_or(0))
    }

    fn desktop_removed(&mut self, desktop: u32) {
        self.layouts.remove(&desktop);
        if self.current == Some(desktop) {
            self.current = None;
        }
    }

    fn save(&self, store: &mut ConfigStore, _current: u32) {
        clear_layouts(store);
        let prefix = entry_key_prefix(PolicyKind::Desktop);
        for (desktop, layout) in &self.layouts {
            if *layout != 0 {
                store.write_entry(
                    LAYOUT_GROUP,
                    &format!("{}{}", prefix, desktop),
                    i64::from(*layout),
                );
            }
        }
    }

    fn load(&mut self, store: &ConfigStore, layouts_count: u32) -> Option<u32> {
        if layouts_count <= 1 {
            return None;
        }
        let prefix = entry_key_prefix(PolicyKind::Desktop);
        for key in store.key_list(LAYOUT_GROUP) {
            let Some(desktop) = key.strip_prefix(&prefix).and_then(|d| d.parse().ok()) else {
                continue;
            };
            let layout: u32 = store.read_entry(LAYOUT_GROUP, &key).unwrap_or(0);
            if layout != 0 {
                self.layouts.insert(desktop, layout);
            }
        }
        let desktop = self.current?;
        self.desktop_changed(desktop)
    }
}

/// Per-window memory, never persisted
#[derive(Default)]
pub struct WindowPolicy {
    layouts: HashMap<WindowId, u32>,
    active: Option<WindowInfo>,
}

impl LayoutPolicy for WindowPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Window
    }

    fn clear_cache(&mut self) {
        self.layouts.clear();
    }

    fn layout_changed(&mut self, index: u32) {
        let Some(window) = self.active.as_ref() else {
            return;
        };
        if window.is_special() {
            return;
        }
        self.layouts.insert(window.id, index);
    }

    fn window_activated(&mut self, window: &WindowInfo) -> Option<u32> {
        self.active = Some(window.clone());
        if window.is_special() {
            return None;
        }
        Some(self.layouts.get(&window.id).copied().unwrap_or(0))
    }

    fn window_closed(&mut self, window: WindowId) {
        self.layouts.remove(&window);
        if self.active.as_ref().map(|w| w.id) == Some(window) {
            self.active = None;
        }
    }
}

struct AppEntry {
    client: ClientId,
    app_id: String,
    layout: u32,
}

/// Per-application memory: windows of one client share a layout
#[derive(Default)]
pub struct ApplicationPolicy {
    layouts: HashMap<WindowId, AppEntry>,
    /// Entries loaded from the session, keyed by app id
    restored: HashMap<String, u32>,
    active: Option<WindowInfo>,
}

impl ApplicationPolicy {
    fn record(&mut self, window: &WindowInfo, index: u32) {
        match self.layouts.get_mut(&window.id) {
            Some(entry) if entry.layout == index => return,
            Some(entry) => entry.layout = index,
            None => {
                self.layouts.insert(
                    window.id,
                    AppEntry {
                        client: window.client,
                        app_id: window.app_id.clone(),
                        layout: index,
                    },
                );
            }
        }
        for entry in self.layouts.values_mut() {
            if entry.client == window.client {
                entry.layout = index;
            }
        }
    }
}

impl LayoutPolicy for ApplicationPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Application
    }

    fn clear_cache(&mut self) {
        self.layouts.clear();
    }

    fn layout_changed(&mut self, index: u32) {
        let Some(window) = self.active.clone() else {
            return;
        };
        if window.is_special() {
            return;
        }
        self.record(&window, index);
    }

    fn window_activated(&mut self, window: &WindowInfo) -> Option<u32> {
        self.active = Some(window.clone());
        if window.is_special() {
            return None;
        }
        if let Some(entry) = self.layouts.get(&window.id) {
            return Some(entry.layout);
        }
        let inherited = self
            .layouts
            .values()
            .find(|entry| entry.client == window.client)
            .map(|entry| entry.layout);
        if let Some(layout) = inherited {
            self.record(window, layout);
            return Some(layout);
        }

        let layout = self.restored.remove(&window.app_id).unwrap_or(0);
        if layout != 0 {
            self.record(window, layout);
        }
        Some(layout)
    }

    fn window_closed(&mut self, window: WindowId) {
        self.layouts.remove(&window);
        if self.active.as_ref().map(|w| w.id) == Some(window) {
            self.active = None;
        }
    }

    fn save(&self, store: &mut ConfigStore, _current: u32) {
        clear_layouts(store);
        let prefix = entry_key_prefix(PolicyKind::Application);
        for entry in self.layouts.values() {
            if entry.layout != 0 && !entry.app_id.is_empty() {
                store.write_entry(
                    LAYOUT_GROUP,
                    &format!("{}{}", prefix, entry.app_id),
                    i64::from(entry.layout),
                );
            }
        }
    }

    fn load(&mut self, store: &ConfigStore, layouts_count: u32) -> Option<u32> {
        if layouts_count <= 1 {
            return None;
        }
        let prefix = entry_key_prefix(PolicyKind::Application);
        for key in store.key_list(LAYOUT_GROUP) {
            if let Some(app_id) = key.strip_prefix(&prefix) {
                let layout = store.read_entry(LAYOUT_GROUP, &key).unwrap_or(0);
                self.restored.insert(app_id.to_string(), layout);
            }
        }
        None
    }
}
