//! Input platform
//!
//! Owns everything one seat's input needs: the device registry, the xkb
//! engine, the layout manager, the redirect with its filter chain and the
//! shortcut matcher. Backends feed devices and events in; the compositor
//! collaborators (seat, shell, bus, VT switcher) are handed in at
//! construction.

use std::collections::VecDeque;

use anyhow::Result;
use log::{debug, info, warn};

use crate::bus::{BusRequest, NotificationBus};
use crate::config::{Config, ConfigStore, ParsedKeybind};
use crate::constants::{
    ACTION_LAYOUT_PREFIX, ACTION_NEXT_LAYOUT, ACTION_TOUCHPAD_OFF, ACTION_TOUCHPAD_ON,
    ACTION_TOUCHPAD_TOGGLE, DEFAULT_NEXT_LAYOUT_SHORTCUT,
};
use crate::device::{Device, DeviceId, DeviceKind, DeviceRegistry};
use crate::error::{InputError, InputResult};
use crate::event::{Event, KeyEvent};
use crate::filters::{self, FilterOptions};
use crate::redirect::{
    EventFilter, EventSpy, InstallPosition, Redirect, RedirectState, Request, TabletMode,
};
use crate::seat::{RepeatInfo, Seat, SeatCapabilities};
use crate::session::VtSwitcher;
use crate::shell::{Shell, WindowId};
use crate::shortcuts::{ActionId, GlobalShortcuts, Trigger};
use crate::spies::{self, KeyListeners};
use crate::xkb::keycodes::{KEY_SYM_TOUCHPAD_OFF, KEY_SYM_TOUCHPAD_ON, KEY_SYM_TOUCHPAD_TOGGLE};
use crate::xkb::{Keyboard, KeymapFactory, LayoutManager, Modifiers, PolicyKind, WindowInfo, Xkb};

/// Receives actions the platform does not run itself
pub type ActionHandler = Box<dyn FnMut(&str)>;

/// Compositor collaborators of a platform
pub struct PlatformParts {
    pub keymaps: Box<dyn KeymapFactory>,
    pub seat: Box<dyn Seat>,
    pub shell: Box<dyn Shell>,
    pub bus: Box<dyn NotificationBus>,
    /// None when running without a session (nested, tests)
    pub vt: Option<Box<dyn VtSwitcher>>,
}

pub struct Platform {
    devices: DeviceRegistry,
    xkb: Xkb,
    layouts: LayoutManager,
    redirect: Redirect,
    shortcuts: GlobalShortcuts,
    seat: Box<dyn Seat>,
    shell: Box<dyn Shell>,
    bus: Box<dyn NotificationBus>,
    vt: Option<Box<dyn VtSwitcher>>,
    store: ConfigStore,
    action_handler: Option<ActionHandler>,
    key_listeners: KeyListeners,
    tablet_mode: TabletMode,
    touchpads_enabled: bool,
    terminate: bool,
    /// Layout actions bound from the config, re-registered on reconfigure
    layout_actions: Vec<ActionId>,
}

impl Platform {
    /// Build the platform, install the default filters and spies and apply
    /// the configuration in `store`
    pub fn new(parts: PlatformParts, store: ConfigStore) -> Self {
        let mut redirect = Redirect::new();
        let key_listeners = KeyListeners::new();
        let options = FilterOptions {
            has_session: parts.vt.is_some(),
            ..Default::default()
        };
        filters::install_defaults(redirect.chain_mut(), &options);
        spies::install_defaults(redirect.chain_mut(), &key_listeners);

        let mut platform = Self {
            devices: DeviceRegistry::new(),
            xkb: Xkb::new(parts.keymaps),
            layouts: LayoutManager::new(),
            redirect,
            shortcuts: GlobalShortcuts::new(),
            seat: parts.seat,
            shell: parts.shell,
            bus: parts.bus,
            vt: parts.vt,
            store,
            action_handler: None,
            key_listeners,
            tablet_mode: TabletMode::default(),
            touchpads_enabled: true,
            terminate: false,
            layout_actions: Vec::new(),
        };
        platform.register_touchpad_shortcuts();
        platform.reconfigure();
        platform
    }

    // === Devices ===

    /// Register a device and announce it to the redirect and the seat
    pub fn add_device(&mut self, mut device: Device) -> DeviceId {
        let kind = device.kind();
        let caps = device.capabilities();
        if let Some(control) = device.control_mut() {
            control.apply_leds(self.xkb.primary().leds());
        }
        let id = self.devices.insert(device);

        if kind == DeviceKind::Keyboard {
            self.xkb.add_keyboard(id);
        }
        if let Some(caps) = self.redirect.state.device_added(id, kind, caps) {
            debug!("Seat capabilities: {:?}", caps);
            self.seat.set_capabilities(caps);
        }
        if kind == DeviceKind::Keyboard {
            self.seat.set_repeat_info(self.redirect.state.repeat.info());
        }
        self.publish_tablet_mode();
        id
    }

    /// Unregister a device
    ///
    /// The redirect forgets the handle before the registry frees its slot.
    pub fn remove_device(&mut self, id: DeviceId) -> Option<Device> {
        if !self.devices.contains(id) {
            debug!("Device {} already removed", id);
            return None;
        }
        if let Some(caps) = self.redirect.state.device_removed(id) {
            debug!("Seat capabilities: {:?}", caps);
            self.seat.set_capabilities(caps);
        }
        self.xkb.remove_keyboard(id);
        let device = self.devices.remove(id);
        self.publish_tablet_mode();
        device
    }

    pub fn devices(&self) -> impl Iterator<Item = (DeviceId, &Device)> {
        self.devices.iter()
    }

    pub fn devices_of(&self, kind: DeviceKind) -> impl Iterator<Item = (DeviceId, &Device)> {
        self.devices.of_kind(kind)
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn capabilities(&self) -> SeatCapabilities {
        self.redirect.state.capabilities()
    }

    // === Events ===

    /// Run one event through the redirect, then everything it caused
    pub fn process_event(&mut self, event: Event) {
        self.drain(VecDeque::from([event]));
    }

    /// Drive the key repeat and long-press timers
    pub fn tick(&mut self, now_msec: u32) {
        let requests = self.redirect.tick(
            now_msec,
            &self.xkb,
            self.seat.as_mut(),
            self.shell.as_mut(),
            &mut self.shortcuts,
        );
        let mut queue = VecDeque::new();
        self.handle_requests(requests, &mut queue);
        if let Some(action) = self.shortcuts.tick(now_msec) {
            self.run_action(&action);
        }
        self.drain(queue);
    }

    fn drain(&mut self, mut queue: VecDeque<Event>) {
        while let Some(event) = queue.pop_front() {
            let Some(event) = self.admit(event) else {
                continue;
            };
            let requests = self.redirect.dispatch(
                event,
                &mut self.xkb,
                self.seat.as_mut(),
                self.shell.as_mut(),
                &mut self.shortcuts,
            );
            // keymap options may switch groups on their own
            self.layouts.check_layout_change(&self.xkb, self.bus.as_mut());
            self.handle_requests(requests, &mut queue);
        }
    }

    /// Drop events of removed devices and keep each device's clock monotonic
    fn admit(&mut self, mut event: Event) -> Option<Event> {
        if let Some(id) = event.base().device {
            match self.devices.stamp(id, event.base().time_msec) {
                Ok(time) => event.base_mut().time_msec = time,
                Err(e) => {
                    warn!("Dropping {} event: {}", event.name(), e);
                    return None;
                }
            }
        }
        Some(event)
    }

    fn handle_requests(&mut self, requests: Vec<Request>, queue: &mut VecDeque<Event>) {
        for request in requests {
            match request {
                Request::SwitchVt(vt) => self.switch_vt(vt),
                Request::Terminate => {
                    info!("Server termination requested");
                    self.terminate = true;
                }
                Request::Action(action) => self.run_action(&action),
                Request::Inject(event) => queue.push_back(event),
                Request::LedsChanged(leds) => self.devices.update_keyboard_leds(leds),
                Request::SetTabletMode(_) => self.publish_tablet_mode(),
                chain @ (Request::InstallFilter(..)
                | Request::UninstallFilter(_)
                | Request::InstallSpy(_)) => {
                    self.redirect.apply_chain_requests(vec![chain]);
                }
            }
        }
    }

    fn switch_vt(&mut self, vt: u32) {
        match self.vt.as_mut() {
            Some(switcher) => {
                if let Err(e) = switcher.switch_vt(vt) {
                    warn!("VT switch to {} failed: {:#}", vt, e);
                }
            }
            None => debug!("No session, VT switch to {} ignored", vt),
        }
    }

    /// Whether a Terminate_Server key was pressed
    pub fn terminate_requested(&self) -> bool {
        self.terminate
    }

    // === Actions and shortcuts ===

    pub fn set_action_handler(&mut self, handler: impl FnMut(&str) + 'static) {
        self.action_handler = Some(Box::new(handler));
    }

    pub fn register_shortcut(
        &mut self,
        trigger: Trigger,
        action: impl Into<ActionId>,
    ) -> InputResult<Option<ActionId>> {
        self.shortcuts.register(trigger, action)
    }

    pub fn unregister_shortcut(&mut self, trigger: Trigger) -> Option<ActionId> {
        self.shortcuts.unregister(trigger)
    }

    pub fn unregister_action(&mut self, action: &str) -> usize {
        self.shortcuts.unregister_action(action)
    }

    fn run_action(&mut self, action: &str) {
        debug!("action: {}", action);
        match action {
            ACTION_NEXT_LAYOUT => {
                if let Err(e) = self.switch_to_next_layout() {
                    debug!("{}: {}", action, e);
                }
            }
            ACTION_TOUCHPAD_TOGGLE => {
                self.toggle_touchpads();
            }
            ACTION_TOUCHPAD_ON => {
                self.enable_touchpads();
            }
            ACTION_TOUCHPAD_OFF => {
                self.disable_touchpads();
            }
            _ => {
                if let Some(long_name) = action.strip_prefix(ACTION_LAYOUT_PREFIX) {
                    if let Err(e) = self.switch_to_layout_by_long_name(long_name) {
                        warn!("{}: {}", action, e);
                    }
                    return;
                }
                match self.action_handler.as_mut() {
                    Some(handler) => handler(action),
                    None => debug!("No handler for action {}", action),
                }
            }
        }
    }

    fn register_touchpad_shortcuts(&mut self) {
        for (keysym, action) in [
            (KEY_SYM_TOUCHPAD_TOGGLE, ACTION_TOUCHPAD_TOGGLE),
            (KEY_SYM_TOUCHPAD_ON, ACTION_TOUCHPAD_ON),
            (KEY_SYM_TOUCHPAD_OFF, ACTION_TOUCHPAD_OFF),
        ] {
            if let Err(e) = self
                .shortcuts
                .register(Trigger::key(Modifiers::empty(), keysym), action)
            {
                debug!("{}", e);
            }
        }
    }

    /// Bind the layout actions from `[Shortcuts]`
    fn register_layout_shortcuts(&mut self, config: &Config) {
        for action in self.layout_actions.drain(..) {
            self.shortcuts.unregister_action(&action);
        }

        let next = config
            .shortcuts
            .keys_for(ACTION_NEXT_LAYOUT)
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| vec![DEFAULT_NEXT_LAYOUT_SHORTCUT.to_string()]);
        let mut bindings = vec![(ActionId::from(ACTION_NEXT_LAYOUT), next)];

        let keyboard = self.xkb.primary();
        for index in 0..keyboard.layouts_count() {
            let Some(long_name) = keyboard.layout_name_from_index(index) else {
                continue;
            };
            let action = format!("{}{}", ACTION_LAYOUT_PREFIX, long_name);
            if let Some(keys) = config.shortcuts.keys_for(&action) {
                bindings.push((ActionId::from(action), keys.to_vec()));
            }
        }

        for (action, keys) in bindings {
            for key in &keys {
                match ParsedKeybind::parse(key) {
                    Some(keybind) => {
                        if let Err(e) = self.shortcuts.register(keybind.into(), action.clone()) {
                            debug!("{}", e);
                        }
                    }
                    None => warn!("Invalid shortcut '{}' for {}", key, action),
                }
            }
            self.layout_actions.push(action);
        }
    }

    // === Filters and spies ===

    pub fn install_filter(&mut self, filter: Box<dyn EventFilter>, position: InstallPosition) {
        self.redirect.chain_mut().install(filter, position);
    }

    pub fn uninstall_filter(&mut self, name: &str) -> bool {
        self.redirect.chain_mut().uninstall(name)
    }

    pub fn install_spy(&mut self, spy: Box<dyn EventSpy>) {
        self.redirect.chain_mut().install_spy(spy);
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.redirect.chain().names()
    }

    /// Listener for every key press and release
    pub fn add_key_listener(&mut self, listener: impl FnMut(&KeyEvent) + 'static) {
        self.key_listeners.add(listener);
    }

    // === Layouts ===

    pub fn keyboard(&self) -> &Keyboard {
        self.xkb.primary()
    }

    pub fn xkb(&self) -> &Xkb {
        &self.xkb
    }

    pub fn layout_policy(&self) -> PolicyKind {
        self.layouts.policy_kind()
    }

    pub fn current_layout_index(&self) -> u32 {
        self.xkb.primary().layout()
    }

    pub fn switch_to_layout(&mut self, index: u32) -> InputResult<()> {
        self.layouts
            .switch_to_layout(&mut self.xkb, self.bus.as_mut(), index)
    }

    pub fn switch_to_layout_by_name(&mut self, name: &str) -> InputResult<()> {
        self.layouts
            .switch_to_layout_by_name(&mut self.xkb, self.bus.as_mut(), name)
    }

    pub fn switch_to_next_layout(&mut self) -> InputResult<()> {
        self.layouts
            .switch_to_next_layout(&mut self.xkb, self.bus.as_mut())
    }

    pub fn switch_to_previous_layout(&mut self) -> InputResult<()> {
        self.layouts
            .switch_to_previous_layout(&mut self.xkb, self.bus.as_mut())
    }

    /// Switch by the name the keymap reports ("German (Neo 2)")
    fn switch_to_layout_by_long_name(&mut self, long_name: &str) -> InputResult<()> {
        let keyboard = self.xkb.primary();
        let index = (0..keyboard.layouts_count())
            .find(|i| keyboard.layout_name_from_index(*i).as_deref() == Some(long_name))
            .ok_or_else(|| InputError::UnknownLayout(long_name.to_string()))?;
        self.switch_to_layout(index)
    }

    pub fn desktop_changed(&mut self, desktop: u32) {
        self.layouts
            .desktop_changed(&mut self.xkb, self.bus.as_mut(), desktop);
    }

    pub fn desktop_removed(&mut self, desktop: u32) {
        self.layouts.desktop_removed(desktop);
    }

    pub fn window_activated(&mut self, window: &WindowInfo) {
        self.layouts
            .window_activated(&mut self.xkb, self.bus.as_mut(), window);
    }

    pub fn window_closed(&mut self, window: WindowId) {
        self.layouts.window_closed(window);
    }

    /// Persist the layout policy state and write the store back
    pub fn session_save(&mut self) -> Result<()> {
        self.layouts.session_save(&self.xkb, &mut self.store);
        self.store.sync()
    }

    pub fn session_load(&mut self) {
        self.layouts
            .session_load(&mut self.xkb, self.bus.as_mut(), &self.store);
    }

    // === Configuration ===

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Re-read the config file and apply it
    pub fn reload_config(&mut self) {
        if let Err(e) = self.store.reparse() {
            warn!("Config reload failed, keeping current settings: {:#}", e);
            return;
        }
        info!("Config reloaded");
        self.reconfigure();
    }

    /// Apply the store's keymap, policy, repeat and shortcut settings
    pub fn reconfigure(&mut self) {
        let config = Config::from_store(&self.store);
        if let Err(e) = self.xkb.reconfigure(config.keymap_settings()) {
            warn!("Keymap not changed: {}", e);
        }
        self.layouts
            .reconfigure(config.layout.policy(), &self.xkb, self.bus.as_mut());

        let info = RepeatInfo {
            rate: config.keyboard.effective_rate(),
            delay_ms: config.keyboard.repeat_delay,
        };
        self.redirect.state.repeat.set_info(info);
        self.seat.set_repeat_info(info);
        if let Some(keymap) = self.xkb.primary().keymap_text() {
            self.seat.set_keymap(&keymap);
        }
        self.devices.update_keyboard_leds(self.xkb.primary().leds());
        self.register_layout_shortcuts(&config);
    }

    /// Handle requests bus clients sent since the last call
    pub fn poll_bus(&mut self) {
        for request in self.bus.poll_requests() {
            match request {
                BusRequest::ReloadConfig => self.reload_config(),
                BusRequest::SetLayout { index, reply } => {
                    let ok = match self.switch_to_layout(index) {
                        Ok(()) => true,
                        Err(e) => {
                            debug!("setLayout({}): {}", index, e);
                            false
                        }
                    };
                    if let Some(reply) = reply {
                        let _ = reply.send(ok);
                    }
                }
            }
        }
    }

    // === Output ===

    pub fn set_output_size(&mut self, width: f64, height: f64) {
        self.redirect.state.set_output_size(width, height);
    }

    pub fn redirect_state(&self) -> &RedirectState {
        &self.redirect.state
    }

    // === Touchpads ===

    /// Flip the touchpad state; returns whether any device changed
    pub fn toggle_touchpads(&mut self) -> bool {
        self.touchpads_enabled = !self.touchpads_enabled;
        let enabled = self.touchpads_enabled;

        let touchpads: Vec<DeviceId> = self
            .devices
            .of_kind(DeviceKind::Pointer)
            .filter(|(_, d)| d.control().map_or(false, |c| c.is_touchpad()))
            .map(|(id, _)| id)
            .collect();

        let mut changed = false;
        for id in touchpads {
            match self.devices.set_enabled(id, enabled) {
                Ok(c) => changed |= c,
                Err(e) => debug!("Touchpad skipped: {}", e),
            }
        }
        if changed {
            info!("Touchpads {}", if enabled { "enabled" } else { "disabled" });
        }
        changed
    }

    pub fn enable_touchpads(&mut self) -> bool {
        if self.touchpads_enabled {
            return false;
        }
        self.toggle_touchpads()
    }

    pub fn disable_touchpads(&mut self) -> bool {
        if !self.touchpads_enabled {
            return false;
        }
        self.toggle_touchpads()
    }

    pub fn touchpads_enabled(&self) -> bool {
        self.touchpads_enabled
    }

    // === Tablet mode ===

    pub fn tablet_mode(&self) -> TabletMode {
        self.redirect.state.tablet_mode()
    }

    fn publish_tablet_mode(&mut self) {
        let mode = self.redirect.state.tablet_mode();
        if mode == self.tablet_mode {
            return;
        }
        debug!("Tablet mode: available={} active={}", mode.available, mode.active);
        self.tablet_mode = mode;
        self.bus.tablet_mode_changed(mode.available, mode.active);
    }
}
