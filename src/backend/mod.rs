//! Input backends
//!
//! A backend turns native device notifications into `Device`s and native
//! events into normalized `Event`s, and hands both to the platform. Every
//! native device key maps to one registration per device kind it exposes.

pub mod fake;
pub mod legacy;
#[cfg(target_os = "linux")]
pub mod libinput;

use std::collections::HashMap;
use std::os::fd::RawFd;

use anyhow::Result;
use log::{debug, info};

use crate::device::{Device, DeviceId, DeviceKind};
use crate::platform::Platform;

pub use fake::{FakeInputBackend, FakeRequest};
pub use legacy::{LegacyBackend, XiDeviceInfo, XiDeviceUse, XiEvent};
#[cfg(target_os = "linux")]
pub use libinput::LibinputBackend;

pub trait Backend {
    fn name(&self) -> &'static str;

    /// Fd to poll for readiness, if the backend has one
    fn fd(&self) -> Option<RawFd> {
        None
    }

    /// Feed everything pending into the platform
    fn dispatch(&mut self, platform: &mut Platform) -> Result<()>;
}

/// Native device key to registered handles
#[derive(Debug, Default)]
pub struct DeviceMap {
    map: HashMap<String, Vec<(DeviceKind, DeviceId)>>,
}

impl DeviceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one `Device` per kind and remember their handles
    pub fn register(
        &mut self,
        platform: &mut Platform,
        native: &str,
        devices: Vec<Device>,
    ) -> Vec<DeviceId> {
        if self.map.contains_key(native) {
            debug!("{} already registered", native);
            return Vec::new();
        }
        let mut entries = Vec::with_capacity(devices.len());
        for device in devices {
            let kind = device.kind();
            let id = platform.add_device(device);
            entries.push((kind, id));
        }
        let ids = entries.iter().map(|(_, id)| *id).collect();
        if !entries.is_empty() {
            self.map.insert(native.to_string(), entries);
        }
        ids
    }

    /// Forget the native key first, then remove its devices from the platform
    pub fn unregister(&mut self, platform: &mut Platform, native: &str) -> usize {
        let Some(entries) = self.map.remove(native) else {
            debug!("{} was never registered", native);
            return 0;
        };
        for (_, id) in entries.iter() {
            platform.remove_device(*id);
        }
        info!("{}: {} registration(s) removed", native, entries.len());
        entries.len()
    }

    pub fn lookup(&self, native: &str, kind: DeviceKind) -> Option<DeviceId> {
        self.map
            .get(native)?
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, id)| *id)
    }

    pub fn contains(&self, native: &str) -> bool {
        self.map.contains_key(native)
    }

    pub fn natives(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
