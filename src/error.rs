//! Error types
//!
//! Library-level failures are reported through `InputError`. None of them
//! are fatal: every variant describes a request that was refused and left
//! state untouched. Application setup code uses `anyhow` on top of this.

use thiserror::Error;

use crate::device::DeviceId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Layout index outside of the configured layout list
    #[error("layout index {index} out of range ({count} layouts configured)")]
    InvalidLayout { index: u32, count: u32 },

    /// No layout with that short or display name
    #[error("no layout named {0:?}")]
    UnknownLayout(String),

    /// Switch mode not one of Global, Desktop, Window, WinClass
    #[error("unknown layout switching policy {0:?}")]
    UnknownPolicy(String),

    /// Exact same trigger is already bound to the same action
    #[error("shortcut {trigger} is already registered for {action}")]
    DuplicateShortcut { trigger: String, action: String },

    /// Device handle outlived its device
    #[error("device {0} has been removed")]
    StaleDevice(DeviceId),

    /// Device exists but lacks the capability the request needs
    #[error("device {device} does not support {capability}")]
    Unsupported {
        device: DeviceId,
        capability: &'static str,
    },

    /// Keymap could not be compiled or no keymap is loaded
    #[error("keymap: {0}")]
    Keymap(String),
}

pub type InputResult<T> = std::result::Result<T, InputError>;
