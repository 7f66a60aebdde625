//! inputcore - input handling core for a display server
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  Backends (libinput / legacy XI2 / fake input)   │
//! │                     ↓ Device, Event              │
//! │  Platform: device registry, xkb, layouts         │
//! │                     ↓                            │
//! │  Redirect: spies → filters → seat default action │
//! │                     ↓ Request                    │
//! │  VT switch, actions, LEDs, bus notifications     │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod bus;
pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod event;
pub mod filters;
pub mod platform;
pub mod redirect;
pub mod seat;
pub mod session;
pub mod shell;
pub mod shortcuts;
pub mod spies;
pub mod xkb;

#[cfg(test)]
mod testing;

pub use error::{InputError, InputResult};
pub use platform::{Platform, PlatformParts};
