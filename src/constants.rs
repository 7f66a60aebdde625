//! Global constants for inputcore
//!
//! Consolidates timing defaults, geometry fallbacks and config names
//! to eliminate magic numbers throughout the codebase.

// ============================================================================
// Timing Constants
// ============================================================================

/// Default key repeat delay in milliseconds
pub const DEFAULT_REPEAT_DELAY_MS: u32 = 660;

/// Default key repeat rate in characters per second
pub const DEFAULT_REPEAT_RATE: u32 = 25;

/// Hold time before the power key counts as a long press
pub const LONG_PRESS_MS: u32 = 1000;

// ============================================================================
// Geometry
// ============================================================================

/// Output size used before the compositor reports one
pub const DEFAULT_OUTPUT_WIDTH: f64 = 1920.0;
pub const DEFAULT_OUTPUT_HEIGHT: f64 = 1080.0;

/// Scroll distance of one legacy wheel click (matches libinput's 15 degrees)
pub const LEGACY_SCROLL_STEP: f64 = 15.0;

// ============================================================================
// Configuration
// ============================================================================

/// Directory name below the XDG config dir
pub const CONFIG_DIR_NAME: &str = "inputcore";

/// Environment variable overriding the config path
pub const CONFIG_ENV_VAR: &str = "INPUTCORE_CONFIG";

/// Config group holding the layout list and switch mode
pub const LAYOUT_GROUP: &str = "Layout";

/// Config group holding repeat and numlock settings
pub const KEYBOARD_GROUP: &str = "Keyboard";

/// Config group holding user shortcut bindings
pub const SHORTCUTS_GROUP: &str = "Shortcuts";

/// Prefix shared by every persisted per-context layout entry
pub const LAYOUT_ENTRY_PREFIX: &str = "LayoutDefault";

/// Default binding for cycling layouts
pub const DEFAULT_NEXT_LAYOUT_SHORTCUT: &str = "ctrl+alt+k";

// ============================================================================
// Built-in Actions
// ============================================================================

/// Action cycling the keyboard layout
pub const ACTION_NEXT_LAYOUT: &str = "Switch to Next Keyboard Layout";

/// Prefix of the per-layout actions, followed by the layout's long name
pub const ACTION_LAYOUT_PREFIX: &str = "Switch keyboard layout to ";

pub const ACTION_TOUCHPAD_TOGGLE: &str = "Toggle Touchpad";
pub const ACTION_TOUCHPAD_ON: &str = "Enable Touchpad";
pub const ACTION_TOUCHPAD_OFF: &str = "Disable Touchpad";

/// Emitted when Meta is pressed and released on its own
pub const ACTION_META_ONLY: &str = "Meta Only";
