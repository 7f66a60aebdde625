//! Configuration file management
//!
//! The config file is a TOML document of named groups:
//!
//! ```toml
//! [Layout]
//! LayoutList = "us,de(neo)"
//! SwitchMode = "WinClass"
//!
//! [Keyboard]
//! RepeatDelay = 600
//! NumLock = 0
//!
//! [Shortcuts]
//! "Switch keyboard layout to German (Neo 2)" = "meta+alt+2"
//! ```
//!
//! Default config path: ~/.config/inputcore/config.toml

pub mod store;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[cfg(target_os = "linux")]
use anyhow::Result;
#[cfg(target_os = "linux")]
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
#[cfg(target_os = "linux")]
use std::sync::mpsc;

pub use store::ConfigStore;

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_ENV_VAR, DEFAULT_REPEAT_DELAY_MS, DEFAULT_REPEAT_RATE, KEYBOARD_GROUP,
    LAYOUT_GROUP, SHORTCUTS_GROUP,
};
use crate::xkb::keycodes::keysym_from_name;
use crate::xkb::policy::PolicyKind;
use crate::xkb::{KeymapSettings, Modifiers, NumLock, RuleNames};

/// Keyboard layout settings, group `[Layout]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LayoutConfig {
    /// Comma separated layouts, variants in parentheses ("de,us,de(neo)")
    pub layout_list: String,
    /// Global, Desktop, Window or WinClass
    pub switch_mode: String,
    pub model: String,
    pub options: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            layout_list: String::new(),
            switch_mode: PolicyKind::Global.name().to_string(),
            model: String::new(),
            options: String::new(),
        }
    }
}

impl LayoutConfig {
    pub fn policy(&self) -> PolicyKind {
        PolicyKind::from_config(&self.switch_mode)
    }

    /// Split the layout list into xkb rule names
    ///
    /// Returns the names plus the short name of every layout.
    pub fn rule_names(&self) -> (RuleNames, Vec<String>) {
        let mut layouts = Vec::new();
        let mut variants = Vec::new();
        let mut short_names = Vec::new();

        for entry in self.layout_list.split(',').map(str::trim) {
            if entry.is_empty() {
                continue;
            }
            let (layout, variant) = match entry.split_once('(') {
                Some((layout, rest)) => (layout.trim(), rest.trim_end_matches(')').trim()),
                None => (entry, ""),
            };
            layouts.push(layout.to_string());
            variants.push(variant.to_string());
            short_names.push(entry.to_string());
        }

        let names = RuleNames {
            rules: String::new(),
            model: self.model.clone(),
            layout: layouts.join(","),
            variant: if variants.iter().all(String::is_empty) {
                String::new()
            } else {
                variants.join(",")
            },
            options: self.options.clone(),
        };
        (names, short_names)
    }
}

/// Keyboard settings, group `[Keyboard]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct KeyboardConfig {
    /// Key repeat delay in milliseconds (default: 660)
    pub repeat_delay: u32,
    /// Key repeats per second (default: 25)
    pub repeat_rate: u32,
    /// "repeat" or "accent" enable key repeat, anything else disables it
    pub key_repeat: String,
    /// NumLock on startup: 0 = on, 1 = off, 2 = leave as is
    pub num_lock: i64,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            repeat_delay: DEFAULT_REPEAT_DELAY_MS,
            repeat_rate: DEFAULT_REPEAT_RATE,
            key_repeat: "repeat".to_string(),
            num_lock: 2,
        }
    }
}

impl KeyboardConfig {
    /// Repeat rate after applying the `KeyRepeat` mode (0 = disabled)
    pub fn effective_rate(&self) -> u32 {
        match self.key_repeat.as_str() {
            "repeat" | "accent" => self.repeat_rate,
            _ => 0,
        }
    }

    pub fn num_lock(&self) -> NumLock {
        NumLock::from_config(self.num_lock)
    }
}

/// Shortcut bindings, group `[Shortcuts]`
///
/// Each entry maps an action name to a key string ("ctrl+alt+k") or a list
/// of key strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortcutsConfig {
    pub bindings: BTreeMap<String, Keybinds>,
}

impl ShortcutsConfig {
    pub fn keys_for(&self, action: &str) -> Option<&[String]> {
        self.bindings.get(action).map(|k| k.0.as_slice())
    }
}

/// One or more key strings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Keybinds(pub Vec<String>);

/// Keybind deserializer: accepts string or array
impl<'de> Deserialize<'de> for Keybinds {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct KeybindVisitor;

        impl<'de> Visitor<'de> for KeybindVisitor {
            type Value = Keybinds;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string or array of strings")
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Keybinds(vec![value.to_string()]))
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut keys = Vec::new();
                while let Some(key) = seq.next_element::<String>()? {
                    keys.push(key);
                }
                Ok(Keybinds(keys))
            }
        }

        deserializer.deserialize_any(KeybindVisitor)
    }
}

/// Snapshot of all typed groups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub layout: LayoutConfig,
    pub keyboard: KeyboardConfig,
    pub shortcuts: ShortcutsConfig,
}

impl Config {
    /// System-wide config path
    const SYSTEM_CONFIG_PATH: &'static str = "/etc/inputcore/config.toml";

    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. INPUTCORE_CONFIG environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/inputcore/config.toml
        if let Some(config_path) = default_config_path() {
            if config_path.exists() {
                return Some(config_path);
            }
        }

        // 3. System config: /etc/inputcore/config.toml
        let system_config = Path::new(Self::SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Some(system_config.to_path_buf());
        }

        None
    }

    /// Open the config store with priority:
    /// 1. INPUTCORE_CONFIG environment variable
    /// 2. ~/.config/inputcore/config.toml (user config)
    /// 3. /etc/inputcore/config.toml (system config)
    /// 4. Built-in defaults (in-memory store)
    pub fn open_store() -> ConfigStore {
        if let Some(path) = Self::config_path() {
            match ConfigStore::open(&path) {
                Ok(store) => return store,
                Err(e) => warn!("Failed to load config {}: {:#}", path.display(), e),
            }
        }
        info!("Using built-in default config");
        ConfigStore::in_memory()
    }

    pub fn from_store(store: &ConfigStore) -> Self {
        Self {
            layout: store.typed_group(LAYOUT_GROUP),
            keyboard: store.typed_group(KEYBOARD_GROUP),
            shortcuts: store.typed_group(SHORTCUTS_GROUP),
        }
    }

    pub fn keymap_settings(&self) -> KeymapSettings {
        let (names, layouts) = self.layout.rule_names();
        KeymapSettings {
            names,
            layouts,
            num_lock: self.keyboard.num_lock(),
        }
    }
}

/// Parse keybind string
/// Example: "ctrl+shift+c" -> (CTRL | SHIFT, keysym 'C')
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKeybind {
    pub mods: Modifiers,
    pub keysym: u32,
}

impl ParsedKeybind {
    pub fn parse(s: &str) -> Option<Self> {
        let lowercase = s.to_lowercase();
        let mut mods = Modifiers::empty();
        let mut keysym = None;

        for part in lowercase.split('+').map(str::trim) {
            match part {
                "ctrl" | "control" => mods |= Modifiers::CTRL,
                "shift" => mods |= Modifiers::SHIFT,
                "alt" => mods |= Modifiers::ALT,
                "meta" | "super" | "logo" => mods |= Modifiers::LOGO,
                other => keysym = Some(keysym_from_name(other)?),
            }
        }

        Some(Self {
            mods,
            keysym: keysym?,
        })
    }
}

/// Config file change watcher (Linux only)
#[cfg(target_os = "linux")]
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<()>,
}

#[cfg(target_os = "linux")]
impl ConfigWatcher {
    /// Start watching config file
    pub fn new(config_path: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let file_name = config_path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                // editors often save by writing a temp file and renaming it
                use notify::EventKind;
                let ours = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                match event.kind {
                    EventKind::Modify(_) | EventKind::Create(_) if ours => {
                        let _ = tx.send(());
                    }
                    _ => {}
                }
            }
        })?;

        // Watch the parent directory to catch rename operations
        let watch_path = config_path.parent().unwrap_or(config_path);
        watcher.watch(watch_path, RecursiveMode::NonRecursive)?;
        info!("Watching config: {}", config_path.display());

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Check if config file was modified (non-blocking)
    ///
    /// Drains every queued notification so a burst reloads once.
    pub fn check_reload(&self) -> bool {
        let mut changed = false;
        while self.rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}

/// Get default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xkb::keycodes::{KEY_SYM_F1, KEY_SYM_TOUCHPAD_TOGGLE};

    #[test]
    fn test_layout_list_with_variants() {
        let config = LayoutConfig {
            layout_list: "de,us,de(neo)".into(),
            model: "pc105".into(),
            ..Default::default()
        };
        let (names, short) = config.rule_names();
        assert_eq!(names.layout, "de,us,de");
        assert_eq!(names.variant, ",,neo");
        assert_eq!(names.model, "pc105");
        assert_eq!(short, vec!["de", "us", "de(neo)"]);
    }

    #[test]
    fn test_layout_list_without_variants() {
        let config = LayoutConfig {
            layout_list: "us, fr".into(),
            ..Default::default()
        };
        let (names, short) = config.rule_names();
        assert_eq!(names.layout, "us,fr");
        assert_eq!(names.variant, "");
        assert_eq!(short.len(), 2);
    }

    #[test]
    fn test_typed_groups_from_store() {
        let store = ConfigStore::parse(
            r#"
[Layout]
LayoutList = "us,de"
SwitchMode = "winclass"

[Keyboard]
RepeatDelay = 300
KeyRepeat = "nothing"
NumLock = 0

[Shortcuts]
"Switch to Next Keyboard Layout" = ["ctrl+alt+k", "meta+space"]
"Switch keyboard layout to Layout de" = "meta+alt+2"
"#,
        )
        .unwrap();
        let config = Config::from_store(&store);
        assert_eq!(config.layout.policy(), PolicyKind::Application);
        assert_eq!(config.keyboard.repeat_delay, 300);
        assert_eq!(config.keyboard.repeat_rate, DEFAULT_REPEAT_RATE);
        assert_eq!(config.keyboard.effective_rate(), 0);
        assert_eq!(config.keyboard.num_lock(), NumLock::On);
        assert_eq!(
            config.shortcuts.keys_for("Switch to Next Keyboard Layout"),
            Some(&["ctrl+alt+k".to_string(), "meta+space".to_string()][..])
        );
        assert_eq!(
            config.shortcuts.keys_for("Switch keyboard layout to Layout de"),
            Some(&["meta+alt+2".to_string()][..])
        );
    }

    #[test]
    fn test_malformed_group_falls_back() {
        let store = ConfigStore::parse("[Keyboard]\nRepeatDelay = \"slow\"\n").unwrap();
        let config = Config::from_store(&store);
        assert_eq!(config.keyboard, KeyboardConfig::default());
        assert_eq!(config.keyboard.num_lock(), NumLock::Leave);
        assert_eq!(config.layout.policy(), PolicyKind::Global);
    }

    #[test]
    fn test_parse_keybind() {
        let kb = ParsedKeybind::parse("ctrl+shift+c").unwrap();
        assert_eq!(kb.mods, Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(kb.keysym, 'C' as u32);

        let kb = ParsedKeybind::parse("Meta+F1").unwrap();
        assert_eq!(kb.mods, Modifiers::LOGO);
        assert_eq!(kb.keysym, KEY_SYM_F1);

        let kb = ParsedKeybind::parse("touchpadtoggle").unwrap();
        assert_eq!(kb.mods, Modifiers::empty());
        assert_eq!(kb.keysym, KEY_SYM_TOUCHPAD_TOGGLE);

        assert!(ParsedKeybind::parse("ctrl+").is_none());
        assert!(ParsedKeybind::parse("ctrl+alt").is_none());
    }
}
