//! Theme state manager.
//!
//! Resolves the three-way display mode against the device appearance
//! signal and persists explicit choices under the `themeMode` key.
//! Persistence failures are logged and never surface to the caller.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Preference key holding the persisted mode.
pub const THEME_MODE_KEY: &str = "themeMode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            _ => Err(format!("Invalid theme mode: {}", s)),
        }
    }
}

/// Brightness reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    #[default]
    Light,
    Dark,
}

impl FromStr for Appearance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(format!("Invalid appearance: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub text: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub card: &'static str,
    pub border: &'static str,
    pub notification: &'static str,
    pub error: &'static str,
    pub success: &'static str,
    pub muted: &'static str,
}

pub const LIGHT_PALETTE: Palette = Palette {
    background: "#FFFFFF",
    text: "#000000",
    primary: "#4CAF50",
    secondary: "#E8F5E9",
    card: "#FFFFFF",
    border: "#E0E0E0",
    notification: "#FF9800",
    error: "#F44336",
    success: "#4CAF50",
    muted: "#757575",
};

pub const DARK_PALETTE: Palette = Palette {
    background: "#121212",
    text: "#FFFFFF",
    primary: "#81C784",
    secondary: "#1B5E20",
    card: "#1E1E1E",
    border: "#333333",
    notification: "#FFB74D",
    error: "#EF5350",
    success: "#66BB6A",
    muted: "#BDBDBD",
};

/// The palette currently rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub dark: bool,
    pub colors: Palette,
}

impl Theme {
    pub const LIGHT: Theme = Theme { dark: false, colors: LIGHT_PALETTE };
    pub const DARK: Theme = Theme { dark: true, colors: DARK_PALETTE };

    /// Active theme for `mode` given the device appearance.
    pub fn resolve(mode: ThemeMode, device: Appearance) -> Self {
        match (mode, device) {
            (ThemeMode::Dark, _) | (ThemeMode::System, Appearance::Dark) => Self::DARK,
            _ => Self::LIGHT,
        }
    }
}

/// Preference store errors.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "IO error: {}", e),
            StoreError::Parse(e) => write!(f, "Parse error: {}", e),
            StoreError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// String-valued key/value persistence.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Preferences kept in a flat TOML table on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => toml::from_str(&content).map_err(StoreError::Parse),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::Io)?;
        }
        let content = toml::to_string_pretty(&values).map_err(StoreError::Serialize)?;
        std::fs::write(&self.path, content).map_err(StoreError::Io)
    }
}

/// In-process store with nothing on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Owns the display mode and derives the active theme from it.
pub struct ThemeManager {
    store: Arc<dyn PreferenceStore>,
    mode: ThemeMode,
    device: watch::Receiver<Appearance>,
}

impl ThemeManager {
    /// Follows the device until a persisted mode is restored.
    pub fn new(store: Arc<dyn PreferenceStore>, device: watch::Receiver<Appearance>) -> Self {
        Self {
            store,
            mode: ThemeMode::System,
            device,
        }
    }

    /// Construct and restore the persisted mode in one step.
    pub fn load(store: Arc<dyn PreferenceStore>, device: watch::Receiver<Appearance>) -> Self {
        let mut manager = Self::new(store, device);
        manager.restore();
        manager
    }

    /// Read the persisted mode. A missing, unreadable or unknown value
    /// leaves the mode at `System`.
    pub fn restore(&mut self) -> ThemeMode {
        match self.store.get(THEME_MODE_KEY) {
            Ok(Some(value)) => match value.parse() {
                Ok(mode) => self.mode = mode,
                Err(e) => tracing::warn!("Ignoring stored theme preference: {}", e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Error loading theme preference: {}", e),
        }
        self.mode
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    /// Apply `mode` and persist it. The new mode stays applied even when
    /// the write fails.
    pub fn set_mode(&mut self, mode: ThemeMode) {
        self.mode = mode;
        if let Err(e) = self.store.set(THEME_MODE_KEY, mode.as_str()) {
            tracing::warn!("Error saving theme preference: {}", e);
        }
    }

    pub fn device_appearance(&self) -> Appearance {
        *self.device.borrow()
    }

    /// Computed on every call so `System` tracks the device live.
    pub fn active_theme(&self) -> Theme {
        Theme::resolve(self.mode, self.device_appearance())
    }

    pub fn is_dark(&self) -> bool {
        self.active_theme().dark
    }

    /// Wait for the next device change and return the recomputed theme.
    /// `None` once the device signal is gone.
    pub async fn changed(&mut self) -> Option<Theme> {
        self.device.changed().await.ok()?;
        let theme = self.active_theme();
        tracing::debug!("Device appearance changed, dark theme: {}", theme.dark);
        Some(theme)
    }
}
