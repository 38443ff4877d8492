//! Persisted settings record and the stores that hold it.
//!
//! The settings are read once at startup and written back wholesale after
//! every mutation. Every field carries a serde default, so files written by
//! older versions (missing newer fields) still load.

mod json;

pub use json::JsonSettingsStore;

use crate::constants::DEFAULT_STREAM_ICON;
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// A named folder holding one note per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stream {
    /// Stable identity, generated at creation.
    pub id: String,
    pub name: String,
    /// Vault-relative folder holding the stream's notes.
    pub folder: String,
    pub icon: String,
    pub show_today_in_ribbon: bool,
    pub add_command: bool,
    pub encrypt_this_stream: bool,
    pub disabled: bool,
}

impl Stream {
    /// Creates an enabled stream with a fresh id and the default icon.
    ///
    /// ```
    /// use streams::settings::Stream;
    ///
    /// let stream = Stream::new("Work", "Journal/Work");
    /// assert_eq!(stream.name, "Work");
    /// assert!(!stream.id.is_empty());
    /// assert!(!stream.disabled);
    /// ```
    pub fn new(name: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
            ..Self::default()
        }
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            folder: String::new(),
            icon: DEFAULT_STREAM_ICON.to_string(),
            show_today_in_ribbon: false,
            add_command: false,
            encrypt_this_stream: false,
            disabled: false,
        }
    }
}

/// Visual style of the streams bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BarStyle {
    #[default]
    Default,
    Modern,
}

impl fmt::Display for BarStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarStyle::Default => f.write_str("default"),
            BarStyle::Modern => f.write_str("modern"),
        }
    }
}

impl FromStr for BarStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(BarStyle::Default),
            "modern" => Ok(BarStyle::Modern),
            other => Err(format!("unknown bar style '{}'", other)),
        }
    }
}

/// The whole persisted settings record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub streams: Vec<Stream>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_stream_id: Option<String>,
    pub show_streams_bar: bool,
    pub reuse_current_tab: bool,
    pub debug_mode: bool,
    pub bar_style: BarStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            streams: Vec::new(),
            active_stream_id: None,
            show_streams_bar: true,
            reuse_current_tab: false,
            debug_mode: false,
            bar_style: BarStyle::Default,
        }
    }
}

/// Storage for the settings record.
///
/// Implementations replace the stored record wholesale on `save`; there
/// are no partial updates.
pub trait SettingsStore {
    /// Returns the stored settings, or the defaults when nothing is stored yet.
    fn load(&self) -> AppResult<Settings>;

    fn save(&self, settings: &Settings) -> AppResult<()>;
}

/// In-memory store for embedding and tests. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    inner: Arc<Mutex<Option<Settings>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `settings` already stored.
    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::default();
        *store.inner.lock().unwrap_or_else(|p| p.into_inner()) = Some(settings);
        store
    }

    /// The currently stored record, if any save or seed happened.
    pub fn stored(&self) -> Option<Settings> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// How many times `save` was called.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> AppResult<Settings> {
        Ok(self.stored().unwrap_or_default())
    }

    fn save(&self, settings: &Settings) -> AppResult<()> {
        *self.inner.lock().unwrap_or_else(|p| p.into_inner()) = Some(settings.clone());
        *self.saves.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        Ok(())
    }
}
