//! User settings kept in a flat key/value store.

use std::{
    collections::{BTreeMap, HashMap},
    fs, io,
    path::{Path, PathBuf},
};

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use thiserror::Error;
use vg_schema::MapStyle;

pub const SETTINGS_MAP_STYLE_KEY: &str = "settingsMapStyleKey";
pub const SETTINGS_LAYER_OPACITY_KEY: &str = "settingsLayerOpacityKey";

pub const DEFAULT_LAYER_OPACITY: f32 = 1.0;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write settings to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize settings for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value '{value}' for setting {key}")]
    InvalidValue { key: &'static str, value: String },
}

pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    values: HashMap<String, String>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A JSON object of string values, rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileSettingsStore {
    /// Opens `path`; a missing file starts out empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| {
                SettingsError::Parse {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(SettingsError::Read { path, source }),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), SettingsError> {
        let contents = serde_json::to_string_pretty(&self.values).map_err(|source| {
            SettingsError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, contents).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "setting", rename_all = "snake_case")]
pub enum SettingsChange {
    MapStyle { style: MapStyle },
    LayerOpacity { value: f32 },
}

/// Typed settings over a store, publishing every change to subscribers.
pub struct Settings<S> {
    store: S,
    subscribers: Vec<Sender<SettingsChange>>,
}

impl<S: SettingsStore> Settings<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            subscribers: Vec::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn subscribe(&mut self) -> Receiver<SettingsChange> {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        receiver
    }

    fn publish(&mut self, change: SettingsChange) {
        self.subscribers
            .retain(|subscriber| subscriber.send(change).is_ok());
    }

    pub fn map_style(&self) -> MapStyle {
        let Some(stored) = self.store.get(SETTINGS_MAP_STYLE_KEY) else {
            return MapStyle::default();
        };
        stored.parse().unwrap_or_else(|err| {
            tracing::warn!(
                target: "vegmap::settings",
                value = %stored,
                error = %err,
                "settings.map_style=invalid"
            );
            MapStyle::default()
        })
    }

    pub fn set_map_style(&mut self, style: MapStyle) -> Result<SettingsChange, SettingsError> {
        self.store.set(SETTINGS_MAP_STYLE_KEY, style.as_str())?;
        let change = SettingsChange::MapStyle { style };
        self.publish(change);
        Ok(change)
    }

    /// Global multiplier applied to every layer opacity, in `[0, 1]`.
    pub fn layer_opacity(&self) -> f32 {
        self.store
            .get(SETTINGS_LAYER_OPACITY_KEY)
            .and_then(|stored| stored.trim().parse::<f32>().ok())
            .filter(|value| value.is_finite())
            .map(|value| value.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_LAYER_OPACITY)
    }

    pub fn set_layer_opacity(&mut self, value: f32) -> Result<SettingsChange, SettingsError> {
        if !value.is_finite() {
            return Err(SettingsError::InvalidValue {
                key: SETTINGS_LAYER_OPACITY_KEY,
                value: value.to_string(),
            });
        }
        let value = value.clamp(0.0, 1.0);
        self.store
            .set(SETTINGS_LAYER_OPACITY_KEY, &value.to_string())?;
        let change = SettingsChange::LayerOpacity { value };
        self.publish(change);
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_an_empty_store() {
        let settings = Settings::new(MemorySettingsStore::new());
        assert_eq!(settings.map_style(), MapStyle::Standard);
        assert_eq!(settings.layer_opacity(), 1.0);
    }

    #[test]
    fn invalid_stored_values_fall_back() {
        let mut store = MemorySettingsStore::new();
        store.set(SETTINGS_MAP_STYLE_KEY, "sepia").unwrap();
        store.set(SETTINGS_LAYER_OPACITY_KEY, "lots").unwrap();
        let settings = Settings::new(store);
        assert_eq!(settings.map_style(), MapStyle::Standard);
        assert_eq!(settings.layer_opacity(), 1.0);
    }

    #[test]
    fn opacity_is_clamped() {
        let mut settings = Settings::new(MemorySettingsStore::new());
        let change = settings.set_layer_opacity(1.7).unwrap();
        assert_eq!(change, SettingsChange::LayerOpacity { value: 1.0 });
        settings.set_layer_opacity(-0.3).unwrap();
        assert_eq!(settings.layer_opacity(), 0.0);
        assert!(settings.set_layer_opacity(f32::NAN).is_err());
    }

    #[test]
    fn subscribers_receive_changes() {
        let mut settings = Settings::new(MemorySettingsStore::new());
        let first = settings.subscribe();
        let dropped = settings.subscribe();
        drop(dropped);
        settings.set_map_style(MapStyle::Night).unwrap();
        settings.set_layer_opacity(0.5).unwrap();
        let received: Vec<_> = first.try_iter().collect();
        assert_eq!(
            received,
            vec![
                SettingsChange::MapStyle {
                    style: MapStyle::Night
                },
                SettingsChange::LayerOpacity { value: 0.5 },
            ]
        );
        assert_eq!(settings.subscribers.len(), 1);
    }

    #[test]
    fn json_file_store_persists_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        {
            let mut settings = Settings::new(JsonFileSettingsStore::open(&path).unwrap());
            settings.set_map_style(MapStyle::Satellite).unwrap();
        }
        let reopened = Settings::new(JsonFileSettingsStore::open(&path).unwrap());
        assert_eq!(reopened.map_style(), MapStyle::Satellite);
    }

    #[test]
    fn write_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("settings.json");
        let mut store = JsonFileSettingsStore::open(&path).unwrap();
        assert!(matches!(
            store.set(SETTINGS_MAP_STYLE_KEY, "night"),
            Err(SettingsError::Write { .. })
        ));
    }

    #[test]
    fn corrupt_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            JsonFileSettingsStore::open(&path),
            Err(SettingsError::Parse { .. })
        ));
    }
}
