//! Configuration persistence for snapframe settings
//!
//! Settings live in a flat key-value store (`get` / `set` / `save`). The
//! editor only talks to [`SettingsStore`]; [`JsonFileStore`] is the on-disk
//! implementation used by the binary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::assets::migrate_stored_value;
use crate::domain::DEFAULT_BACKGROUND_ID;
use crate::error::{EditorError, Result};

pub const KEY_DEFAULT_BACKGROUND: &str = "defaultBackgroundImage";
pub const KEY_SHORTCUTS: &str = "keyboardShortcuts";
pub const KEY_UPLOADED_IMAGES: &str = "uploadedImages";
pub const KEY_COPY_TO_CLIPBOARD: &str = "copyToClipboard";
pub const KEY_SAVE_DIR: &str = "saveDir";
pub const KEY_EDITOR: &str = "editor";

/// Async key-value settings store
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
    async fn save(&self) -> Result<()>;
}

/// Settings kept in memory only; `save` is a no-op
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        Ok(())
    }
}

/// JSON object on disk, rewritten atomically on `save`
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// `$XDG_CONFIG_HOME/snapframe/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("snapframe").join("settings.json"))
    }

    /// Open the store at `path`; a missing file starts empty, an unreadable one is logged and ignored
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    log::warn!("Settings file {} is not a JSON object, starting fresh", path.display());
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    use std::io::Write;

    let parent = path
        .parent()
        .ok_or_else(|| EditorError::Config(format!("{} has no parent directory", path.display())))?;
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.persist(path).map_err(|e| EditorError::Io(e.error.to_string()))?;
    Ok(())
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        let contents = {
            let values = self.values.lock().await;
            serde_json::to_vec_pretty(&*values).map_err(|e| EditorError::Config(e.to_string()))?
        };
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &contents))
            .await
            .map_err(|e| EditorError::Io(e.to_string()))??;
        log::debug!("Settings saved to {}", self.path.display());
        Ok(())
    }
}

/// A capture hotkey binding as persisted by the preferences page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutBinding {
    pub id: String,
    pub action: String,
    pub shortcut: String,
    pub enabled: bool,
}

impl ShortcutBinding {
    fn new(id: &str, action: &str, shortcut: &str, enabled: bool) -> Self {
        Self {
            id: id.to_string(),
            action: action.to_string(),
            shortcut: shortcut.to_string(),
            enabled,
        }
    }
}

/// Built-in capture shortcuts
pub fn default_shortcuts() -> Vec<ShortcutBinding> {
    vec![
        ShortcutBinding::new("region", "Capture Region", "CommandOrControl+Shift+2", true),
        ShortcutBinding::new("fullscreen", "Capture Screen", "CommandOrControl+Shift+3", false),
        ShortcutBinding::new("window", "Capture Window", "CommandOrControl+Shift+4", false),
    ]
}

/// Merge saved bindings with the built-ins.
///
/// Saved shortcut strings win, built-in ids get their built-in `enabled`
/// flag back, unknown ids are kept in saved order, and built-ins missing from
/// the saved list are appended.
pub fn merge_shortcuts(saved: &[ShortcutBinding]) -> Vec<ShortcutBinding> {
    let defaults = default_shortcuts();
    if saved.is_empty() {
        return defaults;
    }
    let mut merged: Vec<ShortcutBinding> = Vec::with_capacity(saved.len() + defaults.len());
    for binding in saved {
        if merged.iter().any(|b| b.id == binding.id) {
            continue;
        }
        let mut binding = binding.clone();
        if let Some(default) = defaults.iter().find(|d| d.id == binding.id) {
            binding.enabled = default.enabled;
        }
        merged.push(binding);
    }
    for default in defaults {
        if !merged.iter().any(|b| b.id == default.id) {
            merged.push(default);
        }
    }
    merged
}

/// Editor tuning kept under the `editor` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorTuning {
    /// Quiet period before a preview re-render, in milliseconds
    pub preview_debounce_ms: u64,
    /// Maximum undo (and redo) depth
    pub history_limit: usize,
    /// Decoded background images kept in memory
    pub image_cache_capacity: usize,
    pub asset_root: Option<PathBuf>,
    pub font_paths: Vec<PathBuf>,
}

impl Default for EditorTuning {
    fn default() -> Self {
        Self {
            preview_debounce_ms: 50,
            history_limit: 50,
            image_cache_capacity: 16,
            asset_root: None,
            font_paths: Vec::new(),
        }
    }
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Asset id or data URL of the background used for new documents
    pub default_background: String,
    pub tuning: EditorTuning,
    /// Uploaded background images, as data URLs
    pub uploaded_images: Vec<String>,
    pub shortcuts: Vec<ShortcutBinding>,
    /// Also copy to the clipboard when saving
    pub copy_to_clipboard: bool,
    /// Where exports are written; `None` means the Pictures folder
    pub save_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_background: DEFAULT_BACKGROUND_ID.to_string(),
            tuning: EditorTuning::default(),
            uploaded_images: Vec::new(),
            shortcuts: default_shortcuts(),
            copy_to_clipboard: false,
            save_dir: None,
        }
    }
}

/// Read and deserialize one key; failures are logged and treated as absent
async fn read_key<T: DeserializeOwned>(store: &dyn SettingsStore, key: &str) -> Option<T> {
    match store.get(key).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("Ignoring invalid setting '{}': {}", key, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            log::warn!("Could not read setting '{}': {}", key, e);
            None
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| EditorError::Config(e.to_string()))
}

impl EditorConfig {
    /// Load configuration from the store, or defaults where values are missing or invalid.
    ///
    /// Legacy background paths are migrated to asset ids and written back.
    pub async fn load(store: &dyn SettingsStore) -> Self {
        let mut config = Self::default();

        if let Some(stored) = read_key::<String>(store, KEY_DEFAULT_BACKGROUND).await {
            let migrated = migrate_stored_value(&stored);
            if migrated != stored {
                let written = match store.set(KEY_DEFAULT_BACKGROUND, Value::String(migrated.clone())).await {
                    Ok(()) => store.save().await,
                    Err(e) => Err(e),
                };
                if let Err(e) = written {
                    log::warn!("Could not persist migrated background: {}", e);
                }
            }
            config.default_background = migrated;
        }
        if let Some(tuning) = read_key(store, KEY_EDITOR).await {
            config.tuning = tuning;
        }
        if let Some(images) = read_key(store, KEY_UPLOADED_IMAGES).await {
            config.uploaded_images = images;
        }
        if let Some(saved) = read_key::<Vec<ShortcutBinding>>(store, KEY_SHORTCUTS).await {
            config.shortcuts = merge_shortcuts(&saved);
        }
        if let Some(copy) = read_key(store, KEY_COPY_TO_CLIPBOARD).await {
            config.copy_to_clipboard = copy;
        }
        config.save_dir = read_key(store, KEY_SAVE_DIR).await;
        config
    }

    /// Write every setting back and flush the store
    pub async fn save(&self, store: &dyn SettingsStore) -> Result<()> {
        store
            .set(KEY_DEFAULT_BACKGROUND, Value::String(self.default_background.clone()))
            .await?;
        store.set(KEY_EDITOR, to_value(&self.tuning)?).await?;
        store.set(KEY_UPLOADED_IMAGES, to_value(&self.uploaded_images)?).await?;
        store.set(KEY_SHORTCUTS, to_value(&self.shortcuts)?).await?;
        store.set(KEY_COPY_TO_CLIPBOARD, Value::Bool(self.copy_to_clipboard)).await?;
        if let Some(dir) = &self.save_dir {
            store.set(KEY_SAVE_DIR, to_value(dir)?).await?;
        }
        store.save().await
    }

    /// Directory exports are written to
    pub fn export_dir(&self) -> PathBuf {
        self.save_dir
            .clone()
            .or_else(dirs::picture_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Remember an uploaded image; duplicates are ignored
    pub fn add_uploaded_image(&mut self, data_url: &str) {
        if !self.uploaded_images.iter().any(|u| u == data_url) {
            self.uploaded_images.push(data_url.to_string());
        }
    }
}
