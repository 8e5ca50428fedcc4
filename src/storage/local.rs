use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::theme::ThemeMode;
use crate::types::Task;

use super::{StorageError, TaskBackend, parse_tasks};

pub const THEME_KEY: &str = "theme";
pub const CATEGORIES_KEY: &str = "categories";
pub const TASKS_KEY: &str = "tasks";

/// String key/value store persisted as one JSON object on disk.
///
/// Every call reads or rewrites the file, so separate handles on the same
/// path always observe each other's writes.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    pub fn set_item(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let mut items = self.read_all();
        items.insert(key.to_string(), value.into());
        self.write_all(&items)
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(err) => {
                warn!(
                    "failed to read local storage '{}': {}",
                    self.path.display(),
                    err
                );
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(
                "local storage '{}' is malformed, treating it as empty: {}",
                self.path.display(),
                err
            );
            BTreeMap::new()
        })
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| anyhow!("invalid local storage path"))?;
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create local storage directory '{}'",
                parent.display()
            )
        })?;

        let contents =
            serde_json::to_string_pretty(items).context("failed to serialize local storage")?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents)
            .with_context(|| format!("failed to write '{}'", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "failed to replace local storage '{}'",
                self.path.display()
            )
        })?;
        Ok(())
    }
}

/// Theme and category list; never synced remotely.
#[derive(Debug, Clone)]
pub struct Preferences {
    storage: LocalStorage,
}

impl Preferences {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    pub fn theme(&self) -> ThemeMode {
        self.storage
            .get_item(THEME_KEY)
            .and_then(|raw| ThemeMode::from_str(&raw).ok())
            .unwrap_or_default()
    }

    pub fn save_theme(&self, theme: ThemeMode) -> Result<()> {
        self.storage.set_item(THEME_KEY, theme.as_str())
    }

    /// Stored category list, or `defaults` when nothing usable is stored.
    pub fn categories(&self, defaults: &[String]) -> Vec<String> {
        let Some(raw) = self.storage.get_item(CATEGORIES_KEY) else {
            return defaults.to_vec();
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(categories) => categories,
            Err(err) => {
                warn!("ignoring malformed stored categories: {err}");
                defaults.to_vec()
            }
        }
    }

    pub fn save_categories(&self, categories: &[String]) -> Result<()> {
        let raw = serde_json::to_string(categories).context("failed to serialize categories")?;
        self.storage.set_item(CATEGORIES_KEY, raw)
    }
}

#[derive(Debug, Clone)]
pub struct LocalBackend {
    storage: LocalStorage,
}

impl LocalBackend {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl TaskBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn load(&self) -> Result<Vec<Task>, StorageError> {
        Ok(self
            .storage
            .get_item(TASKS_KEY)
            .map(|raw| parse_tasks(&raw, "local storage"))
            .unwrap_or_default())
    }

    async fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(tasks)
            .map_err(|err| StorageError::Local(format!("failed to serialize tasks: {err}")))?;
        self.storage
            .set_item(TASKS_KEY, raw)
            .map_err(|err| StorageError::Local(format!("{err:#}")))?;
        debug!(count = tasks.len(), "saved tasks to local storage");
        Ok(())
    }
}
