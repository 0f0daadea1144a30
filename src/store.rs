use serde::{Serialize, de::DeserializeOwned};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::warn;

pub const SETTINGS_KEY: &str = "settings";
pub const TASKS_KEY: &str = "tasks";
pub const STATS_KEY: &str = "stats";
pub const LAST_DATE_KEY: &str = "last_date";
pub const DARK_MODE_KEY: &str = "dark_mode";
pub const POMODORO_COUNT_KEY: &str = "pomodoro_count";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable key/value storage: one pretty-printed JSON file per key.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    /// Missing keys and unreadable data both come back as `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, path = %path.display(), %err, "ignoring corrupt stored value");
                None
            }
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        fs::write(self.path(key), serde_json::to_string_pretty(value)?)?;
        Ok(())
    }
}
