use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use crate::config::{data_env_dirs, roaming_settings_path};

/// Free-text display name entered on the page.
pub const USERNAME_KEY: &str = "username";
/// Locator of the last committed photo.
pub const PHOTO_KEY: &str = "photo";

const TEMP_SUFFIX: &str = "tmp";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Key/value namespace shared by the page components.
///
/// Each call touches a single key and is atomic at that granularity; there
/// are no multi-key transactions.
pub trait SettingsStore {
    fn has(&self, key: &str) -> bool;
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

impl<S: SettingsStore + ?Sized> SettingsStore for Rc<S> {
    fn has(&self, key: &str) -> bool {
        (**self).has(key)
    }

    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RefCell<BTreeMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn has(&self, key: &str) -> bool {
        self.values.borrow().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.borrow_mut().remove(key);
    }
}

/// Roaming namespace persisted as a flat JSON object.
///
/// The whole map is rewritten on every mutation through a sibling temp file
/// and a rename, so readers only ever observe a complete file.
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    values: RefCell<BTreeMap<String, String>>,
    /// Set while the file lags behind `values` after a failed write.
    dirty: Cell<bool>,
}

impl JsonSettingsStore {
    /// Opens the store at `path`. A missing file is an empty store and an
    /// unreadable or malformed one is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = load_values(&path);
        tracing::debug!(path = %path.display(), keys = values.len(), "opened settings store");
        Self {
            path,
            values: RefCell::new(values),
            dirty: Cell::new(false),
        }
    }

    pub fn open_default() -> SettingsResult<Self> {
        let (xdg_data_home, home) = data_env_dirs();
        let path = roaming_settings_path(xdg_data_home.as_deref(), home.as_deref())
            .map_err(|_| SettingsError::MissingHomeDirectory)?;
        Ok(Self::open(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Upserts `key` and reports whether the value reached disk. The
    /// in-memory value is updated either way.
    pub fn try_set(&self, key: &str, value: &str) -> SettingsResult<()> {
        let snapshot = {
            let mut values = self.values.borrow_mut();
            let previous = values.insert(key.to_string(), value.to_string());
            if previous.as_deref() == Some(value) && !self.dirty.get() {
                return Ok(());
            }
            values.clone()
        };
        self.persist(&snapshot)
    }

    /// Removes `key` and reports whether the removal reached disk.
    pub fn try_remove(&self, key: &str) -> SettingsResult<()> {
        let snapshot = {
            let mut values = self.values.borrow_mut();
            if values.remove(key).is_none() && !self.dirty.get() {
                return Ok(());
            }
            values.clone()
        };
        self.persist(&snapshot)
    }

    /// Whether an earlier write failed and the file is behind memory.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> SettingsResult<()> {
        let result = serde_json::to_vec_pretty(values)
            .map_err(SettingsError::from)
            .and_then(|encoded| {
                write_replace(&self.path, &encoded).map_err(|source| SettingsError::Write {
                    path: self.path.clone(),
                    source,
                })
            });
        self.dirty.set(result.is_err());
        result
    }
}

impl SettingsStore for JsonSettingsStore {
    fn has(&self, key: &str) -> bool {
        self.values.borrow().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = self.try_set(key, value) {
            tracing::warn!(key, %err, "settings value kept in memory only");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(err) = self.try_remove(key) {
            tracing::warn!(key, %err, "settings removal not persisted");
        }
    }
}

fn load_values(path: &Path) -> BTreeMap<String, String> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(err) => {
            tracing::warn!(?err, path = %path.display(), "failed to read settings; starting empty");
            return BTreeMap::new();
        }
    };
    serde_json::from_str(&contents).unwrap_or_else(|err| {
        tracing::warn!(?err, path = %path.display(), "failed to parse settings; starting empty");
        BTreeMap::new()
    })
}

fn write_replace(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension(TEMP_SUFFIX);
    let result = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}
