//! Durable key/value storage for session state.
//!
//! The chat session persists a handful of string values: the serialized
//! message list, the theme flag and the layout mode. This module provides
//! the [`Storage`] trait that the session saves through, a file-backed
//! implementation that keeps one file per key, and an in-memory
//! implementation for tests and ephemeral sessions.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::observability::STORAGE_WRITES;

/// Key holding the JSON-serialized message list.
pub const MESSAGES_KEY: &str = "chatMessages";

/// Key holding the dark-mode flag as `"true"` or `"false"`.
pub const DARK_MODE_KEY: &str = "darkMode";

/// Key holding the layout mode as `"center"` or `"side"`.
pub const LAYOUT_KEY: &str = "alignmentMode";

/// A string key/value store that survives restarts.
pub trait Storage: Send {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Storage that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    writes: usize,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            writes: 0,
        }
    }

    /// Number of `set` calls made against this store.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.writes += 1;
        STORAGE_WRITES.click();
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage that keeps one file per key inside a directory.
///
/// Writes go to a temporary sibling and are renamed into place so a crash
/// mid-write never leaves a truncated value behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|err| Error::io("failed to create state directory", err))?;
        Ok(Self { root })
    }

    /// The directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The default state directory: `$XDG_STATE_HOME/chatline`, falling
    /// back to `$HOME/.local/state/chatline`.
    pub fn default_root() -> Option<PathBuf> {
        if let Some(state) = std::env::var_os("XDG_STATE_HOME").filter(|s| !s.is_empty()) {
            return Some(PathBuf::from(state).join("chatline"));
        }
        std::env::var_os("HOME")
            .filter(|s| !s.is_empty())
            .map(|home| PathBuf::from(home).join(".local/state/chatline"))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::storage("invalid storage key", Some(key.to_string())));
        }
        Ok(self.root.join(key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) if err.kind() == io::ErrorKind::InvalidData => Err(Error::storage(
                "stored value is not valid UTF-8",
                Some(key.to_string()),
            )),
            Err(err) => Err(Error::io(format!("failed to read {}", path.display()), err)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp)
            .map_err(|err| Error::io(format!("failed to create {}", tmp.display()), err))?;
        file.write_all(value.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|err| Error::io(format!("failed to write {}", tmp.display()), err))?;
        fs::rename(&tmp, &path)
            .map_err(|err| Error::io(format!("failed to replace {}", path.display()), err))?;
        STORAGE_WRITES.click();
        Ok(())
    }
}
