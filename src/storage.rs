//! Durable client-local key/value storage for session state

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::debug;

use crate::error::Error;

/// String key/value store the session lives in.
///
/// `set_many` and `remove_many` must apply all entries at once so that a
/// reader never observes half of a session.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.set_many(&[(key, value.to_string())])
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.remove_many(&[key])
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), Error>;

    fn remove_many(&self, keys: &[&str]) -> Result<(), Error>;

    /// Remove every key
    fn clear(&self) -> Result<(), Error>;
}

/// In-memory storage. Lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.read().map_err(Error::storage)?;
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, items: &[(&str, String)]) -> Result<(), Error> {
        let mut entries = self.entries.write().map_err(Error::storage)?;
        for (key, value) in items {
            entries.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), Error> {
        let mut entries = self.entries.write().map_err(Error::storage)?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        self.entries.write().map_err(Error::storage)?.clear();
        Ok(())
    }
}

/// Storage backed by a JSON object file. Survives restarts.
///
/// The whole file is rewritten on every mutation. Other processes sharing the
/// same file are not coordinated with.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    /// Open the file at `path`, starting empty if it does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => HashMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(Error::storage(format!("{}: {}", path.display(), err))),
        };
        debug!("Opened session storage at {} ({} keys)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::storage(format!("{}: {}", parent.display(), e)))?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)
            .map_err(|e| Error::storage(format!("{}: {}", self.path.display(), e)))
    }

    /// Apply `change` to a copy, write it out, then swap it in. Memory is
    /// left untouched when the write fails.
    fn update(&self, change: impl FnOnce(&mut HashMap<String, String>)) -> Result<(), Error> {
        let mut entries = self.entries.write().map_err(Error::storage)?;
        let mut next = entries.clone();
        change(&mut next);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.read().map_err(Error::storage)?;
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, items: &[(&str, String)]) -> Result<(), Error> {
        self.update(|entries| {
            for (key, value) in items {
                entries.insert(key.to_string(), value.clone());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), Error> {
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }

    fn clear(&self) -> Result<(), Error> {
        self.update(HashMap::clear)
    }
}
