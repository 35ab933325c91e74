//! SecretStore implementations.
//!
//! Both guard the map with an `RwLock`: intake validation takes read locks,
//! administrative updates take the write lock. `FileSecretStore` only holds
//! the write lock long enough to insert and snapshot; the file is written
//! under a separate persist mutex, so updates reach the disk in order and a
//! slow fsync never stalls readers.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tempfile::NamedTempFile;
use tracing::info;

use crate::ports::{SecretStore, SecretStoreError};

type SecretMap = HashMap<String, String>;

fn read(map: &RwLock<SecretMap>) -> RwLockReadGuard<'_, SecretMap> {
    map.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(map: &RwLock<SecretMap>) -> RwLockWriteGuard<'_, SecretMap> {
    map.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<SecretMap>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, email: &str, secret: &str) -> Self {
        write(&self.secrets).insert(email.to_string(), secret.to_string());
        self
    }
}

impl SecretStore for InMemorySecretStore {
    fn get(&self, email: &str) -> Option<String> {
        read(&self.secrets).get(email).cloned()
    }

    fn set(&self, email: &str, secret: &str) -> Result<(), SecretStoreError> {
        write(&self.secrets).insert(email.to_string(), secret.to_string());
        Ok(())
    }
}

/// JSON object `{ "email": "secret", ... }` on disk.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    secrets: RwLock<SecretMap>,
    persisting: Mutex<()>,
}

impl FileSecretStore {
    /// Load `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SecretStoreError> {
        let path = path.into();
        let secrets = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => SecretMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SecretMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), entries = secrets.len(), "secret store loaded");
        Ok(Self {
            path,
            secrets: RwLock::new(secrets),
            persisting: Mutex::new(()),
        })
    }

    /// Write the whole map next to the target, then rename over it.
    fn persist(&self, secrets: &SecretMap) -> Result<(), SecretStoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // sorted keys keep the file diff-friendly
        let sorted: BTreeMap<_, _> = secrets.iter().collect();

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &sorted)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, email: &str) -> Option<String> {
        read(&self.secrets).get(email).cloned()
    }

    fn set(&self, email: &str, secret: &str) -> Result<(), SecretStoreError> {
        let _persisting = self
            .persisting
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let (previous, snapshot) = {
            let mut secrets = write(&self.secrets);
            let previous = secrets.insert(email.to_string(), secret.to_string());
            (previous, secrets.clone())
        };

        if let Err(e) = self.persist(&snapshot) {
            // keep memory and disk in agreement
            let mut secrets = write(&self.secrets);
            match previous {
                Some(old) => secrets.insert(email.to_string(), old),
                None => secrets.remove(email),
            };
            return Err(e);
        }
        Ok(())
    }
}
