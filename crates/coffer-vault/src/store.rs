//! Persistence substrate: a small string-keyed byte store.
//!
//! The vault only ever stores two values: the encrypted payload under
//! [`VAULT_KEY`] and the serialized sentinel under [`SENTINEL_KEY`]. Both
//! are opaque bytes to the store.

use std::collections::HashMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Storage key of the encrypted vault payload.
pub const VAULT_KEY: &str = "password_vault";

/// Storage key of the authentication sentinel.
pub const SENTINEL_KEY: &str = "auth_token";

/// Byte-valued key/value storage.
pub trait KeyValueStore {
    /// Value stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the backing medium cannot be read.
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the backing medium rejects the write.
    fn set(&self, key: &str, value: &[u8]) -> io::Result<()>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the backing medium rejects the removal.
    fn delete(&self, key: &str) -> io::Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> io::Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        (**self).delete(key)
    }
}

// ── In-memory store ────────────────────────────────────────────────

/// Process-local store. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    map: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        let map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> io::Result<()> {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        map.remove(key);
        Ok(())
    }
}

// ── Directory store ────────────────────────────────────────────────

/// One file per key inside a directory.
///
/// Writes go to a hidden `.{key}.tmp` file that is renamed over the target,
/// so a crash never leaves a half-written value. Files are owner-only on
/// Unix.
#[derive(Clone, Debug)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Open (creating if needed) the store directory.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &str) -> io::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid store key: {key:?}"),
            ));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.file_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> io::Result<()> {
        let path = self.file_for(key)?;
        let tmp = self.dir.join(format!(".{key}.tmp"));

        fs::write(&tmp, value)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp, &path)
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.file_for(key)?) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
