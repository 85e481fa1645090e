//! Vault configuration, stored as plain JSON next to the vault data.
//!
//! Nothing in here is secret. The file is read before unlock because the
//! KDF costs for a new registration and the minimum passphrase length are
//! needed up front.

use std::fs;
use std::io;
use std::path::Path;

use coffer_crypto_core::{KdfParams, PasswordPolicy};
use serde::{Deserialize, Serialize};
use tracing::warn;

const CONFIG_FILE: &str = "coffer.json";
const CONFIG_TMP: &str = ".coffer.json.tmp";

/// Tunables for registration, unlock and password generation.
///
/// Persisted to `{data_dir}/coffer.json`. Missing fields take their
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    /// Argon2id costs for newly registered vaults. Existing vaults keep the
    /// costs recorded in their sentinel.
    #[serde(default)]
    pub kdf: KdfParams,

    /// Minimum master passphrase length, in characters.
    #[serde(default = "default_min_master_length")]
    pub min_master_length: usize,

    /// Policy used when the caller does not supply one.
    #[serde(default)]
    pub generator: PasswordPolicy,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            min_master_length: default_min_master_length(),
            generator: PasswordPolicy::default(),
        }
    }
}

const fn default_min_master_length() -> usize {
    8
}

impl VaultConfig {
    /// Load from `{data_dir}/coffer.json`.
    ///
    /// A missing file yields the defaults; so does a corrupt one, with a
    /// warning.
    #[must_use]
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(CONFIG_FILE);
        let Ok(contents) = fs::read_to_string(&path) else {
            return Self::default();
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            Self::default()
        })
    }

    /// Write to `{data_dir}/coffer.json` via a temp file and rename.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the directory does not exist or the
    /// file system rejects the write or rename.
    pub fn save(&self, data_dir: &Path) -> io::Result<()> {
        let path = data_dir.join(CONFIG_FILE);
        let tmp = data_dir.join(CONFIG_TMP);

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        fs::write(&tmp, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp, &path)
    }
}
