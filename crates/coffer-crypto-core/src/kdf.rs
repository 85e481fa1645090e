//! Argon2id derivation of the session key from the master passphrase.
//!
//! The passphrase is never used as key material directly. Registration
//! generates a [`KeyDerivation`] (random salt + cost parameters) which is
//! stored next to the sentinel; every unlock re-derives the same 256-bit
//! [`SessionKey`] from the passphrase and that record.

use std::fmt;

use crate::error::CryptoError;
use crate::memory::SecretBytes;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Derived key length in bytes (AES-256).
pub const SESSION_KEY_LEN: usize = 32;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// 64 MiB in KiB.
const MEMORY_64MB: u32 = 65_536;

/// 256 MiB in KiB.
const MEMORY_256MB: u32 = 262_144;

/// Argon2id cost parameters.
///
/// Units follow the `argon2` crate: `m_cost` is KiB, not bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParams {
    /// Memory cost in kibibytes.
    pub m_cost: u32,
    /// Number of passes.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        KdfPreset::Interactive.params()
    }
}

impl KdfParams {
    /// Reject costs above the [`KdfPreset::Sensitive`] level.
    ///
    /// Stored params are not authenticated, so an edited `mCost` must not
    /// be able to make an unlock attempt allocate without bound.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::KeyDerivation` naming the first cost over its
    /// ceiling.
    pub fn check_ceiling(&self) -> Result<(), CryptoError> {
        let max = KdfPreset::Sensitive.params();
        let over = [
            ("mCost", self.m_cost, max.m_cost),
            ("tCost", self.t_cost, max.t_cost),
            ("pCost", self.p_cost, max.p_cost),
        ]
        .into_iter()
        .find(|&(_, value, ceiling)| value > ceiling);

        match over {
            Some((name, value, ceiling)) => Err(CryptoError::KeyDerivation(format!(
                "{name} {value} exceeds maximum {ceiling}"
            ))),
            None => Ok(()),
        }
    }
}

/// Named Argon2id cost levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KdfPreset {
    /// Unlock on ordinary hardware in well under a second.
    Interactive,
    /// Slower unlock, larger brute-force cost.
    Moderate,
    /// For vaults that are rarely unlocked.
    Sensitive,
}

impl KdfPreset {
    #[must_use]
    pub const fn params(self) -> KdfParams {
        match self {
            Self::Interactive => KdfParams {
                m_cost: MEMORY_64MB,
                t_cost: 3,
                p_cost: 4,
            },
            Self::Moderate => KdfParams {
                m_cost: MEMORY_256MB,
                t_cost: 3,
                p_cost: 4,
            },
            Self::Sensitive => KdfParams {
                m_cost: MEMORY_256MB,
                t_cost: 6,
                p_cost: 4,
            },
        }
    }
}

/// Everything besides the passphrase that determines the session key.
///
/// Not secret; persisted inside the authentication sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDerivation {
    /// Random per-vault salt.
    pub salt: [u8; SALT_LEN],
    /// Argon2id costs used at registration.
    pub params: KdfParams,
}

impl KeyDerivation {
    /// A fresh derivation record with a random salt.
    #[must_use]
    pub fn generate(params: KdfParams) -> Self {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self { salt, params }
    }
}

/// The symmetric key for one unlocked session.
///
/// Carries its [`KeyDerivation`] so a sentinel can be re-created for it.
pub struct SessionKey {
    key: SecretBytes<SESSION_KEY_LEN>,
    derivation: KeyDerivation,
}

impl SessionKey {
    /// Derive the session key for `passphrase`.
    ///
    /// Deterministic: the same passphrase and derivation record always
    /// produce the same key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::KeyDerivation` if the Argon2id parameters are
    /// rejected or the derivation itself fails.
    pub fn derive(passphrase: &[u8], derivation: &KeyDerivation) -> Result<Self, CryptoError> {
        let key = derive(passphrase, &derivation.salt, &derivation.params)?;
        Ok(Self {
            key,
            derivation: derivation.clone(),
        })
    }

    /// Raw AES key bytes.
    #[must_use]
    pub fn expose(&self) -> &[u8; SESSION_KEY_LEN] {
        self.key.expose()
    }

    #[must_use]
    pub const fn derivation(&self) -> &KeyDerivation {
        &self.derivation
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(***)")
    }
}

/// Run Argon2id v1.3 over `passphrase` and `salt`.
///
/// # Errors
///
/// Returns `CryptoError::KeyDerivation` if the salt is shorter than
/// [`SALT_LEN`], the parameters are invalid or above
/// [`KdfParams::check_ceiling`], or hashing fails.
pub fn derive(
    passphrase: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<SecretBytes<SESSION_KEY_LEN>, CryptoError> {
    if salt.len() < SALT_LEN {
        return Err(CryptoError::KeyDerivation(format!(
            "salt too short: {} bytes (minimum {SALT_LEN})",
            salt.len()
        )));
    }
    params.check_ceiling()?;

    let argon2_params = argon2::Params::new(
        params.m_cost,
        params.t_cost,
        params.p_cost,
        Some(SESSION_KEY_LEN),
    )
    .map_err(|e| CryptoError::KeyDerivation(format!("invalid argon2 params: {e}")))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut output = [0u8; SESSION_KEY_LEN];
    if let Err(e) = argon2.hash_password_into(passphrase, salt, &mut output) {
        output.zeroize();
        return Err(CryptoError::KeyDerivation(format!(
            "argon2id derivation failed: {e}"
        )));
    }

    let key = SecretBytes::new(output);
    output.zeroize();
    Ok(key)
}
