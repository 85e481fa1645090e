//! Authentication sentinel: proves a passphrase is correct without storing it.
//!
//! At registration the fixed constant [`SENTINEL_PLAINTEXT`] is sealed under
//! the session key. To check a candidate passphrase, the key is re-derived
//! with the stored [`KeyDerivation`] and the sentinel is opened; only the
//! right passphrase yields the constant.
//!
//! Serialized form (JSON, stored under its own key next to the vault):
//!
//! ```text
//! { "version": 1, "derivation": { "salt": [..], "params": {..} }, "sealed": {..} }
//! ```

use crate::error::CryptoError;
use crate::kdf::{KeyDerivation, SessionKey};
use crate::symmetric::{self, SealedData};
use serde::{Deserialize, Serialize};

/// Plaintext sealed inside every sentinel.
pub const SENTINEL_PLAINTEXT: &[u8] = b"authenticated";

/// Current sentinel format version.
pub const SENTINEL_VERSION: u8 = 1;

/// AAD binding the sealed constant to its purpose.
const SENTINEL_AAD: &[u8] = b"coffer-auth-sentinel-v1";

/// Encrypted marker used to verify a candidate master passphrase.
#[must_use = "the sentinel must be persisted to allow later unlocks"]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSentinel {
    /// Format version.
    pub version: u8,
    /// Salt and Argon2id costs needed to re-derive the session key.
    pub derivation: KeyDerivation,
    /// [`SENTINEL_PLAINTEXT`] sealed under the session key.
    pub sealed: SealedData,
}

impl AuthSentinel {
    /// Serialize for the persistence substrate.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Encryption` if JSON encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        serde_json::to_vec(self)
            .map_err(|e| CryptoError::Encryption(format!("sentinel encoding failed: {e}")))
    }

    /// Parse a stored sentinel.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MalformedPayload` if the bytes are not a sentinel
    /// document, carry an unknown version, or record KDF costs above
    /// [`KdfParams::check_ceiling`](crate::kdf::KdfParams::check_ceiling).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let sentinel: Self = serde_json::from_slice(bytes)
            .map_err(|e| CryptoError::MalformedPayload(format!("invalid sentinel: {e}")))?;
        if sentinel.version != SENTINEL_VERSION {
            return Err(CryptoError::MalformedPayload(format!(
                "unsupported sentinel version {}",
                sentinel.version
            )));
        }
        sentinel
            .derivation
            .params
            .check_ceiling()
            .map_err(|e| CryptoError::MalformedPayload(format!("sentinel derivation: {e}")))?;
        Ok(sentinel)
    }
}

/// Seal the sentinel constant under `key`. Fresh nonce on every call.
///
/// # Errors
///
/// Returns `CryptoError::Encryption` if sealing fails.
pub fn create_sentinel(key: &SessionKey) -> Result<AuthSentinel, CryptoError> {
    let sealed = symmetric::seal(SENTINEL_PLAINTEXT, key.expose(), SENTINEL_AAD)?;
    Ok(AuthSentinel {
        version: SENTINEL_VERSION,
        derivation: key.derivation().clone(),
        sealed,
    })
}

/// Check `candidate` against `sentinel`.
///
/// Any derivation or decryption failure counts as a mismatch.
#[must_use]
pub fn verify(candidate: &[u8], sentinel: &AuthSentinel) -> bool {
    open_with(candidate, sentinel).is_some()
}

/// Like [`verify`], but hands back the derived key on success so the caller
/// does not pay for Argon2id twice.
#[must_use]
pub fn open_with(candidate: &[u8], sentinel: &AuthSentinel) -> Option<SessionKey> {
    let key = SessionKey::derive(candidate, &sentinel.derivation).ok()?;
    let plaintext = symmetric::open(&sentinel.sealed, key.expose(), SENTINEL_AAD).ok()?;
    constant_time_eq(plaintext.expose(), SENTINEL_PLAINTEXT).then_some(key)
}

/// Byte comparison whose running time does not depend on where the inputs
/// differ. The length is public (it is the length of a fixed constant).
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
