//! Vault codec: `VaultPayload` <-> authenticated ciphertext.
//!
//! The payload is serialized to a JSON array, sealed with AES-256-GCM under
//! the session key and stored as `nonce || ciphertext || tag`. Every call to
//! [`encrypt_vault`] uses a fresh nonce, so encrypting the same payload twice
//! never yields the same bytes.

use coffer_crypto_core::symmetric::{self, SealedData};
use coffer_crypto_core::{CryptoError, SessionKey};
use zeroize::Zeroize;

use crate::entries::VaultPayload;

/// AAD binding a sealed blob to its role as the vault payload.
const VAULT_AAD: &[u8] = b"coffer-vault-payload-v1";

/// Encrypted vault as stored by the persistence layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultCiphertext(Vec<u8>);

impl VaultCiphertext {
    /// Wrap bytes read from storage. No validation happens until decryption.
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Serialize and seal `payload` under `key`.
///
/// # Errors
///
/// Returns `CryptoError::Encryption` if serialization or sealing fails.
pub fn encrypt_vault(payload: &VaultPayload, key: &SessionKey) -> Result<VaultCiphertext, CryptoError> {
    let mut json = serde_json::to_vec(payload)
        .map_err(|e| CryptoError::Encryption(format!("payload encoding failed: {e}")))?;
    let sealed = symmetric::seal(&json, key.expose(), VAULT_AAD);
    json.zeroize();
    Ok(VaultCiphertext(sealed?.to_bytes()))
}

/// Authenticate, decrypt and parse a stored vault.
///
/// # Errors
///
/// - `CryptoError::AuthenticationFailed` for a wrong key, a truncated blob or
///   any tampering
/// - `CryptoError::MalformedPayload` if the plaintext authenticates but is not
///   a valid entry list (including duplicate entry ids)
pub fn decrypt_vault(ciphertext: &VaultCiphertext, key: &SessionKey) -> Result<VaultPayload, CryptoError> {
    let sealed = SealedData::from_bytes(ciphertext.as_bytes())?;
    let plaintext = symmetric::open(&sealed, key.expose(), VAULT_AAD)?;

    let payload: VaultPayload = serde_json::from_slice(plaintext.expose())
        .map_err(|e| CryptoError::MalformedPayload(format!("vault payload: {e}")))?;

    if let Some(id) = payload.duplicate_id() {
        return Err(CryptoError::MalformedPayload(format!(
            "vault payload: duplicate entry id {id}"
        )));
    }
    Ok(payload)
}

/// Seal arbitrary plaintext with the vault AAD.
#[cfg(test)]
pub(crate) fn seal_raw(plaintext: &[u8], key: &SessionKey) -> VaultCiphertext {
    VaultCiphertext(
        symmetric::seal(plaintext, key.expose(), VAULT_AAD)
            .unwrap()
            .to_bytes(),
    )
}
