//! AES-256-GCM sealing shared by the vault codec and the sentinel.
//!
//! - [`seal`] encrypts under a fresh random nonce and returns [`SealedData`]
//! - [`open`] authenticates and decrypts into a [`SecretBuffer`]
//!
//! Callers pass a domain-separation AAD so a blob sealed for one purpose
//! never opens as another.

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use rand::rngs::OsRng;
use rand::RngCore;
use ring::aead;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// AES-256-GCM nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// AES-256-GCM tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// AES-256-GCM key length in bytes.
pub const KEY_LEN: usize = 32;

/// Shortest valid wire encoding: nonce + empty ciphertext + tag.
pub const MIN_SEALED_LEN: usize = NONCE_LEN + TAG_LEN;

/// Nonce, ciphertext and tag of one sealing.
///
/// Wire format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
#[must_use = "sealed data must be persisted to be useful"]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedData {
    /// Random nonce, unique per call to [`seal`].
    pub nonce: [u8; NONCE_LEN],
    /// Same length as the plaintext.
    pub ciphertext: Vec<u8>,
    /// GCM authentication tag.
    pub tag: [u8; TAG_LEN],
}

impl SealedData {
    /// Encode as `nonce || ciphertext || tag`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let capacity = MIN_SEALED_LEN.saturating_add(self.ciphertext.len());
        let mut out = Vec::with_capacity(capacity);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        out
    }

    /// Decode `nonce || ciphertext || tag`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::AuthenticationFailed` if `bytes` is shorter than
    /// [`MIN_SEALED_LEN`]; a truncated blob cannot be told apart from a
    /// corrupted one.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < MIN_SEALED_LEN {
            return Err(CryptoError::AuthenticationFailed);
        }

        let (nonce_part, rest) = bytes.split_at(NONCE_LEN);
        let ct_len = rest
            .len()
            .checked_sub(TAG_LEN)
            .ok_or(CryptoError::AuthenticationFailed)?;
        let (ct_part, tag_part) = rest.split_at(ct_len);

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_part);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(tag_part);

        Ok(Self {
            nonce,
            ciphertext: ct_part.to_vec(),
            tag,
        })
    }
}

fn aead_key(key: &[u8]) -> Result<aead::LessSafeKey, CryptoError> {
    if key.len() != KEY_LEN {
        return Err(CryptoError::InvalidKeyMaterial(format!(
            "invalid key length: {} bytes (expected {KEY_LEN})",
            key.len()
        )));
    }
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, key)
        .map_err(|_| CryptoError::Encryption("failed to create AES-256-GCM key".into()))?;
    Ok(aead::LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under `key` with a fresh `OsRng` nonce.
///
/// Two calls with identical inputs produce different output.
///
/// # Errors
///
/// Returns `CryptoError::InvalidKeyMaterial` for a key that is not 32 bytes,
/// `CryptoError::Encryption` if sealing fails.
pub fn seal(plaintext: &[u8], key: &[u8], aad: &[u8]) -> Result<SealedData, CryptoError> {
    let sealing_key = aead_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    let Ok(tag) = sealing_key.seal_in_place_separate_tag(nonce, aead::Aad::from(aad), &mut in_out)
    else {
        in_out.zeroize();
        return Err(CryptoError::Encryption("AES-256-GCM sealing failed".into()));
    };

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_ref());

    Ok(SealedData {
        nonce: nonce_bytes,
        ciphertext: in_out,
        tag: tag_bytes,
    })
}

/// Authenticate and decrypt `sealed`.
///
/// # Errors
///
/// Returns `CryptoError::InvalidKeyMaterial` for a key that is not 32 bytes,
/// `CryptoError::AuthenticationFailed` for a wrong key, wrong AAD or any
/// modification of nonce, ciphertext or tag.
pub fn open(sealed: &SealedData, key: &[u8], aad: &[u8]) -> Result<SecretBuffer, CryptoError> {
    let opening_key = aead_key(key)?;
    let nonce = aead::Nonce::assume_unique_for_key(sealed.nonce);

    let mut ct_tag = Vec::with_capacity(sealed.ciphertext.len().saturating_add(TAG_LEN));
    ct_tag.extend_from_slice(&sealed.ciphertext);
    ct_tag.extend_from_slice(&sealed.tag);

    let result = opening_key
        .open_in_place(nonce, aead::Aad::from(aad), &mut ct_tag)
        .map(|plaintext| SecretBuffer::new(plaintext))
        .map_err(|_| CryptoError::AuthenticationFailed);
    ct_tag.zeroize();
    result
}
