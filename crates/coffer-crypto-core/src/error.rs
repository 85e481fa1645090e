//! Error types for `coffer-crypto-core`.

use thiserror::Error;

/// Errors produced by key derivation, sealing and opening.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Authentication tag verification failed — wrong key, or the ciphertext
    /// was truncated or tampered with.
    #[error("decryption failed: authentication tag mismatch")]
    AuthenticationFailed,

    /// Decryption succeeded but the plaintext is not a well-formed payload.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Symmetric encryption failure (AES-256-GCM setup or sealing).
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Key derivation failed (Argon2id parameter validation, memory allocation).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Invalid key material (wrong length, corrupted bytes).
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
}

/// A [`PasswordPolicy`](crate::password::PasswordPolicy) that cannot be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The requested length cannot hold one character of every enabled class.
    #[error("password length {length} is too short: at least {required} required")]
    LengthTooShort {
        /// Requested length.
        length: usize,
        /// Minimum length for this policy.
        required: usize,
    },

    /// The requested length exceeds the generator's upper bound.
    #[error("password length {length} exceeds the maximum of {max}")]
    LengthTooLong {
        /// Requested length.
        length: usize,
        /// Maximum supported length.
        max: usize,
    },

    /// No draw satisfied the class-coverage rule within the retry budget.
    #[error("no password satisfied the policy after {0} attempts")]
    RetriesExhausted(usize),
}
