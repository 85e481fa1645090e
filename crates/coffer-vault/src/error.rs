//! Vault error types for `coffer-vault`.

use coffer_crypto_core::{CryptoError, PolicyError};
use thiserror::Error;

/// Unlock failures. Both route the caller back to a passphrase prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The candidate passphrase does not open the stored sentinel.
    #[error("invalid master passphrase")]
    InvalidPassphrase,

    /// No sentinel is stored yet; the vault must be registered first.
    #[error("no vault has been registered")]
    NotRegistered,
}

/// Errors produced by vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Unlock failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Cryptographic failure. `MalformedPayload` here means the stored vault
    /// is corrupt and needs a reset or a backup.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Password generation policy cannot be satisfied.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// The operation needs an unlocked session.
    #[error("vault is locked")]
    Locked,

    /// A sentinel already exists in the store.
    #[error("a vault is already registered")]
    AlreadyRegistered,

    /// Registration passphrase is below the configured minimum.
    #[error("master passphrase must be at least {min} characters")]
    PassphraseTooShort {
        /// Configured minimum length in characters.
        min: usize,
    },

    /// No entry with this id.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// Entry fields rejected (e.g. empty title or secret).
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// Persistence substrate failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
