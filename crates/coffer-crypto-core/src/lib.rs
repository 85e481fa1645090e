//! `coffer-crypto-core` — cryptographic engine of the Coffer vault.
//!
//! Pure computation only: no I/O, no async, no global state. Persistence and
//! session ownership live in `coffer-vault`.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod kdf;
pub mod symmetric;

pub mod sentinel;

pub mod password;
pub mod strength;

pub use error::{CryptoError, PolicyError};
pub use kdf::{KdfParams, KdfPreset, KeyDerivation, SessionKey, SALT_LEN, SESSION_KEY_LEN};
pub use memory::{SecretBuffer, SecretBytes};
pub use password::{generate, CharClass, PasswordPolicy, MAX_POLICY_LENGTH};
pub use sentinel::{create_sentinel, open_with, verify, AuthSentinel, SENTINEL_PLAINTEXT};
pub use strength::{assess, score, StrengthLabel};
pub use symmetric::{open, seal, SealedData};
