//! `coffer-vault` — encrypted credential storage on top of `coffer-crypto-core`.
//!
//! - [`Vault`]: register / unlock / logout and entry CRUD
//! - [`SessionKeyCache`]: the unlocked session's key, owned per vault
//! - [`codec`]: `VaultPayload` <-> AES-256-GCM ciphertext
//! - [`store`]: the key/value persistence substrate

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod codec;
pub mod config;
pub mod entries;
pub mod error;
pub mod session;
pub mod store;
pub mod vault;

pub use codec::{decrypt_vault, encrypt_vault, VaultCiphertext};
pub use config::VaultConfig;
pub use entries::{CredentialEntry, EntryUpdate, NewEntry, VaultPayload};
pub use error::{AuthError, VaultError};
pub use session::SessionKeyCache;
pub use store::{DirStore, KeyValueStore, MemoryStore, SENTINEL_KEY, VAULT_KEY};
pub use vault::Vault;
