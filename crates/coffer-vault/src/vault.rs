//! The vault facade: registration, unlock, lock and entry management.
//!
//! A [`Vault`] ties together a [`KeyValueStore`], a [`SessionKeyCache`] and
//! a [`VaultConfig`]. The store holds two opaque blobs, the sentinel and
//! the encrypted payload; the plaintext payload only exists for the
//! duration of a single operation.
//!
//! Every entry operation is a full load, modify, encrypt and store cycle
//! under the session key. Mutations on one `Vault` are serialized so
//! concurrent writers cannot lose each other's updates.

use std::sync::{Mutex, PoisonError};

use coffer_crypto_core::{
    create_sentinel, password, AuthSentinel, KeyDerivation, PasswordPolicy, SessionKey,
};
use tracing::{debug, info, warn};

use crate::codec::{decrypt_vault, encrypt_vault, VaultCiphertext};
use crate::config::VaultConfig;
use crate::entries::{CredentialEntry, EntryUpdate, NewEntry, VaultPayload};
use crate::error::{AuthError, VaultError};
use crate::session::SessionKeyCache;
use crate::store::{KeyValueStore, SENTINEL_KEY, VAULT_KEY};

/// A password-encrypted credential vault over a key/value store.
pub struct Vault<S> {
    store: S,
    session: SessionKeyCache,
    config: VaultConfig,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> Vault<S> {
    /// A vault with its own, initially locked, session cache.
    pub fn new(store: S, config: VaultConfig) -> Self {
        Self::with_session(store, config, SessionKeyCache::new())
    }

    /// A vault sharing an existing session cache.
    pub fn with_session(store: S, config: VaultConfig, session: SessionKeyCache) -> Self {
        Self {
            store,
            session,
            config,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn session(&self) -> &SessionKeyCache {
        &self.session
    }

    #[must_use]
    pub const fn config(&self) -> &VaultConfig {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Whether a sentinel is stored.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Io` if the store cannot be read.
    pub fn is_registered(&self) -> Result<bool, VaultError> {
        Ok(self.store.get(SENTINEL_KEY)?.is_some())
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        !self.session.is_locked()
    }

    // ── Session lifecycle ──────────────────────────────────────────

    /// Create a new vault protected by `passphrase` and unlock it.
    ///
    /// Stores an empty encrypted payload first and the sentinel last, so a
    /// registration interrupted half-way leaves the vault unregistered.
    ///
    /// # Errors
    ///
    /// - `VaultError::PassphraseTooShort` below `config.min_master_length`
    /// - `VaultError::AlreadyRegistered` if a sentinel exists
    /// - `VaultError::Crypto` if derivation or sealing fails
    /// - `VaultError::Io` on store failures
    pub fn register(&self, passphrase: &str) -> Result<(), VaultError> {
        let min = self.config.min_master_length;
        if passphrase.chars().count() < min {
            return Err(VaultError::PassphraseTooShort { min });
        }

        let _guard = self.lock_writes();
        if self.is_registered()? {
            return Err(VaultError::AlreadyRegistered);
        }

        let derivation = KeyDerivation::generate(self.config.kdf.clone());
        let key = SessionKey::derive(passphrase.as_bytes(), &derivation)?;
        let sentinel = create_sentinel(&key)?;

        self.write_payload(&VaultPayload::new(), &key)?;
        self.store.set(SENTINEL_KEY, &sentinel.to_bytes()?)?;
        self.session.establish(key);

        info!(
            m_cost = derivation.params.m_cost,
            t_cost = derivation.params.t_cost,
            "vault registered"
        );
        Ok(())
    }

    /// Verify `passphrase` and cache the session key.
    ///
    /// Any failure leaves the vault locked, including when it was unlocked
    /// before the attempt.
    ///
    /// # Errors
    ///
    /// - `AuthError::NotRegistered` if no sentinel is stored
    /// - `AuthError::InvalidPassphrase` if the passphrase is wrong
    /// - `VaultError::Crypto(MalformedPayload)` if the stored sentinel is
    ///   unreadable
    /// - `VaultError::Io` on store failures
    pub fn unlock(&self, passphrase: &str) -> Result<(), VaultError> {
        self.session.logout();

        let sentinel = self.sentinel()?.ok_or(AuthError::NotRegistered)?;
        self.session.unlock(passphrase.as_bytes(), &sentinel)?;
        info!("vault unlocked");
        Ok(())
    }

    /// Forget the session key. Idempotent.
    pub fn logout(&self) {
        self.session.logout();
        debug!("vault locked");
    }

    /// Delete the stored vault and sentinel and lock.
    ///
    /// This is the only way out of a corrupt vault; all entries are lost.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Io` if the store rejects a deletion.
    pub fn reset(&self) -> Result<(), VaultError> {
        let _guard = self.lock_writes();
        self.session.logout();
        self.store.delete(SENTINEL_KEY)?;
        self.store.delete(VAULT_KEY)?;
        warn!("vault reset: all stored data removed");
        Ok(())
    }

    // ── Payload ────────────────────────────────────────────────────

    /// Decrypt the stored payload.
    ///
    /// A registered vault with no stored payload is initialized empty.
    ///
    /// # Errors
    ///
    /// - `VaultError::Locked` without an active session
    /// - `VaultError::Crypto(AuthenticationFailed)` if the blob was tampered
    ///   with or belongs to another key
    /// - `VaultError::Crypto(MalformedPayload)` if it decrypts to garbage
    /// - `VaultError::Io` on store failures
    pub fn load(&self) -> Result<VaultPayload, VaultError> {
        let key = self.session.active_key().ok_or(VaultError::Locked)?;
        if let Some(payload) = self.stored_payload(&key)? {
            return Ok(payload);
        }

        // Re-check under the write lock: a concurrent writer may have stored
        // a payload since the read above.
        let _guard = self.lock_writes();
        if let Some(payload) = self.stored_payload(&key)? {
            return Ok(payload);
        }
        debug!("no stored payload; initializing empty vault");
        let empty = VaultPayload::new();
        self.write_payload(&empty, &key)?;
        Ok(empty)
    }

    /// Encrypt and store `payload`, replacing the current contents.
    ///
    /// # Errors
    ///
    /// - `VaultError::Locked` without an active session
    /// - `VaultError::Crypto` if sealing fails
    /// - `VaultError::Io` on store failures
    pub fn save(&self, payload: &VaultPayload) -> Result<(), VaultError> {
        let key = self.session.active_key().ok_or(VaultError::Locked)?;
        let _guard = self.lock_writes();
        self.write_payload(payload, &key)
    }

    // ── Entries ────────────────────────────────────────────────────

    /// Add an entry and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// `VaultError::InvalidEntry` for an empty title or secret, plus the
    /// errors of [`Self::load`] and [`Self::save`].
    pub fn add_entry(&self, entry: NewEntry) -> Result<CredentialEntry, VaultError> {
        let added = self.modify(|payload| payload.add(entry).cloned())?;
        debug!(entry_id = %added.id(), "entry added");
        Ok(added)
    }

    /// Merge `update` into the entry `id`.
    ///
    /// # Errors
    ///
    /// `VaultError::EntryNotFound` for an unknown id,
    /// `VaultError::InvalidEntry` if the update blanks a required field,
    /// plus the errors of [`Self::load`] and [`Self::save`].
    pub fn update_entry(&self, id: &str, update: &EntryUpdate) -> Result<CredentialEntry, VaultError> {
        let updated = self.modify(|payload| payload.update(id, update).cloned())?;
        debug!(entry_id = %id, "entry updated");
        Ok(updated)
    }

    /// Remove the entry `id`.
    ///
    /// # Errors
    ///
    /// `VaultError::EntryNotFound` for an unknown id, plus the errors of
    /// [`Self::load`] and [`Self::save`].
    pub fn delete_entry(&self, id: &str) -> Result<(), VaultError> {
        self.modify(|payload| payload.remove(id).map(drop))?;
        debug!(entry_id = %id, "entry deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// `VaultError::EntryNotFound` for an unknown id, plus the errors of
    /// [`Self::load`].
    pub fn get_entry(&self, id: &str) -> Result<CredentialEntry, VaultError> {
        self.load()?
            .get(id)
            .cloned()
            .ok_or_else(|| VaultError::EntryNotFound(id.to_string()))
    }

    /// All entries in insertion order.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn list_entries(&self) -> Result<Vec<CredentialEntry>, VaultError> {
        Ok(self.load()?.entries().to_vec())
    }

    /// Entries whose title, username or url contains `term`, ignoring case.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn search_entries(&self, term: &str) -> Result<Vec<CredentialEntry>, VaultError> {
        let payload = self.load()?;
        Ok(payload.search(term).into_iter().cloned().collect())
    }

    // ── Generator ──────────────────────────────────────────────────

    /// Generate a password with `policy`, or the configured default policy.
    ///
    /// Works while locked.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Policy` if the policy cannot be satisfied.
    pub fn generate_password(&self, policy: Option<&PasswordPolicy>) -> Result<String, VaultError> {
        let policy = policy.unwrap_or(&self.config.generator);
        Ok(password::generate(policy)?)
    }

    // ── Internals ──────────────────────────────────────────────────

    fn sentinel(&self) -> Result<Option<AuthSentinel>, VaultError> {
        self.store
            .get(SENTINEL_KEY)?
            .map(|bytes| AuthSentinel::from_bytes(&bytes))
            .transpose()
            .map_err(VaultError::from)
    }

    /// The decrypted stored payload, or `None` if nothing is stored. Never
    /// writes.
    fn stored_payload(&self, key: &SessionKey) -> Result<Option<VaultPayload>, VaultError> {
        let Some(bytes) = self.store.get(VAULT_KEY)? else {
            return Ok(None);
        };
        let payload = decrypt_vault(&VaultCiphertext::from_bytes(bytes), key)
            .inspect_err(|e| warn!(error = %e, "stored vault did not decrypt"))?;
        Ok(Some(payload))
    }

    fn write_payload(&self, payload: &VaultPayload, key: &SessionKey) -> Result<(), VaultError> {
        let ciphertext = encrypt_vault(payload, key)?;
        self.store.set(VAULT_KEY, ciphertext.as_bytes())?;
        Ok(())
    }

    /// Load, apply `f`, and store the result under one session key.
    /// Nothing is written if `f` fails.
    fn modify<T>(
        &self,
        f: impl FnOnce(&mut VaultPayload) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let key = self.session.active_key().ok_or(VaultError::Locked)?;
        let _guard = self.lock_writes();
        let mut payload = self.stored_payload(&key)?.unwrap_or_default();
        let out = f(&mut payload)?;
        self.write_payload(&payload, &key)?;
        Ok(out)
    }

    fn lock_writes(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
