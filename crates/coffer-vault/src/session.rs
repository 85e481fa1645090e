//! Session key cache.
//!
//! Holds the derived [`SessionKey`] of the current session behind a
//! `Mutex<Option<_>>`: `None` means locked. The cache is a value, not a
//! global: each [`Vault`](crate::Vault) owns one, and clones of a cache share
//! the same slot. Two independently created caches never observe each
//! other's keys.
//!
//! Readers get an `Arc<SessionKey>`, so a key handed out before `logout`
//! stays valid for the operation that holds it; the key bytes are wiped when
//! the last holder drops it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use coffer_crypto_core::{open_with, AuthSentinel, SessionKey};
use tracing::{debug, info, warn};

use crate::error::AuthError;

/// Shared slot for the active session key.
#[derive(Clone, Default)]
pub struct SessionKeyCache {
    slot: Arc<Mutex<Option<Arc<SessionKey>>>>,
}

impl SessionKeyCache {
    /// An empty (locked) cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify `candidate` against `sentinel` and cache the derived key.
    ///
    /// Any previously cached key is dropped first, so a failed attempt
    /// always leaves the cache locked.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidPassphrase`] if the candidate does not
    /// open the sentinel.
    pub fn unlock(&self, candidate: &[u8], sentinel: &AuthSentinel) -> Result<Arc<SessionKey>, AuthError> {
        self.clear();

        // Argon2id runs outside the lock so readers are never held up by it.
        let Some(key) = open_with(candidate, sentinel) else {
            warn!("unlock rejected: sentinel did not verify");
            return Err(AuthError::InvalidPassphrase);
        };

        let key = Arc::new(key);
        *self.guard() = Some(Arc::clone(&key));
        info!("session key cached");
        Ok(key)
    }

    /// Cache a key that was just derived at registration.
    pub fn establish(&self, key: SessionKey) -> Arc<SessionKey> {
        let key = Arc::new(key);
        *self.guard() = Some(Arc::clone(&key));
        debug!("session key established");
        key
    }

    /// The cached key, or `None` when locked.
    #[must_use]
    pub fn active_key(&self) -> Option<Arc<SessionKey>> {
        self.guard().clone()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.guard().is_none()
    }

    /// Drop the cached key. Safe to call when already locked.
    pub fn logout(&self) {
        if self.clear() {
            info!("session key cleared");
        }
    }

    /// Empty the slot; `true` if a key was present.
    fn clear(&self) -> bool {
        self.guard().take().is_some()
    }

    fn guard(&self) -> MutexGuard<'_, Option<Arc<SessionKey>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SessionKeyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeyCache")
            .field("locked", &self.is_locked())
            .finish()
    }
}
