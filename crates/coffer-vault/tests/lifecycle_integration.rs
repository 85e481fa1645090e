#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Integration tests for the register / unlock / lock cycle.

use std::sync::Arc;
use std::thread;

use coffer_crypto_core::{verify, AuthSentinel, KdfParams};
use coffer_vault::{
    AuthError, DirStore, KeyValueStore, MemoryStore, NewEntry, SessionKeyCache, Vault,
    VaultConfig, VaultError, SENTINEL_KEY, VAULT_KEY,
};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn fast_config() -> VaultConfig {
    VaultConfig {
        kdf: KdfParams {
            m_cost: 32,
            t_cost: 1,
            p_cost: 1,
        },
        ..VaultConfig::default()
    }
}

// ---------------------------------------------------------------------------
// End-to-end
// ---------------------------------------------------------------------------

#[test]
fn register_add_lock_unlock_retrieves_entry() {
    let vault = Vault::new(MemoryStore::new(), fast_config());
    vault.register("correct-horse-1").unwrap();

    let added = vault.add_entry(NewEntry::new("Mail", "x")).unwrap();
    vault.logout();
    assert!(!vault.is_unlocked());

    vault.unlock("correct-horse-1").unwrap();
    let entries = vault.list_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id(), added.id());
    assert_eq!(entries[0].title, "Mail");
    assert_eq!(entries[0].secret, "x");
}

#[test]
fn wrong_passphrase_is_rejected() {
    let vault = Vault::new(MemoryStore::new(), fast_config());
    vault.register("correct-horse-1").unwrap();
    vault.logout();

    let err = vault.unlock("wrong-pass").unwrap_err();
    assert!(matches!(err, VaultError::Auth(AuthError::InvalidPassphrase)));
    assert!(matches!(vault.list_entries(), Err(VaultError::Locked)));
}

#[test]
fn stored_sentinel_verifies_only_the_master_passphrase() {
    let store = MemoryStore::new();
    let vault = Vault::new(store.clone(), fast_config());
    vault.register("correct-horse-1").unwrap();

    let sentinel = AuthSentinel::from_bytes(&store.get(SENTINEL_KEY).unwrap().unwrap()).unwrap();
    assert!(verify(b"correct-horse-1", &sentinel));
    assert!(!verify(b"wrong-pass", &sentinel));
}

#[test]
fn stored_blobs_do_not_leak_plaintext() {
    let store = MemoryStore::new();
    let vault = Vault::new(store.clone(), fast_config());
    vault.register("correct-horse-1").unwrap();
    vault
        .add_entry(NewEntry::new("Mail", "super-secret-value"))
        .unwrap();

    for key in [VAULT_KEY, SENTINEL_KEY] {
        let bytes = store.get(key).unwrap().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("super-secret-value"));
        assert!(!text.contains("correct-horse-1"));
    }
}

// ---------------------------------------------------------------------------
// Session isolation
// ---------------------------------------------------------------------------

#[test]
fn separate_vaults_have_separate_sessions() {
    let store = MemoryStore::new();
    let a = Vault::new(store.clone(), fast_config());
    let b = Vault::new(store, fast_config());

    a.register("correct-horse-1").unwrap();
    assert!(a.is_unlocked());
    assert!(!b.is_unlocked());

    b.unlock("correct-horse-1").unwrap();
    a.logout();
    assert!(b.is_unlocked());
    assert_eq!(b.list_entries().unwrap().len(), 0);
}

#[test]
fn shared_session_cache_unlocks_both_handles() {
    let store = MemoryStore::new();
    let session = SessionKeyCache::new();
    let a = Vault::with_session(store.clone(), fast_config(), session.clone());
    let b = Vault::with_session(store, fast_config(), session);

    a.register("correct-horse-1").unwrap();
    assert!(b.is_unlocked());
    b.logout();
    assert!(!a.is_unlocked());
}

#[test]
fn concurrent_adds_are_not_lost() {
    let vault = Arc::new(Vault::new(MemoryStore::new(), fast_config()));
    vault.register("correct-horse-1").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let vault = Arc::clone(&vault);
            thread::spawn(move || {
                vault
                    .add_entry(NewEntry::new(format!("site-{i}"), "pw"))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(vault.list_entries().unwrap().len(), 8);
}

// ---------------------------------------------------------------------------
// Directory-backed persistence
// ---------------------------------------------------------------------------

#[test]
fn vault_survives_reopen_from_disk() {
    let dir = TempDir::new().unwrap();
    let config = fast_config();
    config.save(dir.path()).unwrap();

    let id = {
        let vault = Vault::new(
            DirStore::open(dir.path()).unwrap(),
            VaultConfig::load(dir.path()),
        );
        vault.register("correct-horse-1").unwrap();
        vault
            .add_entry(NewEntry {
                title: "Mail".into(),
                username: "alice".into(),
                secret: "x".into(),
                url: "https://mail.example.com".into(),
                notes: String::new(),
            })
            .unwrap()
            .id()
            .to_string()
    };

    let reopened = Vault::new(
        DirStore::open(dir.path()).unwrap(),
        VaultConfig::load(dir.path()),
    );
    assert!(reopened.is_registered().unwrap());
    assert!(!reopened.is_unlocked());
    assert!(reopened.unlock("wrong-pass").is_err());

    reopened.unlock("correct-horse-1").unwrap();
    let entry = reopened.get_entry(&id).unwrap();
    assert_eq!(entry.username, "alice");
    assert_eq!(reopened.search_entries("example").unwrap().len(), 1);
}

#[test]
fn reset_clears_disk_state() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(DirStore::open(dir.path()).unwrap(), fast_config());
    vault.register("correct-horse-1").unwrap();
    assert!(dir.path().join(VAULT_KEY).exists());

    vault.reset().unwrap();
    assert!(!dir.path().join(VAULT_KEY).exists());
    assert!(!dir.path().join(SENTINEL_KEY).exists());
    assert!(matches!(
        vault.unlock("correct-horse-1"),
        Err(VaultError::Auth(AuthError::NotRegistered))
    ));
}
