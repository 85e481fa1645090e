#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Integration tests for key derivation, sealing and the authentication sentinel.

use coffer_crypto_core::kdf::{KdfParams, KeyDerivation, SessionKey};
use coffer_crypto_core::sentinel::{create_sentinel, open_with, verify, AuthSentinel};
use coffer_crypto_core::symmetric::{open, seal, SealedData};
use proptest::prelude::*;

const FAST: KdfParams = KdfParams {
    m_cost: 32,
    t_cost: 1,
    p_cost: 1,
};

fn register(passphrase: &str) -> (SessionKey, Vec<u8>) {
    let derivation = KeyDerivation::generate(FAST);
    let key = SessionKey::derive(passphrase.as_bytes(), &derivation).unwrap();
    let stored = create_sentinel(&key).unwrap().to_bytes().unwrap();
    (key, stored)
}

#[test]
fn stored_sentinel_verifies_after_reload() {
    let (_, stored) = register("correct-horse-1");
    let sentinel = AuthSentinel::from_bytes(&stored).unwrap();
    assert!(verify(b"correct-horse-1", &sentinel));
    assert!(!verify(b"wrong-pass", &sentinel));
}

#[test]
fn reopened_key_decrypts_data_sealed_at_registration() {
    let (key, stored) = register("correct-horse-1");
    let sealed = seal(b"[{\"title\":\"Mail\"}]", key.expose(), b"app").unwrap();
    let wire = sealed.to_bytes();
    drop(key);

    let sentinel = AuthSentinel::from_bytes(&stored).unwrap();
    let key = open_with(b"correct-horse-1", &sentinel).unwrap();
    let restored = SealedData::from_bytes(&wire).unwrap();
    let plaintext = open(&restored, key.expose(), b"app").unwrap();
    assert_eq!(plaintext.expose(), b"[{\"title\":\"Mail\"}]");
}

#[test]
fn sentinel_does_not_contain_passphrase() {
    let (_, stored) = register("correct-horse-1");
    let text = String::from_utf8_lossy(&stored);
    assert!(!text.contains("correct-horse-1"));
    assert!(!text.contains("authenticated"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// A sentinel created for one passphrase never accepts a different one.
    #[test]
    fn distinct_passphrases_never_verify(
        a in "[ -~]{1,24}",
        b in "[ -~]{1,24}",
    ) {
        prop_assume!(a != b);
        let derivation = KeyDerivation::generate(FAST);
        let key = SessionKey::derive(a.as_bytes(), &derivation).unwrap();
        let sentinel = create_sentinel(&key).unwrap();
        prop_assert!(verify(a.as_bytes(), &sentinel));
        prop_assert!(!verify(b.as_bytes(), &sentinel));
    }
}
