//! Property-based tests for solvault-core
//!
//! Uses proptest to verify cipher and key invariants across randomized inputs

use proptest::prelude::*;
use solvault_core::{cipher, Keypair, PinHash};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Generate valid PINs (4-8 digits)
fn pin_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9]{4,8}").unwrap()
}

/// Generate key material of realistic sizes
fn material_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 32..=96)
}

// ============================================================================
// Cipher Properties
// ============================================================================

proptest! {
    /// Property: decrypt(encrypt(m, pin), pin) == m
    #[test]
    fn prop_roundtrip(material in material_strategy(), pin in pin_strategy()) {
        let vault = cipher::encrypt(&material, &pin).expect("encrypt");
        let decrypted = cipher::decrypt(&vault, &pin).expect("decrypt");
        prop_assert_eq!(&decrypted[..], &material[..]);
    }

    /// Property: a different PIN never decrypts the vault
    #[test]
    fn prop_wrong_pin_rejected(
        material in material_strategy(),
        pin1 in pin_strategy(),
        pin2 in pin_strategy()
    ) {
        prop_assume!(pin1 != pin2);
        let vault = cipher::encrypt(&material, &pin1).expect("encrypt");
        prop_assert!(cipher::decrypt(&vault, &pin2).is_err());
    }

    /// Property: repeated encryption never reuses a salt or nonce
    #[test]
    fn prop_salt_nonce_uniqueness(material in material_strategy(), pin in pin_strategy()) {
        let a = cipher::encrypt(&material, &pin).expect("encrypt");
        let b = cipher::encrypt(&material, &pin).expect("encrypt");
        prop_assert_ne!(a.salt(), b.salt());
        prop_assert_ne!(a.nonce(), b.nonce());
    }

    /// Property: the stored base64 form roundtrips losslessly
    #[test]
    fn prop_base64_roundtrip(material in material_strategy(), pin in pin_strategy()) {
        let vault = cipher::encrypt(&material, &pin).expect("encrypt");
        let restored = cipher::EncryptedVault::from_base64(&vault.to_base64()).expect("parse");
        prop_assert_eq!(vault, restored);
    }
}

// ============================================================================
// PIN Hash Properties
// ============================================================================

proptest! {
    /// Property: a PIN always verifies against its own hash, and the hex
    /// form survives storage
    #[test]
    fn prop_pin_hash_verify(pin in pin_strategy()) {
        let hash = PinHash::compute(&pin);
        prop_assert!(hash.verify(&pin));

        let reloaded = PinHash::from_hex(hash.as_hex().to_string());
        prop_assert!(reloaded.verify(&pin));
    }

    /// Property: distinct PINs never share a verification hash
    #[test]
    fn prop_pin_hash_distinct(pin1 in pin_strategy(), pin2 in pin_strategy()) {
        prop_assume!(pin1 != pin2);
        let hash = PinHash::compute(&pin1);
        prop_assert!(!hash.verify(&pin2));
    }

    /// Property: the verification hash never equals the vault key derived
    /// with the vault's own salt (independent domain separation)
    #[test]
    fn prop_pin_hash_vault_key_independence(pin in pin_strategy()) {
        let hash_bytes = hex::decode(PinHash::compute(&pin).as_hex()).unwrap();
        let vault = cipher::encrypt(&[1u8; 64], &pin).expect("encrypt");
        let key = cipher::derive_key(&pin, vault.salt());
        prop_assert_ne!(&hash_bytes[..], &key[..]);
    }
}

// ============================================================================
// Keypair Properties
// ============================================================================

proptest! {
    /// Property: encrypting a keypair's secret bytes and decrypting them
    /// recovers the same public key
    #[test]
    fn prop_keypair_vault_roundtrip(pin in pin_strategy()) {
        let keypair = Keypair::generate();
        let secret = keypair.to_secret_bytes();

        let vault = cipher::encrypt(&secret[..], &pin).expect("encrypt");
        let decrypted = cipher::decrypt(&vault, &pin).expect("decrypt");
        let restored = Keypair::from_secret_bytes(&decrypted).expect("restore");

        prop_assert_eq!(keypair.pubkey(), restored.pubkey());
    }
}
