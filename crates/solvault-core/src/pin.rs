//! PIN format validation and verification hashing
//!
//! The verification hash gates session unlock without touching the vault.
//! It uses a fixed domain separator so it can never double as the vault
//! encryption key, which derives through PBKDF2 with its own salt.

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Domain separator mixed into the verification hash
const PIN_VERIFY_DOMAIN: &[u8] = b"solvault_pin_verify_v1";

/// Minimum PIN length
pub const MIN_PIN_LENGTH: usize = 4;

/// Maximum PIN length
pub const MAX_PIN_LENGTH: usize = 8;

/// Validate PIN format: 4-8 ASCII digits
pub fn validate(pin: &str) -> Result<()> {
    if pin.len() < MIN_PIN_LENGTH || pin.len() > MAX_PIN_LENGTH {
        return Err(Error::InvalidPin(format!(
            "PIN must be {}-{} digits",
            MIN_PIN_LENGTH, MAX_PIN_LENGTH
        )));
    }
    if !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidPin("PIN must contain only digits".to_string()));
    }
    Ok(())
}

/// Domain-separated verification hash of a PIN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinHash(String);

impl PinHash {
    /// Compute the verification hash for a PIN
    pub fn compute(pin: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(pin.as_bytes());
        hasher.update(PIN_VERIFY_DOMAIN);
        Self(hex::encode(hasher.finalize()))
    }

    /// Load from the stored hex string
    pub fn from_hex(hash: String) -> Self {
        Self(hash)
    }

    /// Hex string for storage
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Verify a PIN attempt against this hash in constant time
    pub fn verify(&self, pin: &str) -> bool {
        let candidate = Self::compute(pin);
        let stored = match hex::decode(&self.0) {
            Ok(bytes) => bytes,
            // An undecodable stored hash can never match
            Err(_) => return false,
        };
        let attempt = match hex::decode(&candidate.0) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        if stored.len() != attempt.len() {
            return false;
        }
        stored.ct_eq(&attempt).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher;

    #[test]
    fn test_hash_verify() {
        let hash = PinHash::compute("1234");
        assert!(hash.verify("1234"));
        assert!(!hash.verify("4321"));
        assert!(!hash.verify("12345"));
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(PinHash::compute("1234"), PinHash::compute("1234"));
        assert_ne!(PinHash::compute("1234"), PinHash::compute("1235"));
    }

    #[test]
    fn test_corrupt_stored_hash_never_matches() {
        let hash = PinHash::from_hex("zz-not-hex".to_string());
        assert!(!hash.verify("1234"));
    }

    #[test]
    fn test_pin_validation() {
        assert!(validate("1234").is_ok());
        assert!(validate("12345678").is_ok());
        assert!(validate("123").is_err());
        assert!(validate("123456789").is_err());
        assert!(validate("12ab").is_err());
    }

    #[test]
    fn test_verification_hash_independent_of_vault_key() {
        // The verification hash must not equal (or derive) the vault
        // encryption key for any salt the vault could carry.
        let pin = "1234";
        let hash_bytes = hex::decode(PinHash::compute(pin).as_hex()).unwrap();

        let vault = cipher::encrypt(&[9u8; 64], pin).unwrap();
        let vault_key = cipher::derive_key(pin, vault.salt());
        assert_ne!(&hash_bytes[..], &vault_key[..]);

        // Even a degenerate all-zero salt keeps the derivations apart
        let degenerate_key = cipher::derive_key(pin, &[0u8; cipher::SALT_LENGTH]);
        assert_ne!(&hash_bytes[..], &degenerate_key[..]);
    }
}
