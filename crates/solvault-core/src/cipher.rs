//! PIN-derived vault encryption
//!
//! PBKDF2-HMAC-SHA256 key derivation and AES-256-GCM authenticated
//! encryption of raw key material. Pure over its inputs plus the OS RNG.

use crate::{Error, Result};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 16;

/// AES-GCM nonce length in bytes
pub const NONCE_LENGTH: usize = 12;

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Encrypted vault blob: `salt || nonce || ciphertext`
///
/// The ciphertext only decrypts under the PIN that produced it; the GCM
/// tag makes tampering and a wrong PIN indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedVault {
    salt: [u8; SALT_LENGTH],
    nonce: [u8; NONCE_LENGTH],
    ciphertext: Vec<u8>,
}

impl EncryptedVault {
    /// Salt used for key derivation
    pub fn salt(&self) -> &[u8; SALT_LENGTH] {
        &self.salt
    }

    /// AES-GCM nonce
    pub fn nonce(&self) -> &[u8; NONCE_LENGTH] {
        &self.nonce
    }

    /// Authenticated ciphertext (including the GCM tag)
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Serialize to base64 for storage
    pub fn to_base64(&self) -> String {
        let mut combined = Vec::with_capacity(SALT_LENGTH + NONCE_LENGTH + self.ciphertext.len());
        combined.extend_from_slice(&self.salt);
        combined.extend_from_slice(&self.nonce);
        combined.extend_from_slice(&self.ciphertext);
        BASE64.encode(combined)
    }

    /// Deserialize from the stored base64 form
    ///
    /// Any malformed blob surfaces as `DecryptionFailed`; the caller
    /// cannot tell corruption apart from a wrong PIN anyway.
    pub fn from_base64(data: &str) -> Result<Self> {
        let combined = BASE64.decode(data).map_err(|_| Error::DecryptionFailed)?;
        if combined.len() <= SALT_LENGTH + NONCE_LENGTH {
            return Err(Error::DecryptionFailed);
        }

        let mut salt = [0u8; SALT_LENGTH];
        salt.copy_from_slice(&combined[..SALT_LENGTH]);
        let mut nonce = [0u8; NONCE_LENGTH];
        nonce.copy_from_slice(&combined[SALT_LENGTH..SALT_LENGTH + NONCE_LENGTH]);

        Ok(Self {
            salt,
            nonce,
            ciphertext: combined[SALT_LENGTH + NONCE_LENGTH..].to_vec(),
        })
    }
}

/// Derive the 256-bit vault encryption key from a PIN and salt
pub fn derive_key(pin: &str, salt: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2_hmac::<Sha256>(pin.as_bytes(), salt, PBKDF2_ITERATIONS, &mut *key);
    key
}

/// Encrypt key material under a PIN
///
/// Every call draws a fresh salt and nonce, even for identical inputs:
/// the salt changes the derived key and a nonce must never repeat under
/// one key.
pub fn encrypt(material: &[u8], pin: &str) -> Result<EncryptedVault> {
    let mut salt = [0u8; SALT_LENGTH];
    OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(pin, &salt);
    let cipher = Aes256Gcm::new(key.as_ref().into());
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, material)
        .map_err(|e| Error::Crypto(e.to_string()))?;

    Ok(EncryptedVault {
        salt,
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypt a vault under a PIN
///
/// Tag mismatch and malformed blobs surface as the single opaque
/// `DecryptionFailed`.
pub fn decrypt(vault: &EncryptedVault, pin: &str) -> Result<Zeroizing<Vec<u8>>> {
    let key = derive_key(pin, &vault.salt);
    let cipher = Aes256Gcm::new(key.as_ref().into());
    let nonce = Nonce::from_slice(&vault.nonce);

    cipher
        .decrypt(nonce, vault.ciphertext.as_slice())
        .map(Zeroizing::new)
        .map_err(|_| Error::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let material = [7u8; 64];
        let vault = encrypt(&material, "1234").unwrap();
        let decrypted = decrypt(&vault, "1234").unwrap();
        assert_eq!(&decrypted[..], &material[..]);
    }

    #[test]
    fn test_wrong_pin_fails_opaquely() {
        let vault = encrypt(&[7u8; 64], "1234").unwrap();
        assert!(matches!(
            decrypt(&vault, "4321"),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails_opaquely() {
        let vault = encrypt(&[7u8; 64], "1234").unwrap();
        let mut encoded = BASE64.decode(vault.to_base64()).unwrap();
        let last = encoded.len() - 1;
        encoded[last] ^= 0x01;
        let tampered = EncryptedVault::from_base64(&BASE64.encode(encoded)).unwrap();
        assert!(matches!(
            decrypt(&tampered, "1234"),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn test_fresh_salt_and_nonce_every_call() {
        let material = [7u8; 64];
        let a = encrypt(&material, "1234").unwrap();
        let b = encrypt(&material, "1234").unwrap();
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.ciphertext(), b.ciphertext());
    }

    #[test]
    fn test_base64_roundtrip() {
        let vault = encrypt(&[7u8; 64], "1234").unwrap();
        let restored = EncryptedVault::from_base64(&vault.to_base64()).unwrap();
        assert_eq!(vault, restored);
        let decrypted = decrypt(&restored, "1234").unwrap();
        assert_eq!(&decrypted[..], &[7u8; 64]);
    }

    #[test]
    fn test_malformed_blob_is_decryption_failed() {
        assert!(matches!(
            EncryptedVault::from_base64("not base64!!!"),
            Err(Error::DecryptionFailed)
        ));
        // Valid base64 but too short to hold salt + nonce
        assert!(matches!(
            EncryptedVault::from_base64(&BASE64.encode([0u8; 20])),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        let salt = [3u8; SALT_LENGTH];
        assert_eq!(derive_key("1234", &salt), derive_key("1234", &salt));
        assert_ne!(derive_key("1234", &salt), derive_key("1235", &salt));
    }
}
