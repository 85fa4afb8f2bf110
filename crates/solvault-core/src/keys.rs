//! Ed25519 keypair and public key types
//!
//! The secret-key wire format is the 64-byte `seed || public_key` array
//! used by the ledger's standard tooling; addresses are base58.

use crate::{Error, Result};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Length of a public key in bytes
pub const PUBKEY_LENGTH: usize = 32;

/// Length of the full secret key (seed || public key)
pub const SECRET_KEY_LENGTH: usize = 64;

/// A ledger account address (Ed25519 public key)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pubkey([u8; PUBKEY_LENGTH]);

impl Pubkey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; PUBKEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; PUBKEY_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self)
    }
}

impl FromStr for Pubkey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let decoded = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| Error::InvalidAddress(format!("not base58: {}", e)))?;
        if decoded.len() != PUBKEY_LENGTH {
            return Err(Error::InvalidAddress(format!(
                "expected {} bytes, got {}",
                PUBKEY_LENGTH,
                decoded.len()
            )));
        }
        let mut bytes = [0u8; PUBKEY_LENGTH];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

/// An Ed25519 signing keypair
///
/// At most one live copy exists per process, owned by the unlocked
/// session. Key material is zeroized when the keypair is dropped.
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Reconstruct from the 64-byte `seed || public_key` secret array
    ///
    /// The embedded public key must match the one derived from the seed.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(Error::InvalidKey(format!(
                "expected {} bytes, got {}",
                SECRET_KEY_LENGTH,
                bytes.len()
            )));
        }

        let mut seed = Zeroizing::new([0u8; 32]);
        seed.copy_from_slice(&bytes[..32]);
        let signing = SigningKey::from_bytes(&seed);

        let embedded = VerifyingKey::try_from(&bytes[32..])
            .map_err(|e| Error::InvalidKey(format!("bad public key half: {}", e)))?;
        if signing.verifying_key() != embedded {
            return Err(Error::InvalidKey(
                "public key half does not match the seed".to_string(),
            ));
        }

        Ok(Self { signing })
    }

    /// Parse a secret key from its JSON byte-array form (`[12, 34, ...]`)
    pub fn from_json_array(json: &str) -> Result<Self> {
        let bytes: Zeroizing<Vec<u8>> = Zeroizing::new(
            serde_json::from_str(json)
                .map_err(|_| Error::InvalidKey("expected a JSON array of bytes".to_string()))?,
        );
        Self::from_secret_bytes(&bytes)
    }

    /// Get the public key
    pub fn pubkey(&self) -> Pubkey {
        Pubkey(self.signing.verifying_key().to_bytes())
    }

    /// Export the 64-byte `seed || public_key` secret array
    pub fn to_secret_bytes(&self) -> Zeroizing<[u8; SECRET_KEY_LENGTH]> {
        let mut out = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
        out[..32].copy_from_slice(self.signing.as_bytes());
        out[32..].copy_from_slice(&self.signing.verifying_key().to_bytes());
        out
    }

    /// Export the secret key as a JSON byte array
    pub fn to_json_array(&self) -> Zeroizing<String> {
        let bytes = self.to_secret_bytes();
        let rendered: Vec<String> = bytes.iter().map(|b| b.to_string()).collect();
        Zeroizing::new(format!("[{}]", rendered.join(",")))
    }

    /// Sign a message, returning the base58 signature string
    pub fn sign(&self, message: &[u8]) -> String {
        let signature = self.signing.sign(message);
        bs58::encode(signature.to_bytes()).into_string()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never expose secret material through Debug
        write!(f, "Keypair({})", self.pubkey())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_roundtrip() {
        let keypair = Keypair::generate();
        let bytes = keypair.to_secret_bytes();
        let restored = Keypair::from_secret_bytes(&bytes[..]).unwrap();
        assert_eq!(keypair.pubkey(), restored.pubkey());
    }

    #[test]
    fn test_json_array_roundtrip() {
        let keypair = Keypair::generate();
        let json = keypair.to_json_array();
        let restored = Keypair::from_json_array(&json).unwrap();
        assert_eq!(keypair.pubkey(), restored.pubkey());
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(Keypair::from_secret_bytes(&[0u8; 32]).is_err());
        assert!(Keypair::from_secret_bytes(&[0u8; 65]).is_err());
    }

    #[test]
    fn test_rejects_mismatched_public_half() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        let mut bytes = a.to_secret_bytes();
        bytes[32..].copy_from_slice(b.pubkey().as_bytes());
        assert!(matches!(
            Keypair::from_secret_bytes(&bytes[..]),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_pubkey_base58_roundtrip() {
        let keypair = Keypair::generate();
        let encoded = keypair.pubkey().to_string();
        let decoded: Pubkey = encoded.parse().unwrap();
        assert_eq!(decoded, keypair.pubkey());
    }

    #[test]
    fn test_pubkey_rejects_garbage() {
        assert!("not-an-address!".parse::<Pubkey>().is_err());
        assert!("abc".parse::<Pubkey>().is_err());
    }

    #[test]
    fn test_signatures_verify_under_dalek() {
        use ed25519_dalek::{Signature, Verifier};

        let keypair = Keypair::generate();
        let message = b"transfer 1000 lamports";
        let sig_b58 = keypair.sign(message);
        let sig_bytes = bs58::decode(&sig_b58).into_vec().unwrap();
        let signature = Signature::from_slice(&sig_bytes).unwrap();

        let verifying = VerifyingKey::from_bytes(keypair.pubkey().as_bytes()).unwrap();
        assert!(verifying.verify(message, &signature).is_ok());
    }
}
