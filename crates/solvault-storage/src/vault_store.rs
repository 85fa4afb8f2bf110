//! Persistence for the encrypted vault and small config values
//!
//! Pure storage: serialize, deserialize, presence checks. No cryptography
//! happens here; the blob is opaque to this layer.

use crate::{Database, Result};
use solvault_core::EncryptedVault;
use std::sync::Arc;
use tracing::debug;

/// Encrypted vault blob (base64)
const KEY_ENCRYPTED_WALLET: &str = "encrypted_wallet";
/// Present with value "true" when a wallet is stored
const KEY_HAS_WALLET: &str = "has_wallet";
/// Present with value "true" once a PIN has been configured
const KEY_PIN_CONFIGURED: &str = "pin_configured";
/// PIN verification hash (hex)
const KEY_PIN_HASH: &str = "pin_hash";
/// RPC endpoint URL override
const KEY_CONNECTION_ENDPOINT: &str = "connection_endpoint";
/// Pre-encryption wallet format (JSON byte array), kept only so
/// migration can detect and upgrade it
const KEY_LEGACY_WALLET: &str = "solana_wallet_keypair";

/// Default RPC endpoint when none has been saved
pub const DEFAULT_ENDPOINT: &str = "https://api.mainnet-beta.solana.com";

/// Store for the encrypted vault, PIN record, and connection settings
#[derive(Clone)]
pub struct VaultStore {
    db: Arc<Database>,
}

impl VaultStore {
    /// Create over an open database
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // Encrypted vault
    // ------------------------------------------------------------------

    /// Persist the encrypted vault and set the has-wallet marker
    pub fn save_vault(&self, vault: &EncryptedVault) -> Result<()> {
        self.db.set(KEY_ENCRYPTED_WALLET, &vault.to_base64())?;
        self.db.set(KEY_HAS_WALLET, "true")?;
        debug!("Encrypted vault saved");
        Ok(())
    }

    /// Load the encrypted vault, if one is stored
    pub fn load_vault(&self) -> Result<Option<EncryptedVault>> {
        match self.db.get(KEY_ENCRYPTED_WALLET)? {
            Some(blob) => {
                let vault = EncryptedVault::from_base64(&blob)
                    .map_err(|_| crate::Error::Corrupt("encrypted vault blob".to_string()))?;
                Ok(Some(vault))
            }
            None => Ok(None),
        }
    }

    /// Check whether any wallet is stored (encrypted or legacy)
    pub fn wallet_exists(&self) -> Result<bool> {
        Ok(self.db.get(KEY_HAS_WALLET)?.as_deref() == Some("true")
            || self.db.contains(KEY_LEGACY_WALLET)?)
    }

    /// Remove the stored wallet (encrypted blob, marker, legacy artifact)
    pub fn clear_wallet(&self) -> Result<()> {
        self.db.delete(KEY_ENCRYPTED_WALLET)?;
        self.db.delete(KEY_HAS_WALLET)?;
        self.db.delete(KEY_LEGACY_WALLET)?;
        debug!("Stored wallet cleared");
        Ok(())
    }

    // ------------------------------------------------------------------
    // PIN record
    // ------------------------------------------------------------------

    /// Persist the PIN record
    pub fn save_pin_hash(&self, hash_hex: &str) -> Result<()> {
        self.db.set(KEY_PIN_HASH, hash_hex)?;
        self.db.set(KEY_PIN_CONFIGURED, "true")?;
        Ok(())
    }

    /// Stored verification hash, if a PIN has been configured
    pub fn pin_hash(&self) -> Result<Option<String>> {
        self.db.get(KEY_PIN_HASH)
    }

    /// Check whether a PIN has been configured
    pub fn pin_configured(&self) -> Result<bool> {
        Ok(self.db.get(KEY_PIN_CONFIGURED)?.as_deref() == Some("true"))
    }

    /// Remove the PIN record
    pub fn clear_pin(&self) -> Result<()> {
        self.db.delete(KEY_PIN_HASH)?;
        self.db.delete(KEY_PIN_CONFIGURED)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Legacy wallet (migration source)
    // ------------------------------------------------------------------

    /// Raw legacy secret-key value (JSON byte array), if present
    pub fn legacy_secret(&self) -> Result<Option<String>> {
        self.db.get(KEY_LEGACY_WALLET)
    }

    /// Check whether the legacy plaintext wallet is present
    pub fn has_legacy_wallet(&self) -> Result<bool> {
        self.db.contains(KEY_LEGACY_WALLET)
    }

    /// Delete the legacy artifact. Callers must only do this after the
    /// re-encrypted vault has been verified by a round-trip decrypt.
    pub fn clear_legacy(&self) -> Result<()> {
        self.db.delete(KEY_LEGACY_WALLET)?;
        debug!("Legacy wallet artifact removed");
        Ok(())
    }

    /// Store a legacy-format secret (tests and fixture setup only)
    pub fn save_legacy_secret(&self, json_array: &str) -> Result<()> {
        self.db.set(KEY_LEGACY_WALLET, json_array)
    }

    // ------------------------------------------------------------------
    // Connection settings
    // ------------------------------------------------------------------

    /// Saved RPC endpoint, or the default
    pub fn endpoint(&self) -> Result<String> {
        Ok(self
            .db
            .get(KEY_CONNECTION_ENDPOINT)?
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()))
    }

    /// Persist the RPC endpoint
    pub fn set_endpoint(&self, endpoint: &str) -> Result<()> {
        self.db.set(KEY_CONNECTION_ENDPOINT, endpoint)
    }

    // ------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------

    /// Wipe everything: wallet, PIN record, settings stay untouched
    /// except where they describe the wiped wallet
    pub fn reset_all(&self) -> Result<()> {
        self.clear_wallet()?;
        self.clear_pin()?;
        Ok(())
    }
}
