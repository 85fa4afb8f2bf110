//! PIN session state machine
//!
//! `Uninitialized -> Locked -> Unlocked -> Locked`, with `Uninitialized`
//! reachable again only through an explicit reset. The cleartext PIN is
//! held only for the lifetime of the unlocked session, in a wiping
//! buffer, and is never persisted.

use parking_lot::RwLock;
use solvault_core::{pin, Error, PinHash, Result};
use solvault_storage::VaultStore;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Where the session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No PIN configured yet; setup required
    Uninitialized,
    /// PIN configured, not entered this session
    Locked,
    /// PIN verified and held in memory
    Unlocked,
}

/// Verifies PINs against the stored record and owns the session PIN
///
/// PIN verification is a local check only. There is deliberately no
/// lockout or backoff after failed attempts: the attacker model is a
/// local device that already holds the ciphertext, so throttling here
/// would only change observable behavior without adding protection.
/// UI-level throttling is the callers' concern.
pub struct SessionAuthenticator {
    store: VaultStore,
    pin: RwLock<Option<Zeroizing<String>>>,
}

impl SessionAuthenticator {
    /// Create over the vault store
    pub fn new(store: VaultStore) -> Self {
        Self {
            store,
            pin: RwLock::new(None),
        }
    }

    /// Current session status
    pub fn status(&self) -> Result<SessionStatus> {
        if !self.store.pin_configured()? {
            return Ok(SessionStatus::Uninitialized);
        }
        if self.pin.read().is_some() {
            Ok(SessionStatus::Unlocked)
        } else {
            Ok(SessionStatus::Locked)
        }
    }

    /// First-time PIN setup
    ///
    /// Only valid before any PIN exists. The new PIN is retained in the
    /// session - there is no vault yet, so the process is effectively
    /// unlocked for wallet creation.
    pub fn setup_pin(&self, new_pin: &str) -> Result<()> {
        pin::validate(new_pin)?;
        if self.store.pin_configured()? {
            return Err(Error::Session(
                "a PIN is already configured; unlock or reset instead".to_string(),
            ));
        }

        let hash = PinHash::compute(new_pin);
        self.store.save_pin_hash(hash.as_hex())?;
        *self.pin.write() = Some(Zeroizing::new(new_pin.to_string()));
        info!("PIN configured");
        Ok(())
    }

    /// Verify a PIN attempt and unlock the session
    pub fn unlock(&self, attempt: &str) -> Result<()> {
        let stored = self
            .store
            .pin_hash()?
            .ok_or_else(|| Error::Session("no PIN configured".to_string()))?;

        if !PinHash::from_hex(stored).verify(attempt) {
            warn!("PIN verification failed");
            return Err(Error::IncorrectPin);
        }

        *self.pin.write() = Some(Zeroizing::new(attempt.to_string()));
        info!("Session unlocked");
        Ok(())
    }

    /// Whether the session is currently unlocked
    pub fn is_unlocked(&self) -> bool {
        self.pin.read().is_some()
    }

    /// The session PIN, available only while unlocked
    pub fn current_pin(&self) -> Result<Zeroizing<String>> {
        self.pin
            .read()
            .as_ref()
            .map(|p| Zeroizing::new(p.to_string()))
            .ok_or_else(|| Error::Session("wallet is locked".to_string()))
    }

    /// Replace the retained session PIN (after a PIN change)
    pub(crate) fn retain_pin(&self, new_pin: &str) {
        *self.pin.write() = Some(Zeroizing::new(new_pin.to_string()));
    }

    /// Wipe the session PIN and lock
    pub fn lock(&self) {
        *self.pin.write() = None;
        info!("Session locked");
    }

    /// Wipe PIN record, stored wallet, and session state
    pub fn reset(&self) -> Result<()> {
        self.lock();
        self.store.reset_all()?;
        info!("Session and stored wallet reset");
        Ok(())
    }
}
