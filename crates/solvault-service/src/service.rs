//! Wallet orchestration
//!
//! Owns the live keypair, wires the session authenticator, vault store,
//! cache ledger, and transaction submitter together, and implements the
//! wallet lifecycle: setup, unlock (with legacy migration), generate,
//! import, transfer, refresh, disconnect, reset.

use crate::cache::{CacheKey, CacheLedger, CacheSelector};
use crate::session::{SessionAuthenticator, SessionStatus};
use parking_lot::RwLock;
use serde::Serialize;
use solvault_core::{cipher, Error, Keypair, Pubkey, Result};
use solvault_rpc::{
    LedgerRpc, SignatureInfo, SignedTransaction, SubmitConfig, TokenAccount, TransactionSubmitter,
};
use solvault_storage::VaultStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Flat fee estimate reserved on top of a native transfer
pub const ESTIMATED_FEE_LAMPORTS: u64 = 5_000;

/// Signatures requested per history refresh
const HISTORY_FETCH_LIMIT: usize = 10;

/// Signatures kept per history refresh (rate-limit compromise)
const HISTORY_KEEP: usize = 5;

/// Summary of where the wallet stands, for the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletStatus {
    /// First run: no PIN configured yet
    pub needs_pin_setup: bool,
    /// PIN configured but not entered this session
    pub needs_auth: bool,
    /// A wallet (encrypted or legacy) is stored
    pub has_wallet: bool,
    /// A live keypair is loaded and ready to sign
    pub connected: bool,
}

/// What a transfer moves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    /// The native token
    Native,
    /// A token mint
    Token {
        /// Mint id (base58)
        mint: String,
    },
}

/// One user-initiated transfer
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Recipient address (base58)
    pub recipient: String,
    /// Asset to move
    pub asset: Asset,
    /// Amount in decimal units
    pub amount: f64,
    /// Decimal places of the asset (9 for native)
    pub decimals: u8,
}

/// Outcome of a confirmed transfer
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Transaction signature
    pub signature: String,
    /// Amount actually sent, in base units
    pub amount_sent: u64,
    /// True when a native amount was raised to the rent-exemption floor
    pub rent_bumped: bool,
}

/// Cached balance data
#[derive(Debug, Clone, Default)]
pub struct BalanceSnapshot {
    /// Native balance in base units
    pub lamports: u64,
    /// Token holdings with a nonzero amount
    pub tokens: Vec<TokenAccount>,
}

// Opaque message payload handed to the RPC collaborator. This core does
// not define a wire format; the collaborator's serializer owns it.
#[derive(Serialize)]
struct TransferMessage<'a> {
    from: String,
    to: String,
    amount: u64,
    asset: &'a str,
}

/// The application-root wallet service
///
/// One instance per process; hand out `Arc` clones of the cache ledger to
/// views that need invalidation callbacks.
pub struct WalletService {
    store: VaultStore,
    session: SessionAuthenticator,
    cache: Arc<CacheLedger>,
    rpc: Arc<dyn LedgerRpc>,
    submitter: TransactionSubmitter,
    submit_config: SubmitConfig,
    keypair: RwLock<Option<Keypair>>,
    balances: RwLock<BalanceSnapshot>,
    history: RwLock<Vec<SignatureInfo>>,
}

impl WalletService {
    /// Create over an open store and an RPC handle
    pub fn new(store: VaultStore, rpc: Arc<dyn LedgerRpc>) -> Self {
        Self {
            session: SessionAuthenticator::new(store.clone()),
            cache: CacheLedger::new(),
            submitter: TransactionSubmitter::new(rpc.clone()),
            submit_config: SubmitConfig::default(),
            rpc,
            store,
            keypair: RwLock::new(None),
            balances: RwLock::new(BalanceSnapshot::default()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Override submission parameters (polling cadence, commitment)
    pub fn set_submit_config(&mut self, config: SubmitConfig) {
        self.submit_config = config;
    }

    /// Shared cache ledger handle
    pub fn cache(&self) -> Arc<CacheLedger> {
        self.cache.clone()
    }

    /// Session status
    pub fn session_status(&self) -> Result<SessionStatus> {
        self.session.status()
    }

    /// Wallet status summary
    pub fn status(&self) -> Result<WalletStatus> {
        let session = self.session.status()?;
        Ok(WalletStatus {
            needs_pin_setup: session == SessionStatus::Uninitialized,
            needs_auth: session == SessionStatus::Locked,
            has_wallet: self.store.wallet_exists()?,
            connected: self.keypair.read().is_some(),
        })
    }

    /// Public key of the live keypair, if connected
    pub fn pubkey(&self) -> Option<Pubkey> {
        self.keypair.read().as_ref().map(|kp| kp.pubkey())
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// First-time PIN setup
    pub fn setup_pin(&self, pin: &str) -> Result<()> {
        self.session.setup_pin(pin)
    }

    /// Verify the PIN, run legacy migration if needed, and load the vault
    ///
    /// Returns the wallet's public key, or `None` when no wallet is
    /// stored yet (a setup signal, not an error). A freshly unlocked
    /// session cannot trust any previously cached numbers, so every
    /// cache key is invalidated on a successful load.
    pub fn unlock(&self, pin: &str) -> Result<Option<Pubkey>> {
        self.session.unlock(pin)?;
        self.load_wallet_with_session_pin()
    }

    fn load_wallet_with_session_pin(&self) -> Result<Option<Pubkey>> {
        let pin = self.session.current_pin()?;

        if self.store.has_legacy_wallet()? {
            self.migrate_legacy_wallet(&pin)?;
        }

        let Some(vault) = self.store.load_vault()? else {
            return Ok(None);
        };

        let material = cipher::decrypt(&vault, &pin)?;
        let keypair = Keypair::from_secret_bytes(&material)?;
        let pubkey = keypair.pubkey();
        *self.keypair.write() = Some(keypair);

        self.cache.mark_dirty(CacheSelector::All);
        info!(%pubkey, "Wallet loaded");
        Ok(Some(pubkey))
    }

    // One-time upgrade of the pre-encryption wallet format. The legacy
    // artifact is deleted only after the re-encrypted vault has been
    // verified by a full round-trip decrypt, so an interruption at any
    // point leaves a loadable wallet behind.
    fn migrate_legacy_wallet(&self, pin: &str) -> Result<()> {
        let Some(raw) = self.store.legacy_secret()? else {
            return Ok(());
        };
        info!("Legacy plaintext wallet detected; migrating to encrypted vault");

        let keypair = Keypair::from_json_array(&raw)?;
        let vault = cipher::encrypt(&keypair.to_secret_bytes()[..], pin)?;
        self.store.save_vault(&vault)?;

        let verify = cipher::decrypt(&vault, pin)?;
        let restored = Keypair::from_secret_bytes(&verify)?;
        if restored.pubkey() != keypair.pubkey() {
            return Err(Error::Crypto(
                "migrated vault failed round-trip verification".to_string(),
            ));
        }

        self.store.clear_legacy()?;
        info!(pubkey = %keypair.pubkey(), "Legacy wallet migrated");
        Ok(())
    }

    /// Destroy the live keypair and lock the session
    ///
    /// The keypair is dropped (and zeroized) before this returns; no
    /// other path destroys it except `disconnect` and `reset`.
    pub fn lock(&self) {
        *self.keypair.write() = None;
        self.session.lock();
    }

    /// Wipe everything: PIN record, stored vault, session state
    ///
    /// Irreversible; callers must confirm with the user first.
    pub fn reset(&self) -> Result<()> {
        *self.keypair.write() = None;
        self.session.reset()?;
        *self.balances.write() = BalanceSnapshot::default();
        self.history.write().clear();
        self.cache.invalidate_after_wallet_change();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Wallet identity
    // ------------------------------------------------------------------

    /// Generate a fresh keypair and persist it under the session PIN
    pub fn generate_wallet(&self) -> Result<Pubkey> {
        let pin = self.session.current_pin()?;
        let keypair = Keypair::generate();
        self.persist_and_adopt(keypair, &pin)
    }

    /// Import a 64-byte secret key array
    pub fn import_wallet(&self, secret: &[u8]) -> Result<Pubkey> {
        let pin = self.session.current_pin()?;
        let keypair = Keypair::from_secret_bytes(secret)?;
        self.persist_and_adopt(keypair, &pin)
    }

    /// Import a secret key in its JSON byte-array form
    pub fn import_wallet_json(&self, json: &str) -> Result<Pubkey> {
        let pin = self.session.current_pin()?;
        let keypair = Keypair::from_json_array(json)?;
        self.persist_and_adopt(keypair, &pin)
    }

    fn persist_and_adopt(&self, keypair: Keypair, pin: &str) -> Result<Pubkey> {
        let vault = cipher::encrypt(&keypair.to_secret_bytes()[..], pin)?;
        self.store.save_vault(&vault)?;

        let pubkey = keypair.pubkey();
        *self.keypair.write() = Some(keypair);
        self.cache.invalidate_after_wallet_change();
        info!(%pubkey, "Wallet stored");
        Ok(pubkey)
    }

    /// Destroy the live keypair and remove the stored wallet
    ///
    /// The session PIN stays valid; a new wallet can be created without
    /// re-authenticating.
    pub fn disconnect(&self) -> Result<()> {
        *self.keypair.write() = None;
        self.store.clear_wallet()?;
        *self.balances.write() = BalanceSnapshot::default();
        self.history.write().clear();
        self.cache.invalidate_after_wallet_change();
        info!("Wallet disconnected");
        Ok(())
    }

    /// Export the live secret key as a JSON byte array
    pub fn export_secret_key(&self) -> Result<zeroize::Zeroizing<String>> {
        self.keypair
            .read()
            .as_ref()
            .map(|kp| kp.to_json_array())
            .ok_or_else(|| Error::Session("vault not connected".to_string()))
    }

    /// Re-encrypt the vault under a new PIN
    ///
    /// The vault rewrite lands before the new verification hash; a
    /// failure partway leaves the old PIN fully functional.
    pub fn change_pin(&self, old_pin: &str, new_pin: &str) -> Result<()> {
        solvault_core::pin::validate(new_pin)?;
        let stored = self
            .store
            .pin_hash()?
            .ok_or_else(|| Error::Session("no PIN configured".to_string()))?;
        if !solvault_core::PinHash::from_hex(stored).verify(old_pin) {
            return Err(Error::IncorrectPin);
        }

        if let Some(vault) = self.store.load_vault()? {
            let material = cipher::decrypt(&vault, old_pin)?;
            let reencrypted = cipher::encrypt(&material, new_pin)?;
            self.store.save_vault(&reencrypted)?;
        }

        let hash = solvault_core::PinHash::compute(new_pin);
        self.store.save_pin_hash(hash.as_hex())?;
        self.session.retain_pin(new_pin);
        info!("PIN changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transfers
    // ------------------------------------------------------------------

    /// Build, sign, submit, and confirm a transfer
    pub async fn transfer(&self, request: &TransferRequest) -> Result<TransferOutcome> {
        let sender = self
            .pubkey()
            .ok_or_else(|| Error::Session("vault not connected".to_string()))?;
        let recipient: Pubkey = request.recipient.parse()?;

        let outcome = match &request.asset {
            Asset::Native => {
                self.transfer_native(&sender, &recipient, request.amount)
                    .await?
            }
            Asset::Token { mint } => {
                self.transfer_token(&sender, &recipient, mint, request.amount, request.decimals)
                    .await?
            }
        };

        self.cache.invalidate_after_transfer();
        Ok(outcome)
    }

    async fn transfer_native(
        &self,
        sender: &Pubkey,
        recipient: &Pubkey,
        amount: f64,
    ) -> Result<TransferOutcome> {
        let lamports = to_base_units(amount, 9)?;

        // Dormant destinations must receive at least the rent-exemption
        // floor or the transfer would strand an unloadable account.
        let rent_floor = self.rpc.get_minimum_balance_for_rent_exemption(0).await?;
        let destination = match self.rpc.get_account_info(recipient).await {
            Ok(info) => info,
            Err(e) => {
                warn!("Recipient account lookup failed, assuming dormant: {}", e);
                None
            }
        };
        let final_lamports = match destination {
            Some(info) if info.lamports >= rent_floor => lamports,
            _ => lamports.max(rent_floor),
        };

        let sender_balance = self.rpc.get_balance(sender).await?;
        let required = final_lamports + ESTIMATED_FEE_LAMPORTS;
        if sender_balance < required {
            return Err(Error::InsufficientFunds(format!(
                "need {} lamports including fees, have {}",
                required, sender_balance
            )));
        }

        let signature = self
            .submit_transfer(sender, recipient, final_lamports, "native")
            .await?;

        if final_lamports > lamports {
            info!(
                bumped_to = final_lamports,
                "Amount raised to the rent-exemption floor"
            );
        }

        Ok(TransferOutcome {
            signature,
            amount_sent: final_lamports,
            rent_bumped: final_lamports > lamports,
        })
    }

    async fn transfer_token(
        &self,
        sender: &Pubkey,
        recipient: &Pubkey,
        mint: &str,
        amount: f64,
        decimals: u8,
    ) -> Result<TransferOutcome> {
        let raw = to_base_units(amount, decimals)?;

        let holdings = self.rpc.get_parsed_token_accounts_by_owner(sender).await?;
        let held = holdings
            .iter()
            .find(|t| t.mint == mint)
            .map(|t| t.amount)
            .unwrap_or(0);
        if held < raw {
            return Err(Error::InsufficientFunds(format!(
                "need {} base units of {}, have {}",
                raw, mint, held
            )));
        }

        let signature = self.submit_transfer(sender, recipient, raw, mint).await?;
        Ok(TransferOutcome {
            signature,
            amount_sent: raw,
            rent_bumped: false,
        })
    }

    async fn submit_transfer(
        &self,
        sender: &Pubkey,
        recipient: &Pubkey,
        amount: u64,
        asset: &str,
    ) -> Result<String> {
        let message = serde_json::to_vec(&TransferMessage {
            from: sender.to_string(),
            to: recipient.to_string(),
            amount,
            asset,
        })?;

        let transaction = {
            let guard = self.keypair.read();
            let keypair = guard
                .as_ref()
                .ok_or_else(|| Error::Session("vault not connected".to_string()))?;
            let signature = keypair.sign(&message);
            SignedTransaction::new(message, signature)
        };

        self.submitter.submit(&transaction, &self.submit_config).await
    }

    // ------------------------------------------------------------------
    // Cached reads
    // ------------------------------------------------------------------

    /// Refresh native and token balances, consulting the cache ledger
    ///
    /// Skips the network when both keys are clean and `force` is false.
    /// The clean marks land only after both queries succeeded; an error
    /// propagates with the dirty state untouched so the next attempt
    /// retries.
    pub async fn refresh_balances(&self, force: bool) -> Result<BalanceSnapshot> {
        let pubkey = self
            .pubkey()
            .ok_or_else(|| Error::Session("vault not connected".to_string()))?;

        if !self.cache.needs_refresh(CacheKey::Balance, force)
            && !self.cache.needs_refresh(CacheKey::Tokens, force)
        {
            return Ok(self.balances.read().clone());
        }

        let lamports = self.rpc.get_balance(&pubkey).await?;
        let tokens: Vec<TokenAccount> = self
            .rpc
            .get_parsed_token_accounts_by_owner(&pubkey)
            .await?
            .into_iter()
            .filter(|t| t.amount > 0)
            .collect();

        let snapshot = BalanceSnapshot { lamports, tokens };
        *self.balances.write() = snapshot.clone();
        self.cache.mark_clean(CacheKey::Balance);
        self.cache.mark_clean(CacheKey::Tokens);
        Ok(snapshot)
    }

    /// Refresh recent transaction history, consulting the cache ledger
    pub async fn refresh_history(&self, force: bool) -> Result<Vec<SignatureInfo>> {
        let pubkey = self
            .pubkey()
            .ok_or_else(|| Error::Session("vault not connected".to_string()))?;

        if !self.cache.needs_refresh(CacheKey::TransactionHistory, force) {
            return Ok(self.history.read().clone());
        }

        let mut records = self
            .rpc
            .get_signatures_for_address(&pubkey, HISTORY_FETCH_LIMIT)
            .await?;
        records.truncate(HISTORY_KEEP);

        *self.history.write() = records.clone();
        self.cache.mark_clean(CacheKey::TransactionHistory);
        Ok(records)
    }

    // ------------------------------------------------------------------
    // Connection settings
    // ------------------------------------------------------------------

    /// Saved RPC endpoint, or the default
    pub fn endpoint(&self) -> Result<String> {
        Ok(self.store.endpoint()?)
    }

    /// Persist a new RPC endpoint
    pub fn set_endpoint(&self, endpoint: &str) -> Result<()> {
        Ok(self.store.set_endpoint(endpoint)?)
    }

    /// Cheap reachability probe; returns the current slot
    pub async fn probe_endpoint(&self) -> Result<u64> {
        self.rpc.get_slot().await
    }
}

// Convert a decimal amount to base units, rejecting junk early
fn to_base_units(amount: f64, decimals: u8) -> Result<u64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount(
            "amount must be a positive number".to_string(),
        ));
    }
    let scaled = amount * 10f64.powi(decimals as i32);
    if scaled > u64::MAX as f64 {
        return Err(Error::InvalidAmount("amount too large".to_string()));
    }
    let units = scaled.round() as u64;
    if units == 0 {
        return Err(Error::InvalidAmount(format!(
            "amount is below one base unit at {} decimals",
            decimals
        )));
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_base_units_native() {
        assert_eq!(to_base_units(1.5, 9).unwrap(), 1_500_000_000);
        assert_eq!(to_base_units(0.000000001, 9).unwrap(), 1);
    }

    #[test]
    fn test_to_base_units_rejects_junk() {
        assert!(to_base_units(0.0, 9).is_err());
        assert!(to_base_units(-1.0, 9).is_err());
        assert!(to_base_units(f64::NAN, 9).is_err());
        assert!(to_base_units(f64::INFINITY, 9).is_err());
        // Rounds to zero base units
        assert!(to_base_units(0.0000000001, 9).is_err());
    }

    #[test]
    fn test_lamports_per_sol_matches_native_decimals() {
        assert_eq!(
            to_base_units(1.0, 9).unwrap(),
            solvault_core::LAMPORTS_PER_SOL
        );
    }
}
