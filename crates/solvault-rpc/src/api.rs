//! The assumed RPC collaborator contract
//!
//! The actual JSON-RPC client lives outside this core; everything here
//! programs against this trait, and tests inject [`crate::MockLedgerRpc`].

use crate::types::{
    AccountInfo, SendOptions, SignatureInfo, SignatureStatus, SignedTransaction, StatusOptions,
    TokenAccount,
};
use async_trait::async_trait;
use solvault_core::{Pubkey, Result};

/// Ledger RPC primitives consumed by the wallet core
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Native balance of an account, in base units
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64>;

    /// Account state, or `None` if the account does not exist
    async fn get_account_info(&self, pubkey: &Pubkey) -> Result<Option<AccountInfo>>;

    /// Minimum balance an account of the given size must hold to persist
    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64>;

    /// Submit a signed transaction; returns its signature
    async fn send_transaction(
        &self,
        transaction: &SignedTransaction,
        options: &SendOptions,
    ) -> Result<String>;

    /// Status of a submitted signature, or `None` if not yet visible
    async fn get_signature_status(
        &self,
        signature: &str,
        options: &StatusOptions,
    ) -> Result<Option<SignatureStatus>>;

    /// Token accounts owned by a wallet
    async fn get_parsed_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<TokenAccount>>;

    /// Recent signatures involving an address, newest first
    async fn get_signatures_for_address(
        &self,
        owner: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>>;

    /// Current slot; used as a cheap reachability probe
    async fn get_slot(&self) -> Result<u64>;
}
