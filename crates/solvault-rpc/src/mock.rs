//! Scriptable in-memory RPC for tests and offline development
//!
//! The same role the mock keystore plays for platform integration:
//! deterministic, no network, with call counters so protocol tests can
//! assert exactly how many round trips happened.

use crate::api::LedgerRpc;
use crate::types::{
    AccountInfo, SendOptions, SignatureInfo, SignatureStatus, SignedTransaction, StatusOptions,
    TokenAccount,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use solvault_core::{Error, Pubkey, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Default)]
struct MockState {
    balances: HashMap<String, u64>,
    accounts: HashMap<String, AccountInfo>,
    token_accounts: HashMap<String, Vec<TokenAccount>>,
    history: HashMap<String, Vec<SignatureInfo>>,
    statuses: VecDeque<Result<Option<SignatureStatus>>>,
    rent_exempt_minimum: u64,
    slot: u64,
    next_send_failure: Option<String>,
    fail_balance_queries: bool,
}

/// Scriptable mock ledger RPC
#[derive(Default)]
pub struct MockLedgerRpc {
    state: Mutex<MockState>,
    send_calls: AtomicU32,
    status_calls: AtomicU32,
}

impl MockLedgerRpc {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the native balance of an account
    pub fn set_balance(&self, pubkey: &Pubkey, lamports: u64) {
        let mut state = self.state.lock();
        state.balances.insert(pubkey.to_string(), lamports);
        state
            .accounts
            .insert(pubkey.to_string(), AccountInfo { lamports });
    }

    /// Remove an account entirely (dormant destination)
    pub fn remove_account(&self, pubkey: &Pubkey) {
        let mut state = self.state.lock();
        state.balances.remove(&pubkey.to_string());
        state.accounts.remove(&pubkey.to_string());
    }

    /// Set the token accounts owned by a wallet
    pub fn set_token_accounts(&self, owner: &Pubkey, accounts: Vec<TokenAccount>) {
        self.state
            .lock()
            .token_accounts
            .insert(owner.to_string(), accounts);
    }

    /// Set the signature history for an address, newest first
    pub fn set_history(&self, owner: &Pubkey, history: Vec<SignatureInfo>) {
        self.state.lock().history.insert(owner.to_string(), history);
    }

    /// Queue the next signature-status response; an empty queue reports
    /// the signature as not yet visible
    pub fn push_status(&self, status: Result<Option<SignatureStatus>>) {
        self.state.lock().statuses.push_back(status);
    }

    /// Make the next `send_transaction` fail with the given message
    pub fn fail_next_send(&self, message: &str) {
        self.state.lock().next_send_failure = Some(message.to_string());
    }

    /// Make balance queries fail until cleared (refresh-failure tests)
    pub fn set_fail_balance_queries(&self, fail: bool) {
        self.state.lock().fail_balance_queries = fail;
    }

    /// Set the rent-exemption floor
    pub fn set_rent_exempt_minimum(&self, lamports: u64) {
        self.state.lock().rent_exempt_minimum = lamports;
    }

    /// Set the reported slot
    pub fn set_slot(&self, slot: u64) {
        self.state.lock().slot = slot;
    }

    /// Number of `send_transaction` calls so far
    pub fn send_calls(&self) -> u32 {
        self.send_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_signature_status` calls so far
    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerRpc for MockLedgerRpc {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64> {
        let state = self.state.lock();
        if state.fail_balance_queries {
            return Err(Error::Rpc("balance query unavailable".to_string()));
        }
        Ok(state.balances.get(&pubkey.to_string()).copied().unwrap_or(0))
    }

    async fn get_account_info(&self, pubkey: &Pubkey) -> Result<Option<AccountInfo>> {
        Ok(self.state.lock().accounts.get(&pubkey.to_string()).cloned())
    }

    async fn get_minimum_balance_for_rent_exemption(&self, _data_len: usize) -> Result<u64> {
        Ok(self.state.lock().rent_exempt_minimum)
    }

    async fn send_transaction(
        &self,
        transaction: &SignedTransaction,
        _options: &SendOptions,
    ) -> Result<String> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        if let Some(message) = state.next_send_failure.take() {
            return Err(Error::Rpc(message));
        }
        Ok(transaction.signature().to_string())
    }

    async fn get_signature_status(
        &self,
        _signature: &str,
        _options: &StatusOptions,
    ) -> Result<Option<SignatureStatus>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .statuses
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn get_parsed_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<TokenAccount>> {
        let state = self.state.lock();
        if state.fail_balance_queries {
            return Err(Error::Rpc("token query unavailable".to_string()));
        }
        Ok(state
            .token_accounts
            .get(&owner.to_string())
            .cloned()
            .unwrap_or_default())
    }

    async fn get_signatures_for_address(
        &self,
        owner: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>> {
        let mut history = self
            .state
            .lock()
            .history
            .get(&owner.to_string())
            .cloned()
            .unwrap_or_default();
        history.truncate(limit);
        Ok(history)
    }

    async fn get_slot(&self) -> Result<u64> {
        Ok(self.state.lock().slot)
    }
}
