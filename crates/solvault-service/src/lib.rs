//! Session, cache, and wallet orchestration for Solvault
//!
//! The PIN session state machine, the shared dirty/clean cache ledger,
//! and the `WalletService` that ties key storage, signing, and
//! transaction submission together for the UI layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod service;
pub mod session;

pub use cache::{
    CacheKey, CacheLedger, CacheSelector, Freshness, SubscriptionId, CACHE_KEYS,
};
pub use service::{
    Asset, BalanceSnapshot, TransferOutcome, TransferRequest, WalletService, WalletStatus,
    ESTIMATED_FEE_LAMPORTS,
};
pub use session::{SessionAuthenticator, SessionStatus};
