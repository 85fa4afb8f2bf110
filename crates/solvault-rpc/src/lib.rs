//! RPC contract and transaction submission for Solvault
//!
//! Defines the assumed ledger RPC surface as a trait, the bounded
//! send-and-confirm polling protocol built on it, and the token metadata
//! catalog cache. Ships a scriptable mock for tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod metadata;
pub mod mock;
pub mod submitter;
pub mod types;

pub use api::LedgerRpc;
pub use metadata::{MetadataSource, StaticMetadataSource, TokenCatalog};
pub use mock::MockLedgerRpc;
pub use submitter::{
    SubmitConfig, TransactionSubmitter, DEFAULT_MAX_RETRIES, DEFAULT_POLLING_INTERVAL,
};
pub use types::{
    AccountInfo, Commitment, SendOptions, SignatureInfo, SignatureStatus, SignedTransaction,
    StatusOptions, TokenAccount, TokenInfo,
};
