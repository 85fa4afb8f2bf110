//! Send-and-confirm protocol with bounded polling
//!
//! Submits a signed transaction once, then polls the signature status up
//! to a fixed budget. Transient query failures are logged and swallowed;
//! an exhausted budget is reported as an unknown outcome, not a failure.

use crate::api::LedgerRpc;
use crate::types::{Commitment, SendOptions, SignedTransaction, StatusOptions};
use solvault_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default number of status polls before giving up
pub const DEFAULT_MAX_RETRIES: u32 = 30;

/// Default pause between status polls
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(2000);

/// Submission parameters
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    /// Confirmation level that counts as success
    pub commitment: Commitment,
    /// Number of status polls before `ConfirmationTimeout`
    pub max_retries: u32,
    /// Pause between polls (none before the first)
    pub polling_interval: Duration,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            commitment: Commitment::Confirmed,
            max_retries: DEFAULT_MAX_RETRIES,
            polling_interval: DEFAULT_POLLING_INTERVAL,
        }
    }
}

/// Sends exactly the transaction it is given and waits for a terminal
/// status
///
/// Pre-send adjustments (rent-exemption bumps and the like) are a caller
/// concern layered above this component.
pub struct TransactionSubmitter {
    rpc: Arc<dyn LedgerRpc>,
}

impl TransactionSubmitter {
    /// Create over an RPC handle
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self { rpc }
    }

    /// Submit and wait for confirmation
    ///
    /// Retrying after `ConfirmationTimeout` with the *same* signed
    /// transaction is safe (replay of a processed signature is a no-op
    /// remotely); re-signing with a fresh blockhash without first
    /// checking whether the original landed is not.
    pub async fn submit(
        &self,
        transaction: &SignedTransaction,
        config: &SubmitConfig,
    ) -> Result<String> {
        let send_options = SendOptions {
            skip_preflight: false,
            preflight_commitment: config.commitment,
        };

        // A rejected send is terminal; this layer never retries it.
        let signature = match self.rpc.send_transaction(transaction, &send_options).await {
            Ok(signature) => signature,
            Err(Error::Rejected(details)) => return Err(Error::Rejected(details)),
            Err(e) => return Err(Error::Rejected(e.to_string())),
        };
        info!(%signature, commitment = %config.commitment, "Transaction submitted, polling for confirmation");

        let status_options = StatusOptions {
            search_transaction_history: true,
        };

        for attempt in 0..config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(config.polling_interval).await;
            }

            match self.rpc.get_signature_status(&signature, &status_options).await {
                Ok(Some(status)) => {
                    if let Some(details) = status.err {
                        warn!(%signature, %details, "Transaction failed on chain");
                        return Err(Error::ChainRejected(details));
                    }
                    match status.confirmation_status {
                        Some(level) if level.satisfies(config.commitment) => {
                            info!(%signature, %level, "Transaction confirmed");
                            return Ok(signature);
                        }
                        _ => {
                            debug!(%signature, attempt, "Not yet at requested commitment");
                        }
                    }
                }
                Ok(None) => {
                    debug!(%signature, attempt, "Signature not yet visible");
                }
                // Transient RPC hiccups must not abort the wait
                Err(e) => {
                    warn!(%signature, attempt, "Status query failed: {}", e);
                }
            }
        }

        warn!(%signature, polls = config.max_retries, "Confirmation budget exhausted; outcome unknown");
        Err(Error::ConfirmationTimeout {
            polls: config.max_retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLedgerRpc;
    use crate::types::SignatureStatus;

    fn fast_config() -> SubmitConfig {
        SubmitConfig {
            polling_interval: Duration::ZERO,
            ..SubmitConfig::default()
        }
    }

    fn transaction() -> SignedTransaction {
        SignedTransaction::new(vec![1, 2, 3], "sig111".to_string())
    }

    #[tokio::test]
    async fn test_confirmed_after_three_polls() {
        let rpc = Arc::new(MockLedgerRpc::new());
        rpc.push_status(Ok(Some(SignatureStatus::pending())));
        rpc.push_status(Ok(Some(SignatureStatus::pending())));
        rpc.push_status(Ok(Some(SignatureStatus::confirmed_at(Commitment::Confirmed))));

        let submitter = TransactionSubmitter::new(rpc.clone());
        let signature = submitter.submit(&transaction(), &fast_config()).await.unwrap();

        assert_eq!(signature, "sig111");
        assert_eq!(rpc.send_calls(), 1);
        assert_eq!(rpc.status_calls(), 3);
    }

    #[tokio::test]
    async fn test_stronger_level_satisfies_requested() {
        let rpc = Arc::new(MockLedgerRpc::new());
        rpc.push_status(Ok(Some(SignatureStatus::confirmed_at(Commitment::Finalized))));

        let submitter = TransactionSubmitter::new(rpc.clone());
        assert!(submitter.submit(&transaction(), &fast_config()).await.is_ok());
        assert_eq!(rpc.status_calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_budget_times_out() {
        let rpc = Arc::new(MockLedgerRpc::new());
        for _ in 0..30 {
            rpc.push_status(Ok(Some(SignatureStatus::pending())));
        }

        let submitter = TransactionSubmitter::new(rpc.clone());
        let err = submitter.submit(&transaction(), &fast_config()).await.unwrap_err();

        assert!(matches!(err, Error::ConfirmationTimeout { polls: 30 }));
        assert_eq!(rpc.status_calls(), 30);
    }

    #[tokio::test]
    async fn test_chain_error_stops_polling_immediately() {
        let rpc = Arc::new(MockLedgerRpc::new());
        rpc.push_status(Ok(Some(SignatureStatus::chain_error("custom program error"))));
        rpc.push_status(Ok(Some(SignatureStatus::confirmed_at(Commitment::Confirmed))));

        let submitter = TransactionSubmitter::new(rpc.clone());
        let err = submitter.submit(&transaction(), &fast_config()).await.unwrap_err();

        assert!(matches!(err, Error::ChainRejected(ref d) if d.contains("custom program error")));
        assert_eq!(rpc.status_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejected_send_never_polls() {
        let rpc = Arc::new(MockLedgerRpc::new());
        rpc.fail_next_send("simulation failed: insufficient funds for fee");

        let submitter = TransactionSubmitter::new(rpc.clone());
        let err = submitter.submit(&transaction(), &fast_config()).await.unwrap_err();

        assert!(matches!(err, Error::Rejected(_)));
        assert_eq!(rpc.status_calls(), 0);
    }

    #[tokio::test]
    async fn test_transient_query_errors_are_swallowed() {
        let rpc = Arc::new(MockLedgerRpc::new());
        rpc.push_status(Err(Error::Rpc("connection reset".to_string())));
        rpc.push_status(Ok(None));
        rpc.push_status(Ok(Some(SignatureStatus::confirmed_at(Commitment::Confirmed))));

        let submitter = TransactionSubmitter::new(rpc.clone());
        assert!(submitter.submit(&transaction(), &fast_config()).await.is_ok());
        assert_eq!(rpc.status_calls(), 3);
    }

    #[tokio::test]
    async fn test_processed_does_not_satisfy_confirmed() {
        let rpc = Arc::new(MockLedgerRpc::new());
        rpc.push_status(Ok(Some(SignatureStatus::confirmed_at(Commitment::Processed))));
        rpc.push_status(Ok(Some(SignatureStatus::confirmed_at(Commitment::Confirmed))));

        let submitter = TransactionSubmitter::new(rpc.clone());
        assert!(submitter.submit(&transaction(), &fast_config()).await.is_ok());
        assert_eq!(rpc.status_calls(), 2);
    }
}
