//! Error types for Solvault
//!
//! One taxonomy shared by the vault, session, and submission layers.

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Solvault errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Vault decryption failed. Wrong PIN and corrupted blob are
    /// indistinguishable at this layer, so neither is named.
    #[error("Vault decryption failed")]
    DecryptionFailed,

    /// PIN verification failed against the stored hash
    #[error("Incorrect PIN")]
    IncorrectPin,

    /// No wallet has been stored yet. A setup signal, not a failure.
    #[error("No wallet found")]
    NoWalletFound,

    /// Sender balance cannot cover amount plus fees
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// The RPC endpoint refused the submission (preflight/simulation)
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// The transaction landed on chain and failed there
    #[error("Transaction failed on chain: {0}")]
    ChainRejected(String),

    /// Confirmation polling budget exhausted. The outcome is unknown;
    /// the transaction may still land.
    #[error("Confirmation timed out after {polls} status checks")]
    ConfirmationTimeout {
        /// Number of status checks performed before giving up
        polls: u32,
    },

    /// Invalid key material
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Invalid ledger address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid transfer amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// PIN does not meet format requirements
    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    /// Session state machine violation (e.g. signing while locked)
    #[error("Session error: {0}")]
    Session(String),

    /// Encryption error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// RPC transport error
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Check if error is a user-facing error (vs internal error)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::DecryptionFailed
                | Error::IncorrectPin
                | Error::InsufficientFunds(_)
                | Error::Rejected(_)
                | Error::ChainRejected(_)
                | Error::ConfirmationTimeout { .. }
                | Error::InvalidAddress(_)
                | Error::InvalidAmount(_)
                | Error::InvalidPin(_)
                | Error::InvalidKey(_)
        )
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Error::DecryptionFailed => {
                "Could not unlock the vault. Check your PIN, or reset the wallet if the data is corrupted.".to_string()
            }
            Error::IncorrectPin => "Incorrect PIN. Please try again.".to_string(),
            Error::InsufficientFunds(_) => {
                "You don't have enough funds for this transfer (including transaction fees).".to_string()
            }
            Error::Rejected(_) => {
                "The network rejected this transaction before it was processed. Please review and try again.".to_string()
            }
            Error::ChainRejected(_) => {
                "The transaction was processed and failed on chain. No retry was attempted.".to_string()
            }
            Error::ConfirmationTimeout { .. } => {
                "Confirmation timed out. The transaction may still complete - check its status before sending again.".to_string()
            }
            Error::InvalidAddress(_) => {
                "The recipient address is invalid. Please check and try again.".to_string()
            }
            Error::InvalidAmount(_) => "The amount is invalid. Please enter a valid amount.".to_string(),
            Error::InvalidKey(_) => {
                "The private key is invalid. Please check your input.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_detection() {
        assert!(Error::IncorrectPin.is_user_error());
        assert!(Error::InsufficientFunds("test".to_string()).is_user_error());
        assert!(!Error::Storage("test".to_string()).is_user_error());
        assert!(!Error::Rpc("test".to_string()).is_user_error());
    }

    #[test]
    fn test_timeout_message_reports_unknown_outcome() {
        let msg = Error::ConfirmationTimeout { polls: 30 }.user_message();
        assert!(msg.contains("may still complete"));
    }

    #[test]
    fn test_decryption_failure_is_opaque() {
        let msg = Error::DecryptionFailed.to_string();
        assert!(!msg.to_lowercase().contains("wrong"));
        assert!(!msg.to_lowercase().contains("corrupt"));
    }
}
