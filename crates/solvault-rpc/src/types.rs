//! Wire-facing types shared with the RPC collaborator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ledger confirmation-depth level used as the success threshold for
/// submission polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    /// Seen by the node
    Processed,
    /// Voted on by a supermajority
    Confirmed,
    /// Rooted; will not be rolled back
    Finalized,
}

impl Commitment {
    /// Check whether this level meets or exceeds the requested one
    pub fn satisfies(&self, target: Commitment) -> bool {
        *self >= target
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed => write!(f, "processed"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

impl FromStr for Commitment {
    type Err = solvault_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(solvault_core::Error::Rpc(format!(
                "unknown commitment level '{}'",
                other
            ))),
        }
    }
}

/// A signed transaction, opaque to this layer
///
/// This core never parses raw transaction bytes; the message is whatever
/// the RPC collaborator's wire format requires, and the signature is the
/// ledger's unique identifier for it.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    message: Vec<u8>,
    signature: String,
}

impl SignedTransaction {
    /// Wrap signed message bytes and their base58 signature
    pub fn new(message: Vec<u8>, signature: String) -> Self {
        Self { message, signature }
    }

    /// Serialized message bytes
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// Transaction signature (base58), the ledger-unique id
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

/// Options for the initial send
#[derive(Debug, Clone, Copy)]
pub struct SendOptions {
    /// Skip the server-side simulation before accepting the transaction
    pub skip_preflight: bool,
    /// Commitment level used for the preflight simulation
    pub preflight_commitment: Commitment,
}

/// Options for signature status queries
#[derive(Debug, Clone, Copy)]
pub struct StatusOptions {
    /// Also search the node's long-term transaction history
    pub search_transaction_history: bool,
}

/// Reported status of a submitted signature
#[derive(Debug, Clone)]
pub struct SignatureStatus {
    /// Highest confirmation level reached, if any
    pub confirmation_status: Option<Commitment>,
    /// On-chain execution error, if the transaction landed and failed
    pub err: Option<String>,
}

impl SignatureStatus {
    /// A status that has reached the given level without error
    pub fn confirmed_at(level: Commitment) -> Self {
        Self {
            confirmation_status: Some(level),
            err: None,
        }
    }

    /// A status that landed on chain and failed there
    pub fn chain_error(details: &str) -> Self {
        Self {
            confirmation_status: Some(Commitment::Processed),
            err: Some(details.to_string()),
        }
    }

    /// A status still below any commitment level
    pub fn pending() -> Self {
        Self {
            confirmation_status: None,
            err: None,
        }
    }
}

/// Account state as reported by the ledger
#[derive(Debug, Clone)]
pub struct AccountInfo {
    /// Balance in base units
    pub lamports: u64,
}

/// A token holding owned by a wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccount {
    /// Token mint id (base58)
    pub mint: String,
    /// Raw amount in the mint's base units
    pub amount: u64,
    /// Decimal places of the mint
    pub decimals: u8,
}

/// A signature entry from address history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    /// Transaction signature (base58)
    pub signature: String,
    /// Block time (Unix seconds), if known
    pub block_time: Option<i64>,
}

/// Token metadata from the static catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// Ticker symbol
    pub symbol: String,
    /// Human-readable name
    pub name: String,
    /// Icon URL, if the catalog carries one
    pub logo_uri: Option<String>,
    /// Decimal places of the mint
    pub decimals: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_ordering() {
        assert!(Commitment::Finalized.satisfies(Commitment::Confirmed));
        assert!(Commitment::Confirmed.satisfies(Commitment::Confirmed));
        assert!(!Commitment::Processed.satisfies(Commitment::Confirmed));
    }

    #[test]
    fn test_commitment_parse() {
        assert_eq!(
            "confirmed".parse::<Commitment>().unwrap(),
            Commitment::Confirmed
        );
        assert_eq!(
            "Finalized".parse::<Commitment>().unwrap(),
            Commitment::Finalized
        );
        assert!("instant".parse::<Commitment>().is_err());
    }
}
