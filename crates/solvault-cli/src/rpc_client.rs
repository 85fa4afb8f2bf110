//! JSON-RPC 2.0 client implementing the ledger RPC contract
//!
//! One HTTP endpoint, no failover. Errors are surfaced as `Error::Rpc`
//! and classified further by the layers above.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use solvault_core::{Error, Pubkey, Result};
use solvault_rpc::{
    AccountInfo, Commitment, LedgerRpc, SendOptions, SignatureInfo, SignatureStatus,
    SignedTransaction, StatusOptions, TokenAccount,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Timeout for RPC requests
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Token program owning standard token accounts
const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// JSON-RPC request ID counter
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    method: String,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

// Many ledger RPC responses wrap the payload in {"context":..,"value":..}
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

/// HTTP JSON-RPC ledger client
pub struct JsonRpcLedger {
    client: reqwest::Client,
    endpoint: String,
}

impl JsonRpcLedger {
    /// Create a client for the given endpoint URL
    pub fn new(endpoint: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .map_err(|e| Error::Rpc(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, endpoint })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
            id: REQUEST_ID.fetch_add(1, Ordering::SeqCst),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Rpc(format!("{}: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(Error::Rpc(format!(
                "{}: HTTP {}",
                method,
                response.status()
            )));
        }

        let parsed: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Rpc(format!("{}: malformed response: {}", method, e)))?;

        if let Some(error) = parsed.error {
            return Err(Error::Rpc(format!(
                "{}: RPC error {}: {}",
                method, error.code, error.message
            )));
        }

        parsed
            .result
            .ok_or_else(|| Error::Rpc(format!("{}: missing result", method)))
    }
}

#[async_trait]
impl LedgerRpc for JsonRpcLedger {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64> {
        let result: WithContext<u64> = self
            .call("getBalance", json!([pubkey.to_string()]))
            .await?;
        Ok(result.value)
    }

    async fn get_account_info(&self, pubkey: &Pubkey) -> Result<Option<AccountInfo>> {
        #[derive(Deserialize)]
        struct RawAccount {
            lamports: u64,
        }
        let result: WithContext<Option<RawAccount>> = self
            .call(
                "getAccountInfo",
                json!([pubkey.to_string(), {"encoding": "base64"}]),
            )
            .await?;
        Ok(result.value.map(|a| AccountInfo {
            lamports: a.lamports,
        }))
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64> {
        self.call("getMinimumBalanceForRentExemption", json!([data_len]))
            .await
    }

    async fn send_transaction(
        &self,
        transaction: &SignedTransaction,
        options: &SendOptions,
    ) -> Result<String> {
        self.call(
            "sendTransaction",
            json!([
                BASE64.encode(transaction.message()),
                {
                    "encoding": "base64",
                    "skipPreflight": options.skip_preflight,
                    "preflightCommitment": options.preflight_commitment.to_string(),
                }
            ]),
        )
        .await
    }

    async fn get_signature_status(
        &self,
        signature: &str,
        options: &StatusOptions,
    ) -> Result<Option<SignatureStatus>> {
        #[derive(Deserialize)]
        struct RawStatus {
            #[serde(rename = "confirmationStatus")]
            confirmation_status: Option<String>,
            err: Option<Value>,
        }

        let result: WithContext<Vec<Option<RawStatus>>> = self
            .call(
                "getSignatureStatuses",
                json!([
                    [signature],
                    {"searchTransactionHistory": options.search_transaction_history}
                ]),
            )
            .await?;

        let Some(Some(raw)) = result.value.into_iter().next() else {
            return Ok(None);
        };

        let confirmation_status = match raw.confirmation_status.as_deref() {
            Some(level) => Some(level.parse::<Commitment>()?),
            None => None,
        };
        Ok(Some(SignatureStatus {
            confirmation_status,
            err: raw.err.map(|e| e.to_string()),
        }))
    }

    async fn get_parsed_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<TokenAccount>> {
        let result: WithContext<Vec<Value>> = self
            .call(
                "getTokenAccountsByOwner",
                json!([
                    owner.to_string(),
                    {"programId": TOKEN_PROGRAM_ID},
                    {"encoding": "jsonParsed"}
                ]),
            )
            .await?;

        let mut accounts = Vec::new();
        for entry in result.value {
            let info = &entry["account"]["data"]["parsed"]["info"];
            let Some(mint) = info["mint"].as_str() else {
                continue;
            };
            let amount = info["tokenAmount"]["amount"]
                .as_str()
                .and_then(|a| a.parse::<u64>().ok())
                .unwrap_or(0);
            let decimals = info["tokenAmount"]["decimals"].as_u64().unwrap_or(0) as u8;
            accounts.push(TokenAccount {
                mint: mint.to_string(),
                amount,
                decimals,
            });
        }
        Ok(accounts)
    }

    async fn get_signatures_for_address(
        &self,
        owner: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>> {
        #[derive(Deserialize)]
        struct RawEntry {
            signature: String,
            #[serde(rename = "blockTime")]
            block_time: Option<i64>,
        }

        let entries: Vec<RawEntry> = self
            .call(
                "getSignaturesForAddress",
                json!([owner.to_string(), {"limit": limit}]),
            )
            .await?;

        Ok(entries
            .into_iter()
            .map(|e| SignatureInfo {
                signature: e.signature,
                block_time: e.block_time,
            })
            .collect())
    }

    async fn get_slot(&self) -> Result<u64> {
        self.call("getSlot", json!([])).await
    }
}
