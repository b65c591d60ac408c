//! Network binding and query/submit operations
//!
//! A [`NetworkClient`] binds an account identity to one of the fixed
//! named networks and exposes read-only queries against that network's
//! mirror REST surface plus transaction submission. The actual wire
//! access sits behind the [`LedgerEndpoint`] trait so tests can run
//! against the in-process ledger in [`memory`].
//!
//! Query policy: a "not found" response from the query surface is an
//! empty-result success, not an error. A fresh or zero-activity
//! account legitimately has no rows to return.

pub mod memory;

use crate::{AccountId, Error, NetworkId, Result, StatusCode, TransactionId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub use memory::InProcessLedger;

// ============================================================================
// Query/submit data shapes
// ============================================================================

/// Account row from the query surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account identifier
    pub account_id: AccountId,
    /// Native balance in tinybars
    pub balance: i64,
}

/// One token association row for an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Token identifier
    pub token_id: TokenIdString,
    /// Balance in the token's raw integer unit
    pub balance: u64,
    /// Token symbol, when the query surface returns one
    pub symbol: Option<String>,
    /// Token name, when the query surface returns one
    pub name: Option<String>,
}

/// Token ids arrive as plain strings from the query surface
pub type TokenIdString = String;

/// One historical transaction row for an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Transaction identifier string
    pub transaction_id: String,
    /// Operation name (e.g. `CRYPTOTRANSFER`)
    pub name: String,
    /// Consensus timestamp string
    pub consensus_timestamp: String,
    /// Ledger-reported result
    pub result: StatusCode,
    /// Fee charged, in tinybars
    pub charged_fee: i64,
}

/// Final receipt for a previously submitted transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptResponse {
    /// Ledger-reported status
    pub status: StatusCode,
    /// Entity created by the transaction, when applicable
    pub created_entity_id: Option<String>,
}

// ============================================================================
// Endpoint abstraction
// ============================================================================

/// Wire access to one network's query and submission surfaces.
///
/// None of these operations carries a built-in deadline; callers that
/// cannot afford to wait must wrap them with an explicit timeout.
#[async_trait]
pub trait LedgerEndpoint: Send + Sync {
    /// Fetch an account row. `Ok(None)` means the account is unknown
    /// to the query surface.
    async fn get_account(&self, id: &AccountId) -> Result<Option<AccountInfo>>;

    /// Fetch the token associations of an account. Unknown accounts
    /// yield an empty list.
    async fn get_account_tokens(&self, id: &AccountId) -> Result<Vec<TokenBalance>>;

    /// Fetch recent transactions involving an account, newest first.
    async fn get_transactions(
        &self,
        id: &AccountId,
        limit: usize,
    ) -> Result<Vec<TransactionSummary>>;

    /// Submit a signed transaction byte payload for ingestion.
    async fn submit(&self, transaction_id: &TransactionId, payload: &[u8]) -> Result<()>;

    /// Fetch the receipt for a submitted transaction. `Ok(None)` means
    /// the outcome is not yet queryable.
    async fn get_receipt(&self, transaction_id: &TransactionId) -> Result<Option<ReceiptResponse>>;
}

/// Builds the endpoint for a given network.
///
/// Abstracted so a [`crate::session::SessionManager`] can rebuild its
/// bound client on a network switch without the tests having to reach
/// real servers.
pub trait EndpointProvider: Send + Sync {
    /// Endpoint for the given network
    fn endpoint(&self, network: NetworkId) -> Arc<dyn LedgerEndpoint>;
}

/// Default provider: REST endpoints against the public mirror nodes
#[derive(Debug, Default)]
pub struct RestProvider;

impl EndpointProvider for RestProvider {
    fn endpoint(&self, network: NetworkId) -> Arc<dyn LedgerEndpoint> {
        Arc::new(RestEndpoint::for_network(network))
    }
}

/// Test provider: the same endpoint regardless of network
pub struct FixedEndpoint(pub Arc<dyn LedgerEndpoint>);

impl EndpointProvider for FixedEndpoint {
    fn endpoint(&self, _network: NetworkId) -> Arc<dyn LedgerEndpoint> {
        Arc::clone(&self.0)
    }
}

// ============================================================================
// Client
// ============================================================================

/// An account identity bound to one network's endpoint
#[derive(Clone)]
pub struct NetworkClient {
    account_id: AccountId,
    network: NetworkId,
    endpoint: Arc<dyn LedgerEndpoint>,
}

impl NetworkClient {
    /// Bind an account to a network using the public REST surface
    pub fn for_network(account_id: AccountId, network: NetworkId) -> Self {
        Self::with_endpoint(account_id, network, Arc::new(RestEndpoint::for_network(network)))
    }

    /// Bind an account to a network over an explicit endpoint
    pub fn with_endpoint(
        account_id: AccountId,
        network: NetworkId,
        endpoint: Arc<dyn LedgerEndpoint>,
    ) -> Self {
        Self {
            account_id,
            network,
            endpoint,
        }
    }

    /// The bound account
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// The bound network
    pub fn network(&self) -> NetworkId {
        self.network
    }

    /// Native balance of the bound account in tinybars. An account the
    /// query surface does not know yet reads as zero.
    pub async fn get_balance(&self) -> Result<i64> {
        let info = self.endpoint.get_account(&self.account_id).await?;
        Ok(info.map(|i| i.balance).unwrap_or(0))
    }

    /// Token associations of the bound account; empty for fresh accounts
    pub async fn list_tokens(&self) -> Result<Vec<TokenBalance>> {
        self.endpoint.get_account_tokens(&self.account_id).await
    }

    /// Recent transactions involving the bound account
    pub async fn list_transactions(&self, limit: usize) -> Result<Vec<TransactionSummary>> {
        self.endpoint.get_transactions(&self.account_id, limit).await
    }

    /// Submit a signed transaction payload
    pub async fn submit_transaction(
        &self,
        transaction_id: &TransactionId,
        payload: &[u8],
    ) -> Result<()> {
        self.endpoint.submit(transaction_id, payload).await
    }

    /// Fetch the receipt for a submitted transaction, if queryable yet
    pub async fn transaction_receipt(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<ReceiptResponse>> {
        self.endpoint.get_receipt(transaction_id).await
    }
}

impl std::fmt::Debug for NetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkClient")
            .field("account_id", &self.account_id)
            .field("network", &self.network)
            .finish()
    }
}

// ============================================================================
// REST endpoint
// ============================================================================

/// REST access to a network's public mirror node
pub struct RestEndpoint {
    base_url: String,
    http: reqwest::Client,
}

impl RestEndpoint {
    /// Create an endpoint for a named network
    pub fn for_network(network: NetworkId) -> Self {
        Self::with_base_url(network.mirror_base_url())
    }

    /// Create an endpoint against an explicit base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// GET a path, mapping 404 to `None` and other non-2xx to
    /// [`Error::Network`] carrying the response message.
    async fn get_json(&self, path: &str) -> Result<Option<serde_json::Value>> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "mirror query");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Network(format!("{}: {}", status, message)));
        }

        Ok(Some(response.json().await?))
    }

    /// Mirror-style transaction id path segment: `0.0.x-seconds-nanos`
    fn mirror_transaction_id(id: &TransactionId) -> String {
        format!(
            "{}-{}-{:09}",
            id.account_id, id.valid_start_secs, id.valid_start_nanos
        )
    }
}

#[async_trait]
impl LedgerEndpoint for RestEndpoint {
    async fn get_account(&self, id: &AccountId) -> Result<Option<AccountInfo>> {
        let body = match self.get_json(&format!("/api/v1/accounts/{}", id)).await? {
            Some(body) => body,
            None => return Ok(None),
        };

        let balance = body
            .pointer("/balance/balance")
            .and_then(|v| v.as_i64())
            .unwrap_or(0);

        Ok(Some(AccountInfo {
            account_id: *id,
            balance,
        }))
    }

    async fn get_account_tokens(&self, id: &AccountId) -> Result<Vec<TokenBalance>> {
        let body = match self
            .get_json(&format!("/api/v1/accounts/{}/tokens", id))
            .await?
        {
            Some(body) => body,
            None => return Ok(Vec::new()),
        };

        let tokens = body
            .get("tokens")
            .and_then(|v| v.as_array())
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| {
                        Some(TokenBalance {
                            token_id: row.get("token_id")?.as_str()?.to_string(),
                            balance: row.get("balance").and_then(|v| v.as_u64()).unwrap_or(0),
                            symbol: row
                                .get("symbol")
                                .and_then(|v| v.as_str())
                                .map(str::to_string),
                            name: row.get("name").and_then(|v| v.as_str()).map(str::to_string),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(tokens)
    }

    async fn get_transactions(
        &self,
        id: &AccountId,
        limit: usize,
    ) -> Result<Vec<TransactionSummary>> {
        let body = match self
            .get_json(&format!(
                "/api/v1/transactions?account.id={}&limit={}",
                id, limit
            ))
            .await?
        {
            Some(body) => body,
            None => return Ok(Vec::new()),
        };

        let transactions = body
            .get("transactions")
            .and_then(|v| v.as_array())
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| {
                        Some(TransactionSummary {
                            transaction_id: row.get("transaction_id")?.as_str()?.to_string(),
                            name: row
                                .get("name")
                                .and_then(|v| v.as_str())
                                .unwrap_or("UNKNOWN")
                                .to_string(),
                            consensus_timestamp: row
                                .get("consensus_timestamp")
                                .and_then(|v| v.as_str())
                                .unwrap_or_default()
                                .to_string(),
                            result: StatusCode::from(
                                row.get("result")
                                    .and_then(|v| v.as_str())
                                    .unwrap_or("UNKNOWN")
                                    .to_string(),
                            ),
                            charged_fee: row
                                .get("charged_tx_fee")
                                .and_then(|v| v.as_i64())
                                .unwrap_or(0),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(transactions)
    }

    async fn submit(&self, transaction_id: &TransactionId, payload: &[u8]) -> Result<()> {
        let url = format!("{}/api/v1/transactions", self.base_url);
        debug!(%url, transaction_id = %transaction_id, "submitting transaction");

        let response = self.http.post(&url).body(payload.to_vec()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Network(format!("{}: {}", status, message)));
        }

        Ok(())
    }

    async fn get_receipt(&self, transaction_id: &TransactionId) -> Result<Option<ReceiptResponse>> {
        let path = format!(
            "/api/v1/transactions/{}",
            Self::mirror_transaction_id(transaction_id)
        );
        let body = match self.get_json(&path).await? {
            Some(body) => body,
            None => return Ok(None),
        };

        let row = match body
            .get("transactions")
            .and_then(|v| v.as_array())
            .and_then(|rows| rows.first())
        {
            Some(row) => row,
            None => return Ok(None),
        };

        let status = StatusCode::from(
            row.get("result")
                .and_then(|v| v.as_str())
                .unwrap_or("UNKNOWN")
                .to_string(),
        );
        let created_entity_id = row
            .get("entity_id")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(Some(ReceiptResponse {
            status,
            created_entity_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_transaction_id_format() {
        let id = TransactionId {
            account_id: AccountId::new(42),
            valid_start_secs: 1_700_000_000,
            valid_start_nanos: 5,
        };
        assert_eq!(
            RestEndpoint::mirror_transaction_id(&id),
            "0.0.42-1700000000-000000005"
        );
    }

    #[tokio::test]
    async fn test_client_binds_account_and_network() {
        let ledger = Arc::new(InProcessLedger::new());
        let client =
            NetworkClient::with_endpoint(AccountId::new(7), NetworkId::Testnet, ledger);

        assert_eq!(client.account_id(), AccountId::new(7));
        assert_eq!(client.network(), NetworkId::Testnet);
    }

    #[tokio::test]
    async fn test_unknown_account_reads_as_empty() {
        let ledger = Arc::new(InProcessLedger::new());
        let client =
            NetworkClient::with_endpoint(AccountId::new(999), NetworkId::Testnet, ledger);

        // Fresh account: zero balance, no tokens, no history - never errors
        assert_eq!(client.get_balance().await.unwrap(), 0);
        assert!(client.list_tokens().await.unwrap().is_empty());
        assert!(client.list_transactions(10).await.unwrap().is_empty());
    }
}
