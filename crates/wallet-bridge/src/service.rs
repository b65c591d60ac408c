//! Wallet-side request handler
//!
//! Terminal hop of the bridge: executes allow-listed requests against
//! the session manager and answers each with a correlated response.
//! Requests from one page connection are handled one at a time, in
//! arrival order, so a page cannot race its own transactions.
//!
//! Every request runs under a deadline. An unresponsive network
//! endpoint turns into a `TimeoutError` response for that request and
//! the loop moves on; it can never wedge the bridge.

use crate::{BridgeError, BridgeMethod, BridgeRequest, BridgeResponse, Result};
use hedera_wallet_core::storage::WalletStore;
use hedera_wallet_core::{parse_hbar, AssetRef, SessionManager, TransactionDraft};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default deadline for handling one request, network waits included
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendTransactionParams {
    recipient_id: String,
    /// Decimal amount: whole-unit string for the native asset
    /// ("2.5"), integer string of base units for tokens
    amount: String,
    /// `None` or `"hbar"` for the native asset, a token id otherwise
    #[serde(default)]
    asset: Option<String>,
    #[serde(default)]
    memo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignMessageParams {
    message: String,
}

/// Executes bridge requests against the wallet session
pub struct WalletService<S: WalletStore> {
    manager: Arc<SessionManager<S>>,
    request_timeout: Duration,
}

impl<S: WalletStore + 'static> WalletService<S> {
    /// Create a service over an existing session manager
    pub fn new(manager: Arc<SessionManager<S>>) -> Self {
        Self {
            manager,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request deadline
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Spawn the sequential request loop. Runs until the request
    /// channel closes.
    pub fn spawn(
        self,
        mut requests: mpsc::Receiver<BridgeRequest>,
        responses: mpsc::Sender<BridgeResponse>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(request) = requests.recv().await {
                let response = self.handle(request).await;
                if responses.send(response).await.is_err() {
                    break;
                }
            }
            debug!("wallet service stopped");
        })
    }

    /// Handle one request, always producing a correlated response.
    /// Network waits are bounded by the request deadline; dropping the
    /// timed-out dispatch abandons any pending receipt poll.
    pub async fn handle(&self, request: BridgeRequest) -> BridgeResponse {
        let id = request.id.clone();
        debug!(%id, method = %request.method, "handling request");

        let outcome = match request.method.parse::<BridgeMethod>() {
            Ok(method) => {
                match tokio::time::timeout(
                    self.request_timeout,
                    self.dispatch(method, request.params),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(%id, %method, "request deadline elapsed");
                        Err(BridgeError::Timeout(id.to_string()))
                    }
                }
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(result) => BridgeResponse::ok(id, result),
            Err(err) => BridgeResponse::err(id, &err),
        }
    }

    async fn dispatch(&self, method: BridgeMethod, params: Value) -> Result<Value> {
        match method {
            BridgeMethod::Connect => self.connect().await,
            BridgeMethod::GetAccountInfo => self.get_account_info().await,
            BridgeMethod::SendTransaction => {
                self.send_transaction(serde_json::from_value(params)?).await
            }
            BridgeMethod::SignMessage => {
                self.sign_message(serde_json::from_value(params)?).await
            }
        }
    }

    async fn connect(&self) -> Result<Value> {
        let account_id = self.manager.account_id().await?;
        let network = self.manager.network().await?;
        Ok(json!({
            "accountId": account_id.to_string(),
            "network": network.to_string(),
        }))
    }

    async fn get_account_info(&self) -> Result<Value> {
        let account_id = self.manager.account_id().await?;
        let network = self.manager.network().await?;
        let client = self.manager.client().await?;
        let balance = client.get_balance().await.map_err(BridgeError::from)?;
        let tokens = client.list_tokens().await.map_err(BridgeError::from)?;
        Ok(json!({
            "accountId": account_id.to_string(),
            "network": network.to_string(),
            "balance": balance,
            "tokens": tokens,
        }))
    }

    async fn send_transaction(&self, params: SendTransactionParams) -> Result<Value> {
        let sender = self.manager.account_id().await?;
        let recipient = params
            .recipient_id
            .parse()
            .map_err(BridgeError::from)?;

        let (asset, amount) = match params.asset.as_deref() {
            None | Some("hbar") => (AssetRef::Hbar, parse_hbar(&params.amount)?),
            Some(token) => {
                let token = token.parse().map_err(BridgeError::from)?;
                let amount = params.amount.parse::<i64>().map_err(|_| {
                    BridgeError::Serialization(format!(
                        "Invalid token amount: {}",
                        params.amount
                    ))
                })?;
                (AssetRef::Token(token), amount)
            }
        };

        let mut draft = TransactionDraft::transfer(asset, sender, recipient, amount)?;
        if let Some(memo) = params.memo {
            draft = draft.with_memo(memo);
        }

        let result = self.manager.execute(draft).await?;
        info!(transaction_id = %result.transaction_id, status = %result.status, "page transaction executed");
        Ok(serde_json::to_value(result)?)
    }

    async fn sign_message(&self, params: SignMessageParams) -> Result<Value> {
        let signature = self
            .manager
            .sign_message(params.message.as_bytes())
            .await?;
        Ok(json!({ "signature": hex::encode(&signature) }))
    }
}
