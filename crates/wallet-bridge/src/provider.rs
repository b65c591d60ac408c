//! Page-side provider
//!
//! The API a page context holds: fire a request with a fresh
//! correlation id, then await the matching response. Responses are
//! matched strictly by id; a response with an id this provider never
//! issued is dropped with no observable effect, so concurrent page
//! contexts cannot see each other's traffic.

use crate::{BridgeError, BridgeMethod, BridgeRequest, BridgeResponse, RequestId, Result};
use dashmap::DashMap;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

/// Default wait for a response before giving up
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Page-side entry point to the bridge
#[derive(Clone)]
pub struct PageProvider {
    requests: mpsc::Sender<BridgeRequest>,
    pending: Arc<DashMap<RequestId, oneshot::Sender<BridgeResponse>>>,
    call_timeout: Duration,
}

impl PageProvider {
    /// Create a provider sending on the given channel, and spawn the
    /// dispatcher that routes incoming responses to their callers.
    pub fn start(
        requests: mpsc::Sender<BridgeRequest>,
        responses: mpsc::Receiver<BridgeResponse>,
    ) -> (Self, JoinHandle<()>) {
        let provider = Self {
            requests,
            pending: Arc::new(DashMap::new()),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        };
        let dispatcher = provider.clone().spawn_dispatcher(responses);
        (provider, dispatcher)
    }

    /// Override the per-call timeout
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    fn spawn_dispatcher(self, mut responses: mpsc::Receiver<BridgeResponse>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(response) = responses.recv().await {
                match self.pending.remove(&response.id) {
                    Some((_, waiter)) => {
                        let _ = waiter.send(response);
                    }
                    None => {
                        // Not ours, or the caller already timed out
                        debug!(id = %response.id, "dropping uncorrelated response");
                    }
                }
            }
        })
    }

    /// Send a raw request and await its correlated response
    pub async fn call(&self, method: BridgeMethod, params: Value) -> Result<Value> {
        let request = BridgeRequest::new(method, params);
        let id = request.id.clone();

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);

        if self.requests.send(request).await.is_err() {
            self.pending.remove(&id);
            return Err(BridgeError::ChannelClosed("request channel".to_string()));
        }

        let response = match tokio::time::timeout(self.call_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                self.pending.remove(&id);
                return Err(BridgeError::ChannelClosed("response channel".to_string()));
            }
            Err(_) => {
                self.pending.remove(&id);
                return Err(BridgeError::Timeout(id.to_string()));
            }
        };

        match response.error {
            None => Ok(response.result.unwrap_or(Value::Null)),
            Some(code) => Err(match code.as_str() {
                "UnsupportedMethodError" => BridgeError::UnsupportedMethod(
                    response.message.unwrap_or_else(|| method.to_string()),
                ),
                _ => BridgeError::Wallet(response.message.unwrap_or(code)),
            }),
        }
    }

    /// `connect`: the wallet's account id and network
    pub async fn connect(&self) -> Result<Value> {
        self.call(BridgeMethod::Connect, json!({})).await
    }

    /// `getAccountInfo`: balance, network and token holdings
    pub async fn get_account_info(&self) -> Result<Value> {
        self.call(BridgeMethod::GetAccountInfo, json!({})).await
    }

    /// `sendTransaction`: transfer to a recipient. `asset` is `None`
    /// for the native asset or a token id string.
    pub async fn send_transaction(
        &self,
        recipient_id: &str,
        amount: &str,
        asset: Option<&str>,
        memo: Option<&str>,
    ) -> Result<Value> {
        self.call(
            BridgeMethod::SendTransaction,
            json!({
                "recipientId": recipient_id,
                "amount": amount,
                "asset": asset,
                "memo": memo,
            }),
        )
        .await
    }

    /// `signMessage`: hex-encoded signature over the message bytes
    pub async fn sign_message(&self, message: &str) -> Result<Value> {
        self.call(BridgeMethod::SignMessage, json!({ "message": message }))
            .await
    }

    /// Number of requests still awaiting responses
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl std::fmt::Debug for PageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageProvider")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
