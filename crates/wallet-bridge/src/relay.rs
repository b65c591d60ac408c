//! The relay hop between page and wallet service
//!
//! Requests are screened against the method allow-list here, before
//! they can reach the wallet: an unsupported method is answered with
//! an error response directly, and the wallet service never sees it.
//! Responses travel back unchanged.

use crate::{BridgeMethod, BridgeRequest, BridgeResponse};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Channel capacity for each hop
pub const CHANNEL_CAPACITY: usize = 64;

/// Screens and forwards traffic between the page and the wallet service
pub struct ContentRelay;

impl ContentRelay {
    /// Spawn the relay task. Runs until both inbound channels close.
    pub fn spawn(
        mut from_page: mpsc::Receiver<BridgeRequest>,
        to_service: mpsc::Sender<BridgeRequest>,
        mut from_service: mpsc::Receiver<BridgeResponse>,
        to_page: mpsc::Sender<BridgeResponse>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    request = from_page.recv() => {
                        let Some(request) = request else { break };
                        Self::screen(request, &to_service, &to_page).await;
                    }
                    response = from_service.recv() => {
                        let Some(response) = response else { break };
                        debug!(id = %response.id, "relaying response to page");
                        if to_page.send(response).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("relay stopped");
        })
    }

    async fn screen(
        request: BridgeRequest,
        to_service: &mpsc::Sender<BridgeRequest>,
        to_page: &mpsc::Sender<BridgeResponse>,
    ) {
        match request.method.parse::<BridgeMethod>() {
            Ok(method) => {
                debug!(id = %request.id, %method, "relaying request to wallet");
                if to_service.send(request).await.is_err() {
                    warn!("wallet service channel closed, dropping request");
                }
            }
            Err(err) => {
                warn!(id = %request.id, method = %request.method, "rejected request");
                let response = BridgeResponse::err(request.id, &err);
                let _ = to_page.send(response).await;
            }
        }
    }
}
