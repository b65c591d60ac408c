//! # Hedera Wallet Bridge
//!
//! Request bridge between untrusted page contexts and the wallet.
//! Traffic crosses three hops, correlated end to end by request id:
//!
//! 1. **PageProvider**: page-side API; issues ids, awaits responses
//! 2. **ContentRelay**: screens methods against a closed allow-list
//! 3. **WalletService**: executes requests against the wallet session
//!
//! The allow-list is enforced at the relay: an unsupported method is
//! bounced back as an error response and never reaches the wallet.
//! Responses whose id matches no pending request are dropped silently.
//!
//! ```rust,ignore
//! use hedera_wallet_bridge::{ContentRelay, PageProvider, WalletService, CHANNEL_CAPACITY};
//! use tokio::sync::mpsc;
//!
//! let (page_req_tx, page_req_rx) = mpsc::channel(CHANNEL_CAPACITY);
//! let (service_req_tx, service_req_rx) = mpsc::channel(CHANNEL_CAPACITY);
//! let (service_resp_tx, service_resp_rx) = mpsc::channel(CHANNEL_CAPACITY);
//! let (page_resp_tx, page_resp_rx) = mpsc::channel(CHANNEL_CAPACITY);
//!
//! ContentRelay::spawn(page_req_rx, service_req_tx, service_resp_rx, page_resp_tx);
//! WalletService::new(manager).spawn(service_req_rx, service_resp_tx);
//! let (provider, _dispatcher) = PageProvider::start(page_req_tx, page_resp_rx);
//!
//! let info = provider.connect().await?;
//! ```

pub mod error;
pub mod message;
pub mod provider;
pub mod relay;
pub mod service;

pub use error::{BridgeError, Result};
pub use message::{BridgeMethod, BridgeRequest, BridgeResponse, RequestId, WireMessage};
pub use provider::{PageProvider, DEFAULT_CALL_TIMEOUT};
pub use relay::{ContentRelay, CHANNEL_CAPACITY};
pub use service::{WalletService, DEFAULT_REQUEST_TIMEOUT};
