//! # Hedera Wallet Core
//!
//! Core library for a single-account Hedera wallet: key custody,
//! encrypted storage, transaction building, signing and execution.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Key Vault**: passphrase-sealed key material (ChaCha20-Poly1305)
//! - **Wallet Storage**: one persisted record, memory and file backends
//! - **Session Manager**: lock/unlock lifecycle around the decrypted key
//! - **Network Client**: mirror node queries and transaction submission
//! - **Transaction Pipeline**: build, freeze, sign, submit, await receipt
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hedera_wallet_core::{AccountId, AssetRef, SessionManager, TransactionDraft};
//! use hedera_wallet_core::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! let manager = SessionManager::new(Arc::new(MemoryStore::new()));
//! manager.import_wallet("0.0.1234".parse()?, key, "passphrase").await?;
//!
//! let draft = TransactionDraft::transfer(
//!     AssetRef::Hbar,
//!     manager.account_id().await?,
//!     "0.0.5678".parse()?,
//!     hedera_wallet_core::parse_hbar("2.5")?,
//! )?;
//! let result = manager.execute(draft).await?;
//! assert!(result.status.is_success());
//! ```
//!
//! ## Security Model
//!
//! The private key exists in plaintext only inside an unlocked session
//! and is zeroized on drop. At rest it is sealed under a passphrase-derived
//! key; a wrong passphrase is indistinguishable from tampered ciphertext.

pub mod error;
pub mod execute;
pub mod network;
pub mod session;
pub mod sign;
pub mod storage;
pub mod transaction;
pub mod types;
pub mod vault;

pub use error::{Error, Result};
pub use network::{
    EndpointProvider, FixedEndpoint, InProcessLedger, LedgerEndpoint, NetworkClient, RestEndpoint,
};
pub use session::{SessionManager, WalletState};
pub use sign::{SignaturePair, SignedTransaction};
pub use storage::{FileStore, MemoryStore, WalletRecord, WalletStore};
pub use transaction::{FrozenTransaction, TransactionBody, TransactionDraft, TransferLeg};
pub use types::{
    AccountId, AssetRef, ContractId, ExecutionResult, NetworkId, PrivateKey, PublicKeyBytes,
    StatusCode, TokenId, TransactionId, parse_hbar, TINYBARS_PER_HBAR, WALLET_RECORD_KEY,
};
pub use vault::SecretEnvelope;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
