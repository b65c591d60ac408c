//! Wallet session lifecycle
//!
//! The wallet holds at most one account. Its decrypted key lives only
//! inside an unlocked [`Session`], held in memory behind the manager's
//! lock and dropped on `lock()`. Persistent state is the sealed record
//! in the [`WalletStore`]; unlocking never writes, importing and
//! switching networks do.
//!
//! State machine: `Uninitialized` (no stored record), `Locked` (record
//! exists, no session), `Unlocked` (session active). A failed unlock
//! leaves the wallet `Locked` with no session side effects.

use crate::network::{EndpointProvider, NetworkClient, RestProvider};
use crate::storage::{WalletRecord, WalletStore};
use crate::transaction::TransactionDraft;
use crate::{
    execute, sign, vault, AccountId, Error, ExecutionResult, NetworkId, PrivateKey, Result,
    WALLET_RECORD_KEY,
};
use k256::ecdsa::{signature::Signer, Signature as EcdsaSignature};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Observable wallet state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletState {
    /// No wallet record stored
    Uninitialized,
    /// Record stored, key sealed
    Locked,
    /// Key decrypted and held in memory
    Unlocked,
}

/// An unlocked session: the decrypted key and the network client bound
/// to the wallet's account and selected network
struct Session {
    account_id: AccountId,
    key: PrivateKey,
    network: NetworkId,
    client: NetworkClient,
}

/// Manages the wallet's single account across lock/unlock cycles
pub struct SessionManager<S: WalletStore> {
    store: Arc<S>,
    provider: Arc<dyn EndpointProvider>,
    session: Mutex<Option<Session>>,
    /// Serializes submissions without blocking other session operations
    submission: Mutex<()>,
}

impl<S: WalletStore> SessionManager<S> {
    /// Create a manager using mirror node REST endpoints
    pub fn new(store: Arc<S>) -> Self {
        Self::with_provider(store, Arc::new(RestProvider))
    }

    /// Create a manager with a custom endpoint provider
    pub fn with_provider(store: Arc<S>, provider: Arc<dyn EndpointProvider>) -> Self {
        Self {
            store,
            provider,
            session: Mutex::new(None),
            submission: Mutex::new(()),
        }
    }

    fn open_session(&self, account_id: AccountId, key: PrivateKey, network: NetworkId) -> Session {
        let client =
            NetworkClient::with_endpoint(account_id, network, self.provider.endpoint(network));
        Session {
            account_id,
            key,
            network,
            client,
        }
    }

    /// Current state, derived from the store and the in-memory session
    pub async fn state(&self) -> Result<WalletState> {
        if self.session.lock().await.is_some() {
            return Ok(WalletState::Unlocked);
        }
        if self.store.exists(WALLET_RECORD_KEY).await? {
            return Ok(WalletState::Locked);
        }
        Ok(WalletState::Uninitialized)
    }

    /// Import a key for the wallet's account, sealing it under the
    /// passphrase and replacing any existing record. The wallet comes
    /// up unlocked on the default network.
    pub async fn import_wallet(
        &self,
        account_id: AccountId,
        key: PrivateKey,
        passphrase: &str,
    ) -> Result<()> {
        let network = NetworkId::default();
        let envelope = vault::seal(&key.to_bytes()[..], passphrase)?;
        let record = WalletRecord {
            account_id,
            envelope,
            network,
        };
        self.store.put(WALLET_RECORD_KEY, &record).await?;
        info!(%account_id, %network, "wallet imported");

        let mut session = self.session.lock().await;
        *session = Some(self.open_session(account_id, key, network));
        Ok(())
    }

    /// Unlock the stored wallet. A wrong passphrase yields an opaque
    /// authentication error and leaves the wallet locked.
    pub async fn unlock(&self, passphrase: &str) -> Result<()> {
        let record = self
            .store
            .get(WALLET_RECORD_KEY)
            .await?
            .ok_or_else(|| Error::Precondition("No wallet to unlock".to_string()))?;

        let secret = vault::open(&record.envelope, passphrase)?;
        let bytes = Zeroizing::new(
            <[u8; 32]>::try_from(secret.as_slice())
                .map_err(|_| Error::Storage("Stored key has wrong length".to_string()))?,
        );
        let key = PrivateKey::from_bytes(*bytes)?;

        let mut session = self.session.lock().await;
        *session = Some(self.open_session(record.account_id, key, record.network));
        debug!(account_id = %record.account_id, "wallet unlocked");
        Ok(())
    }

    /// Drop the in-memory session. The stored record is untouched.
    pub async fn lock(&self) {
        let mut session = self.session.lock().await;
        *session = None;
        debug!("wallet locked");
    }

    /// Remove the stored record and any active session
    pub async fn forget(&self) -> Result<()> {
        self.lock().await;
        self.store.delete(WALLET_RECORD_KEY).await
    }

    /// Account of the active session
    pub async fn account_id(&self) -> Result<AccountId> {
        let session = self.session.lock().await;
        session
            .as_ref()
            .map(|s| s.account_id)
            .ok_or_else(|| Error::Precondition("Wallet is locked".to_string()))
    }

    /// Network of the active session
    pub async fn network(&self) -> Result<NetworkId> {
        let session = self.session.lock().await;
        session
            .as_ref()
            .map(|s| s.network)
            .ok_or_else(|| Error::Precondition("Wallet is locked".to_string()))
    }

    /// Switch the active session to another network and persist the
    /// choice. Subsequent queries and submissions go to the new network.
    pub async fn switch_network(&self, network: NetworkId) -> Result<()> {
        let mut session = self.session.lock().await;
        let current = session
            .as_mut()
            .ok_or_else(|| Error::Precondition("Wallet is locked".to_string()))?;

        let mut record = self
            .store
            .get(WALLET_RECORD_KEY)
            .await?
            .ok_or_else(|| Error::Storage("Wallet record missing".to_string()))?;
        record.network = network;
        self.store.put(WALLET_RECORD_KEY, &record).await?;

        current.network = network;
        current.client = NetworkClient::with_endpoint(
            current.account_id,
            network,
            self.provider.endpoint(network),
        );
        info!(%network, "switched network");
        Ok(())
    }

    /// Clone of the active session's network client for queries
    pub async fn client(&self) -> Result<NetworkClient> {
        let session = self.session.lock().await;
        session
            .as_ref()
            .map(|s| s.client.clone())
            .ok_or_else(|| Error::Precondition("Wallet is locked".to_string()))
    }

    /// Freeze, sign and execute a draft with the session's key.
    ///
    /// Submissions from one wallet run one at a time through the
    /// submission lock. The session lock is only held to snapshot the
    /// key and client, so a slow receipt poll never blocks unrelated
    /// session operations. The receipt wait has no internal deadline;
    /// callers that cannot wait forever wrap this call with
    /// `tokio::time::timeout`, and abandoning the future releases the
    /// submission slot.
    pub async fn execute(&self, draft: TransactionDraft) -> Result<ExecutionResult> {
        let (key, client) = {
            let session = self.session.lock().await;
            let session = session
                .as_ref()
                .ok_or_else(|| Error::Precondition("Wallet is locked".to_string()))?;
            (session.key.clone(), session.client.clone())
        };

        let _slot = self.submission.lock().await;
        let frozen = draft.freeze(&client)?;
        let signed = sign::sign(frozen, &key)?;
        execute::execute(&signed, &client).await
    }

    /// Sign an arbitrary message with the session's key
    pub async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>> {
        let session = self.session.lock().await;
        let session = session
            .as_ref()
            .ok_or_else(|| Error::Precondition("Wallet is locked".to_string()))?;

        let signature: EcdsaSignature = session.key.signing_key().sign(message);
        Ok(signature.to_bytes().to_vec())
    }
}

impl<S: WalletStore> std::fmt::Debug for SessionManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn manager() -> SessionManager<MemoryStore> {
        SessionManager::new(Arc::new(MemoryStore::new()))
    }

    fn key(seed: u8) -> PrivateKey {
        PrivateKey::from_bytes([seed; 32]).unwrap()
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let manager = manager();
        assert_eq!(manager.state().await.unwrap(), WalletState::Uninitialized);

        manager
            .import_wallet(AccountId::new(1001), key(5), "hunter2")
            .await
            .unwrap();
        assert_eq!(manager.state().await.unwrap(), WalletState::Unlocked);
        assert_eq!(manager.account_id().await.unwrap(), AccountId::new(1001));
        assert_eq!(manager.network().await.unwrap(), NetworkId::Testnet);

        manager.lock().await;
        assert_eq!(manager.state().await.unwrap(), WalletState::Locked);

        manager.unlock("hunter2").await.unwrap();
        assert_eq!(manager.state().await.unwrap(), WalletState::Unlocked);
    }

    #[tokio::test]
    async fn test_wrong_passphrase_is_opaque_and_leaves_locked() {
        let manager = manager();
        manager
            .import_wallet(AccountId::new(1001), key(5), "hunter2")
            .await
            .unwrap();
        manager.lock().await;

        let err = manager.unlock("wrong").await.unwrap_err();
        assert!(matches!(err, Error::Authentication));
        assert_eq!(manager.state().await.unwrap(), WalletState::Locked);
        assert!(matches!(
            manager.account_id().await.unwrap_err(),
            Error::Precondition(_)
        ));
    }

    #[tokio::test]
    async fn test_unlock_without_record_is_precondition() {
        let manager = manager();
        let err = manager.unlock("anything").await.unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[tokio::test]
    async fn test_switch_network_persists() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(store.clone());
        manager
            .import_wallet(AccountId::new(1001), key(5), "hunter2")
            .await
            .unwrap();

        manager.switch_network(NetworkId::Mainnet).await.unwrap();
        assert_eq!(manager.network().await.unwrap(), NetworkId::Mainnet);

        let record = store.get(WALLET_RECORD_KEY).await.unwrap().unwrap();
        assert_eq!(record.network, NetworkId::Mainnet);

        // Survives a lock cycle
        manager.lock().await;
        manager.unlock("hunter2").await.unwrap();
        assert_eq!(manager.network().await.unwrap(), NetworkId::Mainnet);
    }

    #[tokio::test]
    async fn test_locked_operations_are_preconditions() {
        let manager = manager();
        assert!(matches!(
            manager.sign_message(b"hi").await.unwrap_err(),
            Error::Precondition(_)
        ));
        assert!(matches!(
            manager.client().await.unwrap_err(),
            Error::Precondition(_)
        ));
    }

    #[tokio::test]
    async fn test_forget_clears_everything() {
        let manager = manager();
        manager
            .import_wallet(AccountId::new(1001), key(5), "hunter2")
            .await
            .unwrap();
        manager.forget().await.unwrap();
        assert_eq!(manager.state().await.unwrap(), WalletState::Uninitialized);
    }
}
