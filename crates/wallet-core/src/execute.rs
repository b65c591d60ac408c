//! Transaction execution pipeline
//!
//! Submission and receipt retrieval are separate round trips, the way
//! the ledger exposes them. [`submit`] hands the signed payload to the
//! network and returns the transaction id to poll on; [`await_receipt`]
//! polls until the ledger reports an outcome. [`execute`] chains both.
//!
//! A receipt is always returned as data, whatever its status. Failed
//! consensus outcomes (invalid signature, duplicate, insufficient
//! balance) are results to inspect, not transport errors.

use crate::network::NetworkClient;
use crate::sign::SignedTransaction;
use crate::{ExecutionResult, Result, TransactionId};
use std::time::Duration;
use tracing::debug;

/// Interval between receipt polls
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Submit a signed transaction to the network. Returns the id to poll
/// receipts on; does not wait for consensus.
pub async fn submit(
    transaction: &SignedTransaction,
    client: &NetworkClient,
) -> Result<TransactionId> {
    let transaction_id = transaction.transaction.transaction_id();
    let payload = transaction.to_bytes()?;

    debug!(%transaction_id, bytes = payload.len(), "submitting transaction");
    client.submit_transaction(&transaction_id, &payload).await?;

    Ok(transaction_id)
}

/// Poll the network until a receipt is available. Runs without an
/// internal deadline; callers bound it with `tokio::time::timeout`
/// when they need one.
pub async fn await_receipt(
    transaction_id: &TransactionId,
    client: &NetworkClient,
) -> Result<ExecutionResult> {
    loop {
        if let Some(receipt) = client.transaction_receipt(transaction_id).await? {
            debug!(%transaction_id, status = %receipt.status, "receipt available");
            return Ok(ExecutionResult {
                transaction_id: transaction_id.to_string(),
                status: receipt.status,
                created_entity_id: receipt.created_entity_id,
            });
        }
        tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
    }
}

/// Submit and wait for the receipt in one call
pub async fn execute(
    transaction: &SignedTransaction,
    client: &NetworkClient,
) -> Result<ExecutionResult> {
    let transaction_id = submit(transaction, client).await?;
    await_receipt(&transaction_id, client).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::InProcessLedger;
    use crate::transaction::TransactionDraft;
    use crate::{sign, AccountId, AssetRef, NetworkId, PrivateKey, StatusCode};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_execute_returns_receipt_as_data() {
        let ledger = Arc::new(InProcessLedger::new());
        let a = AccountId::new(1001);
        let b = AccountId::new(1002);
        let key = PrivateKey::from_bytes([7u8; 32]).unwrap();
        ledger.seed_account(a, 10_000, key.public_key());
        ledger.seed_account(b, 0, PrivateKey::from_bytes([8u8; 32]).unwrap().public_key());

        let client = NetworkClient::with_endpoint(a, NetworkId::Testnet, ledger.clone());

        let frozen = TransactionDraft::transfer(AssetRef::Hbar, a, b, 2_500)
            .unwrap()
            .freeze(&client)
            .unwrap();
        let signed = sign::sign(frozen, &key).unwrap();

        let result = execute(&signed, &client).await.unwrap();
        assert_eq!(result.status, StatusCode::Success);
        assert!(result.status.is_success());
        assert_eq!(ledger.balance_of(&b), 2_500);
    }

    #[tokio::test]
    async fn test_failed_outcome_is_not_a_transport_error() {
        let ledger = Arc::new(InProcessLedger::new());
        let a = AccountId::new(1001);
        let key = PrivateKey::from_bytes([7u8; 32]).unwrap();
        ledger.seed_account(a, 10_000, key.public_key());

        let client = NetworkClient::with_endpoint(a, NetworkId::Testnet, ledger);

        let frozen = TransactionDraft::transfer(AssetRef::Hbar, a, AccountId::new(1002), 100)
            .unwrap()
            .freeze(&client)
            .unwrap();
        let wrong_key = PrivateKey::from_bytes([9u8; 32]).unwrap();
        let signed = sign::sign(frozen, &wrong_key).unwrap();

        let result = execute(&signed, &client).await.unwrap();
        assert_eq!(result.status, StatusCode::InvalidSignature);
        assert!(!result.status.is_success());
    }
}
