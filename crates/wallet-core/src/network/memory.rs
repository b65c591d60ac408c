//! In-process ledger for testing and local development
//!
//! Implements [`LedgerEndpoint`] against in-memory state: seeded
//! accounts with balances and keys, token associations, and a receipt
//! log. Submitted transactions are decoded, signature-checked and
//! applied, so the full build/sign/submit/receipt pipeline can run in
//! a single process.
//!
//! Receipts for one transaction id form a list, newest last, the way
//! the real query surface reports duplicates: re-submitting the same
//! signed transaction is a distinct round trip whose outcome is a
//! `DUPLICATE_TRANSACTION` receipt, never a silent dedupe.

use super::{
    AccountInfo, LedgerEndpoint, ReceiptResponse, TokenBalance, TransactionSummary,
};
use crate::sign::SignedTransaction;
use crate::transaction::TransactionBody;
use crate::{
    AccountId, Error, PublicKeyBytes, Result, StatusCode, TokenId, TransactionId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct TokenMeta {
    name: String,
    symbol: String,
}

/// In-memory ledger endpoint
pub struct InProcessLedger {
    /// Native balances in tinybars
    balances: DashMap<AccountId, i64>,
    /// Known account keys, for signature checks
    account_keys: DashMap<AccountId, PublicKeyBytes>,
    /// Token metadata by id
    token_meta: DashMap<TokenId, TokenMeta>,
    /// Token association and balance per (account, token)
    token_balances: DashMap<(AccountId, TokenId), u64>,
    /// Receipts per transaction id, newest last
    receipts: DashMap<String, Vec<ReceiptResponse>>,
    /// Transaction history with the accounts each row involves
    history: Mutex<Vec<(Vec<AccountId>, TransactionSummary)>>,
    /// Next entity number to assign on creation
    next_entity: AtomicU64,
}

impl InProcessLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
            account_keys: DashMap::new(),
            token_meta: DashMap::new(),
            token_balances: DashMap::new(),
            receipts: DashMap::new(),
            history: Mutex::new(Vec::new()),
            next_entity: AtomicU64::new(2000),
        }
    }

    /// Seed an account with a balance and its public key
    pub fn seed_account(&self, id: AccountId, balance: i64, public_key: PublicKeyBytes) {
        self.balances.insert(id, balance);
        self.account_keys.insert(id, public_key);
    }

    /// Current native balance of an account, zero if unknown
    pub fn balance_of(&self, id: &AccountId) -> i64 {
        self.balances.get(id).map(|b| *b).unwrap_or(0)
    }

    /// Current token balance, `None` when not associated
    pub fn token_balance_of(&self, account: &AccountId, token: &TokenId) -> Option<u64> {
        self.token_balances.get(&(*account, *token)).map(|b| *b)
    }

    /// Number of times a transaction id has been submitted
    pub fn submission_count(&self, id: &TransactionId) -> usize {
        self.receipts.get(&id.to_string()).map(|r| r.len()).unwrap_or(0)
    }

    fn record(&self, involved: Vec<AccountId>, id: &TransactionId, name: &str, status: &StatusCode) {
        let summary = TransactionSummary {
            transaction_id: id.to_string(),
            name: name.to_string(),
            consensus_timestamp: format!("{}.{:09}", id.valid_start_secs, id.valid_start_nanos),
            result: status.clone(),
            charged_fee: 0,
        };
        self.history
            .lock()
            .expect("history lock poisoned")
            .push((involved, summary));
    }

    fn push_receipt(&self, id: &TransactionId, receipt: ReceiptResponse) {
        self.receipts.entry(id.to_string()).or_default().push(receipt);
    }

    /// Whether `account`'s known key has signed `tx`. Accounts the
    /// ledger has no key for cannot be checked and pass.
    fn signed_by(&self, tx: &SignedTransaction, account: &AccountId) -> bool {
        match self.account_keys.get(account) {
            Some(key) => tx.has_signature_from(key.value()),
            None => true,
        }
    }

    /// Decode, validate and apply a submitted transaction, producing
    /// its receipt status and any created entity.
    fn apply(&self, tx: &SignedTransaction) -> Result<(StatusCode, Option<String>)> {
        if !tx.verify_signatures()? {
            return Ok((StatusCode::InvalidSignature, None));
        }

        let payer = tx.transaction.payer();
        if !self.signed_by(tx, &payer) {
            return Ok((StatusCode::InvalidSignature, None));
        }

        match tx.transaction.body() {
            TransactionBody::Transfer { asset, legs } => {
                // Every debited account must have signed
                for leg in legs.iter().filter(|l| l.delta < 0) {
                    if !self.signed_by(tx, &leg.party) {
                        return Ok((StatusCode::InvalidSignature, None));
                    }
                }

                match asset {
                    crate::AssetRef::Hbar => {
                        for leg in legs.iter().filter(|l| l.delta < 0) {
                            if self.balance_of(&leg.party) < -leg.delta {
                                return Ok((StatusCode::InsufficientPayerBalance, None));
                            }
                        }
                        for leg in legs {
                            *self.balances.entry(leg.party).or_insert(0) += leg.delta;
                        }
                    }
                    crate::AssetRef::Token(token) => {
                        for leg in legs {
                            if !self.token_balances.contains_key(&(leg.party, *token)) {
                                return Ok((StatusCode::TokenNotAssociatedToAccount, None));
                            }
                        }
                        for leg in legs.iter().filter(|l| l.delta < 0) {
                            let held = self.token_balance_of(&leg.party, token).unwrap_or(0);
                            if held < (-leg.delta) as u64 {
                                return Ok((StatusCode::InsufficientTokenBalance, None));
                            }
                        }
                        for leg in legs {
                            let mut entry =
                                self.token_balances.entry((leg.party, *token)).or_insert(0);
                            if leg.delta < 0 {
                                *entry -= (-leg.delta) as u64;
                            } else {
                                *entry += leg.delta as u64;
                            }
                        }
                    }
                }
                Ok((StatusCode::Success, None))
            }

            TransactionBody::TokenCreate {
                name,
                symbol,
                initial_supply,
                treasury,
                ..
            } => {
                let token = TokenId::new(self.next_entity.fetch_add(1, Ordering::SeqCst));
                self.token_meta.insert(
                    token,
                    TokenMeta {
                        name: name.clone(),
                        symbol: symbol.clone(),
                    },
                );
                self.token_balances
                    .insert((*treasury, token), *initial_supply);
                Ok((StatusCode::Success, Some(token.to_string())))
            }

            TransactionBody::TokenAssociate { account, token } => {
                if !self.signed_by(tx, account) {
                    return Ok((StatusCode::InvalidSignature, None));
                }
                self.token_balances.entry((*account, *token)).or_insert(0);
                Ok((StatusCode::Success, None))
            }

            TransactionBody::ContractCreate { .. } => {
                let num = self.next_entity.fetch_add(1, Ordering::SeqCst);
                Ok((StatusCode::Success, Some(format!("0.0.{}", num))))
            }

            TransactionBody::ContractCall { .. } => Ok((StatusCode::Success, None)),
        }
    }
}

impl Default for InProcessLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerEndpoint for InProcessLedger {
    async fn get_account(&self, id: &AccountId) -> Result<Option<AccountInfo>> {
        if !self.balances.contains_key(id) {
            return Ok(None);
        }
        Ok(Some(AccountInfo {
            account_id: *id,
            balance: self.balance_of(id),
        }))
    }

    async fn get_account_tokens(&self, id: &AccountId) -> Result<Vec<TokenBalance>> {
        let mut rows: Vec<TokenBalance> = self
            .token_balances
            .iter()
            .filter(|entry| entry.key().0 == *id)
            .map(|entry| {
                let token = entry.key().1;
                let meta = self.token_meta.get(&token);
                TokenBalance {
                    token_id: token.to_string(),
                    balance: *entry.value(),
                    symbol: meta.as_ref().map(|m| m.symbol.clone()),
                    name: meta.as_ref().map(|m| m.name.clone()),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.token_id.cmp(&b.token_id));
        Ok(rows)
    }

    async fn get_transactions(
        &self,
        id: &AccountId,
        limit: usize,
    ) -> Result<Vec<TransactionSummary>> {
        let history = self.history.lock().expect("history lock poisoned");
        Ok(history
            .iter()
            .rev()
            .filter(|(involved, _)| involved.contains(id))
            .take(limit)
            .map(|(_, summary)| summary.clone())
            .collect())
    }

    async fn submit(&self, transaction_id: &TransactionId, payload: &[u8]) -> Result<()> {
        let tx = SignedTransaction::from_bytes(payload)
            .map_err(|e| Error::Network(format!("Rejected payload: {}", e)))?;

        if tx.transaction.transaction_id() != *transaction_id {
            return Err(Error::Network(
                "Payload transaction id does not match submission".to_string(),
            ));
        }

        // Re-submission of a known id resolves as a duplicate, as a
        // distinct receipt row
        if self.receipts.contains_key(&transaction_id.to_string()) {
            self.push_receipt(
                transaction_id,
                ReceiptResponse {
                    status: StatusCode::DuplicateTransaction,
                    created_entity_id: None,
                },
            );
            return Ok(());
        }

        let (status, created_entity_id) = self.apply(&tx)?;

        let involved: Vec<AccountId> = match tx.transaction.body() {
            TransactionBody::Transfer { legs, .. } => legs.iter().map(|l| l.party).collect(),
            _ => vec![tx.transaction.payer()],
        };
        let name = match tx.transaction.body() {
            TransactionBody::Transfer { .. } => "CRYPTOTRANSFER",
            TransactionBody::TokenCreate { .. } => "TOKENCREATION",
            TransactionBody::TokenAssociate { .. } => "TOKENASSOCIATE",
            TransactionBody::ContractCreate { .. } => "CONTRACTCREATEINSTANCE",
            TransactionBody::ContractCall { .. } => "CONTRACTCALL",
        };
        self.record(involved, transaction_id, name, &status);
        self.push_receipt(
            transaction_id,
            ReceiptResponse {
                status,
                created_entity_id,
            },
        );

        Ok(())
    }

    async fn get_receipt(&self, transaction_id: &TransactionId) -> Result<Option<ReceiptResponse>> {
        Ok(self
            .receipts
            .get(&transaction_id.to_string())
            .and_then(|rows| rows.last().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign;
    use crate::transaction::TransactionDraft;
    use crate::{AssetRef, NetworkId, PrivateKey};

    fn key(seed: u8) -> PrivateKey {
        PrivateKey::from_bytes([seed; 32]).unwrap()
    }

    fn txid(payer: AccountId, nanos: u32) -> TransactionId {
        TransactionId {
            account_id: payer,
            valid_start_secs: 1_700_000_000,
            valid_start_nanos: nanos,
        }
    }

    async fn submit_signed(
        ledger: &InProcessLedger,
        tx: &SignedTransaction,
    ) -> ReceiptResponse {
        let id = tx.transaction.transaction_id();
        ledger.submit(&id, &tx.to_bytes().unwrap()).await.unwrap();
        ledger.get_receipt(&id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_transfer_applies_balances() {
        let ledger = InProcessLedger::new();
        let (a, b) = (AccountId::new(1), AccountId::new(2));
        let a_key = key(3);
        ledger.seed_account(a, 1_000, a_key.public_key());
        ledger.seed_account(b, 0, key(4).public_key());

        let frozen = TransactionDraft::transfer(AssetRef::Hbar, a, b, 400)
            .unwrap()
            .freeze_with_id(txid(a, 1), NetworkId::Testnet)
            .unwrap();
        let signed = sign::sign(frozen, &a_key).unwrap();

        let receipt = submit_signed(&ledger, &signed).await;
        assert_eq!(receipt.status, StatusCode::Success);
        assert_eq!(ledger.balance_of(&a), 600);
        assert_eq!(ledger.balance_of(&b), 400);
    }

    #[tokio::test]
    async fn test_unsigned_payer_rejected_as_status() {
        let ledger = InProcessLedger::new();
        let (a, b) = (AccountId::new(1), AccountId::new(2));
        ledger.seed_account(a, 1_000, key(3).public_key());

        let frozen = TransactionDraft::transfer(AssetRef::Hbar, a, b, 400)
            .unwrap()
            .freeze_with_id(txid(a, 1), NetworkId::Testnet)
            .unwrap();
        // Signed by the wrong key
        let signed = sign::sign(frozen, &key(9)).unwrap();

        let receipt = submit_signed(&ledger, &signed).await;
        assert_eq!(receipt.status, StatusCode::InvalidSignature);
        assert_eq!(ledger.balance_of(&a), 1_000);
    }

    #[tokio::test]
    async fn test_duplicate_submission_is_distinct_round_trip() {
        let ledger = InProcessLedger::new();
        let (a, b) = (AccountId::new(1), AccountId::new(2));
        let a_key = key(3);
        ledger.seed_account(a, 1_000, a_key.public_key());

        let frozen = TransactionDraft::transfer(AssetRef::Hbar, a, b, 100)
            .unwrap()
            .freeze_with_id(txid(a, 1), NetworkId::Testnet)
            .unwrap();
        let signed = sign::sign(frozen, &a_key).unwrap();

        let first = submit_signed(&ledger, &signed).await;
        assert_eq!(first.status, StatusCode::Success);

        let second = submit_signed(&ledger, &signed).await;
        assert_eq!(second.status, StatusCode::DuplicateTransaction);

        // Applied exactly once
        assert_eq!(ledger.balance_of(&b), 100);
        assert_eq!(ledger.submission_count(&txid(a, 1)), 2);
    }

    #[tokio::test]
    async fn test_token_transfer_requires_association() {
        let ledger = InProcessLedger::new();
        let (a, b) = (AccountId::new(1), AccountId::new(2));
        let a_key = key(3);
        ledger.seed_account(a, 1_000, a_key.public_key());
        ledger.seed_account(b, 0, key(4).public_key());

        // Create a token held by the treasury a
        let create = TransactionDraft::token_create("Demo", "DMO", 0, 500, a)
            .unwrap()
            .freeze_with_id(txid(a, 1), NetworkId::Testnet)
            .unwrap();
        let receipt = submit_signed(&ledger, &sign::sign(create, &a_key).unwrap()).await;
        let token: TokenId = receipt.created_entity_id.unwrap().parse().unwrap();

        // b is not associated yet
        let transfer = TransactionDraft::transfer(AssetRef::Token(token), a, b, 10)
            .unwrap()
            .freeze_with_id(txid(a, 2), NetworkId::Testnet)
            .unwrap();
        let receipt = submit_signed(&ledger, &sign::sign(transfer, &a_key).unwrap()).await;
        assert_eq!(receipt.status, StatusCode::TokenNotAssociatedToAccount);
    }

    #[tokio::test]
    async fn test_associate_then_transfer_with_cosign() {
        let ledger = InProcessLedger::new();
        let (a, b) = (AccountId::new(1), AccountId::new(2));
        let (a_key, b_key) = (key(3), key(4));
        ledger.seed_account(a, 1_000, a_key.public_key());
        ledger.seed_account(b, 0, b_key.public_key());

        let create = TransactionDraft::token_create("Demo", "DMO", 0, 500, a)
            .unwrap()
            .freeze_with_id(txid(a, 1), NetworkId::Testnet)
            .unwrap();
        let receipt = submit_signed(&ledger, &sign::sign(create, &a_key).unwrap()).await;
        let token: TokenId = receipt.created_entity_id.unwrap().parse().unwrap();

        // Association paid by a, co-signed by the receiving account b
        let associate = TransactionDraft::token_associate(b, token)
            .freeze_with_id(txid(a, 2), NetworkId::Testnet)
            .unwrap();
        let associate = sign::sign(associate, &a_key)
            .unwrap()
            .sign_with(&b_key)
            .unwrap();
        let receipt = submit_signed(&ledger, &associate).await;
        assert_eq!(receipt.status, StatusCode::Success);

        let transfer = TransactionDraft::transfer(AssetRef::Token(token), a, b, 10)
            .unwrap()
            .freeze_with_id(txid(a, 3), NetworkId::Testnet)
            .unwrap();
        let receipt = submit_signed(&ledger, &sign::sign(transfer, &a_key).unwrap()).await;
        assert_eq!(receipt.status, StatusCode::Success);
        assert_eq!(ledger.token_balance_of(&b, &token), Some(10));
        assert_eq!(ledger.token_balance_of(&a, &token), Some(490));
    }

    #[tokio::test]
    async fn test_association_without_cosign_rejected() {
        let ledger = InProcessLedger::new();
        let (a, b) = (AccountId::new(1), AccountId::new(2));
        let a_key = key(3);
        ledger.seed_account(a, 1_000, a_key.public_key());
        ledger.seed_account(b, 0, key(4).public_key());

        let associate = TransactionDraft::token_associate(b, TokenId::new(777))
            .freeze_with_id(txid(a, 1), NetworkId::Testnet)
            .unwrap();
        let receipt = submit_signed(&ledger, &sign::sign(associate, &a_key).unwrap()).await;
        assert_eq!(receipt.status, StatusCode::InvalidSignature);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_transport_error() {
        let ledger = InProcessLedger::new();
        let id = txid(AccountId::new(1), 1);
        let result = ledger.submit(&id, b"not a transaction").await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
