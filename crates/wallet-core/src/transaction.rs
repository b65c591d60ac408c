//! Transaction construction
//!
//! Drafts are immutable values: each builder step returns a new value,
//! and freezing is a type-level transition into [`FrozenTransaction`],
//! which cannot be mutated and whose canonical byte encoding is the
//! signing input.
//!
//! The core invariant: for each asset being moved, the transfer legs
//! for that asset sum to exactly zero. It is checked when a draft is
//! built and again before freezing.

use crate::network::NetworkClient;
use crate::{AccountId, AssetRef, ContractId, Error, NetworkId, Result, TokenId, TransactionId};
use serde::{Deserialize, Serialize};

/// Default fee ceiling in tinybars (1 HBAR)
pub const DEFAULT_MAX_FEE: i64 = 100_000_000;

/// One side of a balanced transfer: an account and a signed delta
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLeg {
    /// Account gaining or losing value
    pub party: AccountId,
    /// Signed amount in the asset's smallest unit
    pub delta: i64,
}

/// What a transaction does once executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionBody {
    /// Move one asset between accounts via balanced legs
    Transfer {
        asset: AssetRef,
        legs: Vec<TransferLeg>,
    },
    /// Create a new token with the signing account as treasury
    TokenCreate {
        name: String,
        symbol: String,
        decimals: u32,
        initial_supply: u64,
        treasury: AccountId,
    },
    /// Associate an account with a token so it can hold a balance.
    /// The account being associated must co-sign.
    TokenAssociate {
        account: AccountId,
        token: TokenId,
    },
    /// Deploy contract bytecode
    ContractCreate {
        bytecode: Vec<u8>,
        gas: u64,
    },
    /// Call a deployed contract
    ContractCall {
        contract: ContractId,
        parameters: Vec<u8>,
        gas: u64,
    },
}

/// A transaction under construction. Immutable; builder steps return
/// new values. Freeze it to obtain the signable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    /// What the transaction does
    pub body: TransactionBody,
    /// Optional memo carried on the ledger
    pub memo: Option<String>,
    /// Fee ceiling in tinybars
    pub max_fee: i64,
}

impl TransactionDraft {
    /// Build a two-leg transfer of `amount` (smallest unit) of `asset`
    /// from one account to another.
    pub fn transfer(
        asset: AssetRef,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> Result<Self> {
        if amount <= 0 {
            return Err(Error::Validation(format!(
                "Transfer amount must be positive, got {}",
                amount
            )));
        }

        let draft = Self {
            body: TransactionBody::Transfer {
                asset,
                legs: vec![
                    TransferLeg {
                        party: from,
                        delta: -amount,
                    },
                    TransferLeg {
                        party: to,
                        delta: amount,
                    },
                ],
            },
            memo: None,
            max_fee: DEFAULT_MAX_FEE,
        };
        draft.check_balanced()?;
        Ok(draft)
    }

    /// Build a token creation draft. The treasury must be the account
    /// that will sign and pay, which is checked at freeze time against
    /// the submitting client.
    pub fn token_create(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u32,
        initial_supply: u64,
        treasury: AccountId,
    ) -> Result<Self> {
        let name = name.into();
        let symbol = symbol.into();

        if name.is_empty() {
            return Err(Error::Validation("Token name must not be empty".to_string()));
        }
        if symbol.is_empty() {
            return Err(Error::Validation(
                "Token symbol must not be empty".to_string(),
            ));
        }

        Ok(Self {
            body: TransactionBody::TokenCreate {
                name,
                symbol,
                decimals,
                initial_supply,
                treasury,
            },
            memo: None,
            max_fee: DEFAULT_MAX_FEE,
        })
    }

    /// Build a token association draft for `account`
    pub fn token_associate(account: AccountId, token: TokenId) -> Self {
        Self {
            body: TransactionBody::TokenAssociate { account, token },
            memo: None,
            max_fee: DEFAULT_MAX_FEE,
        }
    }

    /// Build a contract deployment draft
    pub fn contract_create(bytecode: Vec<u8>, gas: u64) -> Result<Self> {
        if bytecode.is_empty() {
            return Err(Error::Validation(
                "Contract bytecode must not be empty".to_string(),
            ));
        }

        Ok(Self {
            body: TransactionBody::ContractCreate { bytecode, gas },
            memo: None,
            max_fee: DEFAULT_MAX_FEE,
        })
    }

    /// Build a contract call draft
    pub fn contract_call(contract: ContractId, parameters: Vec<u8>, gas: u64) -> Self {
        Self {
            body: TransactionBody::ContractCall {
                contract,
                parameters,
                gas,
            },
            memo: None,
            max_fee: DEFAULT_MAX_FEE,
        }
    }

    /// Return a draft carrying the given memo
    pub fn with_memo(self, memo: impl Into<String>) -> Self {
        Self {
            memo: Some(memo.into()),
            ..self
        }
    }

    /// Return a draft with the given fee ceiling in tinybars
    pub fn with_max_fee(self, max_fee: i64) -> Self {
        Self { max_fee, ..self }
    }

    /// Verify the per-asset zero-sum invariant of transfer legs
    fn check_balanced(&self) -> Result<()> {
        if let TransactionBody::Transfer { legs, asset } = &self.body {
            let sum: i64 = legs.iter().map(|l| l.delta).sum();
            if sum != 0 {
                return Err(Error::Validation(format!(
                    "Transfer legs for {} sum to {}, expected 0",
                    asset, sum
                )));
            }
        }
        Ok(())
    }

    /// Freeze the draft against the client that will submit it,
    /// generating a fresh transaction id paid by the bound account.
    pub fn freeze(self, client: &NetworkClient) -> Result<FrozenTransaction> {
        let transaction_id = TransactionId::generate(client.account_id());
        self.freeze_with_id(transaction_id, client.network())
    }

    /// Freeze with an explicit transaction id and network. Used by
    /// [`Self::freeze`] and by tests that need determinism.
    pub fn freeze_with_id(
        self,
        transaction_id: TransactionId,
        network: NetworkId,
    ) -> Result<FrozenTransaction> {
        self.check_balanced()?;

        if let TransactionBody::TokenCreate { treasury, .. } = &self.body {
            if *treasury != transaction_id.account_id {
                return Err(Error::Validation(format!(
                    "Token treasury {} must match the paying account {}",
                    treasury, transaction_id.account_id
                )));
            }
        }

        Ok(FrozenTransaction {
            body: self.body,
            memo: self.memo,
            max_fee: self.max_fee,
            transaction_id,
            network,
        })
    }
}

/// A transaction locked against mutation and bound to the network that
/// will carry it. Its canonical bytes are the signing input. Fields
/// are read-only; nothing can change after the freeze.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrozenTransaction {
    body: TransactionBody,
    memo: Option<String>,
    max_fee: i64,
    transaction_id: TransactionId,
    network: NetworkId,
}

impl FrozenTransaction {
    /// Freezing an already frozen transaction is the identity
    pub fn freeze(self, _client: &NetworkClient) -> FrozenTransaction {
        self
    }

    /// What the transaction does
    pub fn body(&self) -> &TransactionBody {
        &self.body
    }

    /// Optional memo
    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }

    /// Fee ceiling in tinybars
    pub fn max_fee(&self) -> i64 {
        self.max_fee
    }

    /// Identifier (payer plus valid-start instant)
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// Network this transaction is bound to
    pub fn network(&self) -> NetworkId {
        self.network
    }

    /// The paying account
    pub fn payer(&self) -> AccountId {
        self.transaction_id.account_id
    }

    /// Canonical byte encoding used as the signing input. Stable for a
    /// given frozen value.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_hbar;

    fn payer() -> AccountId {
        AccountId::new(1001)
    }

    fn txid() -> TransactionId {
        TransactionId {
            account_id: payer(),
            valid_start_secs: 1_700_000_000,
            valid_start_nanos: 42,
        }
    }

    #[test]
    fn test_transfer_emits_balanced_legs() {
        let draft = TransactionDraft::transfer(
            AssetRef::Hbar,
            payer(),
            AccountId::new(1002),
            parse_hbar("10").unwrap(),
        )
        .unwrap();

        match &draft.body {
            TransactionBody::Transfer { legs, .. } => {
                assert_eq!(legs.len(), 2);
                assert_eq!(legs[0].delta, -1_000_000_000);
                assert_eq!(legs[0].party, payer());
                assert_eq!(legs[1].delta, 1_000_000_000);
                assert_eq!(legs[1].party, AccountId::new(1002));
                assert_eq!(legs.iter().map(|l| l.delta).sum::<i64>(), 0);
            }
            other => panic!("Expected transfer body, got {:?}", other),
        }
    }

    #[test]
    fn test_transfer_rejects_non_positive_amount() {
        for amount in [0, -1, i64::MIN + 1] {
            let result =
                TransactionDraft::transfer(AssetRef::Hbar, payer(), AccountId::new(2), amount);
            assert!(matches!(result, Err(Error::Validation(_))), "amount {}", amount);
        }
    }

    #[test]
    fn test_token_transfer_uses_raw_units() {
        let token = TokenId::new(5005);
        let draft = TransactionDraft::transfer(
            AssetRef::Token(token),
            payer(),
            AccountId::new(1002),
            250,
        )
        .unwrap();

        match &draft.body {
            TransactionBody::Transfer { asset, legs } => {
                assert_eq!(*asset, AssetRef::Token(token));
                assert_eq!(legs[0].delta, -250);
                assert_eq!(legs[1].delta, 250);
            }
            other => panic!("Expected transfer body, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_steps_return_new_values() {
        let base = TransactionDraft::transfer(AssetRef::Hbar, payer(), AccountId::new(2), 1)
            .unwrap();
        let with_memo = base.clone().with_memo("rent");

        assert_eq!(base.memo, None);
        assert_eq!(with_memo.memo.as_deref(), Some("rent"));
    }

    #[test]
    fn test_freeze_is_idempotent() {
        let frozen = TransactionDraft::transfer(AssetRef::Hbar, payer(), AccountId::new(2), 100)
            .unwrap()
            .freeze_with_id(txid(), NetworkId::Testnet)
            .unwrap();

        let ledger = std::sync::Arc::new(crate::network::InProcessLedger::new());
        let client = NetworkClient::with_endpoint(payer(), NetworkId::Testnet, ledger);

        let refrozen = frozen.clone().freeze(&client);
        assert_eq!(frozen, refrozen);
        assert_eq!(
            frozen.canonical_bytes().unwrap(),
            refrozen.canonical_bytes().unwrap()
        );
    }

    #[test]
    fn test_canonical_bytes_stable() {
        let make = || {
            TransactionDraft::transfer(AssetRef::Hbar, payer(), AccountId::new(2), 100)
                .unwrap()
                .with_memo("x")
                .freeze_with_id(txid(), NetworkId::Testnet)
                .unwrap()
        };
        assert_eq!(
            make().canonical_bytes().unwrap(),
            make().canonical_bytes().unwrap()
        );
    }

    #[test]
    fn test_token_create_treasury_must_pay() {
        let draft =
            TransactionDraft::token_create("Demo", "DMO", 2, 1_000, AccountId::new(9999)).unwrap();

        // Frozen by a different payer: rejected
        let result = draft.freeze_with_id(txid(), NetworkId::Testnet);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_token_create_validates_fields() {
        assert!(TransactionDraft::token_create("", "DMO", 2, 0, payer()).is_err());
        assert!(TransactionDraft::token_create("Demo", "", 2, 0, payer()).is_err());
        assert!(TransactionDraft::token_create("Demo", "DMO", 0, 0, payer()).is_ok());
    }

    #[test]
    fn test_frozen_view_is_read_only() {
        let frozen = TransactionDraft::transfer(AssetRef::Hbar, payer(), AccountId::new(2), 100)
            .unwrap()
            .with_memo("rent")
            .freeze_with_id(txid(), NetworkId::Testnet)
            .unwrap();

        // Everything after the freeze is exposed through accessors only
        assert_eq!(frozen.transaction_id(), txid());
        assert_eq!(frozen.payer(), payer());
        assert_eq!(frozen.network(), NetworkId::Testnet);
        assert_eq!(frozen.memo(), Some("rent"));
        assert_eq!(frozen.max_fee(), DEFAULT_MAX_FEE);
        assert!(matches!(frozen.body(), TransactionBody::Transfer { .. }));
    }

    #[test]
    fn test_contract_create_rejects_empty_bytecode() {
        assert!(TransactionDraft::contract_create(Vec::new(), 100_000).is_err());
        assert!(TransactionDraft::contract_create(vec![0x60, 0x80], 100_000).is_ok());
    }
}
