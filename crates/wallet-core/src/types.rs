//! Core types for the wallet
//!
//! This module defines the fundamental types used throughout the wallet:
//! ledger entity identifiers, network selection, asset references,
//! transaction identifiers, receipt status codes and the in-memory
//! private key wrapper.

use crate::{Error, Result};
use k256::ecdsa::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Number of tinybars in one whole HBAR (8-decimal native asset)
pub const TINYBARS_PER_HBAR: i64 = 100_000_000;

/// Fixed persistent-store key under which the single wallet record lives
pub const WALLET_RECORD_KEY: &str = "wallet";

// ============================================================================
// Entity identifiers
// ============================================================================

fn parse_entity(s: &str, kind: &str) -> Result<(u64, u64, u64)> {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 3 {
        return Err(Error::Validation(format!(
            "Invalid {} id '{}': expected shard.realm.num",
            kind, s
        )));
    }
    let parse = |p: &str| {
        p.parse::<u64>()
            .map_err(|_| Error::Validation(format!("Invalid {} id '{}': non-numeric part", kind, s)))
    };
    Ok((parse(parts[0])?, parse(parts[1])?, parse(parts[2])?))
}

/// A ledger account identifier in `shard.realm.num` form (e.g. `0.0.1234`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl AccountId {
    /// Create an account id in the default shard and realm
    pub fn new(num: u64) -> Self {
        Self {
            shard: 0,
            realm: 0,
            num,
        }
    }
}

impl FromStr for AccountId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (shard, realm, num) = parse_entity(s, "account")?;
        Ok(Self { shard, realm, num })
    }
}

impl TryFrom<String> for AccountId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> String {
        id.to_string()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

/// A token identifier, same shape as [`AccountId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl TokenId {
    /// Create a token id in the default shard and realm
    pub fn new(num: u64) -> Self {
        Self {
            shard: 0,
            realm: 0,
            num,
        }
    }
}

impl FromStr for TokenId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (shard, realm, num) = parse_entity(s, "token")?;
        Ok(Self { shard, realm, num })
    }
}

impl TryFrom<String> for TokenId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TokenId> for String {
    fn from(id: TokenId) -> String {
        id.to_string()
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

/// A smart contract identifier, same shape as [`AccountId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContractId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl FromStr for ContractId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (shard, realm, num) = parse_entity(s, "contract")?;
        Ok(Self { shard, realm, num })
    }
}

impl TryFrom<String> for ContractId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ContractId> for String {
    fn from(id: ContractId) -> String {
        id.to_string()
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

// ============================================================================
// Networks and assets
// ============================================================================

/// One of the fixed set of named networks the wallet can bind to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Mainnet,
    #[default]
    Testnet,
    Previewnet,
}

impl NetworkId {
    /// Base URL of this network's mirror (query) REST surface
    pub fn mirror_base_url(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "https://mainnet-public.mirrornode.hedera.com",
            NetworkId::Testnet => "https://testnet.mirrornode.hedera.com",
            NetworkId::Previewnet => "https://previewnet.mirrornode.hedera.com",
        }
    }

    /// Human-readable network name
    pub fn name(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "mainnet",
            NetworkId::Testnet => "testnet",
            NetworkId::Previewnet => "previewnet",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NetworkId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mainnet" => Ok(NetworkId::Mainnet),
            "testnet" => Ok(NetworkId::Testnet),
            "previewnet" => Ok(NetworkId::Previewnet),
            other => Err(Error::Validation(format!("Unknown network: {}", other))),
        }
    }
}

/// Reference to an asset being moved: the native currency or a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetRef {
    /// Native currency, amounts in tinybars
    Hbar,
    /// A created token, amounts in the token's raw integer unit
    Token(TokenId),
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Hbar => write!(f, "HBAR"),
            AssetRef::Token(id) => write!(f, "{}", id),
        }
    }
}

/// Parse a display-unit HBAR amount (e.g. `"10"`, `"1.5"`) into tinybars.
///
/// Amounts are unsigned; a leading sign is rejected. Fractions beyond
/// 8 decimal places are rejected rather than truncated.
pub fn parse_hbar(s: &str) -> Result<i64> {
    let invalid = || Error::Validation(format!("Invalid HBAR amount: '{}'", s));

    if s.starts_with('-') || s.starts_with('+') {
        return Err(invalid());
    }

    let (whole_str, frac_str) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    if whole_str.is_empty() && frac_str.is_empty() {
        return Err(invalid());
    }
    if frac_str.len() > 8 {
        return Err(Error::Validation(format!(
            "HBAR amount '{}' has more than 8 decimal places",
            s
        )));
    }

    let whole: i64 = if whole_str.is_empty() {
        0
    } else {
        whole_str.parse().map_err(|_| invalid())?
    };
    let mut frac_padded = frac_str.to_string();
    while frac_padded.len() < 8 {
        frac_padded.push('0');
    }
    let frac: i64 = if frac_str.is_empty() {
        0
    } else {
        frac_padded.parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(TINYBARS_PER_HBAR)
        .and_then(|t| t.checked_add(frac))
        .ok_or_else(invalid)
}

// ============================================================================
// Transaction identity and outcomes
// ============================================================================

/// Transaction identifier: paying account plus its chosen valid-start
/// instant, rendered as `0.0.x@seconds.nanos`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    /// Paying account
    pub account_id: AccountId,
    /// Valid-start seconds since the Unix epoch
    pub valid_start_secs: i64,
    /// Valid-start sub-second nanos
    pub valid_start_nanos: u32,
}

impl TransactionId {
    /// Generate a fresh transaction id for the given payer, using the
    /// current time as the valid-start instant.
    pub fn generate(payer: AccountId) -> Self {
        let now = chrono::Utc::now();
        Self {
            account_id: payer,
            valid_start_secs: now.timestamp(),
            valid_start_nanos: now.timestamp_subsec_nanos(),
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{:09}",
            self.account_id, self.valid_start_secs, self.valid_start_nanos
        )
    }
}

/// Ledger-reported outcome of a transaction.
///
/// A non-success code is data, not an error: the network accepted and
/// resolved the transaction, it just did not do what the caller hoped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusCode {
    Success,
    InvalidSignature,
    DuplicateTransaction,
    TransactionExpired,
    InsufficientPayerBalance,
    InsufficientTokenBalance,
    TokenNotAssociatedToAccount,
    InvalidAccountId,
    /// A code this wallet does not interpret specially
    Other(String),
}

impl StatusCode {
    /// Whether this code represents full success
    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Success)
    }

    /// Canonical wire string for this code
    pub fn as_str(&self) -> &str {
        match self {
            StatusCode::Success => "SUCCESS",
            StatusCode::InvalidSignature => "INVALID_SIGNATURE",
            StatusCode::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            StatusCode::TransactionExpired => "TRANSACTION_EXPIRED",
            StatusCode::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
            StatusCode::InsufficientTokenBalance => "INSUFFICIENT_TOKEN_BALANCE",
            StatusCode::TokenNotAssociatedToAccount => "TOKEN_NOT_ASSOCIATED_TO_ACCOUNT",
            StatusCode::InvalidAccountId => "INVALID_ACCOUNT_ID",
            StatusCode::Other(s) => s,
        }
    }
}

impl From<String> for StatusCode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "SUCCESS" => StatusCode::Success,
            "INVALID_SIGNATURE" => StatusCode::InvalidSignature,
            "DUPLICATE_TRANSACTION" => StatusCode::DuplicateTransaction,
            "TRANSACTION_EXPIRED" => StatusCode::TransactionExpired,
            "INSUFFICIENT_PAYER_BALANCE" => StatusCode::InsufficientPayerBalance,
            "INSUFFICIENT_TOKEN_BALANCE" => StatusCode::InsufficientTokenBalance,
            "TOKEN_NOT_ASSOCIATED_TO_ACCOUNT" => StatusCode::TokenNotAssociatedToAccount,
            "INVALID_ACCOUNT_ID" => StatusCode::InvalidAccountId,
            _ => StatusCode::Other(s),
        }
    }
}

impl From<StatusCode> for String {
    fn from(code: StatusCode) -> String {
        code.as_str().to_string()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final, immutable result of one submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Identifier of the submitted transaction
    pub transaction_id: String,
    /// Ledger-reported status
    pub status: StatusCode,
    /// Identifier of an entity the transaction created (token,
    /// contract), when applicable
    pub created_entity_id: Option<String>,
}

// ============================================================================
// Key material
// ============================================================================

/// Compressed secp256k1 public key bytes (33 bytes)
pub type PublicKeyBytes = Vec<u8>;

/// An ECDSA private key held in volatile memory.
///
/// The raw scalar is zeroized when the value is dropped and is never
/// included in debug output.
#[derive(Clone)]
pub struct PrivateKey {
    bytes: Zeroizing<[u8; 32]>,
}

impl PrivateKey {
    /// Construct from raw scalar bytes, rejecting invalid scalars
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self> {
        SigningKey::from_bytes(&bytes.into())
            .map_err(|_| Error::Validation("Invalid private key bytes".to_string()))?;
        Ok(Self {
            bytes: Zeroizing::new(bytes),
        })
    }

    /// Construct from a hex string, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw = Zeroizing::new(hex::decode(s)?);
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| Error::Validation("Private key must be 32 bytes".to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Raw scalar bytes, for sealing into an envelope. Wrapped in
    /// [`Zeroizing`] so the copy is wiped on drop.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        self.bytes.clone()
    }

    /// Borrow as a usable signing key
    pub fn signing_key(&self) -> SigningKey {
        // Validated at construction, cannot fail here
        SigningKey::from_bytes(self.bytes.as_ref().into()).expect("validated at construction")
    }

    /// Compressed public key (33 bytes)
    pub fn public_key(&self) -> PublicKeyBytes {
        let verifying: VerifyingKey = *self.signing_key().verifying_key();
        verifying.to_sec1_bytes().to_vec()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_roundtrip() {
        let id: AccountId = "0.0.1234".parse().unwrap();
        assert_eq!(id, AccountId::new(1234));
        assert_eq!(id.to_string(), "0.0.1234");
    }

    #[test]
    fn test_account_id_rejects_malformed() {
        assert!("0.0".parse::<AccountId>().is_err());
        assert!("a.b.c".parse::<AccountId>().is_err());
        assert!("0.0.12.3".parse::<AccountId>().is_err());
        assert!("".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_parse_hbar_scaling() {
        assert_eq!(parse_hbar("10").unwrap(), 1_000_000_000);
        assert_eq!(parse_hbar("1.5").unwrap(), 150_000_000);
        assert_eq!(parse_hbar("0.00000001").unwrap(), 1);
        assert_eq!(parse_hbar(".5").unwrap(), 50_000_000);
    }

    #[test]
    fn test_parse_hbar_rejects_excess_precision() {
        assert!(parse_hbar("0.000000001").is_err());
        assert!(parse_hbar("abc").is_err());
        assert!(parse_hbar("").is_err());
    }

    #[test]
    fn test_parse_hbar_rejects_signed_amounts() {
        // Amounts are unsigned; signs must not slip through as a
        // half-scaled value
        assert!(parse_hbar("-1.5").is_err());
        assert!(parse_hbar("-1").is_err());
        assert!(parse_hbar("+1").is_err());
    }

    #[test]
    fn test_status_code_wire_strings() {
        assert_eq!(StatusCode::from("SUCCESS".to_string()), StatusCode::Success);
        assert_eq!(
            StatusCode::from("INVALID_SIGNATURE".to_string()),
            StatusCode::InvalidSignature
        );
        let other = StatusCode::from("FEE_SCHEDULE_FILE_PART_UPLOADED".to_string());
        assert_eq!(other.as_str(), "FEE_SCHEDULE_FILE_PART_UPLOADED");
        assert!(!other.is_success());
    }

    #[test]
    fn test_transaction_id_display() {
        let id = TransactionId {
            account_id: AccountId::new(42),
            valid_start_secs: 1_700_000_000,
            valid_start_nanos: 123_456_789,
        };
        assert_eq!(id.to_string(), "0.0.42@1700000000.123456789");
    }

    #[test]
    fn test_private_key_debug_redacted() {
        let key = PrivateKey::from_bytes([7u8; 32]).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("07"));
    }

    #[test]
    fn test_private_key_public_key_compressed() {
        let key = PrivateKey::from_bytes([7u8; 32]).unwrap();
        let public = key.public_key();
        assert_eq!(public.len(), 33);
    }

    #[test]
    fn test_private_key_rejects_zero_scalar() {
        assert!(PrivateKey::from_bytes([0u8; 32]).is_err());
    }

    #[test]
    fn test_private_key_bytes_wiped_on_drop() {
        let key = PrivateKey::from_bytes([7u8; 32]).unwrap();
        let exported = key.to_bytes();
        assert_eq!(&exported[..], &[7u8; 32][..]);

        // The export is a self-wiping copy, not a bare array
        fn assert_zeroizing(_: &Zeroizing<[u8; 32]>) {}
        assert_zeroizing(&exported);
    }
}
