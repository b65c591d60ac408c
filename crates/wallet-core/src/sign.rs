//! Transaction signing
//!
//! Signatures are produced over the frozen transaction's canonical
//! bytes with deterministic ECDSA (secp256k1). The engine itself adds
//! no randomness. A signed transaction carries an append-only list of
//! signatures; co-signing accumulates them in the order presented,
//! which matters for operations like token association where the
//! receiving account must sign alongside the payer.

use crate::transaction::FrozenTransaction;
use crate::{Error, PrivateKey, PublicKeyBytes, Result};
use k256::ecdsa::{
    Signature as EcdsaSignature, VerifyingKey,
    signature::{Signer, Verifier},
};
use serde::{Deserialize, Serialize};

/// One contributed signature: the signer's public key and the raw
/// 64-byte ECDSA signature over the canonical transaction bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    /// Compressed public key of the signer (33 bytes)
    pub public_key: PublicKeyBytes,
    /// Raw `r || s` signature bytes (64 bytes)
    pub signature: Vec<u8>,
}

/// A frozen transaction plus its accumulated signatures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// The immutable transaction being signed
    pub transaction: FrozenTransaction,
    /// Append-only signature list
    pub signatures: Vec<SignaturePair>,
}

impl SignedTransaction {
    /// Add another account's signature. Signatures accumulate in the
    /// order presented; a key that already signed is not added twice.
    pub fn sign_with(mut self, key: &PrivateKey) -> Result<Self> {
        let public_key = key.public_key();
        if self.has_signature_from(&public_key) {
            return Ok(self);
        }

        let bytes = self.transaction.canonical_bytes()?;
        let signature: EcdsaSignature = key.signing_key().sign(&bytes);

        self.signatures.push(SignaturePair {
            public_key,
            signature: signature.to_bytes().to_vec(),
        });
        Ok(self)
    }

    /// Whether the given public key has already signed
    pub fn has_signature_from(&self, public_key: &[u8]) -> bool {
        self.signatures.iter().any(|s| s.public_key == public_key)
    }

    /// Verify every attached signature against the canonical bytes
    pub fn verify_signatures(&self) -> Result<bool> {
        let bytes = self.transaction.canonical_bytes()?;

        for pair in &self.signatures {
            let verifying = match VerifyingKey::from_sec1_bytes(&pair.public_key) {
                Ok(key) => key,
                Err(_) => return Ok(false),
            };
            let signature = match EcdsaSignature::from_slice(&pair.signature) {
                Ok(sig) => sig,
                Err(_) => return Ok(false),
            };
            if verifying.verify(&bytes, &signature).is_err() {
                return Ok(false);
            }
        }

        Ok(!self.signatures.is_empty())
    }

    /// Serialized wire payload for submission
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Into::into)
    }

    /// Decode a wire payload
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Sign a frozen transaction with the given key, producing the
/// first signature of a [`SignedTransaction`]
pub fn sign(transaction: FrozenTransaction, key: &PrivateKey) -> Result<SignedTransaction> {
    SignedTransaction {
        transaction,
        signatures: Vec::new(),
    }
    .sign_with(key)
}
