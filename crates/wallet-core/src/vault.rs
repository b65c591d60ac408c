//! Encrypted key-at-rest storage
//!
//! The vault seals a secret under a passphrase-derived symmetric key
//! using ChaCha20-Poly1305, producing an opaque [`SecretEnvelope`] that
//! is meaningless without the passphrase. Opening a tampered envelope
//! or using the wrong passphrase fails with the same opaque
//! [`Error::Authentication`]; plaintext is never partially returned.
//!
//! The key derivation is deterministic and unsalted so that the same
//! passphrase always yields the same key, with iterated SHA-256
//! stretching. Without a salt, identical passphrases across wallets
//! derive identical keys; acceptable for a single-record store but a
//! known weakness worth keeping in mind.

use crate::{Error, Result};
use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Stretching rounds for passphrase-to-key derivation
const KDF_ROUNDS: usize = 10_000;

/// At-rest encrypted representation of a secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretEnvelope {
    /// AEAD ciphertext (includes the authentication tag)
    pub ciphertext: Vec<u8>,
    /// Nonce used for encryption, fresh per seal call (12 bytes)
    pub nonce: [u8; 12],
}

/// Derive a 32-byte symmetric key from a passphrase
fn derive_key(passphrase: &str) -> [u8; 32] {
    let mut result = Sha256::digest(passphrase.as_bytes());
    for _ in 0..KDF_ROUNDS {
        let mut hasher = Sha256::new();
        hasher.update(result);
        hasher.update(passphrase.as_bytes());
        result = hasher.finalize();
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&result);
    key
}

/// Seal a secret under a passphrase
pub fn seal(secret: &[u8], passphrase: &str) -> Result<SecretEnvelope> {
    let key = derive_key(passphrase);
    let cipher = ChaCha20Poly1305::new(&key.into());

    let nonce_bytes: [u8; 12] = rand::random();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, secret)
        .map_err(|_| Error::Authentication)?;

    Ok(SecretEnvelope {
        ciphertext,
        nonce: nonce_bytes,
    })
}

/// Open an envelope with a passphrase. The plaintext comes back wrapped
/// in [`Zeroizing`] so it is wiped when dropped.
///
/// Fails with [`Error::Authentication`] on a wrong passphrase or
/// tampered ciphertext, without distinguishing which.
pub fn open(envelope: &SecretEnvelope, passphrase: &str) -> Result<Zeroizing<Vec<u8>>> {
    let key = derive_key(passphrase);
    let cipher = ChaCha20Poly1305::new(&key.into());
    let nonce = Nonce::from_slice(&envelope.nonce);

    cipher
        .decrypt(nonce, envelope.ciphertext.as_ref())
        .map(Zeroizing::new)
        .map_err(|_| Error::Authentication)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let secret = b"very secret key material";
        let envelope = seal(secret, "correct horse").unwrap();

        let opened = open(&envelope, "correct horse").unwrap();
        assert_eq!(&opened[..], &secret[..]);
    }

    #[test]
    fn test_open_wrong_passphrase() {
        let envelope = seal(b"secret", "pw1").unwrap();
        let result = open(&envelope, "pw2");
        assert!(matches!(result, Err(Error::Authentication)));
    }

    #[test]
    fn test_open_tampered_ciphertext() {
        let mut envelope = seal(b"secret", "pw").unwrap();
        envelope.ciphertext[0] ^= 0xff;
        let result = open(&envelope, "pw");
        assert!(matches!(result, Err(Error::Authentication)));
    }

    #[test]
    fn test_nonce_fresh_per_seal() {
        let a = seal(b"secret", "pw").unwrap();
        let b = seal(b"secret", "pw").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_same_passphrase_same_key_contract() {
        // Sealed under one passphrase, openable any number of times
        let envelope = seal(b"k", "pw").unwrap();
        assert_eq!(&open(&envelope, "pw").unwrap()[..], b"k");
        assert_eq!(&open(&envelope, "pw").unwrap()[..], b"k");
    }
}
