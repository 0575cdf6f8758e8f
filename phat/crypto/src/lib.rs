//! # phat-crypto
//!
//! Key material for talking to Phat contracts. Every query and command uses a
//! fresh [`Keypair`]; the shared [`AgreementKey`] it derives with the remote
//! party's public key encrypts exactly one payload.
//!
//! ## Flow
//!
//! ```rust,ignore
//! use phat_crypto::{seal, Keypair, PublicKey};
//!
//! let remote = PublicKey::from_bytes(&worker_pubkey)?;
//! let ephemeral = Keypair::generate(&mut rand::rngs::OsRng);
//! let key = ephemeral.agree(&remote);
//! let envelope = seal(&ephemeral, &key, &payload, &mut rand::rngs::OsRng)?;
//! // ... send envelope, receive the encrypted reply ...
//! let reply = phat_crypto::open(&key, &reply_envelope)?;
//! ```
//!
//! ## Key format
//!
//! Keys are sr25519 (`schnorrkel`, ed25519-mode expansion of a 32-byte mini
//! secret) and public keys are compressed Ristretto points. The agreement key
//! is the compressed point `secret * remote`, used directly as the
//! AES-256-GCM key.

pub mod aead;
pub mod sr25519;

#[cfg(test)]
mod tests;

use phat_contract_primitives::{EncryptedData, IV_LEN};
use rand::{CryptoRng, RngCore};
use thiserror::Error;

pub use aead::{decrypt, encrypt};
pub use sr25519::{verify, AgreementKey, Keypair, PublicKey, SIGNATURE_LEN};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    #[error("public key is not a valid ristretto point")]
    InvalidPublicKey,
    #[error("invalid mini secret key")]
    InvalidSeed,
    #[error("invalid symmetric key length")]
    InvalidKeyLength,
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed: wrong key or corrupted ciphertext")]
    Decrypt,
}

/// Encrypts `plaintext` under `key` with a random IV and attaches the
/// sender's public key so the receiver can derive the same key.
pub fn seal<R: RngCore + CryptoRng>(
    sender: &Keypair,
    key: &AgreementKey,
    plaintext: &[u8],
    rng: &mut R,
) -> Result<EncryptedData, CryptoError> {
    let mut iv = [0u8; IV_LEN];
    rng.fill_bytes(&mut iv);
    let data = encrypt(key, &iv, plaintext)?;
    Ok(EncryptedData { iv, pubkey: sender.public().to_bytes(), data })
}

/// Decrypts an envelope with an already derived agreement key.
pub fn open(key: &AgreementKey, envelope: &EncryptedData) -> Result<Vec<u8>, CryptoError> {
    decrypt(key, &envelope.iv, &envelope.data)
}

/// Receiver side of [`seal`]: derives the agreement key from the envelope's
/// sender key, then decrypts. Returns the key so a reply can be sealed with it.
pub fn open_with(
    receiver: &Keypair,
    envelope: &EncryptedData,
) -> Result<(AgreementKey, Vec<u8>), CryptoError> {
    let sender = PublicKey::from_bytes(&envelope.pubkey)?;
    let key = receiver.agree(&sender);
    let plaintext = open(&key, envelope)?;
    Ok((key, plaintext))
}
