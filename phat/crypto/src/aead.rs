//! AES-256-GCM over agreement keys.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use phat_contract_primitives::IV_LEN;

use crate::{AgreementKey, CryptoError};

fn cipher(key: &AgreementKey) -> Result<Aes256Gcm, CryptoError> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::InvalidKeyLength)
}

/// Returns ciphertext with the 16-byte tag appended.
pub fn encrypt(
    key: &AgreementKey,
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    cipher(key)?
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|_| CryptoError::Encrypt)
}

pub fn decrypt(
    key: &AgreementKey,
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    cipher(key)?
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| CryptoError::Decrypt)
}
