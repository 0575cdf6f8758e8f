//! sr25519 keys, as used by Substrate accounts and Phala workers.
//!
//! Signing and verification come from `schnorrkel` with ed25519-mode
//! mini-secret expansion. Key agreement multiplies our secret scalar with the
//! remote Ristretto point directly.

use core::fmt;

use curve25519_dalek::scalar::Scalar;
use rand::{rngs::OsRng, CryptoRng, RngCore};
use schnorrkel::{
    context::attach_rng, signing_context, ExpansionMode, MiniSecretKey, Signature,
};
use zeroize::Zeroize;

use crate::CryptoError;

pub const SEED_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

/// A validated Ristretto public key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(schnorrkel::PublicKey);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        Self::from_slice(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        schnorrkel::PublicKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_compressed().as_bytes()
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(0x{})", hex::encode(self.as_bytes()))
    }
}

/// Symmetric key shared by the two ends of a key agreement.
#[derive(Clone, PartialEq, Eq)]
pub struct AgreementKey([u8; 32]);

impl AgreementKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Drop for AgreementKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for AgreementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AgreementKey(..)")
    }
}

pub struct Keypair {
    inner: schnorrkel::Keypair,
    public: PublicKey,
}

impl Keypair {
    fn from_mini(mini: &MiniSecretKey) -> Self {
        let inner = mini.expand_to_keypair(ExpansionMode::Ed25519);
        let public = PublicKey(inner.public);
        Self { inner, public }
    }

    /// Deterministically derives a keypair from a 32-byte mini secret.
    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Result<Self, CryptoError> {
        let mini = MiniSecretKey::from_bytes(seed).map_err(|_| CryptoError::InvalidSeed)?;
        Ok(Self::from_mini(&mini))
    }

    /// Fresh keypair from a random mini secret.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_mini(&MiniSecretKey::generate_with(rng))
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    /// Diffie-Hellman agreement with `remote`.
    pub fn agree(&self, remote: &PublicKey) -> AgreementKey {
        // first half of the expanded secret is the canonical scalar
        let mut expanded = self.inner.secret.to_bytes();
        let mut key = [0u8; 32];
        key.copy_from_slice(&expanded[..32]);
        let scalar = Scalar::from_bytes_mod_order(key);
        expanded.zeroize();
        key.zeroize();
        AgreementKey((scalar * remote.0.as_point()).compress().to_bytes())
    }

    /// Signs `message` under `context` with a witness drawn from the OS RNG.
    pub fn sign(&self, context: &[u8], message: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.sign_with_rng(context, message, &mut OsRng)
    }

    pub fn sign_with_rng<R: RngCore + CryptoRng>(
        &self,
        context: &[u8],
        message: &[u8],
        rng: &mut R,
    ) -> [u8; SIGNATURE_LEN] {
        let transcript = attach_rng(signing_context(context).bytes(message), rng);
        self.inner.sign(transcript).to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair").field("public", &self.public).finish_non_exhaustive()
    }
}

/// Checks a signature produced by [`Keypair::sign`] or any sr25519 signer.
pub fn verify(
    public: &PublicKey,
    context: &[u8],
    message: &[u8],
    signature: &[u8; SIGNATURE_LEN],
) -> bool {
    Signature::from_bytes(signature)
        .and_then(|sig| public.0.verify_simple(context, message, &sig))
        .is_ok()
}
