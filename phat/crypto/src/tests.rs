use crate::*;
use hex_literal::hex;
use phat_contract_primitives::IV_LEN;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// `//Alice` mini secret and public key from the Substrate dev keyring.
const ALICE_SEED: [u8; 32] =
    hex!("e5be9a5092b81bca64be81d212e7f2f9eba183bb7a90954f7b76361f6edb5c0a");
const ALICE_PUBLIC: [u8; 32] =
    hex!("d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d");

#[test]
fn seed_expansion_matches_substrate_keyring() {
    let alice = Keypair::from_seed(&ALICE_SEED).unwrap();
    assert_eq!(alice.public().to_bytes(), ALICE_PUBLIC);
}

#[test]
fn from_seed_is_deterministic() {
    let a = Keypair::from_seed(&[7u8; 32]).unwrap();
    let b = Keypair::from_seed(&[7u8; 32]).unwrap();
    assert_eq!(a.public(), b.public());
    assert_ne!(a.public(), Keypair::from_seed(&[8u8; 32]).unwrap().public());
}

#[test]
fn agreement_is_symmetric() {
    let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
    let local = Keypair::generate(&mut rng);
    let remote = Keypair::generate(&mut rng);
    assert_eq!(local.agree(remote.public()), remote.agree(local.public()));
}

#[test]
fn fresh_keypairs_never_repeat() {
    let mut rng = rand::rngs::OsRng;
    let a = Keypair::generate(&mut rng);
    let b = Keypair::generate(&mut rng);
    assert_ne!(a.public(), b.public());
}

#[test]
fn malformed_public_key_is_rejected() {
    // not a canonical ristretto encoding
    assert_eq!(PublicKey::from_bytes(&[0xff; 32]), Err(CryptoError::InvalidPublicKey));
    assert_eq!(PublicKey::from_slice(&[0u8; 31]), Err(CryptoError::InvalidPublicKey));
    assert!(PublicKey::from_bytes(&ALICE_PUBLIC).is_ok());
}

#[test]
fn sealed_envelope_opens_on_the_receiving_side() {
    let mut rng = ChaCha20Rng::from_seed([2u8; 32]);
    let worker = Keypair::generate(&mut rng);
    let ephemeral = Keypair::generate(&mut rng);
    let key = ephemeral.agree(worker.public());

    let envelope = seal(&ephemeral, &key, b"query payload", &mut rng).unwrap();
    assert_eq!(envelope.pubkey, ephemeral.public().to_bytes());
    assert_eq!(envelope.data.len(), b"query payload".len() + 16);

    let (worker_key, plaintext) = open_with(&worker, &envelope).unwrap();
    assert_eq!(plaintext, b"query payload");
    assert_eq!(worker_key, key);

    // reply travels back under the same agreement key
    let reply = seal(&worker, &worker_key, b"response", &mut rng).unwrap();
    assert_eq!(open(&key, &reply).unwrap(), b"response");
}

#[test]
fn wrong_key_fails_to_decrypt() {
    let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
    let a = Keypair::generate(&mut rng);
    let b = Keypair::generate(&mut rng);
    let c = Keypair::generate(&mut rng);

    let ciphertext = encrypt(&a.agree(b.public()), &[0u8; IV_LEN], b"secret").unwrap();
    assert_eq!(
        decrypt(&a.agree(c.public()), &[0u8; IV_LEN], &ciphertext),
        Err(CryptoError::Decrypt)
    );
}

#[test]
fn tampered_ciphertext_is_rejected() {
    let local = Keypair::from_seed(&[4u8; 32]).unwrap();
    let key = local.agree(Keypair::from_seed(&[5u8; 32]).unwrap().public());
    let iv = [9u8; IV_LEN];
    let mut ciphertext = encrypt(&key, &iv, b"payload").unwrap();
    ciphertext[0] ^= 1;
    assert_eq!(decrypt(&key, &iv, &ciphertext), Err(CryptoError::Decrypt));
}

#[test]
fn signatures_verify_and_bind_the_message() {
    let signer = Keypair::from_seed(&ALICE_SEED).unwrap();
    let sig = signer.sign(b"substrate", b"certificate body");
    assert_eq!(sig[63] & 0x80, 0x80);
    assert!(verify(signer.public(), b"substrate", b"certificate body", &sig));
    assert!(!verify(signer.public(), b"substrate", b"other body", &sig));
    assert!(!verify(signer.public(), b"other context", b"certificate body", &sig));

    let other = Keypair::from_seed(&[1u8; 32]).unwrap();
    assert!(!verify(other.public(), b"substrate", b"certificate body", &sig));
}

#[test]
fn signatures_without_marker_are_rejected() {
    let signer = Keypair::from_seed(&[6u8; 32]).unwrap();
    let mut sig = signer.sign(b"ctx", b"msg");
    sig[63] &= 0x7f;
    assert!(!verify(signer.public(), b"ctx", b"msg", &sig));
}

#[test]
fn interoperates_with_schnorrkel_signers() {
    use schnorrkel::{signing_context, ExpansionMode, MiniSecretKey};

    let reference = MiniSecretKey::from_bytes(&ALICE_SEED)
        .unwrap()
        .expand_to_keypair(ExpansionMode::Ed25519);
    let ours = Keypair::from_seed(&ALICE_SEED).unwrap();
    assert_eq!(ours.public().to_bytes(), reference.public.to_bytes());

    let theirs = reference.sign(signing_context(b"substrate").bytes(b"payload")).to_bytes();
    assert!(verify(ours.public(), b"substrate", b"payload", &theirs));

    let sig = schnorrkel::Signature::from_bytes(&ours.sign(b"substrate", b"payload")).unwrap();
    assert!(reference.public.verify_simple(b"substrate", b"payload", &sig).is_ok());
}
