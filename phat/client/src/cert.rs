//! Query certificates.
//!
//! An account delegates query signing to a short-lived session key by signing
//! a [`CertificateBody`] that names the session public key. Every query then
//! carries the session signature plus the signed body, so the worker can tie
//! the request back to the account.

use std::fmt;

use parity_scale_codec::Encode;
use phat_contract_primitives::{AccountId, CertificateBody};
use phat_crypto::{Keypair, SIGNATURE_LEN};
use rand::rngs::OsRng;

use crate::{
    config::defaults,
    rpc::{CertificateProto, RequestSignature, SignatureType},
};

pub struct Certificate {
    account: AccountId,
    body: CertificateBody,
    /// Account signature over the encoded body.
    signature: [u8; SIGNATURE_LEN],
    session: Keypair,
    ss58_prefix: u16,
}

impl Certificate {
    /// Root certificate for `account`, delegating to a fresh session key.
    pub fn sign_with(account: &Keypair, ttl: u32) -> Self {
        let session = Keypair::generate(&mut OsRng);
        let body = CertificateBody { pubkey: session.public().to_bytes(), ttl, config_bits: 0 };
        let signature = account.sign(defaults::SIGNING_CONTEXT, &body.encode());
        Self {
            account: AccountId::new(account.public().to_bytes()),
            body,
            signature,
            session,
            ss58_prefix: defaults::SS58_PREFIX,
        }
    }

    pub fn with_ss58_prefix(mut self, prefix: u16) -> Self {
        self.ss58_prefix = prefix;
        self
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn ss58_prefix(&self) -> u16 {
        self.ss58_prefix
    }

    /// SS58 address of the certified account.
    pub fn address(&self) -> String {
        self.account.to_ss58check_with_version(self.ss58_prefix)
    }

    pub fn body(&self) -> &CertificateBody {
        &self.body
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
        &self.signature
    }

    fn to_proto(&self) -> CertificateProto {
        CertificateProto {
            encoded_body: self.body.encode(),
            signature: Some(Box::new(RequestSignature {
                signed_by: None,
                signature_type: SignatureType::Sr25519,
                signature: self.signature.to_vec(),
            })),
        }
    }

    /// Session-key signature over `data`, chained to this certificate.
    pub fn sign_query(&self, data: &[u8]) -> RequestSignature {
        RequestSignature {
            signed_by: Some(Box::new(self.to_proto())),
            signature_type: SignatureType::Sr25519,
            signature: self.session.sign(defaults::SIGNING_CONTEXT, data).to_vec(),
        }
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("address", &self.address())
            .field("ttl", &self.body.ttl)
            .finish_non_exhaustive()
    }
}
