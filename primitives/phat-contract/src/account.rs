//! 32-byte account ids with SS58 text form.

use alloc::{string::String, vec::Vec};
use blake2::{Blake2b512, Digest};
use core::fmt;
use parity_scale_codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;

/// Phala / Khala address prefix.
pub const PHALA_SS58_PREFIX: u16 = 30;

const SS58_CONTEXT: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ss58Error {
    BadBase58,
    BadHex,
    BadLength,
    InvalidPrefix,
    InvalidChecksum,
}

impl fmt::Display for Ss58Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::BadBase58 => "invalid base58",
            Self::BadHex => "invalid hex",
            Self::BadLength => "invalid length",
            Self::InvalidPrefix => "invalid ss58 prefix",
            Self::InvalidChecksum => "invalid checksum",
        };
        f.write_str(msg)
    }
}

#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, TypeInfo, MaxEncodedLen,
)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_ss58check_with_version(&self, prefix: u16) -> String {
        let mut raw = encode_prefix(prefix);
        raw.extend_from_slice(&self.0);
        let hash = ss58_hash(&raw);
        raw.extend_from_slice(&hash[..CHECKSUM_LEN]);
        bs58::encode(raw).into_string()
    }

    /// Parses an SS58 address of any prefix, returning the id and the prefix.
    pub fn from_ss58check_with_version(s: &str) -> Result<(Self, u16), Ss58Error> {
        let data = bs58::decode(s).into_vec().map_err(|_| Ss58Error::BadBase58)?;
        let (prefix, prefix_len) = match data.first() {
            Some(&b) if b < 64 => (b as u16, 1),
            Some(&b) if b < 128 => {
                let second = *data.get(1).ok_or(Ss58Error::BadLength)?;
                let lower = (b << 2) | (second >> 6);
                let upper = second & 0b0011_1111;
                (lower as u16 | ((upper as u16) << 8), 2)
            }
            Some(_) => return Err(Ss58Error::InvalidPrefix),
            None => return Err(Ss58Error::BadLength),
        };
        if data.len() != prefix_len + 32 + CHECKSUM_LEN {
            return Err(Ss58Error::BadLength);
        }
        let body_end = prefix_len + 32;
        let hash = ss58_hash(&data[..body_end]);
        if data[body_end..] != hash[..CHECKSUM_LEN] {
            return Err(Ss58Error::InvalidChecksum);
        }
        let mut id = [0u8; 32];
        id.copy_from_slice(&data[prefix_len..body_end]);
        Ok((Self(id), prefix))
    }
}

fn encode_prefix(prefix: u16) -> Vec<u8> {
    let ident = prefix & 0b0011_1111_1111_1111;
    if ident < 64 {
        alloc::vec![ident as u8]
    } else {
        let first = ((ident & 0b0000_0000_1111_1100) as u8 >> 2) | 0b0100_0000;
        let second = ((ident >> 8) as u8) | (((ident & 0b0000_0000_0000_0011) as u8) << 6);
        alloc::vec![first, second]
    }
}

fn ss58_hash(data: &[u8]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_CONTEXT);
    hasher.update(data);
    let mut out = [0u8; 64];
    out.copy_from_slice(&hasher.finalize());
    out
}

impl From<[u8; 32]> for AccountId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl core::str::FromStr for AccountId {
    type Err = Ss58Error;

    /// Accepts SS58 text of any prefix or `0x`-prefixed hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(digits) = s.strip_prefix("0x") {
            let mut id = [0u8; 32];
            hex::decode_to_slice(digits, &mut id).map_err(|e| match e {
                hex::FromHexError::InvalidHexCharacter { .. } => Ss58Error::BadHex,
                _ => Ss58Error::BadLength,
            })?;
            return Ok(Self(id));
        }
        Self::from_ss58check_with_version(s).map(|(id, _)| id)
    }
}

/// Displays with the Phala prefix, matching how certificates record addresses.
impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ss58check_with_version(PHALA_SS58_PREFIX))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} (0x{}...)", hex::encode(&self.0[..4]))
    }
}
