use std::time::Duration;

use phat_contract_primitives::WeightVersion;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub mod defaults {
    use phat_contract_primitives::PHALA_SS58_PREFIX;

    /// How long `wait_finalized` polls before giving up.
    pub const FINALIZE_TIMEOUT_MS: u64 = 120_000;
    pub const POLL_INTERVAL_MS: u64 = 1_000;
    pub const SS58_PREFIX: u16 = PHALA_SS58_PREFIX;
    /// Certificate lifetime in blocks.
    pub const CERTIFICATE_TTL: u32 = 0x7fff_ffff;
    /// Signing context shared with substrate's sr25519 signer.
    pub const SIGNING_CONTEXT: &[u8] = b"substrate";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub finalize_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub ss58_prefix: u16,
    pub weight_version: WeightVersion,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            finalize_timeout_ms: defaults::FINALIZE_TIMEOUT_MS,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            ss58_prefix: defaults::SS58_PREFIX,
            weight_version: WeightVersion::V2,
        }
    }
}

impl ClientConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be non-zero".into()));
        }
        if self.ss58_prefix > 0x3fff {
            return Err(Error::Config(format!("ss58 prefix {} out of range", self.ss58_prefix)));
        }
        Ok(())
    }

    pub fn finalize_timeout(&self) -> Duration {
        Duration::from_millis(self.finalize_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
