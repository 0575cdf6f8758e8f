//! Inclusion results of contract commands.
//!
//! A command included in a block is not yet visible to queries: the worker
//! applies it only after it has processed that block. [`RemoteFinalization`]
//! tracks whether that has been observed.

use std::{sync::Arc, time::Duration};

use phat_contract_primitives::{ContractId, Hash};
use tracing::{debug, info, warn};

use crate::{
    abi::{ContractAbi, DecodedEvent},
    registry::PhatRegistry,
    Error, Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Ready,
    InBlock(Hash),
    Finalized(Hash),
    Dropped,
    Invalid,
}

impl TxStatus {
    pub fn block_hash(&self) -> Option<Hash> {
        match self {
            Self::InBlock(hash) | Self::Finalized(hash) => Some(*hash),
            _ => None,
        }
    }
}

/// A runtime event emitted while the extrinsic executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub pallet: String,
    pub variant: String,
    pub contract: Option<ContractId>,
    /// Contract-supplied event data for contract events, raw otherwise.
    pub data: Vec<u8>,
}

impl EventRecord {
    fn is_contract_event(&self) -> bool {
        self.pallet.eq_ignore_ascii_case("contracts")
            && matches!(self.variant.as_str(), "ContractEmitted" | "ContractExecution")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxInclusion {
    pub status: TxStatus,
    pub events: Vec<EventRecord>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemoteFinalization {
    #[default]
    Pending,
    /// The worker reported processing past the inclusion block.
    Finalized { worker_block: u32 },
}

pub struct ContractSubmittableResult {
    status: TxStatus,
    events: Vec<EventRecord>,
    contract_events: Vec<DecodedEvent>,
    finalization: RemoteFinalization,
    registry: Arc<PhatRegistry>,
}

impl ContractSubmittableResult {
    pub(crate) fn new(inclusion: TxInclusion, abi: &ContractAbi, registry: Arc<PhatRegistry>) -> Self {
        let contract_events = decode_contract_events(abi, &inclusion.events);
        Self {
            status: inclusion.status,
            events: inclusion.events,
            contract_events,
            finalization: RemoteFinalization::Pending,
            registry,
        }
    }

    pub fn status(&self) -> TxStatus {
        self.status
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn contract_events(&self) -> &[DecodedEvent] {
        &self.contract_events
    }

    pub fn finalization(&self) -> RemoteFinalization {
        self.finalization
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.finalization, RemoteFinalization::Finalized { .. })
    }

    /// Waits until the worker has processed a block past the one including
    /// this transaction. `None` uses the configured timeout.
    ///
    /// A timeout says nothing about the transaction itself; it may still be
    /// applied later.
    pub async fn wait_finalized(&mut self, timeout: Option<Duration>) -> Result<()> {
        if self.is_finalized() {
            return Ok(());
        }
        let hash = self.status.block_hash().ok_or(Error::NotIncluded)?;
        let block = self.registry.chain().block_number(hash).await?;

        let timeout = timeout.unwrap_or_else(|| self.registry.config().finalize_timeout());
        let interval = self.registry.config().poll_interval();
        let clock = self.registry.clock().clone();
        let started = clock.now();
        loop {
            let worker_block = self.registry.worker().get_info().await?.blocknum;
            if worker_block > block {
                self.finalization = RemoteFinalization::Finalized { worker_block };
                info!(block, worker_block, "command visible to worker");
                return Ok(());
            }
            if clock.now().saturating_sub(started) > timeout {
                return Err(Error::FinalizeTimeout {
                    block,
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
            debug!(block, worker_block, "worker behind inclusion block");
            clock.sleep(interval).await;
        }
    }
}

fn decode_contract_events(abi: &ContractAbi, records: &[EventRecord]) -> Vec<DecodedEvent> {
    records
        .iter()
        .filter(|record| record.is_contract_event())
        .filter_map(|record| match abi.decode_event(&record.data) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(variant = %record.variant, %err, "dropping undecodable contract event");
                None
            }
        })
        .collect()
}
