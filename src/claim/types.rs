use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::DealId;
use crate::TaskId;
use crate::TxHash;

/// Which write call a batch goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchType {
    /// Plain claim of tasks already initialized on the ledger
    Claim,
    /// Initialize and claim in one call, for tasks the ledger never saw
    InitializeAndClaim,
}

impl fmt::Display for BatchType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            BatchType::Claim => f.write_str("CLAIM"),
            BatchType::InitializeAndClaim => f.write_str("INITIALIZE_AND_CLAIM"),
        }
    }
}

/// One task of the deal waiting to be claimed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimWorkItem {
    /// Position of the task in the deal
    pub index: usize,
    pub task_id: TaskId,
}

/// A confirmed claim transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTransaction {
    pub tx_hash: TxHash,
    pub batch_type: BatchType,
    /// Task indices covered, ascending
    pub indices: Vec<usize>,
    pub block_number: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    /// In submission order
    pub transactions: Vec<ClaimTransaction>,
    pub claimed: BTreeMap<usize, TaskId>,
}

impl ClaimOutcome {
    pub(crate) fn record(
        &mut self,
        transaction: ClaimTransaction,
        items: Vec<ClaimWorkItem>,
    ) {
        for item in items {
            self.claimed.insert(item.index, item.task_id);
        }
        self.transactions.push(transaction);
    }
}

/// One transaction worth of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimBatch {
    pub batch_type: BatchType,
    pub items: Vec<ClaimWorkItem>,
}

/// Claim workload of a deal, partitioned and sized against the current
/// resource ceiling. Nothing has been submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPlan {
    pub deal_id: DealId,
    /// `0 < status < COMPLETED`, ascending by index
    pub initialized: Vec<ClaimWorkItem>,
    /// `UNSET`, ascending by index
    pub not_initialized: Vec<ClaimWorkItem>,
    pub resource_ceiling: u64,
    pub claim_batch_size: usize,
    pub init_batch_size: usize,
}

impl ClaimPlan {
    pub fn items_count(&self) -> usize {
        self.initialized.len() + self.not_initialized.len()
    }

    /// Every batch `claim` would submit, in order.
    pub fn batches(&self) -> Vec<ClaimBatch> {
        let mut batches = Vec::new();
        for (batch_type, items, size) in self.queues() {
            if items.is_empty() || size == 0 {
                continue;
            }
            batches.extend(items.chunks(size).map(|chunk| ClaimBatch {
                batch_type,
                items: chunk.to_vec(),
            }));
        }
        batches
    }

    fn queues(&self) -> [(BatchType, &[ClaimWorkItem], usize); 2] {
        [
            (BatchType::Claim, self.initialized.as_slice(), self.claim_batch_size),
            (
                BatchType::InitializeAndClaim,
                self.not_initialized.as_slice(),
                self.init_batch_size,
            ),
        ]
    }
}
