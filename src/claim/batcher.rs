use std::collections::VecDeque;
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::BatchType;
use super::ClaimOutcome;
use super::ClaimPlan;
use super::ClaimTransaction;
use super::ClaimWorkItem;
use crate::utils::time::deadline_reached;
use crate::utils::time::now_unix_secs;
use crate::ClaimConfig;
use crate::ClaimInterrupted;
use crate::DealId;
use crate::Error;
use crate::LedgerReader;
use crate::LedgerWriter;
use crate::PreconditionError;
use crate::Receipt;
use crate::Result;
use crate::SubmissionError;
use crate::TaskStatus;
use crate::TxHash;

/// Claims every unfinished task of a deal whose deadline has passed.
///
/// The workload is split in two queues, tasks already initialized on the ledger
/// and tasks it never saw, each drained in sub-batches sized so that
/// `batch_size * cost_per_item <= resource_ceiling`. Batches are submitted one
/// at a time and each one is confirmed before the next is sent.
#[derive(Clone)]
pub struct ClaimBatcher {
    reader: Arc<dyn LedgerReader>,
    writer: Arc<dyn LedgerWriter>,
    config: ClaimConfig,
}

struct ClaimQueue {
    batch_type: BatchType,
    items: VecDeque<ClaimWorkItem>,
    batch_size: usize,
}

impl ClaimBatcher {
    pub fn new(
        reader: Arc<dyn LedgerReader>,
        writer: Arc<dyn LedgerWriter>,
        config: ClaimConfig,
    ) -> Self {
        Self { reader, writer, config }
    }

    /// Partition and size the workload without submitting anything.
    pub async fn plan(
        &self,
        deal_id: &DealId,
    ) -> Result<ClaimPlan> {
        let deal = self.reader.read_deal(deal_id).await?;
        if !deal.deadline_reached && !deadline_reached(deal.final_time, now_unix_secs()) {
            return Err(PreconditionError::DeadlineNotReached {
                deal_id: deal_id.clone(),
                final_time: deal.final_time,
            }
            .into());
        }

        let reads = join_all(deal.task_ids.iter().map(|task_id| self.reader.read_task(task_id))).await;

        let mut initialized = Vec::new();
        let mut not_initialized = Vec::new();
        for (index, (task_id, read)) in deal.task_ids.iter().zip(reads).enumerate() {
            let status = match read {
                Ok(snapshot) => snapshot.status,
                Err(err) if err.is_not_found() => TaskStatus::Unset,
                Err(err) => {
                    warn!(deal_id = %deal_id, task_id = %task_id, error = %err, "task status read failed");
                    return Err(err);
                }
            };
            let item = ClaimWorkItem {
                index,
                task_id: task_id.clone(),
            };
            match status {
                TaskStatus::Unset => not_initialized.push(item),
                status if status.is_initialized_pending() => initialized.push(item),
                status => trace!(deal_id = %deal_id, index, %status, "already final, skipped"),
            }
        }
        if initialized.is_empty() && not_initialized.is_empty() {
            return Err(PreconditionError::NothingToClaim {
                deal_id: deal_id.clone(),
            }
            .into());
        }

        let resource_ceiling = self.reader.read_resource_ceiling().await?;
        let claim_batch_size = batch_size(resource_ceiling, self.config.claim_cost, &initialized)?;
        let init_batch_size = batch_size(resource_ceiling, self.config.init_and_claim_cost, &not_initialized)?;

        debug!(
            deal_id = %deal_id,
            initialized = initialized.len(),
            not_initialized = not_initialized.len(),
            resource_ceiling,
            claim_batch_size,
            init_batch_size,
            "claim planned"
        );

        Ok(ClaimPlan {
            deal_id: deal_id.clone(),
            initialized,
            not_initialized,
            resource_ceiling,
            claim_batch_size,
            init_batch_size,
        })
    }

    /// Plan, then drain both queues, initialized tasks first.
    ///
    /// On a failed submit or confirm the drain stops and
    /// [`Error::ClaimInterrupted`] reports the confirmed batches together with
    /// the failed batch and everything after it.
    pub async fn claim(
        &self,
        deal_id: &DealId,
    ) -> Result<ClaimOutcome> {
        let plan = self.plan(deal_id).await?;
        self.drain(plan).await
    }

    async fn drain(
        &self,
        plan: ClaimPlan,
    ) -> Result<ClaimOutcome> {
        let deal_id = plan.deal_id;
        let mut pending = VecDeque::from([
            ClaimQueue {
                batch_type: BatchType::Claim,
                items: plan.initialized.into(),
                batch_size: plan.claim_batch_size,
            },
            ClaimQueue {
                batch_type: BatchType::InitializeAndClaim,
                items: plan.not_initialized.into(),
                batch_size: plan.init_batch_size,
            },
        ]);
        let mut outcome = ClaimOutcome::default();

        while let Some(mut queue) = pending.pop_front() {
            while !queue.items.is_empty() {
                let take = queue.batch_size.min(queue.items.len());
                let batch: Vec<ClaimWorkItem> = queue.items.drain(..take).collect();

                match self.submit(&deal_id, queue.batch_type, &batch).await {
                    Ok((tx_hash, receipt)) => {
                        debug!(
                            deal_id = %deal_id,
                            tx_hash = %tx_hash,
                            batch_type = %queue.batch_type,
                            items = batch.len(),
                            "claim batch confirmed"
                        );
                        let transaction = ClaimTransaction {
                            tx_hash,
                            batch_type: queue.batch_type,
                            indices: batch.iter().map(|item| item.index).collect(),
                            block_number: receipt.block_number,
                        };
                        outcome.record(transaction, batch);
                    }
                    Err(cause) => {
                        let remaining: Vec<ClaimWorkItem> = batch
                            .into_iter()
                            .chain(queue.items)
                            .chain(pending.into_iter().flat_map(|queue| queue.items))
                            .collect();
                        warn!(
                            deal_id = %deal_id,
                            confirmed = outcome.transactions.len(),
                            remaining = remaining.len(),
                            error = %cause,
                            "claim interrupted"
                        );
                        return Err(Error::ClaimInterrupted(Box::new(ClaimInterrupted {
                            cause,
                            progress: outcome,
                            remaining,
                        })));
                    }
                }
            }
        }

        info!(
            deal_id = %deal_id,
            transactions = outcome.transactions.len(),
            claimed = outcome.claimed.len(),
            "claim finished"
        );
        Ok(outcome)
    }

    async fn submit(
        &self,
        deal_id: &DealId,
        batch_type: BatchType,
        batch: &[ClaimWorkItem],
    ) -> std::result::Result<(TxHash, Receipt), SubmissionError> {
        let submitted = match batch_type {
            BatchType::Claim => {
                let task_ids = batch.iter().map(|item| item.task_id.clone()).collect();
                self.writer.submit_claim_batch(task_ids).await
            }
            BatchType::InitializeAndClaim => {
                let indices = batch.iter().map(|item| item.index).collect();
                self.writer.submit_init_and_claim_batch(deal_id, indices).await
            }
        };
        let tx_hash = submitted.map_err(|source| SubmissionError::Submit {
            batch_type,
            indices: batch.iter().map(|item| item.index).collect(),
            source: Box::new(source),
        })?;

        let receipt = self
            .writer
            .await_confirmation(&tx_hash)
            .await
            .map_err(|source| SubmissionError::Confirm {
                tx_hash: tx_hash.clone(),
                source: Box::new(source),
            })?;
        Ok((tx_hash, receipt))
    }
}

/// `floor(ceiling / cost)`; zero is only allowed for an empty queue
fn batch_size(
    ceiling: u64,
    cost_per_item: u64,
    queue: &[ClaimWorkItem],
) -> Result<usize> {
    let size = ceiling.checked_div(cost_per_item).unwrap_or(0);
    if size == 0 && !queue.is_empty() {
        return Err(PreconditionError::CeilingTooLow { ceiling, cost_per_item }.into());
    }
    Ok(usize::try_from(size).unwrap_or(usize::MAX))
}
