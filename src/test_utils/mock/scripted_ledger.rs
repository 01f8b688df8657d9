use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::DealId;
use crate::DealSnapshot;
use crate::Error;
use crate::LedgerReader;
use crate::LedgerWriter;
use crate::NotFoundError;
use crate::ReadError;
use crate::Receipt;
use crate::Result;
use crate::TaskId;
use crate::TaskSnapshot;
use crate::TxHash;

/// One scripted answer to `read_task`
#[derive(Clone)]
pub enum Step {
    Snapshot(TaskSnapshot),
    NotFound,
    Unavailable(&'static str),
    /// Park the read until the notify fires, then answer with the inner step
    Hold(Arc<Notify>, Box<Step>),
}

#[derive(Clone)]
pub enum DealStep {
    Snapshot(DealSnapshot),
    Unavailable(&'static str),
}

/// What the writer side was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Claim(Vec<TaskId>),
    InitAndClaim(DealId, Vec<usize>),
}

/// In-memory ledger answering from per-record scripts.
///
/// Each `read_task` pops the next step of that task's script; the last step
/// repeats forever. Unknown tasks and deals read as not found.
#[derive(Default)]
pub struct ScriptedLedger {
    tasks: Mutex<HashMap<TaskId, VecDeque<Step>>>,
    deals: Mutex<HashMap<DealId, DealStep>>,
    task_reads: Mutex<HashMap<TaskId, usize>>,
    deal_reads: AtomicUsize,
    ceiling: AtomicU64,
    submitted: Mutex<Vec<Submitted>>,
    /// 0-based submission number that fails
    fail_submission: Mutex<Option<usize>>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_task(
        &self,
        task_id: &str,
        steps: Vec<Step>,
    ) {
        self.tasks.lock().insert(TaskId::from(task_id), steps.into());
    }

    pub fn set_deal(
        &self,
        deal: DealSnapshot,
    ) {
        self.deals
            .lock()
            .insert(deal.deal_id.clone(), DealStep::Snapshot(deal));
    }

    pub fn fail_deal(
        &self,
        deal_id: &str,
        reason: &'static str,
    ) {
        self.deals
            .lock()
            .insert(DealId::from(deal_id), DealStep::Unavailable(reason));
    }

    pub fn set_ceiling(
        &self,
        ceiling: u64,
    ) {
        self.ceiling.store(ceiling, Ordering::SeqCst);
    }

    pub fn fail_submission_at(
        &self,
        n: usize,
    ) {
        *self.fail_submission.lock() = Some(n);
    }

    pub fn task_reads(
        &self,
        task_id: &str,
    ) -> usize {
        self.task_reads
            .lock()
            .get(&TaskId::from(task_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn deal_reads(&self) -> usize {
        self.deal_reads.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<Submitted> {
        self.submitted.lock().clone()
    }

    fn next_step(
        &self,
        task_id: &TaskId,
    ) -> Step {
        *self.task_reads.lock().entry(task_id.clone()).or_insert(0) += 1;
        let mut tasks = self.tasks.lock();
        match tasks.get_mut(task_id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Step::NotFound),
            Some(queue) => queue.front().cloned().unwrap_or(Step::NotFound),
            None => Step::NotFound,
        }
    }

    fn record(
        &self,
        submission: Submitted,
    ) -> Result<TxHash> {
        let mut submitted = self.submitted.lock();
        let n = submitted.len();
        if *self.fail_submission.lock() == Some(n) {
            return Err(ReadError::Unavailable(format!("submission {n} rejected")).into());
        }
        submitted.push(submission);
        Ok(TxHash::new(format!("0xtx{n}")))
    }
}

#[async_trait]
impl LedgerReader for ScriptedLedger {
    async fn read_task(
        &self,
        task_id: &TaskId,
    ) -> Result<TaskSnapshot> {
        let mut step = self.next_step(task_id);
        loop {
            match step {
                Step::Snapshot(snapshot) => return Ok(snapshot),
                Step::NotFound => return Err(NotFoundError::Task(task_id.clone()).into()),
                Step::Unavailable(reason) => return Err(ReadError::Unavailable(reason.to_string()).into()),
                Step::Hold(notify, inner) => {
                    notify.notified().await;
                    step = *inner;
                }
            }
        }
    }

    async fn read_deal(
        &self,
        deal_id: &DealId,
    ) -> Result<DealSnapshot> {
        self.deal_reads.fetch_add(1, Ordering::SeqCst);
        let step = self.deals.lock().get(deal_id).cloned();
        match step {
            Some(DealStep::Snapshot(deal)) => Ok(deal),
            Some(DealStep::Unavailable(reason)) => Err(ReadError::Unavailable(reason.to_string()).into()),
            None => Err(Error::NotFound(NotFoundError::Deal(deal_id.clone()))),
        }
    }

    async fn read_resource_ceiling(&self) -> Result<u64> {
        Ok(self.ceiling.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl LedgerWriter for ScriptedLedger {
    async fn submit_claim_batch(
        &self,
        task_ids: Vec<TaskId>,
    ) -> Result<TxHash> {
        self.record(Submitted::Claim(task_ids))
    }

    async fn submit_init_and_claim_batch(
        &self,
        deal_id: &DealId,
        indices: Vec<usize>,
    ) -> Result<TxHash> {
        self.record(Submitted::InitAndClaim(deal_id.clone(), indices))
    }

    async fn await_confirmation(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Receipt> {
        Ok(Receipt {
            tx_hash: tx_hash.clone(),
            block_number: 1,
            resource_used: 0,
        })
    }
}
