use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use deal_observer::DealId;
use deal_observer::DealSnapshot;
use deal_observer::Error;
use deal_observer::LedgerReader;
use deal_observer::LedgerWriter;
use deal_observer::NotFoundError;
use deal_observer::Receipt;
use deal_observer::Result;
use deal_observer::TaskId;
use deal_observer::TaskSnapshot;
use deal_observer::TaskStatus;
use deal_observer::TxHash;
use parking_lot::Mutex;

#[derive(Default)]
struct State {
    deal_id: Option<DealId>,
    task_ids: Vec<TaskId>,
    /// Absent: never initialized
    statuses: HashMap<TaskId, TaskStatus>,
    expired: bool,
    ceiling: u64,
    transactions: Vec<Vec<TaskId>>,
}

/// Single-deal ledger whose records are mutated by the test while watches run.
///
/// Claims are applied on submission: every covered task becomes `FAILED`.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    state: Arc<Mutex<State>>,
}

impl MemoryLedger {
    pub fn with_deal(
        deal_id: &str,
        task_ids: &[&str],
    ) -> Self {
        let ledger = Self::default();
        {
            let mut state = ledger.state.lock();
            state.deal_id = Some(DealId::from(deal_id));
            state.task_ids = task_ids.iter().map(|id| TaskId::from(*id)).collect();
            state.ceiling = 5_500_000;
        }
        ledger
    }

    pub fn set_status(
        &self,
        task_id: &str,
        status: TaskStatus,
    ) {
        self.state.lock().statuses.insert(TaskId::from(task_id), status);
    }

    pub fn status(
        &self,
        task_id: &str,
    ) -> Option<TaskStatus> {
        self.state.lock().statuses.get(&TaskId::from(task_id)).copied()
    }

    /// Move the deal past its final deadline
    pub fn expire(&self) {
        self.state.lock().expired = true;
    }

    pub fn set_ceiling(
        &self,
        ceiling: u64,
    ) {
        self.state.lock().ceiling = ceiling;
    }

    pub fn transactions(&self) -> Vec<Vec<TaskId>> {
        self.state.lock().transactions.clone()
    }

    fn apply_claim(
        &self,
        task_ids: Vec<TaskId>,
    ) -> TxHash {
        let mut state = self.state.lock();
        for task_id in &task_ids {
            state.statuses.insert(task_id.clone(), TaskStatus::Failed);
        }
        state.transactions.push(task_ids);
        TxHash::new(format!("0x{:04x}", state.transactions.len()))
    }
}

#[async_trait]
impl LedgerReader for MemoryLedger {
    async fn read_task(
        &self,
        task_id: &TaskId,
    ) -> Result<TaskSnapshot> {
        let state = self.state.lock();
        let status = state
            .statuses
            .get(task_id)
            .copied()
            .ok_or_else(|| Error::from(NotFoundError::Task(task_id.clone())))?;
        Ok(TaskSnapshot {
            task_id: task_id.clone(),
            deal_id: state.deal_id.clone(),
            status,
            timed_out: state.expired,
            final_deadline: if state.expired { 0 } else { u64::MAX },
        })
    }

    async fn read_deal(
        &self,
        deal_id: &DealId,
    ) -> Result<DealSnapshot> {
        let state = self.state.lock();
        if state.deal_id.as_ref() != Some(deal_id) {
            return Err(NotFoundError::Deal(deal_id.clone()).into());
        }
        Ok(DealSnapshot {
            deal_id: deal_id.clone(),
            task_ids: state.task_ids.clone(),
            final_time: if state.expired { 0 } else { u64::MAX },
            deadline_reached: state.expired,
        })
    }

    async fn read_resource_ceiling(&self) -> Result<u64> {
        Ok(self.state.lock().ceiling)
    }
}

#[async_trait]
impl LedgerWriter for MemoryLedger {
    async fn submit_claim_batch(
        &self,
        task_ids: Vec<TaskId>,
    ) -> Result<TxHash> {
        Ok(self.apply_claim(task_ids))
    }

    async fn submit_init_and_claim_batch(
        &self,
        _deal_id: &DealId,
        indices: Vec<usize>,
    ) -> Result<TxHash> {
        let task_ids = {
            let state = self.state.lock();
            indices
                .iter()
                .filter_map(|index| state.task_ids.get(*index).cloned())
                .collect()
        };
        Ok(self.apply_claim(task_ids))
    }

    async fn await_confirmation(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Receipt> {
        Ok(Receipt {
            tx_hash: tx_hash.clone(),
            block_number: self.state.lock().transactions.len() as u64,
            resource_used: 0,
        })
    }
}
