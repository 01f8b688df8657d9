//! Ledger collaborator seam
//!
//! The remote ledger is append-only and reachable only through read queries
//! and signed transactions. Both sides are consumed through the narrow
//! [`LedgerReader`] and [`LedgerWriter`] traits; connection handling, request
//! validation and signing live behind them.
//!
//! Contract for implementors:
//! - `read_task` / `read_deal` fail with [`Error::NotFound`](crate::Error::NotFound)
//!   when the ledger holds no initialized record for the id. Watchers rely on this
//!   to tell "not yet initialized" apart from a real read failure.
//! - Any other failure should be reported as [`Error::Read`](crate::Error::Read).
//! - No retries or timeouts are expected from callers of these traits.

mod types;

pub use types::*;


#[cfg(test)]
use mockall::automock;

use async_trait::async_trait;

use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait LedgerReader: Send + Sync + 'static {
    /// Fetch the current snapshot of a task.
    async fn read_task(
        &self,
        task_id: &TaskId,
    ) -> Result<TaskSnapshot>;

    /// Fetch the current snapshot of a deal.
    async fn read_deal(
        &self,
        deal_id: &DealId,
    ) -> Result<DealSnapshot>;

    /// Current per-transaction resource limit (e.g. block gas limit).
    async fn read_resource_ceiling(&self) -> Result<u64>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait LedgerWriter: Send + Sync + 'static {
    /// Plain claim of tasks that are already initialized on the ledger.
    async fn submit_claim_batch(
        &self,
        task_ids: Vec<TaskId>,
    ) -> Result<TxHash>;

    /// Initialize then claim the tasks at `indices` of the deal's task batch.
    async fn submit_init_and_claim_batch(
        &self,
        deal_id: &DealId,
        indices: Vec<usize>,
    ) -> Result<TxHash>;

    async fn await_confirmation(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Receipt>;
}
