use std::sync::Arc;

use super::ObserverBuilder;
use crate::stream::EventStream;
use crate::ClaimBatcher;
use crate::ClaimOutcome;
use crate::ClaimPlan;
use crate::DealEvent;
use crate::DealId;
use crate::DealWatcher;
use crate::LedgerReader;
use crate::LedgerWriter;
use crate::ObserverConfig;
use crate::Result;
use crate::TaskEvent;
use crate::TaskId;
use crate::TaskWatcher;
use crate::WatchTaskOptions;

/// Caller entry point: task and deal watches plus deadline claims, all sharing
/// one pair of ledger collaborators.
///
/// Cheap to clone. Watches need a tokio runtime at subscribe time.
#[derive(Clone)]
pub struct DealObserver {
    config: ObserverConfig,
    tasks: TaskWatcher,
    deals: DealWatcher,
    batcher: ClaimBatcher,
}

impl DealObserver {
    pub fn builder(
        reader: Arc<dyn LedgerReader>,
        writer: Arc<dyn LedgerWriter>,
    ) -> ObserverBuilder {
        ObserverBuilder::new(reader, writer)
    }

    pub(super) fn from_parts(
        reader: Arc<dyn LedgerReader>,
        writer: Arc<dyn LedgerWriter>,
        config: ObserverConfig,
    ) -> Self {
        Self {
            tasks: TaskWatcher::new(Arc::clone(&reader), config.watch.clone()),
            deals: DealWatcher::new(Arc::clone(&reader), config.watch.clone()),
            batcher: ClaimBatcher::new(reader, writer, config.claim.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Events: `TASK_UPDATED`, then one of `TASK_COMPLETED`, `TASK_FAILED`,
    /// `TASK_TIMEDOUT` or an error.
    pub fn watch_task(
        &self,
        task_id: impl Into<TaskId>,
        options: WatchTaskOptions,
    ) -> EventStream<TaskEvent> {
        self.tasks.watch(task_id.into(), options)
    }

    /// Events: `DEAL_UPDATED`, then one of `DEAL_COMPLETED`, `DEAL_TIMEDOUT`
    /// or an error.
    pub fn watch_deal(
        &self,
        deal_id: impl Into<DealId>,
    ) -> EventStream<DealEvent> {
        self.deals.watch(deal_id.into())
    }

    pub async fn plan_claim(
        &self,
        deal_id: &DealId,
    ) -> Result<ClaimPlan> {
        self.batcher.plan(deal_id).await
    }

    pub async fn claim(
        &self,
        deal_id: &DealId,
    ) -> Result<ClaimOutcome> {
        self.batcher.claim(deal_id).await
    }
}
