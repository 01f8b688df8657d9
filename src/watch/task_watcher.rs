use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::TaskEvent;
use crate::stream::EventStream;
use crate::stream::Subscriber;
use crate::stream::Teardown;
use crate::utils::time::now_unix_secs;
use crate::DealId;
use crate::Error;
use crate::LedgerReader;
use crate::TaskId;
use crate::TaskSnapshot;
use crate::TaskStatus;
use crate::WatchConfig;

#[derive(Debug, Clone, Default)]
pub struct WatchTaskOptions {
    /// Parent deal, used to resolve tasks the ledger has not initialized yet
    pub deal_id: Option<DealId>,
}

/// Polls one task on a fixed interval and turns snapshots into [`TaskEvent`]s.
///
/// Each subscription spawns its own polling task on the current tokio runtime,
/// so `subscribe` must be called from within one.
#[derive(Clone)]
pub struct TaskWatcher {
    reader: Arc<dyn LedgerReader>,
    config: WatchConfig,
}

impl TaskWatcher {
    pub fn new(
        reader: Arc<dyn LedgerReader>,
        config: WatchConfig,
    ) -> Self {
        Self { reader, config }
    }

    pub fn watch(
        &self,
        task_id: TaskId,
        options: WatchTaskOptions,
    ) -> EventStream<TaskEvent> {
        let reader = Arc::clone(&self.reader);
        let interval = self.config.poll_interval();

        EventStream::new(move |subscriber: Subscriber<TaskEvent>| {
            let token = CancellationToken::new();
            let poller = TaskPoller {
                task_id: task_id.clone(),
                deal_id: options.deal_id.clone(),
                reader: Arc::clone(&reader),
                interval,
                token: token.clone(),
                deal_final_time: None,
            };
            tokio::spawn(poller.run(subscriber));
            Teardown::new(move || token.cancel())
        })
    }
}

/// One read, normalized
#[derive(Debug)]
pub(crate) enum Polled {
    Found(TaskSnapshot),
    /// Not initialized on the ledger yet; synthetic `UNSET` state
    Pending(TaskSnapshot),
    Failed(Error),
}

/// Decide what a fresh snapshot emits, if anything.
///
/// A tick whose status matches the previous one is skipped unless the task has
/// timed out.
pub(crate) fn classify(
    previous: Option<&TaskSnapshot>,
    snapshot: TaskSnapshot,
) -> Option<TaskEvent> {
    if let Some(previous) = previous {
        if previous.status == snapshot.status && !snapshot.timed_out {
            return None;
        }
    }
    let event = match snapshot.status {
        TaskStatus::Completed => TaskEvent::Completed(snapshot),
        TaskStatus::Failed => TaskEvent::Failed(snapshot),
        _ if snapshot.timed_out => TaskEvent::TimedOut(snapshot),
        _ => TaskEvent::Updated(snapshot),
    };
    Some(event)
}

struct TaskPoller {
    task_id: TaskId,
    deal_id: Option<DealId>,
    reader: Arc<dyn LedgerReader>,
    interval: Duration,
    token: CancellationToken,
    /// Deal deadlines never move; read once
    deal_final_time: Option<u64>,
}

impl TaskPoller {
    async fn run(
        mut self,
        subscriber: Subscriber<TaskEvent>,
    ) {
        debug!(task_id = %self.task_id, interval = ?self.interval, "task watch started");
        let mut previous: Option<TaskSnapshot> = None;

        loop {
            if self.token.is_cancelled() {
                break;
            }

            let polled = self.poll().await;

            if self.token.is_cancelled() {
                trace!(task_id = %self.task_id, "discarding read finished after cancel");
                break;
            }

            let snapshot = match polled {
                Polled::Found(snapshot) => snapshot,
                Polled::Pending(snapshot) => {
                    trace!(task_id = %self.task_id, timed_out = snapshot.timed_out, "task not initialized yet");
                    snapshot
                }
                Polled::Failed(err) => {
                    warn!(task_id = %self.task_id, error = %err, "task read failed");
                    subscriber.error(err);
                    break;
                }
            };

            match classify(previous.as_ref(), snapshot.clone()) {
                None => {
                    trace!(task_id = %self.task_id, status = %snapshot.status, "unchanged");
                }
                Some(event) if event.is_terminal() => {
                    debug!(task_id = %self.task_id, event = event.message(), "task watch finished");
                    subscriber.next(event);
                    subscriber.complete();
                    break;
                }
                Some(event) => subscriber.next(event),
            }
            previous = Some(snapshot);

            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }
    }

    async fn poll(&mut self) -> Polled {
        let err = match self.reader.read_task(&self.task_id).await {
            Ok(snapshot) => return Polled::Found(snapshot),
            Err(err) => err,
        };
        if !err.is_not_found() {
            return Polled::Failed(err);
        }
        let Some(deal_id) = self.deal_id.clone() else {
            return Polled::Failed(err);
        };

        let final_time = match self.deal_final_time {
            Some(final_time) => final_time,
            None => match self.reader.read_deal(&deal_id).await {
                Ok(deal) => {
                    self.deal_final_time = Some(deal.final_time);
                    deal.final_time
                }
                Err(err) => return Polled::Failed(err),
            },
        };

        Polled::Pending(TaskSnapshot::pending(
            self.task_id.clone(),
            Some(deal_id),
            final_time,
            now_unix_secs(),
        ))
    }
}
