use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::DealEvent;
use super::DealProgress;
use super::TaskEvent;
use super::TaskProgress;
use super::TaskWatcher;
use super::WatchTaskOptions;
use crate::stream::EventStream;
use crate::stream::Notification;
use crate::stream::Observer;
use crate::stream::Subscriber;
use crate::stream::Subscription;
use crate::stream::Teardown;
use crate::DealId;
use crate::DealSnapshot;
use crate::Error;
use crate::LedgerReader;
use crate::TaskId;
use crate::TaskSnapshot;
use crate::TaskStatus;
use crate::WatchConfig;

/// Watches every task of a deal and folds them into one [`DealEvent`] stream.
///
/// One [`TaskWatcher`] subscription is opened per task. Children forward their
/// notifications over a channel to a single aggregator task, which owns the
/// per-index table and is the only emitter towards the deal subscriber.
#[derive(Clone)]
pub struct DealWatcher {
    reader: Arc<dyn LedgerReader>,
    tasks: TaskWatcher,
}

impl DealWatcher {
    pub fn new(
        reader: Arc<dyn LedgerReader>,
        config: WatchConfig,
    ) -> Self {
        Self {
            tasks: TaskWatcher::new(Arc::clone(&reader), config),
            reader,
        }
    }

    pub fn watch(
        &self,
        deal_id: DealId,
    ) -> EventStream<DealEvent> {
        let watcher = self.clone();
        EventStream::new(move |subscriber: Subscriber<DealEvent>| {
            let token = CancellationToken::new();
            tokio::spawn(watcher.clone().aggregate(deal_id.clone(), subscriber, token.clone()));
            Teardown::new(move || token.cancel())
        })
    }

    async fn aggregate(
        self,
        deal_id: DealId,
        subscriber: Subscriber<DealEvent>,
        token: CancellationToken,
    ) {
        let read = tokio::select! {
            _ = token.cancelled() => return,
            read = self.reader.read_deal(&deal_id) => read,
        };
        let deal = match read {
            Ok(deal) => deal,
            Err(err) => {
                warn!(deal_id = %deal_id, error = %err, "deal read failed");
                subscriber.error(err);
                return;
            }
        };
        if token.is_cancelled() {
            return;
        }

        let mut table = TaskTable::new(&deal);
        debug!(deal_id = %deal_id, tasks = table.len(), "deal watch started");
        if table.len() == 0 {
            if let Verdict::Completed(progress) = table.verdict() {
                subscriber.next(DealEvent::Completed(progress));
            }
            subscriber.complete();
            return;
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let children = ChildSubscriptions::default();
        {
            let children = children.clone();
            subscriber.on_unsubscribe(move || children.unsubscribe_all());
        }
        for (index, task_id) in deal.task_ids.iter().enumerate() {
            let options = WatchTaskOptions {
                deal_id: Some(deal.deal_id.clone()),
            };
            let child = self.tasks.watch(task_id.clone(), options).subscribe(ChildForwarder {
                index,
                tx: tx.clone(),
            });
            children.push(child);
        }
        drop(tx);

        loop {
            let message = tokio::select! {
                _ = token.cancelled() => break,
                message = rx.recv() => message,
            };
            let Some((index, notification)) = message else {
                break;
            };

            match notification {
                Notification::Next(event) => {
                    table.merge(index, event.snapshot());
                    match table.verdict() {
                        Verdict::Incomplete => {
                            trace!(deal_id = %deal_id, index, "waiting for every task to report");
                        }
                        Verdict::Updated(progress) => subscriber.next(DealEvent::Updated(progress)),
                        Verdict::Completed(progress) => {
                            debug!(deal_id = %deal_id, "deal completed");
                            subscriber.next(DealEvent::Completed(progress));
                            subscriber.complete();
                            break;
                        }
                        Verdict::TimedOut(progress) => {
                            debug!(
                                deal_id = %deal_id,
                                completed = progress.completed_tasks_count,
                                failed = progress.failed_tasks_count,
                                "deal timed out"
                            );
                            subscriber.next(DealEvent::TimedOut(progress));
                            subscriber.complete();
                            break;
                        }
                    }
                }
                Notification::Complete => {
                    trace!(deal_id = %deal_id, index, "task watch finished");
                }
                Notification::Error(err) => {
                    warn!(deal_id = %deal_id, index, error = %err, "task watch failed, stopping deal watch");
                    subscriber.error(err);
                    break;
                }
            }
        }

        children.unsubscribe_all();
    }
}

pub(crate) enum Verdict {
    /// Some index has not reported yet
    Incomplete,
    Updated(DealProgress),
    Completed(DealProgress),
    TimedOut(DealProgress),
}

struct TaskEntry {
    task_id: TaskId,
    state: Option<(TaskStatus, bool)>,
}

/// Latest `{status, timed_out}` per task index
pub(crate) struct TaskTable {
    deal_id: DealId,
    entries: Vec<TaskEntry>,
}

impl TaskTable {
    pub(crate) fn new(deal: &DealSnapshot) -> Self {
        Self {
            deal_id: deal.deal_id.clone(),
            entries: deal
                .task_ids
                .iter()
                .map(|task_id| TaskEntry {
                    task_id: task_id.clone(),
                    state: None,
                })
                .collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn merge(
        &mut self,
        index: usize,
        snapshot: &TaskSnapshot,
    ) {
        match self.entries.get_mut(index) {
            Some(entry) => entry.state = Some((snapshot.status, snapshot.timed_out)),
            None => warn!(deal_id = %self.deal_id, index, "update for unknown task index"),
        }
    }

    pub(crate) fn verdict(&self) -> Verdict {
        let mut tasks = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            let Some((status, timed_out)) = entry.state else {
                return Verdict::Incomplete;
            };
            tasks.push(TaskProgress {
                index,
                task_id: entry.task_id.clone(),
                status,
                timed_out,
            });
        }

        let tasks_count = tasks.len();
        let completed_tasks_count = tasks.iter().filter(|t| t.status == TaskStatus::Completed).count();
        // A completed task never counts as timed out, whatever the clock says.
        let failed_tasks_count = tasks
            .iter()
            .filter(|t| t.timed_out && t.status != TaskStatus::Completed)
            .count();

        let progress = DealProgress {
            deal_id: self.deal_id.clone(),
            tasks,
            completed_tasks_count,
            failed_tasks_count,
            tasks_count,
        };
        if completed_tasks_count == tasks_count {
            Verdict::Completed(progress)
        } else if completed_tasks_count + failed_tasks_count == tasks_count {
            Verdict::TimedOut(progress)
        } else {
            Verdict::Updated(progress)
        }
    }
}

/// Tags child notifications with the task index
struct ChildForwarder {
    index: usize,
    tx: mpsc::UnboundedSender<(usize, Notification<TaskEvent>)>,
}

impl ChildForwarder {
    fn forward(
        &self,
        notification: Notification<TaskEvent>,
    ) {
        // Aggregator gone: the deal watch is over.
        let _ = self.tx.send((self.index, notification));
    }
}

impl Observer<TaskEvent> for ChildForwarder {
    fn next(
        &self,
        value: TaskEvent,
    ) {
        self.forward(Notification::Next(value));
    }

    fn error(
        &self,
        err: Error,
    ) {
        self.forward(Notification::Error(err));
    }

    fn complete(&self) {
        self.forward(Notification::Complete);
    }
}

#[derive(Default)]
struct ChildState {
    closed: bool,
    live: Vec<Subscription>,
}

/// Every child handle the deal watch opened; each is torn down once
#[derive(Clone, Default)]
struct ChildSubscriptions {
    inner: Arc<Mutex<ChildState>>,
}

impl ChildSubscriptions {
    fn push(
        &self,
        child: Subscription,
    ) {
        let mut state = self.inner.lock();
        if state.closed {
            drop(state);
            child.unsubscribe();
            return;
        }
        state.live.push(child);
    }

    fn unsubscribe_all(&self) {
        let live = {
            let mut state = self.inner.lock();
            state.closed = true;
            std::mem::take(&mut state.live)
        };
        if !live.is_empty() {
            trace!(children = live.len(), "unsubscribing task watches");
        }
        for child in live {
            child.unsubscribe();
        }
    }
}
