use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use crate::stream::Notification;
use crate::stream::Observer;
use crate::DealId;
use crate::DealSnapshot;
use crate::Error;
use crate::TaskId;
use crate::TaskSnapshot;
use crate::TaskStatus;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

/// Observer that keeps every notification it receives
pub struct Recorder<T> {
    seen: Arc<Mutex<Vec<Notification<T>>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            seen: Arc::clone(&self.seen),
        }
    }
}

impl<T: Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn take(&self) -> Vec<Notification<T>> {
        std::mem::take(&mut *self.seen.lock())
    }

    pub fn terminal_count(&self) -> usize {
        self.seen.lock().iter().filter(|n| n.is_terminal()).count()
    }

    pub fn errors(&self) -> usize {
        self.seen
            .lock()
            .iter()
            .filter(|n| matches!(n, Notification::Error(_)))
            .count()
    }
}

impl<T: Clone + Send + 'static> Recorder<T> {
    pub fn values(&self) -> Vec<T> {
        self.seen
            .lock()
            .iter()
            .filter_map(|n| match n {
                Notification::Next(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }
}

impl<T: Send + 'static> Observer<T> for Recorder<T> {
    fn next(
        &self,
        value: T,
    ) {
        self.seen.lock().push(Notification::Next(value));
    }

    fn error(
        &self,
        err: Error,
    ) {
        self.seen.lock().push(Notification::Error(err));
    }

    fn complete(&self) {
        self.seen.lock().push(Notification::Complete);
    }
}

pub fn task_snapshot(
    task_id: &str,
    status: TaskStatus,
    timed_out: bool,
) -> TaskSnapshot {
    TaskSnapshot {
        task_id: TaskId::from(task_id),
        deal_id: None,
        status,
        timed_out,
        final_deadline: u64::MAX,
    }
}

pub fn deal_snapshot(
    deal_id: &str,
    task_ids: &[&str],
    final_time: u64,
    deadline_reached: bool,
) -> DealSnapshot {
    DealSnapshot {
        deal_id: DealId::from(deal_id),
        task_ids: task_ids.iter().map(|id| TaskId::from(*id)).collect(),
        final_time,
        deadline_reached,
    }
}
