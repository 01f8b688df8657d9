//! Polling watchers over ledger records
//!
//! - [`TaskWatcher`] turns repeated task snapshots into a monotonic
//!   [`TaskEvent`] sequence ending in exactly one terminal event or error.
//! - [`DealWatcher`] runs one task watch per deal task and emits deal-level
//!   [`DealEvent`]s once every task has reported.
//!
//! Cancellation is cooperative: `unsubscribe` returns at once, a read already in
//! flight is allowed to finish but its result is discarded.

mod deal_watcher;
mod event;
mod task_watcher;

pub use deal_watcher::DealWatcher;
pub use event::*;
pub use task_watcher::TaskWatcher;
pub use task_watcher::WatchTaskOptions;
