//! Observe tasks and deals living on a polled, append-only ledger, and claim
//! the ones that missed their deadline.
//!
//! - [`TaskWatcher`] / [`DealWatcher`]: polling watchers exposed as cold,
//!   cancellable [`stream::EventStream`]s.
//! - [`ClaimBatcher`]: drains a deal's claim workload in batches that fit the
//!   ledger's per-transaction resource ceiling.
//! - [`DealObserver`]: one handle over both, built with [`ObserverBuilder`].
//!
//! Ledger access is consumed through the [`LedgerReader`] and [`LedgerWriter`]
//! traits.

mod claim;
mod config;
mod errors;
mod ledger;
mod observer;
pub mod stream;
pub mod utils;
mod watch;

pub use claim::*;
pub use self::config::*;
pub use errors::*;
pub use ledger::*;
pub use observer::*;
pub use watch::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
