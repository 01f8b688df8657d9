//! Minimal push-stream primitive every watcher is built on
//!
//! An [`EventStream`] is cold: it stores a producer and runs it once per
//! subscription. The producer receives a [`Subscriber`] (the `next` / `error` /
//! `complete` capability set) and returns a [`Teardown`] that runs when the
//! subscription ends, whether by terminal signal or by
//! [`Subscription::unsubscribe`].
//!
//! Every subscriber is wrapped in a [`SafeObserver`], which guarantees at most
//! one terminal signal and idempotent cancellation.
//!
//! ```ignore
//! let numbers = EventStream::new(|subscriber: Subscriber<u32>| {
//!     subscriber.next(1);
//!     subscriber.next(2);
//!     subscriber.complete();
//!     Teardown::noop()
//! });
//! let values: Vec<u32> = numbers.into_stream().try_collect().await?;
//! ```

mod event_stream;
mod observer;
mod safe_observer;
mod watch_stream;

pub use event_stream::*;
pub use observer::*;
pub use safe_observer::*;
pub use watch_stream::*;
