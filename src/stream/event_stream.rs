use std::sync::Arc;

use tokio::sync::mpsc;

use super::Observer;
use super::SafeObserver;
use super::Teardown;
use super::WatchStream;
use crate::Error;

type Producer<T> = dyn Fn(Subscriber<T>) -> Teardown + Send + Sync;

/// Cold, cancellable push stream.
///
/// Holds a single producer. Every [`subscribe`](EventStream::subscribe) call runs
/// the producer once against a fresh [`Subscriber`]; nothing is shared between
/// subscriptions and nothing runs before the first subscribe.
pub struct EventStream<T> {
    producer: Arc<Producer<T>>,
}

impl<T> Clone for EventStream<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<T: Send + 'static> EventStream<T> {
    pub fn new<F>(producer: F) -> Self
    where
        F: Fn(Subscriber<T>) -> Teardown + Send + Sync + 'static,
    {
        Self {
            producer: Arc::new(producer),
        }
    }

    pub fn subscribe(
        &self,
        observer: impl Observer<T>,
    ) -> Subscription {
        let safe = Arc::new(SafeObserver::new(observer));
        let teardown = (self.producer)(Subscriber {
            inner: Arc::clone(&safe),
        });
        safe.set_on_unsubscribe(teardown);
        Subscription { inner: safe }
    }

    /// Subscribe through an unbounded channel and expose the result as a
    /// [`futures::Stream`].
    pub fn into_stream(self) -> WatchStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(tx);
        WatchStream::new(rx, subscription)
    }
}

/// Capability set handed to a producer: `next`, `error`, `complete`.
///
/// Clones share the same guarded observer.
pub struct Subscriber<T> {
    inner: Arc<SafeObserver<T>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Subscriber<T> {
    pub fn next(
        &self,
        value: T,
    ) {
        self.inner.next(value)
    }

    pub fn error(
        &self,
        err: Error,
    ) {
        self.inner.error(err)
    }

    pub fn complete(&self) {
        self.inner.complete()
    }

    /// Terminal delivered or subscription cancelled
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn on_unsubscribe<F>(
        &self,
        f: F,
    ) where
        F: FnOnce() + Send + 'static,
    {
        self.inner.set_on_unsubscribe(Teardown::new(f))
    }
}

trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self);

    fn is_closed(&self) -> bool;
}

impl<T: Send + 'static> Unsubscribe for SafeObserver<T> {
    fn unsubscribe(&self) {
        SafeObserver::unsubscribe(self)
    }

    fn is_closed(&self) -> bool {
        SafeObserver::is_closed(self)
    }
}

/// Handle returned by [`EventStream::subscribe`].
///
/// Dropping the handle unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    inner: Arc<dyn Unsubscribe>,
}

impl Subscription {
    /// Idempotent. No emission is observed once this returns.
    pub fn unsubscribe(&self) {
        self.inner.unsubscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.inner.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}
