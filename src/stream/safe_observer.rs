use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use parking_lot::ReentrantMutex;
use tracing::trace;

use super::Observer;
use crate::Error;

/// Cleanup registered for a subscription, run at most once
pub struct Teardown(Option<Box<dyn FnOnce() + Send>>);

impl Teardown {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Teardown(Some(Box::new(f)))
    }

    pub fn noop() -> Self {
        Teardown(None)
    }

    /// Run `self`, then `next`.
    pub(crate) fn chain(
        self,
        next: Teardown,
    ) -> Self {
        match (self.0, next.0) {
            (None, None) => Teardown(None),
            (Some(f), None) | (None, Some(f)) => Teardown(Some(f)),
            (Some(first), Some(second)) => Teardown::new(move || {
                first();
                second();
            }),
        }
    }

    pub(crate) fn run(self) {
        if let Some(f) = self.0 {
            f();
        }
    }
}

impl std::fmt::Debug for Teardown {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_tuple("Teardown").field(&self.0.is_some()).finish()
    }
}

/// Guard around a raw [`Observer`].
///
/// - After `error` or `complete` has been delivered, every further call is dropped.
/// - `unsubscribe` runs the registered teardown exactly once, however many times
///   and from however many threads it is called.
/// - Once `unsubscribe` returns, the destination observes nothing more: emissions
///   and the close flag are serialised by a reentrant gate, so a destination may
///   unsubscribe from inside its own callback.
pub struct SafeObserver<T> {
    destination: Box<dyn Observer<T>>,
    gate: ReentrantMutex<()>,
    /// No more deliveries
    stopped: AtomicBool,
    /// Teardown claimed
    unsubscribed: AtomicBool,
    on_unsubscribe: Mutex<Option<Teardown>>,
}

impl<T: Send + 'static> SafeObserver<T> {
    pub fn new(destination: impl Observer<T>) -> Self {
        Self {
            destination: Box::new(destination),
            gate: ReentrantMutex::new(()),
            stopped: AtomicBool::new(false),
            unsubscribed: AtomicBool::new(false),
            on_unsubscribe: Mutex::new(None),
        }
    }

    pub fn next(
        &self,
        value: T,
    ) {
        let _gate = self.gate.lock();
        if self.stopped.load(Ordering::SeqCst) {
            trace!("next dropped on closed observer");
            return;
        }
        self.destination.next(value);
    }

    pub fn error(
        &self,
        err: Error,
    ) {
        {
            let _gate = self.gate.lock();
            if self.stopped.swap(true, Ordering::SeqCst) {
                trace!(error = %err, "error dropped on closed observer");
                return;
            }
            self.destination.error(err);
        }
        self.unsubscribe();
    }

    pub fn complete(&self) {
        {
            let _gate = self.gate.lock();
            if self.stopped.swap(true, Ordering::SeqCst) {
                trace!("complete dropped on closed observer");
                return;
            }
            self.destination.complete();
        }
        self.unsubscribe();
    }

    pub fn unsubscribe(&self) {
        {
            // Waits for an in-flight emission on another thread to finish.
            let _gate = self.gate.lock();
            self.stopped.store(true, Ordering::SeqCst);
        }
        if self.unsubscribed.swap(true, Ordering::SeqCst) {
            return;
        }
        let hook = self.on_unsubscribe.lock().take();
        if let Some(hook) = hook {
            hook.run();
        }
    }

    /// Register cleanup to run on unsubscribe.
    ///
    /// Hooks accumulate in registration order. A hook registered after the
    /// observer was already unsubscribed runs immediately.
    pub fn set_on_unsubscribe(
        &self,
        hook: Teardown,
    ) {
        let mut slot = self.on_unsubscribe.lock();
        if self.unsubscribed.load(Ordering::SeqCst) {
            drop(slot);
            hook.run();
            return;
        }
        let merged = match slot.take() {
            Some(prev) => prev.chain(hook),
            None => hook,
        };
        *slot = Some(merged);
    }

    pub fn is_closed(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}
