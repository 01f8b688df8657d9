use tokio::sync::mpsc;

use crate::Error;

/// Receiver side of an [`EventStream`](super::EventStream).
///
/// Callbacks may run on any runtime worker thread.
pub trait Observer<T>: Send + Sync + 'static {
    fn next(
        &self,
        value: T,
    );

    fn error(
        &self,
        err: Error,
    );

    fn complete(&self);
}

/// One delivered signal, as seen by channel and closure observers
#[derive(Debug)]
pub enum Notification<T> {
    Next(T),
    Error(Error),
    Complete,
}

impl<T> Notification<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notification::Next(_))
    }
}

impl<T: Send + 'static> Observer<T> for mpsc::UnboundedSender<Notification<T>> {
    fn next(
        &self,
        value: T,
    ) {
        // Receiver gone means nobody is listening any more.
        let _ = self.send(Notification::Next(value));
    }

    fn error(
        &self,
        err: Error,
    ) {
        let _ = self.send(Notification::Error(err));
    }

    fn complete(&self) {
        let _ = self.send(Notification::Complete);
    }
}

/// Observer backed by a single closure over [`Notification`]
pub struct FnObserver<F> {
    f: F,
}

pub fn observer_fn<T, F>(f: F) -> FnObserver<F>
where
    F: Fn(Notification<T>) + Send + Sync + 'static,
{
    FnObserver { f }
}

impl<T, F> Observer<T> for FnObserver<F>
where
    F: Fn(Notification<T>) + Send + Sync + 'static,
{
    fn next(
        &self,
        value: T,
    ) {
        (self.f)(Notification::Next(value))
    }

    fn error(
        &self,
        err: Error,
    ) {
        (self.f)(Notification::Error(err))
    }

    fn complete(&self) {
        (self.f)(Notification::Complete)
    }
}
