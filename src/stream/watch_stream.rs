use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use futures::ready;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::Notification;
use super::Subscription;
use crate::Result;

/// [`Stream`] view over one subscription.
///
/// Yields `Ok` for each value, a single `Err` if the source fails, and ends on
/// completion. Dropping it unsubscribes.
pub struct WatchStream<T> {
    events: UnboundedReceiverStream<Notification<T>>,
    subscription: Subscription,
    done: bool,
}

impl<T> WatchStream<T> {
    pub(super) fn new(
        rx: mpsc::UnboundedReceiver<Notification<T>>,
        subscription: Subscription,
    ) -> Self {
        Self {
            events: UnboundedReceiverStream::new(rx),
            subscription,
            done: false,
        }
    }

    /// Cancel the underlying subscription. Already-buffered values stay readable.
    pub fn close(&self) {
        self.subscription.unsubscribe();
    }
}

impl<T> Unpin for WatchStream<T> {}

impl<T> Stream for WatchStream<T> {
    type Item = Result<T>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match ready!(Pin::new(&mut this.events).poll_next(cx)) {
            Some(Notification::Next(value)) => Poll::Ready(Some(Ok(value))),
            Some(Notification::Error(err)) => {
                this.done = true;
                Poll::Ready(Some(Err(err)))
            }
            Some(Notification::Complete) | None => {
                this.done = true;
                Poll::Ready(None)
            }
        }
    }
}
