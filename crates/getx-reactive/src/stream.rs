#![forbid(unsafe_code)]

//! Push bridge from a reactive container to `futures::Stream` consumers.
//!
//! The bridge allocates nothing until the first [`StreamBridge::open`]. Every
//! later change is pushed to each open stream; closed receivers are pruned
//! on the next push. [`StreamBridge::close`] ends every stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use futures::{Stream, StreamExt};

/// Lazily allocated set of stream senders.
pub(crate) struct StreamBridge<T> {
    senders: Option<Vec<UnboundedSender<T>>>,
}

impl<T> Default for StreamBridge<T> {
    fn default() -> Self {
        Self { senders: None }
    }
}

impl<T: Clone> StreamBridge<T> {
    /// Open a new stream receiving every subsequent push.
    pub(crate) fn open(&mut self) -> ValueStream<T> {
        let (tx, rx) = unbounded();
        self.senders.get_or_insert_with(Vec::new).push(tx);
        ValueStream { rx: Some(rx) }
    }

    /// Send `value` to every open stream.
    pub(crate) fn push(&mut self, value: &T) {
        if let Some(senders) = self.senders.as_mut() {
            senders.retain(|tx| tx.unbounded_send(value.clone()).is_ok());
        }
    }

    /// End every stream and release the senders.
    pub(crate) fn close(&mut self) {
        self.senders = None;
    }

    /// Whether the bridge was ever allocated and is still open.
    pub(crate) fn is_allocated(&self) -> bool {
        self.senders.is_some()
    }

    /// Number of open streams.
    pub(crate) fn open_count(&self) -> usize {
        self.senders.as_ref().map_or(0, Vec::len)
    }
}

/// Stream of values pushed by an observable after it was opened.
///
/// Ends when the source is disposed.
#[must_use = "streams do nothing unless polled"]
pub struct ValueStream<T> {
    rx: Option<UnboundedReceiver<T>>,
}

impl<T> ValueStream<T> {
    /// A stream that is already finished.
    pub(crate) fn ended() -> Self {
        Self { rx: None }
    }
}

impl<T> std::fmt::Debug for ValueStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueStream")
            .field("ended", &self.rx.is_none())
            .finish()
    }
}

impl<T> Unpin for ValueStream<T> {}

impl<T> Stream for ValueStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        match this.rx.as_mut() {
            Some(rx) => {
                let polled = rx.poll_next_unpin(cx);
                if let Poll::Ready(None) = polled {
                    this.rx = None;
                }
                polled
            }
            None => Poll::Ready(None),
        }
    }
}
