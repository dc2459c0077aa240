#![forbid(unsafe_code)]

//! Status-carrying state cell with an async producer state machine.
//!
//! [`StateCell<T>`] pairs a [`Status<T>`] with the last successful value and
//! notifies listeners through an embedded [`Observable`] core.
//!
//! # State machine
//!
//! ```text
//!   run_async()          producer Ok(v), empty   producer Ok(v)     producer Err(e)
//! ──────────────▶ Loading ───────────────▶ Empty  ──────────▶ Success(v) ─────────▶ Error(e)
//! ```
//!
//! All three outcomes are terminal until the next `run_async` or `change`.
//!
//! # Overlapping producers
//!
//! Starting a second producer does not cancel the first, and completions are
//! not fenced by call order: whichever producer resolves last decides the
//! final status. A slow stale producer can therefore overwrite a fresher
//! result. Callers that need "latest call wins" must sequence calls
//! themselves.

use std::error::Error;
use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use tracing::{debug, trace};

use crate::listenable::{Listenable, SourceId};
use crate::listeners::Subscription;
use crate::observable::Observable;
use crate::status::{IsEmpty, Status, StatusError};

/// Options for [`StateCell::run_async_with`].
#[derive(Debug, Clone)]
pub struct AsyncOptions {
    /// Resolve empty results to [`Status::Empty`] instead of `Success`.
    pub detect_empty: bool,
    /// Replace the failure message while keeping the original cause.
    pub error_message: Option<String>,
}

impl Default for AsyncOptions {
    fn default() -> Self {
        Self {
            detect_empty: true,
            error_message: None,
        }
    }
}

impl AsyncOptions {
    /// Set whether empty results become [`Status::Empty`].
    #[must_use]
    pub fn with_detect_empty(mut self, enabled: bool) -> Self {
        self.detect_empty = enabled;
        self
    }

    /// Set the message used for failures.
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct StateData<T> {
    value: Option<T>,
    status: Status<T>,
}

/// Value plus [`Status`], observable as one unit.
///
/// Clones share state.
pub struct StateCell<T> {
    core: Observable<StateData<T>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCell").field("core", &self.core).finish()
    }
}

impl<T: Clone + PartialEq + 'static> Default for StateCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq + 'static> StateCell<T> {
    /// A cell in [`Status::Loading`] with no value.
    #[must_use]
    pub fn new() -> Self {
        Self::with_status(Status::Loading)
    }

    /// A cell starting at `status`; a `Success` payload becomes the value.
    #[must_use]
    pub fn with_status(status: Status<T>) -> Self {
        let value = status.data().cloned();
        Self {
            core: Observable::new(StateData { value, status }),
        }
    }

    /// Current status. Tracked.
    #[must_use]
    pub fn status(&self) -> Status<T> {
        self.core.with(|d| d.status.clone())
    }

    /// Last successful value, possibly stale. Tracked.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.core.with(|d| d.value.clone())
    }

    /// Replace the status.
    ///
    /// A no-op when `status` equals the current one. A `Success` payload is
    /// also stored as the value. Listeners are notified once.
    pub fn change(&self, status: Status<T>) {
        self.core.mutate_with(|data| {
            if data.status == status {
                return ((), false);
            }
            trace!(from = data.status.kind(), to = status.kind(), "status change");
            if let Status::Success(v) = &status {
                data.value = Some(v.clone());
            }
            data.status = status;
            ((), true)
        });
    }

    pub fn set_loading(&self) {
        self.change(Status::Loading);
    }

    pub fn set_success(&self, value: T) {
        self.change(Status::Success(value));
    }

    pub fn set_error(&self, error: StatusError) {
        self.change(Status::Error(error));
    }

    pub fn set_empty(&self) {
        self.change(Status::Empty);
    }

    pub fn set_custom(&self, label: impl Into<String>) {
        self.change(Status::Custom(label.into()));
    }

    /// Replace the value without touching the status. Equality gated.
    pub fn set_value(&self, value: T) {
        self.core.mutate_with(|data| {
            if data.value.as_ref() == Some(&value) {
                return ((), false);
            }
            data.value = Some(value);
            ((), true)
        });
    }

    /// Listen to status changes.
    pub fn listen(&self, callback: impl Fn(&Status<T>) + 'static) -> Subscription {
        self.core.listen(move |data| callback(&data.status))
    }

    /// Number of delivered changes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.core.version()
    }

    /// Release listeners. Later changes (including late async completions)
    /// are ignored.
    pub fn dispose(&self) {
        self.core.dispose();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }
}

impl<T: Clone + PartialEq + IsEmpty + 'static> StateCell<T> {
    /// [`run_async_with`](Self::run_async_with) using default options
    /// (empty detection on).
    pub fn run_async<F, Fut, E>(&self, producer: F) -> LocalBoxFuture<'static, ()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Error + 'static,
    {
        self.run_async_with(producer, AsyncOptions::default())
    }

    /// Switch to `Loading` now, then resolve the status from `producer`.
    ///
    /// The status becomes `Loading` before this returns; the producer's
    /// outcome is applied when the returned future completes. See the
    /// module docs for what happens when calls overlap.
    pub fn run_async_with<F, Fut, E>(
        &self,
        producer: F,
        options: AsyncOptions,
    ) -> LocalBoxFuture<'static, ()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Error + 'static,
    {
        self.set_loading();
        let pending = producer();
        let cell = self.clone();
        Box::pin(async move {
            let status = match pending.await {
                Ok(value) if options.detect_empty && value.is_empty_value() => Status::Empty,
                Ok(value) => Status::Success(value),
                Err(err) => {
                    debug!(error = %err, "async producer failed");
                    let wrapped = match options.error_message {
                        Some(message) => StatusError::with_message(message, err),
                        None => StatusError::new(err),
                    };
                    Status::Error(wrapped)
                }
            };
            cell.change(status);
        })
    }
}

impl<T: Clone + 'static> Listenable for StateCell<T> {
    fn listen_change(&self, callback: Rc<dyn Fn()>) -> Subscription {
        self.core.listen_change(callback)
    }

    fn source_id(&self) -> SourceId {
        self.core.source_id()
    }

    fn is_disposed(&self) -> bool {
        Listenable::is_disposed(&self.core)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::{LocalPool, block_on};
    use futures::task::LocalSpawnExt;
    use std::cell::{Cell, RefCell};
    use std::fmt;

    #[derive(Debug)]
    struct Failed(&'static str);

    impl fmt::Display for Failed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "failed: {}", self.0)
        }
    }

    impl Error for Failed {}

    fn count_changes<T: Clone + PartialEq + 'static>(
        cell: &StateCell<T>,
    ) -> (Rc<Cell<u32>>, Subscription) {
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        let sub = cell.listen(move |_| c.set(c.get() + 1));
        (count, sub)
    }

    #[test]
    fn starts_loading_without_value() {
        let cell = StateCell::<i32>::new();
        assert!(cell.status().is_loading());
        assert_eq!(cell.value(), None);
    }

    #[test]
    fn equal_status_is_a_no_op() {
        let cell = StateCell::<i32>::new();
        let (count, _sub) = count_changes(&cell);
        cell.set_loading();
        assert_eq!(count.get(), 0);

        cell.set_success(1);
        cell.set_success(1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn success_stores_value_and_survives_loading() {
        let cell = StateCell::new();
        cell.set_success("a".to_string());
        cell.set_loading();
        assert!(cell.status().is_loading());
        assert_eq!(cell.value().as_deref(), Some("a"));
    }

    #[test]
    fn with_status_seeds_value() {
        let cell = StateCell::with_status(Status::Success(7));
        assert_eq!(cell.value(), Some(7));
    }

    #[test]
    fn set_value_keeps_status() {
        let cell = StateCell::<i32>::new();
        let (count, _sub) = count_changes(&cell);
        cell.set_value(3);
        cell.set_value(3);
        assert_eq!(count.get(), 1);
        assert!(cell.status().is_loading());
        assert_eq!(cell.value(), Some(3));
    }

    #[test]
    fn listener_sees_status() {
        let cell = StateCell::<i32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = cell.listen(move |status| s.borrow_mut().push(status.kind()));
        cell.set_empty();
        cell.set_custom("paused");
        cell.set_error(StatusError::msg("x"));
        assert_eq!(*seen.borrow(), vec!["empty", "custom", "error"]);
    }

    #[test]
    fn run_async_success() {
        let cell = StateCell::new();
        let fut = cell.run_async(|| async { Ok::<_, Failed>(vec![1, 2]) });
        assert!(cell.status().is_loading());
        block_on(fut);
        assert_eq!(cell.status(), Status::Success(vec![1, 2]));
        assert_eq!(cell.value(), Some(vec![1, 2]));
    }

    #[test]
    fn run_async_empty_detection() {
        let cell = StateCell::<Vec<i32>>::new();
        block_on(cell.run_async(|| async { Ok::<_, Failed>(Vec::new()) }));
        assert!(cell.status().is_empty());

        let cell = StateCell::<Vec<i32>>::new();
        let options = AsyncOptions::default().with_detect_empty(false);
        block_on(cell.run_async_with(|| async { Ok::<_, Failed>(Vec::new()) }, options));
        assert_eq!(cell.status(), Status::Success(Vec::new()));
    }

    #[test]
    fn run_async_failure_wraps_cause() {
        let cell = StateCell::<String>::new();
        block_on(cell.run_async(|| async { Err(Failed("net")) }));
        let status = cell.status();
        let err = status.error().expect("error status");
        assert_eq!(err.message(), "failed: net");
        assert!(err.downcast_ref::<Failed>().is_some());

        let options = AsyncOptions::default().with_error_message("could not load");
        block_on(cell.run_async_with(|| async { Err(Failed("disk")) }, options));
        assert_eq!(
            cell.status().error().map(|e| e.to_string()).as_deref(),
            Some("could not load")
        );
    }

    #[test]
    fn run_async_from_success_goes_through_loading() {
        let cell = StateCell::with_status(Status::Success("old".to_string()));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = cell.listen(move |status| s.borrow_mut().push(status.kind()));

        block_on(cell.run_async(|| async { Ok::<_, Failed>("new".to_string()) }));
        assert_eq!(*seen.borrow(), vec!["loading", "success"]);
    }

    #[test]
    fn overlapping_calls_last_resolution_wins() {
        let cell = StateCell::<String>::new();
        let (tx_first, rx_first) = oneshot::channel::<String>();
        let (tx_second, rx_second) = oneshot::channel::<String>();

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        spawner
            .spawn_local(cell.run_async(move || async move { rx_first.await }))
            .expect("spawn first");
        spawner
            .spawn_local(cell.run_async(move || async move { rx_second.await }))
            .expect("spawn second");
        pool.run_until_stalled();
        assert!(cell.status().is_loading());

        // Second call resolves first...
        tx_second.send("second".into()).expect("send second");
        pool.run_until_stalled();
        assert_eq!(cell.status(), Status::Success("second".to_string()));

        // ...and the stale first call overwrites it.
        tx_first.send("first".into()).expect("send first");
        pool.run_until_stalled();
        assert_eq!(cell.status(), Status::Success("first".to_string()));
    }

    #[test]
    fn completion_after_dispose_is_dropped() {
        let cell = StateCell::<String>::new();
        let (tx, rx) = oneshot::channel::<String>();
        let fut = cell.run_async(move || async move { rx.await });
        cell.dispose();
        tx.send("late".into()).expect("send");
        block_on(fut);
        assert!(cell.status().is_loading());
        assert!(cell.is_disposed());
    }
}
