#![forbid(unsafe_code)]

//! Observable value cell with change notification, version tracking, and a
//! stream bridge.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value of type `T` in shared, reference-counted
//! storage. When the value changes (determined by `PartialEq`), all live
//! listeners are notified synchronously in registration order, and the new
//! value is pushed to every open [`ValueStream`].
//!
//! Higher-level containers (`StateCell`, `RxList`, `RxMap`) embed an
//! `Observable` by value and mutate it through the crate-internal
//! `mutate_with` path, which lets them decide per call whether the mutation
//! notifies.
//!
//! # Performance
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `get()`       | O(1) + clone               |
//! | `set()`       | O(L + S) listeners/streams |
//! | `listen()`    | O(1) amortized             |
//!
//! # Failure Modes
//!
//! - **Use after dispose**: mutations are ignored and logged at `debug`.
//!   `listen()` hands back an inert [`Subscription`]; `stream()` hands back
//!   an ended stream. Use [`Observable::try_set`] to observe the condition.
//! - **Re-entrant set**: a listener may call `set()` on the observable it
//!   listens to. The nested change runs its own notification pass before the
//!   outer pass continues; equality gating is what terminates the recursion.
//!   A guard dropped inside the nested pass is honored by the outer pass too.
//! - **Closure reading its own cell**: the closures given to `with()` and
//!   `update()` run while the cell is borrowed. Calling back into the same
//!   observable from inside them panics with a `RefCell` borrow error. Read
//!   through the closure argument instead.
//! - **Listener leak**: guards stored indefinitely keep callbacks alive. Dead
//!   entries are pruned lazily during notification.

use std::cell::RefCell;
use std::rc::Rc;

use futures::{Stream, StreamExt};
use tracing::{debug, trace};

use crate::error::ReactiveError;
use crate::listenable::{Listenable, SourceId, source_id_of};
use crate::listeners::{ListenerRegistry, Subscription};
use crate::stream::{StreamBridge, ValueStream};
use crate::tracking;

struct CellState<T> {
    value: T,
    version: u64,
    disposed: bool,
    streams: StreamBridge<T>,
}

struct Shared<T> {
    state: RefCell<CellState<T>>,
    listeners: ListenerRegistry<T>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** inner state;
/// both handles see the same value and share listeners.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each delivered change.
/// 2. `set(v)` where `v == current` is a no-op.
/// 3. Listeners are notified in registration order.
/// 4. After `dispose()` returns, no listener runs and every stream has ended.
pub struct Observable<T> {
    shared: Rc<Shared<T>>,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("Observable")
            .field("value", &state.value)
            .field("version", &state.version)
            .field("disposed", &state.disposed)
            .field("listener_count", &self.shared.listeners.len())
            .finish()
    }
}

impl<T: Default + Clone + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Create a new observable with the given initial value.
    ///
    /// The initial version is 0 and no listeners are registered.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(CellState {
                    value,
                    version: 0,
                    disposed: false,
                    streams: StreamBridge::default(),
                }),
                listeners: ListenerRegistry::new(),
            }),
        }
    }

    /// Get a clone of the current value and record the read in the
    /// enclosing tracking scope.
    #[must_use]
    pub fn get(&self) -> T {
        self.track_read();
        self.peek()
    }

    /// Get a clone of the current value without recording a read.
    #[must_use]
    pub fn peek(&self) -> T {
        self.shared.state.borrow().value.clone()
    }

    /// Access the current value by reference without cloning. Tracked.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track_read();
        f(&self.shared.state.borrow().value)
    }

    /// Notify listeners even though the value may not have changed.
    pub fn refresh(&self) {
        self.mutate_with(|_| ((), true));
    }

    /// Store `value` and notify unconditionally.
    ///
    /// For values without `PartialEq`. Returns `false` if disposed.
    pub fn replace(&self, value: T) -> bool {
        self.mutate_with(|current| {
            *current = value;
            ((), true)
        })
        .is_some()
    }

    /// Register a listener receiving the value after each change.
    ///
    /// Returns a [`Subscription`] guard. Dropping the guard unsubscribes.
    pub fn listen(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        if self.is_disposed() {
            debug!("listen on disposed observable ignored");
            return Subscription::inert();
        }
        self.shared.listeners.add(callback)
    }

    /// Open a stream of every subsequent value.
    ///
    /// The bridge is allocated on first use; `dispose()` ends the stream.
    pub fn stream(&self) -> ValueStream<T> {
        let mut state = self.shared.state.borrow_mut();
        if state.disposed {
            return ValueStream::ended();
        }
        state.streams.open()
    }

    /// Current version number. Increments by 1 on each delivered change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.state.borrow().version
    }

    /// Number of registered listeners (including dead ones not yet pruned).
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Whether [`dispose`](Self::dispose) was called on any handle.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.state.borrow().disposed
    }

    /// Release every listener and end every stream. Idempotent.
    ///
    /// This is the `close()` of the cell: nothing is delivered afterwards.
    pub fn dispose(&self) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.streams.close();
        }
        self.shared.listeners.clear();
        debug!("observable disposed");
    }

    /// Mutate the value in place, notifying when `f` reports a change.
    ///
    /// Returns `None` (and leaves the value untouched) if disposed.
    pub(crate) fn mutate_with<R>(&self, f: impl FnOnce(&mut T) -> (R, bool)) -> Option<R> {
        let (out, changed) = {
            let mut state = self.shared.state.borrow_mut();
            if state.disposed {
                drop(state);
                debug!("mutation of disposed observable ignored");
                return None;
            }
            let (out, changed) = f(&mut state.value);
            if changed {
                state.version += 1;
            }
            (out, changed)
        };
        if changed {
            self.notify();
        }
        Some(out)
    }

    pub(crate) fn track_read(&self) {
        tracking::record(self.source_id(), || {
            Box::new(self.clone()) as Box<dyn Listenable>
        });
    }

    /// Push to streams and notify live listeners.
    fn notify(&self) {
        let value = {
            let mut state = self.shared.state.borrow_mut();
            let value = state.value.clone();
            state.streams.push(&value);
            trace!(version = state.version, "observable changed");
            value
        };
        // No borrow is held while listeners run.
        self.shared.listeners.notify(&value);
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Set a new value. If it differs from the current value (by
    /// `PartialEq`), the version is incremented and all live listeners are
    /// notified. Ignored after dispose.
    pub fn set(&self, value: T) {
        self.mutate_with(|current| {
            if *current == value {
                return ((), false);
            }
            *current = value;
            ((), true)
        });
    }

    /// Like [`set`](Self::set) but reports whether the value changed, or
    /// `Err(ReactiveError::Disposed)` when the cell is gone.
    pub fn try_set(&self, value: T) -> Result<bool, ReactiveError> {
        self.mutate_with(|current| {
            if *current == value {
                return (false, false);
            }
            *current = value;
            (true, true)
        })
        .ok_or(ReactiveError::Disposed)
    }

    /// Modify the value in place via a closure. If the value changes
    /// (compared by `PartialEq` against a snapshot), the version is
    /// incremented and listeners are notified.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.mutate_with(|current| {
            let old = current.clone();
            f(current);
            let changed = *current != old;
            ((), changed)
        });
    }

    /// Drive the cell from `stream` until it ends or the cell is disposed.
    pub async fn bind_stream<S>(&self, stream: S)
    where
        S: Stream<Item = T>,
    {
        let mut stream = std::pin::pin!(stream);
        while let Some(value) = stream.next().await {
            if self.is_disposed() {
                break;
            }
            self.set(value);
        }
    }
}

impl<T: Clone + 'static> Listenable for Observable<T> {
    fn listen_change(&self, callback: Rc<dyn Fn()>) -> Subscription {
        self.listen(move |_| callback())
    }

    fn source_id(&self) -> SourceId {
        source_id_of(&self.shared)
    }

    fn is_disposed(&self) -> bool {
        self.shared.state.borrow().disposed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;

    fn counting(obs: &Observable<i32>) -> (Rc<Cell<u32>>, Subscription) {
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        let sub = obs.listen(move |_| c.set(c.get() + 1));
        (count, sub)
    }

    #[test]
    fn get_set_basic() {
        let obs = Observable::new(42);
        assert_eq!(obs.get(), 42);
        assert_eq!(obs.version(), 0);

        obs.set(99);
        assert_eq!(obs.get(), 99);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn equal_set_is_silent() {
        let obs = Observable::new(42);
        let (count, _sub) = counting(&obs);
        obs.set(42);
        assert_eq!(obs.version(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn update_mutates_in_place() {
        let obs = Observable::new(vec![1, 2, 3]);
        obs.update(|v| v.push(4));
        assert_eq!(obs.get(), vec![1, 2, 3, 4]);
        assert_eq!(obs.version(), 1);

        obs.update(|v| v[0] = 1);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn refresh_notifies_unconditionally() {
        let obs = Observable::new(5);
        let (count, _sub) = counting(&obs);
        obs.refresh();
        obs.refresh();
        assert_eq!(count.get(), 2);
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn replace_notifies_even_when_equal() {
        let obs = Observable::new(5);
        let (count, _sub) = counting(&obs);
        assert!(obs.replace(5));
        assert_eq!(count.get(), 1);
        obs.dispose();
        assert!(!obs.replace(6));
        assert_eq!(obs.peek(), 5);
    }

    #[test]
    fn listener_receives_new_value() {
        let obs = Observable::new(0);
        let last_seen = Rc::new(Cell::new(0));
        let last = Rc::clone(&last_seen);
        let _sub = obs.listen(move |v| last.set(*v));

        obs.set(42);
        assert_eq!(last_seen.get(), 42);
    }

    #[test]
    fn subscription_drop_unsubscribes() {
        let obs = Observable::new(0);
        let (count, sub) = counting(&obs);
        obs.set(1);
        drop(sub);
        obs.set(2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn notification_order_is_registration_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let subs: Vec<_> = ['A', 'B', 'C']
            .into_iter()
            .map(|tag| {
                let log = Rc::clone(&log);
                obs.listen(move |_| log.borrow_mut().push(tag))
            })
            .collect();

        obs.set(1);
        assert_eq!(*log.borrow(), vec!['A', 'B', 'C']);
        drop(subs);
    }

    #[test]
    fn clone_shares_state_and_listeners() {
        let obs1 = Observable::new(0);
        let (count, _sub) = counting(&obs1);
        let obs2 = obs1.clone();

        obs2.set(42);
        assert_eq!(obs1.get(), 42);
        assert_eq!(obs1.version(), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(obs1.source_id(), obs2.source_id());
    }

    #[test]
    fn listener_count_prunes_lazily() {
        let obs = Observable::new(0);
        let _s1 = obs.listen(|_| {});
        let s2 = obs.listen(|_| {});
        assert_eq!(obs.listener_count(), 2);

        drop(s2);
        assert_eq!(obs.listener_count(), 2);
        obs.set(1);
        assert_eq!(obs.listener_count(), 1);
    }

    #[test]
    fn dispose_silences_everything_and_is_idempotent() {
        let obs = Observable::new(0);
        let (count, _sub) = counting(&obs);

        obs.dispose();
        obs.dispose();
        obs.set(1);
        obs.update(|v| *v = 2);
        obs.refresh();

        assert_eq!(count.get(), 0);
        assert_eq!(obs.peek(), 0);
        assert!(obs.is_disposed());
        assert_eq!(obs.try_set(3), Err(ReactiveError::Disposed));
    }

    #[test]
    fn listen_after_dispose_is_inert() {
        let obs = Observable::new(0);
        obs.dispose();
        let sub = obs.listen(|_| panic!("must not run"));
        assert!(!sub.is_attached());
        obs.set(1);
    }

    #[test]
    fn dispose_from_listener_stops_later_listeners() {
        let obs = Observable::new(0);
        let o = obs.clone();
        let _first = obs.listen(move |_| o.dispose());
        let (count, _second) = counting(&obs);

        obs.set(1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn try_set_reports_change() {
        let obs = Observable::new(1);
        assert_eq!(obs.try_set(1), Ok(false));
        assert_eq!(obs.try_set(2), Ok(true));
    }

    #[test]
    fn reentrant_set_recurses_until_stable() {
        let obs = Observable::new(0);
        let o = obs.clone();
        let _clamp = obs.listen(move |v| {
            if *v > 10 {
                o.set(10);
            }
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _log = obs.listen(move |v| s.borrow_mut().push(*v));

        obs.set(15);
        assert_eq!(obs.get(), 10);
        // Nested pass delivers 10 before the outer pass reaches the logger.
        assert_eq!(*seen.borrow(), vec![10, 15]);
    }

    #[test]
    fn guard_dropped_during_reentrant_set_stays_silent() {
        let obs = Observable::new(0);
        let o = obs.clone();
        let _bump = obs.listen(move |v| {
            if *v == 1 {
                o.set(2);
            }
        });
        let held: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let h = Rc::clone(&held);
        let _killer = obs.listen(move |v| {
            if *v == 2 {
                h.borrow_mut().take();
            }
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        *held.borrow_mut() = Some(obs.listen(move |v| s.borrow_mut().push(*v)));

        obs.set(1);
        assert_eq!(obs.get(), 2);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn stream_receives_changes_and_ends_on_dispose() {
        let obs = Observable::new(0);
        let stream = obs.stream();
        obs.set(1);
        obs.set(1);
        obs.set(2);
        obs.dispose();
        assert_eq!(block_on(stream.collect::<Vec<_>>()), vec![1, 2]);
    }

    #[test]
    fn stream_after_dispose_is_ended() {
        let obs = Observable::new(0);
        obs.dispose();
        assert!(block_on(obs.stream().collect::<Vec<_>>()).is_empty());
    }

    #[test]
    fn bind_stream_drives_value() {
        let obs = Observable::new(0);
        let (count, _sub) = counting(&obs);
        block_on(obs.bind_stream(futures::stream::iter(vec![1, 1, 2, 3])));
        assert_eq!(obs.get(), 3);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn debug_format() {
        let obs = Observable::new(42);
        let dbg = format!("{obs:?}");
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
        assert!(dbg.contains("version"));
    }

    #[test]
    fn many_set_calls_version_monotonic() {
        let obs = Observable::new(0);
        for i in 1..=100 {
            obs.set(i);
        }
        assert_eq!(obs.version(), 100);
    }
}
