#![forbid(unsafe_code)]

//! Reactive list.
//!
//! [`RxList<T>`] embeds an [`Observable<Vec<T>>`] core and mutates it in place.
//!
//! # Invariants
//!
//! 1. Every mutating call notifies exactly once, after the mutation, whether
//!    or not the content actually changed (no diffing). N calls produce N
//!    notifications.
//! 2. Reads never notify. Reads are tracked like `Observable::get`.
//! 3. A call that cannot apply its mutation (out-of-range index, false
//!    condition, disposed list) does not notify.
//!
//! # Failure Modes
//!
//! Predicates, comparators and the iterator passed to `add_all` run while the
//! list is borrowed. Reading the same list from inside them (for example
//! `list.remove_where(|x| list.contains(x))`) panics with a `RefCell` borrow
//! error. Collect what you need with `to_vec()` first.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::condition::Condition;
use crate::error::ReactiveError;
use crate::listenable::{Listenable, SourceId};
use crate::listeners::Subscription;
use crate::observable::Observable;
use crate::stream::ValueStream;

/// A vector whose every mutation notifies listeners.
///
/// Clones share state.
pub struct RxList<T> {
    core: Observable<Vec<T>>,
}

impl<T> Clone for RxList<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for RxList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RxList").field("core", &self.core).finish()
    }
}

impl<T: Clone + 'static> Default for RxList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> From<Vec<T>> for RxList<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            core: Observable::new(items),
        }
    }
}

impl<T: Clone + 'static> FromIterator<T> for RxList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T: Clone + 'static> RxList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    /// Apply `f` and notify unconditionally.
    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> Option<R> {
        self.core.mutate_with(|items| (f(items), true))
    }

    // -- mutations ---------------------------------------------------------

    /// Append one element.
    pub fn add(&self, item: T) {
        self.mutate(|items| items.push(item));
    }

    /// Same as [`add`](Self::add).
    pub fn push(&self, item: T) {
        self.add(item);
    }

    /// Append every element of `items` (one notification).
    pub fn add_all(&self, items: impl IntoIterator<Item = T>) {
        self.mutate(|v| v.extend(items));
    }

    /// Append `item` only if `condition` holds.
    pub fn add_if(&self, condition: impl Condition, item: T) {
        if condition.evaluate() {
            self.add(item);
        }
    }

    /// Append `items` only if `condition` holds.
    pub fn add_all_if(&self, condition: impl Condition, items: impl IntoIterator<Item = T>) {
        if condition.evaluate() {
            self.add_all(items);
        }
    }

    /// Insert at `index`, shifting later elements.
    pub fn insert(&self, index: usize, item: T) -> Result<(), ReactiveError> {
        self.insert_all(index, std::iter::once(item))
    }

    /// Insert every element of `items` starting at `index`.
    pub fn insert_all(
        &self,
        index: usize,
        items: impl IntoIterator<Item = T>,
    ) -> Result<(), ReactiveError> {
        let len = untracked_len(&self.core);
        if index > len {
            return Err(ReactiveError::IndexOutOfRange { index, len });
        }
        self.mutate(|v| {
            v.splice(index..index, items);
        })
        .ok_or(ReactiveError::Disposed)
    }

    /// Remove and return the element at `index`.
    pub fn remove_at(&self, index: usize) -> Result<T, ReactiveError> {
        let len = untracked_len(&self.core);
        if index >= len {
            return Err(ReactiveError::IndexOutOfRange { index, len });
        }
        self.mutate(|v| v.remove(index)).ok_or(ReactiveError::Disposed)
    }

    /// Remove every element matching `pred`. Notifies even if none matched.
    pub fn remove_where(&self, mut pred: impl FnMut(&T) -> bool) {
        self.mutate(|v| v.retain(|item| !pred(item)));
    }

    /// Keep only elements matching `pred`. Notifies even if all matched.
    pub fn retain_where(&self, pred: impl FnMut(&T) -> bool) {
        self.mutate(|v| v.retain(pred));
    }

    /// Element assignment: replace the element at `index`, returning the
    /// previous one.
    pub fn set(&self, index: usize, item: T) -> Result<T, ReactiveError> {
        let len = untracked_len(&self.core);
        if index >= len {
            return Err(ReactiveError::IndexOutOfRange { index, len });
        }
        self.mutate(|v| std::mem::replace(&mut v[index], item))
            .ok_or(ReactiveError::Disposed)
    }

    /// Length assignment: truncate, or pad with clones of `fill`.
    pub fn resize(&self, new_len: usize, fill: T) {
        self.mutate(|v| v.resize(new_len, fill));
    }

    /// Truncate to `new_len`. Notifies even when already shorter.
    pub fn truncate(&self, new_len: usize) {
        self.mutate(|v| v.truncate(new_len));
    }

    /// Sort with a comparator. Notifies even if already sorted.
    pub fn sort_by(&self, compare: impl FnMut(&T, &T) -> Ordering) {
        self.mutate(|v| v.sort_by(compare));
    }

    /// Sort by a key. Notifies even if already sorted.
    pub fn sort_by_key<K: Ord>(&self, key: impl FnMut(&T) -> K) {
        self.mutate(|v| v.sort_by_key(key));
    }

    /// Remove every element.
    pub fn clear(&self) {
        self.mutate(Vec::clear);
    }

    /// Replace the content with a single element.
    pub fn assign(&self, item: T) {
        self.mutate(|v| {
            v.clear();
            v.push(item);
        });
    }

    /// Replace the content with `items`.
    pub fn assign_all(&self, items: impl IntoIterator<Item = T>) {
        self.mutate(|v| {
            v.clear();
            v.extend(items);
        });
    }

    /// Notify without mutating.
    pub fn refresh(&self) {
        self.core.refresh();
    }

    // -- reads -------------------------------------------------------------

    #[must_use]
    pub fn len(&self) -> usize {
        self.core.with(Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core.with(Vec::is_empty)
    }

    /// Indexed read.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.core.with(|v| v.get(index).cloned())
    }

    #[must_use]
    pub fn first(&self) -> Option<T> {
        self.core.with(|v| v.first().cloned())
    }

    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.core.with(|v| v.last().cloned())
    }

    /// Elements matching `pred`, in order.
    #[must_use]
    pub fn filter(&self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        self.core
            .with(|v| v.iter().filter(|item| pred(*item)).cloned().collect())
    }

    /// Elements projected through `f`, skipping `None`. This is the typed
    /// counterpart of filtering by runtime type.
    #[must_use]
    pub fn filter_map<U>(&self, f: impl FnMut(&T) -> Option<U>) -> Vec<U> {
        self.core.with(|v| v.iter().filter_map(f).collect())
    }

    /// Elements in reverse order.
    #[must_use]
    pub fn reversed(&self) -> Vec<T> {
        self.core.with(|v| v.iter().rev().cloned().collect())
    }

    /// Snapshot of the content.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.core.get()
    }

    /// Borrow the content as a slice.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.core.with(|v| f(v))
    }

    // -- lifecycle ---------------------------------------------------------

    /// Listen to every mutation; the callback receives the new content.
    pub fn listen(&self, callback: impl Fn(&[T]) + 'static) -> Subscription {
        self.core.listen(move |v| callback(v))
    }

    /// Stream of content snapshots after each mutation.
    pub fn stream(&self) -> ValueStream<Vec<T>> {
        self.core.stream()
    }

    /// Number of delivered notifications so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.core.version()
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }
}

impl<T: Clone + PartialEq + 'static> RxList<T> {
    /// Remove the first element equal to `item`. Notifies whether or not one
    /// was found; returns whether one was.
    pub fn remove(&self, item: &T) -> bool {
        self.mutate(|v| match v.iter().position(|x| x == item) {
            Some(pos) => {
                v.remove(pos);
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.core.with(|v| v.contains(item))
    }
}

impl<T: Clone + Ord + 'static> RxList<T> {
    /// Sort ascending. Notifies even if already sorted.
    pub fn sort(&self) {
        self.mutate(|v| v.sort());
    }
}

impl<T: Clone + 'static> Listenable for RxList<T> {
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

/// Current length without recording a read, for range checks.
fn untracked_len<T: Clone + 'static>(core: &Observable<Vec<T>>) -> usize {
    crate::tracking::untracked(|| core.with(Vec::len))
}
