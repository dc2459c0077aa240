#![forbid(unsafe_code)]

//! Ordered registry of change callbacks.
//!
//! # Design
//!
//! Callbacks are stored as `Weak` function pointers next to a shared
//! `active` flag. The strong `Rc` and the flag live in the [`Subscription`]
//! guard handed back to the caller. Dropping the guard clears the flag and
//! releases the callback. Every pass checks the flag right before each call,
//! so a pass that already took a snapshot (including an outer pass suspended
//! by a nested one) skips the entry. Dead entries are pruned lazily during
//! [`ListenerRegistry::notify`].
//!
//! # Invariants
//!
//! 1. Callbacks run in registration order.
//! 2. A callback whose guard was dropped never runs again, even if the drop
//!    happens in the middle of a notification pass.
//! 3. After [`ListenerRegistry::clear`] returns, no callback registered before
//!    the clear runs again, including the rest of an in-flight pass.
//! 4. No borrow is held while a callback runs, so callbacks may register new
//!    listeners or trigger nested notifications.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type CallbackRc<A> = Rc<dyn Fn(&A)>;

struct Entry<A: ?Sized> {
    callback: Weak<dyn Fn(&A)>,
    active: Rc<Cell<bool>>,
}

impl<A: ?Sized> Entry<A> {
    fn is_live(&self) -> bool {
        self.active.get() && self.callback.strong_count() > 0
    }
}

/// Registration-ordered list of weakly held callbacks receiving `&A`.
pub struct ListenerRegistry<A: ?Sized> {
    entries: RefCell<Vec<Entry<A>>>,
    /// Bumped by `clear()` so an in-flight pass can tell it was cut off.
    epoch: Cell<u64>,
}

impl<A: ?Sized> Default for ListenerRegistry<A> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            epoch: Cell::new(0),
        }
    }
}

impl<A: ?Sized> std::fmt::Debug for ListenerRegistry<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("entries", &self.entries.borrow().len())
            .field("epoch", &self.epoch.get())
            .finish()
    }
}

impl<A: ?Sized + 'static> ListenerRegistry<A> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It stays active while the returned guard lives.
    pub fn add(&self, callback: impl Fn(&A) + 'static) -> Subscription {
        let strong: CallbackRc<A> = Rc::new(callback);
        let active = Rc::new(Cell::new(true));
        self.entries.borrow_mut().push(Entry {
            callback: Rc::downgrade(&strong),
            active: Rc::clone(&active),
        });
        Subscription {
            guard: Some(Box::new(strong)),
            active: Some(active),
        }
    }

    /// Invoke every live callback with `arg`, pruning dead entries first.
    ///
    /// Returns the number of callbacks that actually ran.
    pub fn notify(&self, arg: &A) -> usize {
        let epoch = self.epoch.get();
        let callbacks: Vec<(CallbackRc<A>, Rc<Cell<bool>>)> = {
            let mut entries = self.entries.borrow_mut();
            entries.retain(Entry::is_live);
            entries
                .iter()
                .filter_map(|e| Some((e.callback.upgrade()?, Rc::clone(&e.active))))
                .collect()
        };

        let mut delivered = 0;
        for (cb, active) in &callbacks {
            if self.epoch.get() != epoch {
                break;
            }
            if !active.get() {
                continue;
            }
            cb(arg);
            delivered += 1;
        }
        delivered
    }

    /// Drop every entry. Callbacks registered so far never run again.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
        self.epoch.set(self.epoch.get().wrapping_add(1));
    }

    /// Number of entries, including dead ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the registry holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of entries whose guard is still alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.is_live())
            .count()
    }
}

/// RAII guard for a registered callback.
///
/// Dropping the `Subscription` clears the entry's `active` flag and drops the
/// strong `Rc` to the callback. No pass runs the callback after that.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    /// Type-erased strong reference keeping the callback alive. `None` for
    /// inert subscriptions handed out by disposed sources.
    guard: Option<Box<dyn Any>>,
    active: Option<Rc<Cell<bool>>>,
}

impl Subscription {
    /// A subscription that is not attached to anything.
    pub fn inert() -> Self {
        Self {
            guard: None,
            active: None,
        }
    }

    /// Whether this guard keeps a callback registered.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.guard.is_some()
    }

    /// Unsubscribe explicitly. Equivalent to dropping the guard.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.set(false);
        }
        self.guard = None;
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&i32) + 'static) {
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        (count, move |_: &i32| c.set(c.get() + 1))
    }

    #[test]
    fn notify_runs_in_registration_order() {
        let registry = ListenerRegistry::<i32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = Rc::clone(&log);
        let l2 = Rc::clone(&log);
        let _a = registry.add(move |v| l1.borrow_mut().push(('a', *v)));
        let _b = registry.add(move |v| l2.borrow_mut().push(('b', *v)));

        assert_eq!(registry.notify(&7), 2);
        assert_eq!(*log.borrow(), vec![('a', 7), ('b', 7)]);
    }

    #[test]
    fn dropped_guard_is_pruned_on_next_notify() {
        let registry = ListenerRegistry::<i32>::new();
        let (count, cb) = counter();
        let sub = registry.add(cb);
        assert_eq!(registry.live_count(), 1);

        drop(sub);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.live_count(), 0);

        assert_eq!(registry.notify(&1), 0);
        assert_eq!(registry.len(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn cancel_is_drop() {
        let registry = ListenerRegistry::<i32>::new();
        let (count, cb) = counter();
        registry.add(cb).cancel();
        registry.notify(&1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn guard_dropped_mid_pass_is_skipped() {
        let registry = Rc::new(ListenerRegistry::<i32>::new());
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let (count, cb) = counter();

        let v = Rc::clone(&victim);
        let _killer = registry.add(move |_| {
            v.borrow_mut().take();
        });
        *victim.borrow_mut() = Some(registry.add(cb));

        assert_eq!(registry.notify(&1), 1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn guard_dropped_in_nested_pass_is_skipped_by_outer_pass() {
        // first re-notifies with 2 on seeing 1; killer drops the last guard
        // on seeing 2; the outer pass must not reach the dropped entry.
        let registry = Rc::new(ListenerRegistry::<i32>::new());
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let r = Rc::downgrade(&registry);
        let _first = registry.add(move |v| {
            if *v == 1 {
                if let Some(r) = r.upgrade() {
                    r.notify(&2);
                }
            }
        });
        let v = Rc::clone(&victim);
        let _killer = registry.add(move |x| {
            if *x == 2 {
                v.borrow_mut().take();
            }
        });
        let s = Rc::clone(&seen);
        *victim.borrow_mut() = Some(registry.add(move |x| s.borrow_mut().push(*x)));

        registry.notify(&1);
        assert!(seen.borrow().is_empty());
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn clear_mid_pass_stops_delivery() {
        let registry = Rc::new(ListenerRegistry::<i32>::new());
        let (count, cb) = counter();

        let r = Rc::downgrade(&registry);
        let _first = registry.add(move |_| {
            if let Some(r) = r.upgrade() {
                r.clear();
            }
        });
        let _second = registry.add(cb);

        registry.notify(&1);
        assert_eq!(count.get(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn listener_may_register_during_notify() {
        let registry = Rc::new(ListenerRegistry::<i32>::new());
        let held = Rc::new(RefCell::new(Vec::new()));
        let r = Rc::downgrade(&registry);
        let h = Rc::clone(&held);
        let _sub = registry.add(move |_| {
            if let Some(r) = r.upgrade() {
                h.borrow_mut().push(r.add(|_| {}));
            }
        });

        registry.notify(&1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn inert_subscription_is_detached() {
        let sub = Subscription::inert();
        assert!(!sub.is_attached());
        assert!(format!("{sub:?}").contains("attached: false"));
    }

    #[test]
    fn unsized_argument() {
        let registry = ListenerRegistry::<[u8]>::new();
        let seen = Rc::new(Cell::new(0usize));
        let s = Rc::clone(&seen);
        let _sub = registry.add(move |bytes: &[u8]| s.set(bytes.len()));
        registry.notify(&[1, 2, 3][..]);
        assert_eq!(seen.get(), 3);
    }
}
