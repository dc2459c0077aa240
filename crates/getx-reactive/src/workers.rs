#![forbid(unsafe_code)]

//! Workers: callbacks bound to reactive sources.
//!
//! - [`ever`] runs after every change.
//! - [`once`] runs after the first change only.
//! - [`ever_all`] runs after a change of any of several sources.
//!
//! A [`Worker`] stops on [`Worker::dispose`] or when dropped.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::listenable::Listenable;
use crate::listeners::Subscription;

/// Handle keeping a worker's subscriptions alive.
#[must_use = "dropping a Worker stops it"]
pub struct Worker {
    subscriptions: RefCell<Vec<Subscription>>,
    disposed: Rc<Cell<bool>>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("sources", &self.subscriptions.borrow().len())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

impl Worker {
    fn new(subscriptions: Vec<Subscription>, disposed: Rc<Cell<bool>>) -> Self {
        Self {
            subscriptions: RefCell::new(subscriptions),
            disposed,
        }
    }

    /// Stop the worker. Idempotent.
    pub fn dispose(&self) {
        self.disposed.set(true);
        self.subscriptions.borrow_mut().clear();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

/// Run `callback` after every change of `source`.
pub fn ever(source: &dyn Listenable, callback: impl Fn() + 'static) -> Worker {
    ever_all(&[source], callback)
}

/// Run `callback` after the first change of `source`, then stop.
pub fn once(source: &dyn Listenable, callback: impl Fn() + 'static) -> Worker {
    let disposed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&disposed);
    let cb: Rc<dyn Fn()> = Rc::new(move || {
        if flag.replace(true) {
            return;
        }
        callback();
    });
    Worker::new(vec![source.listen_change(cb)], disposed)
}

/// Run `callback` after a change of any of `sources`.
pub fn ever_all(sources: &[&dyn Listenable], callback: impl Fn() + 'static) -> Worker {
    let disposed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&disposed);
    let cb: Rc<dyn Fn()> = Rc::new(move || {
        if !flag.get() {
            callback();
        }
    });
    let subscriptions = sources
        .iter()
        .map(|s| s.listen_change(Rc::clone(&cb)))
        .collect();
    Worker::new(subscriptions, disposed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::Observable;
    use crate::rx_list::RxList;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        (count, move || c.set(c.get() + 1))
    }

    #[test]
    fn ever_runs_each_change() {
        let obs = Observable::new(0);
        let (count, cb) = counter();
        let worker = ever(&obs, cb);
        obs.set(1);
        obs.set(1);
        obs.set(2);
        assert_eq!(count.get(), 2);

        worker.dispose();
        obs.set(3);
        assert_eq!(count.get(), 2);
        assert!(worker.is_disposed());
    }

    #[test]
    fn once_runs_first_change_only() {
        let obs = Observable::new(0);
        let (count, cb) = counter();
        let worker = once(&obs, cb);
        obs.set(1);
        obs.set(2);
        assert_eq!(count.get(), 1);
        assert!(worker.is_disposed());
    }

    #[test]
    fn ever_all_spans_sources() {
        let a = Observable::new(0);
        let list = RxList::<u8>::new();
        let (count, cb) = counter();
        let _worker = ever_all(&[&a, &list], cb);
        a.set(5);
        list.add(1);
        list.clear();
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn dropped_worker_stops() {
        let obs = Observable::new(0);
        let (count, cb) = counter();
        drop(ever(&obs, cb));
        obs.set(1);
        assert_eq!(count.get(), 0);
    }
}
