#![forbid(unsafe_code)]

//! Automatic dependency tracking and the [`Observer`] scope builder.
//!
//! Every tracked read (`Observable::get`, `RxList::len`, ...) records its
//! source in the innermost tracking scope of the current thread. An
//! [`Observer`] runs its builder inside such a scope, subscribes to whatever
//! was read, and re-runs the builder when any of those sources changes.
//!
//! # Invariants
//!
//! 1. A source read several times in one scope is recorded once.
//! 2. Reads inside [`untracked`] are never recorded.
//! 3. Scopes nest: a read is recorded only by the innermost scope.
//! 4. Each observer run replaces the previous dependency set entirely.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{trace, warn};

use crate::listenable::{Listenable, SourceId};
use crate::listeners::Subscription;

struct Scope {
    ids: Vec<SourceId>,
    sources: Vec<Box<dyn Listenable>>,
    suppressed: bool,
}

thread_local! {
    /// Stack of active tracking scopes for this thread.
    static SCOPES: RefCell<Vec<Scope>> = const { RefCell::new(Vec::new()) };
}

/// Pops the scope it pushed, even if the tracked closure panics.
struct ScopeGuard;

impl ScopeGuard {
    fn push(suppressed: bool) -> Self {
        SCOPES.with(|scopes| {
            scopes.borrow_mut().push(Scope {
                ids: Vec::new(),
                sources: Vec::new(),
                suppressed,
            });
        });
        Self
    }

    fn finish(self) -> Dependencies {
        let scope = SCOPES.with(|scopes| scopes.borrow_mut().pop());
        std::mem::forget(self);
        Dependencies {
            sources: scope.map(|s| s.sources).unwrap_or_default(),
        }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPES.with(|scopes| {
            scopes.borrow_mut().pop();
        });
    }
}

/// Record a read of `id` in the innermost scope.
///
/// `make` is only called when the source is new to the scope.
pub(crate) fn record(id: SourceId, make: impl FnOnce() -> Box<dyn Listenable>) {
    SCOPES.with(|scopes| {
        let mut scopes = scopes.borrow_mut();
        let Some(scope) = scopes.last_mut() else {
            return;
        };
        if scope.suppressed || scope.ids.contains(&id) {
            return;
        }
        scope.ids.push(id);
        scope.sources.push(make());
    });
}

/// Whether a tracking scope is active on this thread.
#[must_use]
pub fn is_tracking() -> bool {
    SCOPES.with(|scopes| scopes.borrow().last().is_some_and(|s| !s.suppressed))
}

/// Run `f` and collect every reactive source it read.
pub fn track<R>(f: impl FnOnce() -> R) -> (R, Dependencies) {
    let guard = ScopeGuard::push(false);
    let out = f();
    (out, guard.finish())
}

/// Run `f` without recording any of its reads in the enclosing scope.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let guard = ScopeGuard::push(true);
    let out = f();
    drop(guard);
    out
}

/// Sources read during a tracked run.
#[derive(Default)]
pub struct Dependencies {
    sources: Vec<Box<dyn Listenable>>,
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("ids", &self.ids())
            .finish()
    }
}

impl Dependencies {
    /// Number of distinct sources read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether nothing reactive was read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Identities of the sources, in first-read order.
    #[must_use]
    pub fn ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.source_id()).collect()
    }

    /// Subscribe `callback` to every source.
    pub fn subscribe_all(&self, callback: Rc<dyn Fn()>) -> Vec<Subscription> {
        self.sources
            .iter()
            .map(|s| s.listen_change(Rc::clone(&callback)))
            .collect()
    }
}

struct ObserverInner {
    builder: Box<dyn Fn()>,
    subscriptions: RefCell<Vec<Subscription>>,
    runs: Cell<u64>,
    dependencies: Cell<usize>,
    disposed: Cell<bool>,
}

impl ObserverInner {
    fn run(this: &Rc<Self>) {
        if this.disposed.get() {
            return;
        }
        let ((), deps) = track(|| (this.builder)());
        this.runs.set(this.runs.get() + 1);
        this.dependencies.set(deps.len());
        if deps.is_empty() {
            warn!("observer builder read no reactive values; it will never rebuild");
        }
        trace!(run = this.runs.get(), deps = deps.len(), "observer ran");

        let weak = Rc::downgrade(this);
        let rerun: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                ObserverInner::run(&inner);
            }
        });
        let subscriptions = deps.subscribe_all(rerun);
        // Disposed from inside the builder: drop the fresh subscriptions too.
        if this.disposed.get() {
            return;
        }
        let previous = std::mem::replace(&mut *this.subscriptions.borrow_mut(), subscriptions);
        drop(previous);
    }
}

/// Re-runs a builder whenever a reactive value it read changes.
///
/// The rebuild happens synchronously inside the notifying mutation. Dropping
/// the observer disposes it.
pub struct Observer {
    inner: Rc<ObserverInner>,
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("runs", &self.inner.runs.get())
            .field("dependencies", &self.inner.dependencies.get())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

impl Observer {
    /// Run `builder` once now and again after every change of what it read.
    pub fn new(builder: impl Fn() + 'static) -> Self {
        let inner = Rc::new(ObserverInner {
            builder: Box::new(builder),
            subscriptions: RefCell::new(Vec::new()),
            runs: Cell::new(0),
            dependencies: Cell::new(0),
            disposed: Cell::new(false),
        });
        ObserverInner::run(&inner);
        Self { inner }
    }

    /// How many times the builder has run.
    #[must_use]
    pub fn run_count(&self) -> u64 {
        self.inner.runs.get()
    }

    /// Distinct sources read by the latest run.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.get()
    }

    /// Stop rebuilding. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        drop(subscriptions);
    }

    /// Whether [`dispose`](Self::dispose) was called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.dispose();
    }
}
