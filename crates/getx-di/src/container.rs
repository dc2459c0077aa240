#![forbid(unsafe_code)]

//! Explicit dependency container.
//!
//! A [`Container`] resolves instances by type plus an optional string tag.
//! It is an ordinary value passed by reference; there is no process-wide
//! instance.
//!
//! # Entry kinds
//!
//! | Kind       | Registered with   | `find` returns                    |
//! |------------|-------------------|-----------------------------------|
//! | Instance   | `put`, `put_with` | the stored instance               |
//! | Lazy       | `lazy_put`        | built on first `find`, then kept  |
//! | Factory    | `create`          | a fresh instance on every `find`  |
//!
//! # Invariants
//!
//! 1. Registering a key that is already present keeps the existing entry.
//! 2. Permanent entries survive [`Container::release_route`] and refuse
//!    [`Container::delete`]; only [`Container::force_delete`] or
//!    [`Container::reset`] remove them.
//! 3. An entry registered while a binding runs for route `R` is owned by
//!    `R`. Entries registered outside any binding have no owner and are
//!    never released by route.
//! 4. `on_close` hooks run exactly once, after the entry has been removed
//!    and with no internal borrow held.
//! 5. Builders run with no internal borrow held, so they may resolve their
//!    own dependencies from the same container.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, debug_span};

use crate::binding::Binding;
use crate::error::DiError;

type AnyRc = Rc<dyn Any>;
type Builder = Rc<dyn Fn(&Container) -> Built>;
type CloseHook = Rc<dyn Fn()>;

struct Built {
    instance: AnyRc,
    on_close: Option<CloseHook>,
}

impl Built {
    fn plain(instance: AnyRc) -> Self {
        Self {
            instance,
            on_close: None,
        }
    }
}

/// Lifecycle hooks for instances registered with
/// [`Container::put_controller`].
pub trait Controller {
    /// Runs once, right after registration.
    fn on_init(&self) {}

    /// Runs once, when the instance is deleted or its route is released.
    fn on_close(&self) {}
}

/// Options for registering an entry.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Distinguishes several entries of the same type.
    pub tag: Option<String>,
    /// Survive route release and plain `delete`.
    pub permanent: bool,
}

impl PutOptions {
    /// Options with a tag.
    #[must_use]
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            permanent: false,
        }
    }

    /// Set the tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set permanence.
    #[must_use]
    pub fn with_permanent(mut self, permanent: bool) -> Self {
        self.permanent = permanent;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    type_id: TypeId,
    tag: Option<String>,
}

impl Key {
    fn of<T: 'static>(tag: Option<&str>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            tag: tag.map(str::to_owned),
        }
    }
}

enum EntryKind {
    Instance(AnyRc),
    Lazy(Builder),
    Factory(Builder),
}

struct Entry {
    type_name: &'static str,
    kind: EntryKind,
    permanent: bool,
    owner: Option<String>,
    on_close: Option<CloseHook>,
}

#[derive(Default)]
struct Registry {
    entries: HashMap<Key, Entry>,
    /// Routes whose bindings are currently running, innermost last.
    scopes: Vec<String>,
}

/// Type-and-tag keyed registry of shared instances.
#[derive(Default)]
pub struct Container {
    registry: RefCell<Registry>,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("Container")
            .field("entries", &registry.entries.len())
            .field("scopes", &registry.scopes)
            .finish()
    }
}

impl Container {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the key exists. Returns whether it was inserted.
    fn insert(&self, key: Key, mut entry: Entry) -> bool {
        let mut registry = self.registry.borrow_mut();
        if registry.entries.contains_key(&key) {
            debug!(
                type_name = entry.type_name,
                tag = ?key.tag,
                "instance already registered; keeping existing"
            );
            return false;
        }
        entry.owner = registry.scopes.last().cloned();
        debug!(
            type_name = entry.type_name,
            tag = ?key.tag,
            owner = ?entry.owner,
            permanent = entry.permanent,
            "instance registered"
        );
        registry.entries.insert(key, entry);
        true
    }

    /// Register `value` with default options.
    pub fn put<T: 'static>(&self, value: T) -> Rc<T> {
        self.put_with(value, PutOptions::default())
    }

    /// Register `value`. If the key is already registered the existing
    /// instance wins and is returned; `value` is dropped.
    pub fn put_with<T: 'static>(&self, value: T, options: PutOptions) -> Rc<T> {
        let instance = Rc::new(value);
        let key = Key::of::<T>(options.tag.as_deref());
        let inserted = self.insert(
            key,
            Entry {
                type_name: type_name::<T>(),
                kind: EntryKind::Instance(Rc::clone(&instance) as AnyRc),
                permanent: options.permanent,
                owner: None,
                on_close: None,
            },
        );
        if inserted {
            return instance;
        }
        self.find_tagged::<T>(options.tag.as_deref())
            .unwrap_or(instance)
    }

    /// Register a controller and run its `on_init`. `on_close` runs when the
    /// entry is removed.
    pub fn put_controller<T: Controller + 'static>(&self, value: T, options: PutOptions) -> Rc<T> {
        let instance = Rc::new(value);
        let key = Key::of::<T>(options.tag.as_deref());
        let hook = {
            let instance = Rc::clone(&instance);
            Rc::new(move || instance.on_close()) as CloseHook
        };
        let inserted = self.insert(
            key,
            Entry {
                type_name: type_name::<T>(),
                kind: EntryKind::Instance(Rc::clone(&instance) as AnyRc),
                permanent: options.permanent,
                owner: None,
                on_close: Some(hook),
            },
        );
        if !inserted {
            return self
                .find_tagged::<T>(options.tag.as_deref())
                .unwrap_or(instance);
        }
        instance.on_init();
        instance
    }

    /// Register a builder that runs on the first `find` only.
    pub fn lazy_put<T: 'static>(
        &self,
        builder: impl Fn(&Container) -> T + 'static,
        options: PutOptions,
    ) {
        let key = Key::of::<T>(options.tag.as_deref());
        self.insert(
            key,
            Entry {
                type_name: type_name::<T>(),
                kind: EntryKind::Lazy(Rc::new(move |c: &Container| {
                    Built::plain(Rc::new(builder(c)))
                })),
                permanent: options.permanent,
                owner: None,
                on_close: None,
            },
        );
    }

    /// Like [`lazy_put`](Self::lazy_put) for controllers: `on_init` runs
    /// when the instance is first built, `on_close` when it is removed.
    pub fn lazy_put_controller<T: Controller + 'static>(
        &self,
        builder: impl Fn(&Container) -> T + 'static,
        options: PutOptions,
    ) {
        let key = Key::of::<T>(options.tag.as_deref());
        self.insert(
            key,
            Entry {
                type_name: type_name::<T>(),
                kind: EntryKind::Lazy(Rc::new(move |c: &Container| {
                    let instance = Rc::new(builder(c));
                    instance.on_init();
                    let hook = {
                        let instance = Rc::clone(&instance);
                        Rc::new(move || instance.on_close()) as CloseHook
                    };
                    Built {
                        instance,
                        on_close: Some(hook),
                    }
                })),
                permanent: options.permanent,
                owner: None,
                on_close: None,
            },
        );
    }

    /// Register a factory: every `find` builds a new instance.
    pub fn create<T: 'static>(
        &self,
        builder: impl Fn(&Container) -> T + 'static,
        options: PutOptions,
    ) {
        let key = Key::of::<T>(options.tag.as_deref());
        self.insert(
            key,
            Entry {
                type_name: type_name::<T>(),
                kind: EntryKind::Factory(Rc::new(move |c: &Container| {
                    Built::plain(Rc::new(builder(c)))
                })),
                permanent: options.permanent,
                owner: None,
                on_close: None,
            },
        );
    }

    /// Resolve the untagged `T`.
    pub fn find<T: 'static>(&self) -> Result<Rc<T>, DiError> {
        self.find_tagged::<T>(None)
    }

    /// Resolve `T` under `tag`.
    pub fn find_tagged<T: 'static>(&self, tag: Option<&str>) -> Result<Rc<T>, DiError> {
        let key = Key::of::<T>(tag);
        let not_found = || DiError::NotFound {
            type_name: type_name::<T>(),
            tag: tag.map(str::to_owned),
        };

        let (builder, cache) = {
            let registry = self.registry.borrow();
            let entry = registry.entries.get(&key).ok_or_else(not_found)?;
            match &entry.kind {
                EntryKind::Instance(instance) => return downcast::<T>(Rc::clone(instance)),
                EntryKind::Lazy(builder) => (Rc::clone(builder), true),
                EntryKind::Factory(builder) => (Rc::clone(builder), false),
            }
        };

        let built = builder(self);
        if cache {
            let mut registry = self.registry.borrow_mut();
            if let Some(entry) = registry.entries.get_mut(&key) {
                if matches!(entry.kind, EntryKind::Lazy(_)) {
                    debug!(type_name = entry.type_name, "lazy instance built");
                    entry.kind = EntryKind::Instance(Rc::clone(&built.instance));
                    entry.on_close = built.on_close;
                }
            }
        }
        downcast::<T>(built.instance)
    }

    /// Whether `T` is registered under `tag` (built or not).
    #[must_use]
    pub fn is_registered<T: 'static>(&self, tag: Option<&str>) -> bool {
        self.registry
            .borrow()
            .entries
            .contains_key(&Key::of::<T>(tag))
    }

    /// Whether `T` under `tag` has a live instance (lazy entries count once
    /// built; factories never do).
    #[must_use]
    pub fn is_prepared<T: 'static>(&self, tag: Option<&str>) -> bool {
        self.registry
            .borrow()
            .entries
            .get(&Key::of::<T>(tag))
            .is_some_and(|e| matches!(e.kind, EntryKind::Instance(_)))
    }

    /// Route that owns `T` under `tag`, if any.
    #[must_use]
    pub fn owner_of<T: 'static>(&self, tag: Option<&str>) -> Option<String> {
        self.registry
            .borrow()
            .entries
            .get(&Key::of::<T>(tag))
            .and_then(|e| e.owner.clone())
    }

    /// Remove a non-permanent entry and run its close hook.
    pub fn delete<T: 'static>(&self, tag: Option<&str>) -> Result<(), DiError> {
        self.remove::<T>(tag, false)
    }

    /// Remove an entry even if permanent.
    pub fn force_delete<T: 'static>(&self, tag: Option<&str>) -> Result<(), DiError> {
        self.remove::<T>(tag, true)
    }

    fn remove<T: 'static>(&self, tag: Option<&str>, force: bool) -> Result<(), DiError> {
        let key = Key::of::<T>(tag);
        let entry = {
            let mut registry = self.registry.borrow_mut();
            let Some(entry) = registry.entries.get(&key) else {
                return Err(DiError::NotFound {
                    type_name: type_name::<T>(),
                    tag: tag.map(str::to_owned),
                });
            };
            if entry.permanent && !force {
                return Err(DiError::Permanent {
                    type_name: type_name::<T>(),
                    tag: tag.map(str::to_owned),
                });
            }
            registry.entries.remove(&key)
        };
        if let Some(entry) = entry {
            debug!(type_name = entry.type_name, tag = ?tag, "instance deleted");
            close(entry);
        }
        Ok(())
    }

    /// Run `binding` with `route` as the owner of everything it registers.
    pub fn run_binding(&self, route: &str, binding: &dyn Binding) {
        let _span = debug_span!("binding", route).entered();
        self.registry.borrow_mut().scopes.push(route.to_owned());
        binding.dependencies(self);
        self.registry.borrow_mut().scopes.pop();
    }

    /// Remove every non-permanent entry owned by `route`, running close
    /// hooks. Returns how many were removed.
    pub fn release_route(&self, route: &str) -> usize {
        let released: Vec<Entry> = {
            let mut registry = self.registry.borrow_mut();
            let keys: Vec<Key> = registry
                .entries
                .iter()
                .filter(|(_, e)| !e.permanent && e.owner.as_deref() == Some(route))
                .map(|(k, _)| k.clone())
                .collect();
            keys.iter()
                .filter_map(|k| registry.entries.remove(k))
                .collect()
        };
        let count = released.len();
        for entry in released {
            debug!(type_name = entry.type_name, route, "instance released with route");
            close(entry);
        }
        count
    }

    /// Remove everything, permanent entries included.
    pub fn reset(&self) {
        let entries: Vec<Entry> = {
            let mut registry = self.registry.borrow_mut();
            registry.entries.drain().map(|(_, e)| e).collect()
        };
        debug!(count = entries.len(), "container reset");
        entries.into_iter().for_each(close);
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.borrow().entries.is_empty()
    }
}

fn downcast<T: 'static>(instance: AnyRc) -> Result<Rc<T>, DiError> {
    instance.downcast::<T>().map_err(|_| DiError::TypeMismatch {
        type_name: type_name::<T>(),
    })
}

fn close(entry: Entry) {
    if let Some(hook) = entry.on_close {
        hook();
    }
}
