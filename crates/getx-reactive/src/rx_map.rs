#![forbid(unsafe_code)]

//! Reactive map with the same notify-on-every-mutation rule as `RxList`.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use crate::listenable::{Listenable, SourceId};
use crate::listeners::Subscription;
use crate::observable::Observable;

/// A `HashMap` whose every mutation notifies listeners.
///
/// Clones share state.
pub struct RxMap<K, V> {
    core: Observable<HashMap<K, V>>,
}

impl<K, V> Clone for RxMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<K: std::fmt::Debug + 'static, V: std::fmt::Debug + 'static> std::fmt::Debug for RxMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RxMap").field("core", &self.core).finish()
    }
}

impl<K, V> Default for RxMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> From<HashMap<K, V>> for RxMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    fn from(map: HashMap<K, V>) -> Self {
        Self {
            core: Observable::new(map),
        }
    }
}

impl<K, V> RxMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::from(HashMap::new())
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut HashMap<K, V>) -> R) -> Option<R> {
        self.core.mutate_with(|map| (f(map), true))
    }

    /// Insert, returning the previous value for `key`.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.mutate(|m| m.insert(key, value)).flatten()
    }

    /// Remove `key`. Notifies even if it was absent.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.mutate(|m| m.remove(key)).flatten()
    }

    pub fn extend(&self, entries: impl IntoIterator<Item = (K, V)>) {
        self.mutate(|m| m.extend(entries));
    }

    pub fn retain(&self, pred: impl FnMut(&K, &mut V) -> bool) {
        self.mutate(|m| m.retain(pred));
    }

    pub fn clear(&self) {
        self.mutate(HashMap::clear);
    }

    /// Replace the content with `entries`.
    pub fn assign_all(&self, entries: impl IntoIterator<Item = (K, V)>) {
        self.mutate(|m| {
            m.clear();
            m.extend(entries);
        });
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.core.with(|m| m.get(key).cloned())
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.core.with(|m| m.contains_key(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.core.with(HashMap::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core.with(HashMap::is_empty)
    }

    /// Snapshot of the content.
    #[must_use]
    pub fn to_map(&self) -> HashMap<K, V> {
        self.core.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&HashMap<K, V>) -> R) -> R {
        self.core.with(f)
    }

    pub fn listen(&self, callback: impl Fn(&HashMap<K, V>) + 'static) -> Subscription {
        self.core.listen(callback)
    }

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

impl<K, V> Listenable for RxMap<K, V>
where
    K: Clone + 'static,
    V: Clone + 'static,
{
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
