use std::{collections::hash_map::Entry, collections::HashMap, hash::Hash};

/// A very basic concurrent hashmap that is hard to misuse in an async context.
/// A lock is only ever held for the duration of a single map operation, never across an await.
#[derive(Default)]
pub struct SafeMap<K: Hash + Eq, V>(std::sync::RwLock<HashMap<K, V>>);

impl<K: Hash + Eq, V> SafeMap<K, V> {
    pub fn new() -> Self { Self(std::sync::RwLock::new(HashMap::new())) }

    // a poisoned lock only means another thread panicked mid-operation; the map itself is still consistent
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<K, V>> { self.0.read().unwrap_or_else(|e| e.into_inner()) }
    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<K, V>> { self.0.write().unwrap_or_else(|e| e.into_inner()) }

    pub fn len(&self) -> usize { self.read().len() }
    pub fn is_empty(&self) -> bool { self.read().is_empty() }

    pub fn remove(&self, key: &K) -> Option<V> { self.write().remove(key) }
}

impl<K: Hash + Eq, V> SafeMap<K, V>
where V: Clone
{
    pub fn get(&self, k: &K) -> Option<V> { self.read().get(k).cloned() }

    /// Insert `value` unless the key is already present. Returns whichever value ends up in the map.
    pub fn insert_if_absent(&self, key: K, value: V) -> V {
        match self.write().entry(key) {
            Entry::Occupied(o) => o.get().clone(),
            Entry::Vacant(v) => v.insert(value).clone(),
        }
    }
}

impl<K: Hash + Eq + std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for SafeMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "SafeMap {{ {:?} }}", self.read()) }
}
