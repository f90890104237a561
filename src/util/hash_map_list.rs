use std::{collections::HashMap, hash::Hash};

/// Wrapper around `HashMap<K, Vec<V>>`. Values sharing a key are kept in insertion order, and
/// a key disappears once its last value is removed.
#[derive(Debug)]
pub struct HashMapList<K, V>(HashMap<K, Vec<V>>);

impl<K, V> HashMapList<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty [HashMapList].
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Retrieves the values stored under a key, in insertion order. Empty if the key is unknown.
    pub fn get(&self, k: &K) -> &[V] {
        self.0.get(k).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Appends a value to the list for the key, initialising the list if required.
    pub fn insert(&mut self, k: K, v: V) {
        self.0.entry(k).or_default().push(v);
    }

    /// Keeps only the values under `k` for which `keep` returns `true`. Returns the number of
    /// values dropped.
    pub fn retain<F>(&mut self, k: &K, keep: F) -> usize
    where
        F: FnMut(&V) -> bool,
    {
        let Some(list) = self.0.get_mut(k) else {
            return 0;
        };

        let before = list.len();
        list.retain(keep);
        let removed = before - list.len();

        if list.is_empty() {
            self.0.remove(k);
        }

        removed
    }

    /// Applies [`Self::retain`] to every key.
    pub fn retain_all<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&V) -> bool,
    {
        let mut removed = 0;

        self.0.retain(|_, list| {
            let before = list.len();
            list.retain(&mut keep);
            removed += before - list.len();

            !list.is_empty()
        });

        removed
    }

    /// Total number of values across all keys.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> Default for HashMapList<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
