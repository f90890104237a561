use std::{
    ops::{Index, IndexMut},
    rc::{Rc, Weak},
};

use super::NodeHandle;

/// Slots below this count are never swept.
const MIN_SWEEP: usize = 64;

struct Entry<T> {
    value: Option<T>,
    handle: Weak<usize>,
}

/// Storage for surface nodes, addressed by [`NodeHandle`]. A slot becomes releasable once every
/// clone of its handle has been dropped, and is reused after being freed.
pub(crate) struct Arena<T> {
    entries: Vec<Entry<T>>,
    free: Vec<usize>,
    sweep_at: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            sweep_at: MIN_SWEEP,
        }
    }

    pub fn insert(&mut self, value: T) -> NodeHandle {
        let key = self.free.pop().unwrap_or(self.entries.len());
        let handle = NodeHandle::new(key);
        let entry = Entry {
            value: Some(value),
            handle: Rc::downgrade(&handle.0),
        };

        match self.entries.get_mut(key) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }

        handle
    }

    /// The key of `handle`, if it was produced by this arena and its slot is still occupied.
    pub fn key(&self, handle: &NodeHandle) -> Option<usize> {
        let entry = self.entries.get(handle.key())?;

        (entry.value.is_some() && std::ptr::eq(entry.handle.as_ptr(), Rc::as_ptr(&handle.0)))
            .then_some(handle.key())
    }

    pub fn contains(&self, key: usize) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.value.is_some())
    }

    pub fn get(&self, key: usize) -> Option<&T> {
        self.entries.get(key).and_then(|entry| entry.value.as_ref())
    }

    /// Whether a handle to `key` is still held somewhere.
    pub fn is_held(&self, key: usize) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.handle.strong_count() > 0)
    }

    /// Whether enough slots were created since the last sweep to make another worthwhile.
    pub fn needs_sweep(&self) -> bool {
        self.free.is_empty() && self.entries.len() >= self.sweep_at
    }

    /// Occupied slots nobody holds a handle to.
    pub fn released(&self) -> Vec<usize> {
        (0..self.entries.len())
            .filter(|key| self.contains(*key) && !self.is_held(*key))
            .collect()
    }

    /// Empty the slot at `key`, making it available to [`Arena::insert()`].
    pub fn free(&mut self, key: usize) -> Option<T> {
        let value = self.entries.get_mut(key)?.value.take()?;
        self.free.push(key);

        Some(value)
    }

    /// Record the end of a sweep, so the next happens once the arena doubled.
    pub fn swept(&mut self) {
        self.sweep_at = (2 * self.len()).max(MIN_SWEEP);
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }
}

impl<T> Index<usize> for Arena<T> {
    type Output = T;

    fn index(&self, key: usize) -> &T {
        match self.get(key) {
            Some(value) => value,
            None => panic!("node #{key} was freed while still linked"),
        }
    }
}

impl<T> IndexMut<usize> for Arena<T> {
    fn index_mut(&mut self, key: usize) -> &mut T {
        match self.entries.get_mut(key).and_then(|entry| entry.value.as_mut()) {
            Some(value) => value,
            None => panic!("node #{key} was freed while still linked"),
        }
    }
}
