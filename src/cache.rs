//! Fixed-capacity key/value store with least-recently-used eviction.
//!
//! [`LruCache`] keeps its entries in a slab of doubly linked nodes indexed by
//! a hash map, so lookups, insertions, removals and evictions are all O(1).
//! The list runs from the most recently used entry (head) to the least
//! recently used one (tail).
//!
//! The cache performs no internal locking; owners must serialise mutation.

use std::{collections::HashMap, hash::Hash, num::NonZeroUsize};

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Bounded map that evicts the least recently used entry when full.
///
/// Both [`get`](Self::get) and [`put`](Self::put) mark an entry as most
/// recently used; [`peek`](Self::peek) and [`contains_key`](Self::contains_key)
/// leave the order untouched.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use slicegram::cache::LruCache;
///
/// let mut cache = LruCache::new(NonZeroUsize::new(2).expect("non-zero"));
/// cache.put("a", 1);
/// cache.put("b", 2);
/// assert_eq!(cache.get(&"a"), Some(&1));
/// assert_eq!(cache.put("c", 3), Some(("b", 2)));
/// assert!(!cache.contains_key(&"b"));
/// ```
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: NonZeroUsize,
    index: HashMap<K, usize>,
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            index: HashMap::with_capacity(capacity.get()),
            slots: Vec::with_capacity(capacity.get()),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    /// Maximum number of entries retained.
    #[must_use]
    pub const fn capacity(&self) -> NonZeroUsize { self.capacity }

    /// Number of entries currently stored.
    #[must_use]
    pub fn len(&self) -> usize { self.index.len() }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.index.is_empty() }

    /// Whether `key` is present. Does not affect recency.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool { self.index.contains_key(key) }

    /// Borrow the value for `key`, marking it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let slot = *self.index.get(key)?;
        self.touch(slot);
        self.node(slot).map(|node| &node.value)
    }

    /// Mutably borrow the value for `key`, marking it most recently used.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let slot = *self.index.get(key)?;
        self.touch(slot);
        self.node_mut(slot).map(|node| &mut node.value)
    }

    /// Borrow the value for `key` without changing its recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        let slot = *self.index.get(key)?;
        self.node(slot).map(|node| &node.value)
    }

    /// Insert or replace `key`, marking it most recently used.
    ///
    /// Replacing an existing key never evicts. Inserting a new key into a full
    /// cache evicts the least recently used entry, which is returned.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&slot) = self.index.get(&key) {
            if let Some(node) = self.node_mut(slot) {
                node.value = value;
            }
            self.touch(slot);
            return None;
        }

        let node = Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        };
        let slot = if let Some(slot) = self.free.pop() {
            if let Some(entry) = self.slots.get_mut(slot) {
                *entry = Some(node);
            }
            slot
        } else {
            self.slots.push(Some(node));
            self.slots.len() - 1
        };
        self.index.insert(key, slot);
        self.push_front(slot);

        if self.index.len() > self.capacity.get() {
            return self.pop_lru();
        }
        None
    }

    /// Remove `key`, returning its value if present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.index.remove(key)?;
        self.release(slot).map(|(_, value)| value)
    }

    /// Remove and return the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let slot = self.tail?;
        let entry = self.release(slot)?;
        self.index.remove(&entry.0);
        Some(entry)
    }

    /// Drop every entry and release the backing storage.
    pub fn clear(&mut self) {
        self.index = HashMap::new();
        self.slots = Vec::new();
        self.free = Vec::new();
        self.head = None;
        self.tail = None;
    }

    /// Iterate over keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        std::iter::successors(self.head, |&slot| self.node(slot).and_then(|n| n.next))
            .filter_map(|slot| self.node(slot).map(|node| &node.key))
    }

    fn node(&self, slot: usize) -> Option<&Node<K, V>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn release(&mut self, slot: usize) -> Option<(K, V)> {
        self.unlink(slot);
        let node = self.slots.get_mut(slot).and_then(Option::take)?;
        self.free.push(slot);
        Some((node.key, node.value))
    }

    fn touch(&mut self, slot: usize) {
        if self.head != Some(slot) {
            self.unlink(slot);
            self.push_front(slot);
        }
    }

    fn unlink(&mut self, slot: usize) {
        let Some(node) = self.node_mut(slot) else {
            return;
        };
        let (prev, next) = (node.prev.take(), node.next.take());

        match prev {
            Some(p) => {
                if let Some(before) = self.node_mut(p) {
                    before.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(after) = self.node_mut(n) {
                    after.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, slot: usize) {
        let old_head = self.head;
        let Some(node) = self.node_mut(slot) else {
            return;
        };
        node.prev = None;
        node.next = old_head;

        if let Some(after) = old_head.and_then(|h| self.node_mut(h)) {
            after.prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}
