//! LRU (Least Recently Used) cache implementation
//!
//! Uses an intrusive linked list over an index arena for O(1) eviction.

use std::borrow::Borrow;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use ahash::RandomState;
use tracing::trace;

type OnEvicted<K, V> = Box<dyn FnMut(&K, &V) + Send>;

/// Upper bound on slots reserved up front; larger caches grow on demand.
const MAX_PREALLOC: usize = 4096;

/// Node in the LRU doubly-linked list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// LRU cache with an optional capacity limit
///
/// The head of the list is the most recently used entry, the tail the least.
/// `add` and a hit on `get` both move an entry to the head.
pub struct LruCache<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    /// 0 means unbounded.
    max_entries: usize,
    on_evicted: Option<OnEvicted<K, V>>,
    _not_sync: PhantomData<Cell<()>>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache holding at most `max_entries` entries
    ///
    /// A limit of 0 means the cache never evicts on its own.
    pub fn new(max_entries: usize) -> Self {
        let prealloc = max_entries.min(MAX_PREALLOC);

        Self {
            map: HashMap::with_capacity_and_hasher(prealloc, RandomState::new()),
            nodes: Vec::with_capacity(prealloc),
            head: None,
            tail: None,
            free_list: Vec::new(),
            max_entries,
            on_evicted: None,
            _not_sync: PhantomData,
        }
    }

    /// Builder form of [`LruCache::set_on_evicted`]
    pub fn with_on_evicted<F>(mut self, f: F) -> Self
    where
        F: FnMut(&K, &V) + Send + 'static,
    {
        self.set_on_evicted(f);
        self
    }

    /// Install the callback run for every entry that leaves the cache
    ///
    /// It fires on capacity eviction, `remove`, `remove_oldest` and once per
    /// entry on `clear`, after the entry has been unlinked.
    pub fn set_on_evicted<F>(&mut self, f: F)
    where
        F: FnMut(&K, &V) + Send + 'static,
    {
        self.on_evicted = Some(Box::new(f));
    }

    /// Insert or update a value
    ///
    /// Updating an existing key replaces its value in place and marks it most
    /// recently used; the old value is dropped without a callback.
    pub fn add(&mut self, key: K, value: V) {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = &mut self.nodes[idx] {
                node.value = value;
            }
            self.move_to_front(idx);
            return;
        }

        let idx = self.alloc_node();
        self.nodes[idx] = Some(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.push_front(idx);
        self.map.insert(key, idx);

        if self.max_entries != 0
            && self.map.len() > self.max_entries
            && self.remove_oldest().is_some()
        {
            trace!(max_entries = self.max_entries, "evicted least recently used entry");
        }
    }

    /// Get a value from the cache, marking it most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Get a value without changing its recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Check whether a key is present without changing its recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Remove a key from the cache
    ///
    /// Returns the removed value; absent keys are a no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.map.remove(key)?;
        self.detach(idx).map(|(_, value)| value)
    }

    /// Remove the least recently used entry
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        let tail_idx = self.tail?;
        if let Some(node) = &self.nodes[tail_idx] {
            self.map.remove(&node.key);
        }
        self.detach(tail_idx)
    }

    /// Get the current size of the cache
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Capacity limit; 0 means unbounded
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Iterate entries from most to least recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            next: self.head,
            remaining: self.map.len(),
        }
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Remove every entry
    ///
    /// The eviction callback sees the entries from most to least recently
    /// used. The cache is reusable afterwards.
    pub fn clear(&mut self) {
        let mut nodes = std::mem::take(&mut self.nodes);
        let mut next = self.head;

        self.map.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;

        if let Some(on_evicted) = self.on_evicted.as_mut() {
            while let Some(idx) = next {
                match nodes[idx].take() {
                    Some(node) => {
                        on_evicted(&node.key, &node.value);
                        next = node.next;
                    }
                    None => break,
                }
            }
        }
        nodes.clear();
        self.nodes = nodes;
    }

    /// Unlink a slot whose key is already gone from the index, run the
    /// callback and hand the entry back.
    fn detach(&mut self, idx: usize) -> Option<(K, V)> {
        self.unlink(idx);
        let node = self.nodes[idx].take()?;
        self.free_node(idx);

        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(&node.key, &node.value);
        }
        Some((node.key, node.value))
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return; // Already at front
        }

        self.unlink(idx);
        self.push_front(idx);
    }

    fn push_front(&mut self, idx: usize) {
        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = if let Some(node) = &self.nodes[idx] {
            (node.prev, node.next)
        } else {
            return;
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }

    fn free_node(&mut self, idx: usize) {
        self.free_list.push(idx);
    }
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = Iter {
            nodes: &self.nodes,
            next: self.head,
            remaining: self.map.len(),
        };
        f.debug_struct("LruCache")
            .field("max_entries", &self.max_entries)
            .field("entries", &entries.collect::<Vec<_>>())
            .finish()
    }
}

/// Iterator over cache entries, most recently used first
pub struct Iter<'a, K, V> {
    nodes: &'a [Option<Node<K, V>>],
    next: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let nodes = self.nodes;
        let node = nodes[idx].as_ref()?;
        self.next = node.next;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
