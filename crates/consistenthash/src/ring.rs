//! Hash ring with virtual nodes

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;
use std::marker::PhantomData;

use ahash::RandomState;
use tracing::debug;

/// Maps a byte sequence to a position on the ring.
///
/// Must be pure: the same input always yields the same position.
pub type HashFn = fn(&[u8]) -> u32;

/// Default ring hash: the IEEE CRC-32 checksum.
pub fn default_hash(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Consistent hash ring
///
/// Node `n` owns the positions `hash("0n")`, `hash("1n")`, ... up to
/// `replicas - 1`. A key belongs to the node owning the first position at or
/// after `hash(key)`, wrapping to the lowest position past the end.
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Sorted ascending; may hold the same value twice after a collision.
    positions: Vec<u32>,
    owners: HashMap<u32, String, RandomState>,
    _not_sync: PhantomData<Cell<()>>,
}

impl HashRing {
    /// Create an empty ring using the CRC-32 hash
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, default_hash)
    }

    /// Create an empty ring with a custom hash function
    ///
    /// A `replicas` of 0 is accepted but the ring then never gains a position.
    pub fn with_hasher(replicas: usize, hash: HashFn) -> Self {
        Self {
            hash,
            replicas,
            positions: Vec::new(),
            owners: HashMap::with_hasher(RandomState::new()),
            _not_sync: PhantomData,
        }
    }

    /// True until a node has been added
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Add nodes to the ring
    ///
    /// Positions colliding with an existing one are not detected: the later
    /// node takes over that position.
    pub fn add<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut buf = String::new();
        let mut added = 0usize;

        for node in nodes {
            let node = node.as_ref();
            for i in 0..self.replicas {
                buf.clear();
                // Writing into a String cannot fail.
                let _ = write!(buf, "{}{}", i, node);
                let pos = (self.hash)(buf.as_bytes());
                self.positions.push(pos);
                self.owners.insert(pos, node.to_owned());
            }
            added += 1;
        }

        self.positions.sort_unstable();
        debug!(
            nodes = added,
            positions = self.positions.len(),
            "added nodes to ring"
        );
    }

    /// Find the node that owns `key`
    ///
    /// Returns the empty string when the ring is empty.
    pub fn get(&self, key: &str) -> &str {
        if self.is_empty() {
            return "";
        }

        let hash = (self.hash)(key.as_bytes());
        let mut idx = self.positions.partition_point(|&pos| pos < hash);
        if idx == self.positions.len() {
            // Past the last position: wrap around.
            idx = 0;
        }

        self.owners
            .get(&self.positions[idx])
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Number of positions per node
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Total number of positions on the ring, collisions included
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Distinct nodes that own at least one position, sorted
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.owners.values().map(String::as_str).collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("positions", &self.positions.len())
            .field("nodes", &self.nodes())
            .finish()
    }
}
