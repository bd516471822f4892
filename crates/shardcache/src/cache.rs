//! ShardedCache: consistent hash routing over per-node LRU caches

use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;
use consistenthash::HashRing;
use lrucache::LruCache;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::ShardConfig;
use crate::error::{Error, Result};
use crate::stats::CacheStats;

type Shard<V> = Arc<Mutex<LruCache<String, V>>>;

/// Ring plus the shard owned by each node on it
struct Topology<V> {
    ring: HashRing,
    shards: HashMap<String, Shard<V>, RandomState>,
}

/// Node-local cache sharded by consistent hashing
///
/// Neither the ring nor the LRU caches lock internally; this type serializes
/// access with one mutex around the ring and one per shard. The ring lock is
/// released before a shard lock is taken.
pub struct ShardedCache<V> {
    topology: Mutex<Topology<V>>,

    /// Cache statistics
    stats: Arc<CacheStats>,

    /// Config the cache was built from
    config: ShardConfig,
}

impl<V> ShardedCache<V>
where
    V: Send + 'static,
{
    /// Create a sharded cache with one shard per configured node
    ///
    /// # Arguments
    /// * `config` - Replica count, shard capacity and initial nodes
    ///
    /// # Returns
    /// * `Result<ShardedCache>` - Error if the config does not validate
    pub fn new(config: ShardConfig) -> Result<Self> {
        config.validate()?;

        let stats = Arc::new(CacheStats::new());
        let mut ring = HashRing::new(config.replicas);
        let mut shards = HashMap::with_hasher(RandomState::new());

        for node in &config.nodes {
            shards.insert(node.clone(), new_shard(config.shard_capacity, &stats));
        }
        ring.add(&config.nodes);

        info!(
            nodes = config.nodes.len(),
            replicas = config.replicas,
            shard_capacity = config.shard_capacity,
            "sharded cache ready"
        );

        Ok(Self {
            topology: Mutex::new(Topology { ring, shards }),
            stats,
            config,
        })
    }

    /// Add a node and give it an empty shard
    ///
    /// Keys now owned by the new node are not copied over; their entries stay
    /// in the previous owner's shard until evicted.
    pub fn add_node(&self, node: impl Into<String>) -> Result<()> {
        let node = node.into();
        if node.is_empty() {
            return Err(Error::InvalidConfig("node ID must not be empty".into()));
        }

        let mut topology = self.topology.lock();
        if topology.shards.contains_key(&node) {
            return Err(Error::DuplicateNode(node));
        }

        topology.ring.add([node.as_str()]);
        topology
            .shards
            .insert(node.clone(), new_shard(self.config.shard_capacity, &self.stats));

        info!(%node, nodes = topology.shards.len(), "added node");
        Ok(())
    }

    /// Node that owns `key`, or `None` if there are no nodes
    pub fn owner(&self, key: &str) -> Option<String> {
        let topology = self.topology.lock();
        match topology.ring.get(key) {
            "" => None,
            node => Some(node.to_owned()),
        }
    }

    /// Store a value in the owning node's shard
    ///
    /// # Returns
    /// * `Result<String>` - ID of the node that now holds the value
    pub fn put(&self, key: &str, value: V) -> Result<String> {
        let (node, shard) = self.route(key).ok_or(Error::NoNodes)?;

        shard.lock().add(key.to_owned(), value);
        self.stats.record_insert();
        debug!(key, %node, "stored value");

        Ok(node)
    }

    /// Remove a value from the owning node's shard
    pub fn remove(&self, key: &str) -> Option<V> {
        let (_, shard) = self.route(key)?;
        let removed = shard.lock().remove(key);
        removed
    }

    /// Total entries across all shards
    pub fn len(&self) -> usize {
        self.shards().iter().map(|(_, shard)| shard.lock().len()).sum()
    }

    /// Check if every shard is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries held by one node, `None` for an unknown node
    pub fn shard_len(&self, node: &str) -> Option<usize> {
        let shard = self.topology.lock().shards.get(node).cloned()?;
        let len = shard.lock().len();
        Some(len)
    }

    /// Node IDs, sorted
    pub fn nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self.shards().into_iter().map(|(node, _)| node).collect();
        nodes.sort_unstable();
        nodes
    }

    /// Empty every shard; each dropped entry counts as an eviction
    pub fn clear(&self) {
        for (_, shard) in self.shards() {
            shard.lock().clear();
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Config the cache was built from
    pub fn config(&self) -> &ShardConfig {
        &self.config
    }

    fn route(&self, key: &str) -> Option<(String, Shard<V>)> {
        let topology = self.topology.lock();
        let node = topology.ring.get(key);
        let shard = topology.shards.get(node)?;
        Some((node.to_owned(), Arc::clone(shard)))
    }

    fn shards(&self) -> Vec<(String, Shard<V>)> {
        let topology = self.topology.lock();
        topology
            .shards
            .iter()
            .map(|(node, shard)| (node.clone(), Arc::clone(shard)))
            .collect()
    }
}

impl<V> ShardedCache<V>
where
    V: Clone + Send + 'static,
{
    /// Get a copy of a value from the owning node's shard
    pub fn get(&self, key: &str) -> Option<V> {
        let value = self.route(key).and_then(|(_, shard)| {
            let mut lru = shard.lock();
            lru.get(key).cloned()
        });

        if value.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        value
    }
}

fn new_shard<V>(capacity: usize, stats: &Arc<CacheStats>) -> Shard<V>
where
    V: Send + 'static,
{
    let stats = Arc::clone(stats);
    let lru = LruCache::new(capacity).with_on_evicted(move |_: &String, _: &V| {
        stats.record_eviction();
    });
    Arc::new(Mutex::new(lru))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(nodes: &[&str], shard_capacity: usize) -> ShardConfig {
        ShardConfig {
            replicas: 50,
            shard_capacity,
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn test_put_get() {
        let cache = ShardedCache::new(config(&["a", "b", "c"], 16)).unwrap();

        let node = cache.put("user:1", 7u64).unwrap();

        assert_eq!(cache.get("user:1"), Some(7));
        assert_eq!(cache.owner("user:1"), Some(node.clone()));
        assert_eq!(cache.shard_len(&node), Some(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().inserts(), 1);
    }

    #[test]
    fn test_routing_matches_ring() {
        let cache: ShardedCache<u64> = ShardedCache::new(config(&["a", "b", "c"], 16)).unwrap();
        let mut ring = HashRing::new(50);
        ring.add(["a", "b", "c"]);

        for i in 0..200 {
            let key = format!("key-{i}");
            assert_eq!(cache.owner(&key).as_deref(), Some(ring.get(&key)));
        }
    }

    #[test]
    fn test_miss_counts() {
        let cache: ShardedCache<u64> = ShardedCache::new(config(&["a"], 16)).unwrap();

        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().hit_ratio(), 0.0);
    }

    #[test]
    fn test_empty_ring() {
        let cache: ShardedCache<u64> = ShardedCache::new(config(&[], 16)).unwrap();

        assert_eq!(cache.owner("key"), None);
        assert!(matches!(cache.put("key", 1), Err(Error::NoNodes)));
        assert_eq!(cache.get("key"), None);
        assert_eq!(cache.remove("key"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shard_capacity_evicts() {
        let cache = ShardedCache::new(config(&["only"], 2)).unwrap();

        cache.put("A", 1u64).unwrap();
        cache.put("B", 2).unwrap();
        cache.get("A");
        cache.put("C", 3).unwrap();

        assert_eq!(cache.get("B"), None);
        assert_eq!(cache.get("A"), Some(1));
        assert_eq!(cache.get("C"), Some(3));
        assert_eq!(cache.stats().evictions(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_remove_and_clear_count_evictions() {
        let cache = ShardedCache::new(config(&["a", "b"], 0)).unwrap();

        for i in 0..10u64 {
            cache.put(&format!("key-{i}"), i).unwrap();
        }
        assert_eq!(cache.remove("key-3"), Some(3));
        assert_eq!(cache.remove("key-3"), None);
        assert_eq!(cache.stats().evictions(), 1);

        cache.clear();
        assert_eq!(cache.stats().evictions(), 10);
        assert!(cache.is_empty());

        cache.put("key-0", 0).unwrap();
        assert_eq!(cache.get("key-0"), Some(0));
    }

    #[test]
    fn test_add_node() {
        let cache: ShardedCache<u64> = ShardedCache::new(config(&["a"], 16)).unwrap();

        cache.add_node("b").unwrap();

        assert_eq!(cache.nodes(), vec!["a", "b"]);
        assert_eq!(cache.shard_len("b"), Some(0));
        assert_eq!(cache.shard_len("z"), None);
        assert!(matches!(cache.add_node("a"), Err(Error::DuplicateNode(n)) if n == "a"));
        assert!(matches!(cache.add_node(""), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_add_node_only_moves_some_keys() {
        let cache: ShardedCache<u64> = ShardedCache::new(config(&["a", "b", "c"], 0)).unwrap();
        let keys: Vec<String> = (0..1000).map(|i| format!("key-{i}")).collect();
        let before: Vec<String> = keys.iter().map(|k| cache.owner(k).unwrap()).collect();

        cache.add_node("d").unwrap();

        let mut moved = 0;
        for (key, old) in keys.iter().zip(&before) {
            let new = cache.owner(key).unwrap();
            if &new != old {
                assert_eq!(new, "d", "{key} moved between existing nodes");
                moved += 1;
            }
        }
        assert!(moved > 0 && moved < keys.len());
    }

    #[test]
    fn test_invalid_config() {
        let bad = ShardConfig {
            replicas: 0,
            ..Default::default()
        };

        assert!(matches!(
            ShardedCache::<u64>::new(bad),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(ShardedCache::new(config(&["a", "b", "c", "d"], 0)).unwrap());

        std::thread::scope(|s| {
            for t in 0..4u64 {
                let cache = Arc::clone(&cache);
                s.spawn(move || {
                    for i in 0..250u64 {
                        let key = format!("t{t}-{i}");
                        cache.put(&key, i).unwrap();
                        assert_eq!(cache.get(&key), Some(i));
                    }
                });
            }
        });

        assert_eq!(cache.len(), 1000);
        assert_eq!(cache.stats().inserts(), 1000);
        assert_eq!(cache.stats().hits(), 1000);
    }
}
