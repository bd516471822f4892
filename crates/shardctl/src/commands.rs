//! Subcommand implementations

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use consistenthash::HashRing;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use shardcache::{ShardConfig, ShardedCache};
use tracing::{info, warn};

/// Share of operations that hit the hot key set.
const HOT_FRACTION: f64 = 0.8;

/// Share of the key space that is hot.
const HOT_KEYS: f64 = 0.2;

/// Share of operations that are reads.
const READ_FRACTION: f64 = 0.7;

fn build_ring(config: &ShardConfig) -> Result<HashRing> {
    if config.nodes.is_empty() {
        bail!("no nodes configured; pass --node or --config");
    }

    let mut ring = HashRing::new(config.replicas);
    ring.add(&config.nodes);
    Ok(ring)
}

/// Print `key -> node` for each key
pub fn locate(config: &ShardConfig, keys: &[String]) -> Result<()> {
    let ring = build_ring(config)?;

    for key in keys {
        println!("{} -> {}", key, ring.get(key));
    }
    Ok(())
}

/// Print per-node key counts for `key-0..key-N`
pub fn distribution(config: &ShardConfig, samples: usize) -> Result<()> {
    let ring = build_ring(config)?;

    let mut counts: BTreeMap<&str, usize> = config.nodes.iter().map(|n| (n.as_str(), 0)).collect();
    for i in 0..samples {
        let owner = ring.get(&format!("key-{i}"));
        *counts.entry(owner).or_default() += 1;
    }

    println!("{:<24} {:>10} {:>8}", "node", "keys", "share");
    for (node, count) in &counts {
        let share = if samples == 0 {
            0.0
        } else {
            *count as f64 * 100.0 / samples as f64
        };
        println!("{:<24} {:>10} {:>7.2}%", node, count, share);
    }

    let idle = counts.values().filter(|&&c| c == 0).count();
    if idle > 0 && samples > 0 {
        warn!(idle, "some nodes own no sample keys; consider more replicas");
    }
    Ok(())
}

/// Run a skewed read-through workload against a sharded cache
///
/// Reads that miss write the value back, like a cache in front of a slower
/// store would.
pub fn simulate(config: ShardConfig, keys: u64, ops: u64, seed: u64) -> Result<()> {
    if config.nodes.is_empty() {
        bail!("no nodes configured; pass --node or --config");
    }
    if keys == 0 {
        bail!("--keys must be at least 1");
    }

    let cache: ShardedCache<u64> = ShardedCache::new(config)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let hot = ((keys as f64 * HOT_KEYS) as u64).max(1);

    for _ in 0..ops {
        let id = if rng.random_bool(HOT_FRACTION) {
            rng.random_range(0..hot)
        } else {
            rng.random_range(0..keys)
        };
        let key = format!("key-{id}");

        if rng.random_bool(READ_FRACTION) {
            if cache.get(&key).is_none() {
                cache.put(&key, id)?;
            }
        } else {
            cache.put(&key, id)?;
        }
    }

    let shards: BTreeMap<String, usize> = cache
        .nodes()
        .into_iter()
        .filter_map(|node| cache.shard_len(&node).map(|len| (node, len)))
        .collect();

    info!(ops, entries = cache.len(), "workload finished");

    let report = json!({
        "ops": ops,
        "entries": cache.len(),
        "shards": shards,
        "stats": cache.stats().snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
