//! # consistenthash
//!
//! Consistent hash ring that maps string keys to node identities.
//!
//! ## Architecture
//! - **Positions**: sorted `Vec<u32>` searched with a binary search (O(log n))
//! - **Owners**: AHash map from ring position to node ID
//! - **Replicas**: every node is hashed onto the ring `replicas` times
//!
//! Adding a node only remaps the keys that fall between its new positions and
//! their predecessors; every other key keeps its owner.
//!
//! The ring is meant for a single owner. It is `Send` but not `Sync`, so
//! sharing one across threads takes an explicit lock.

#![warn(missing_docs)]

mod ring;

pub use ring::{default_hash, HashFn, HashRing};
