//! # lrucache
//!
//! Bounded LRU cache with an optional eviction callback.
//!
//! ## Architecture
//! - **HashMap**: AHash index from key to arena slot (O(1))
//! - **LRU List**: doubly-linked list threaded through the arena by slot index (O(1))
//! - **Free list**: slots vacated by removals are reused before the arena grows
//!
//! A capacity of 0 disables eviction. The cache is not `Sync`; callers that
//! share one across threads wrap it in a mutex.

#![warn(missing_docs)]

mod lru;

pub use lru::{Iter, LruCache};
