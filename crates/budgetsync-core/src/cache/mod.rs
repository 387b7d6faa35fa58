//! Local caching module for offline data access.
//!
//! This module provides the `CacheManager` for storing and retrieving
//! budget data locally, one directory per user. Data is cached in JSON
//! format and considered stale after 60 minutes.
//!
//! Cached keys:
//! - `userData`: the logged-in user's profile
//! - `userBudget`: the budget profile
//! - `expenses`: the last fetched expense list
//! - `earnings_<userId>`: the local-only earnings ledger

pub mod keys;
pub mod locks;
pub mod manager;

pub use keys::CacheKey;
pub use locks::KeyLocks;
pub use manager::{CacheAges, CacheManager, CachedData};
