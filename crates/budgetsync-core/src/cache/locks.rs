use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::CacheKey;

/// One async mutex per cache key. Holding the guard gives the caller the only
/// in-flight reconciliation or write for that key.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: DashMap<CacheKey, Arc<Mutex<()>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &CacheKey) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the map shard is not held across the await.
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    pub fn try_acquire(&self, key: &CacheKey) -> Option<OwnedMutexGuard<()>> {
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.try_lock_owned().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = KeyLocks::new();
        let guard = locks.acquire(&CacheKey::UserBudget).await;
        assert!(locks.try_acquire(&CacheKey::UserBudget).is_none());
        drop(guard);
        assert!(locks.try_acquire(&CacheKey::UserBudget).is_some());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyLocks::new();
        let _budget = locks.acquire(&CacheKey::UserBudget).await;
        assert!(locks.try_acquire(&CacheKey::Expenses).is_some());
    }
}
