//! Stale-while-revalidate reconciliation of one cache key.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::SessionData;
use crate::cache::{CacheKey, CacheManager, CachedData, KeyLocks};

/// What a view currently has to show for one piece of data.
#[derive(Debug, Clone, PartialEq)]
pub enum DataState<T> {
    /// Nothing read yet.
    Loading,
    /// No cached value and no successful fetch. Callers show an empty or
    /// onboarding prompt.
    Empty,
    /// Value read from the local cache, possibly out of date.
    Stale { data: T, cached_at: DateTime<Utc> },
    /// Value confirmed by the server during this load.
    Fresh { data: T },
}

impl<T> DataState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            DataState::Stale { data, .. } | DataState::Fresh { data } => Some(data),
            DataState::Loading | DataState::Empty => None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.data().is_some()
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, DataState::Fresh { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DataState::Empty)
    }
}

impl<T> From<CachedData<T>> for DataState<T> {
    fn from(cached: CachedData<T>) -> Self {
        DataState::Stale {
            data: cached.data,
            cached_at: cached.cached_at,
        }
    }
}

/// Observable slot a reconciler publishes into. Subscribers see every
/// transition (`Stale` then `Fresh`); `snapshot` returns the latest one.
#[derive(Debug)]
pub struct ViewState<T> {
    tx: watch::Sender<DataState<T>>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ViewState<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DataState::Loading);
        Self { tx }
    }

    pub fn publish(&self, state: DataState<T>) {
        // send_replace succeeds with or without live receivers
        self.tx.send_replace(state);
    }

    pub fn subscribe(&self) -> watch::Receiver<DataState<T>> {
        self.tx.subscribe()
    }
}

impl<T: Clone> ViewState<T> {
    pub fn snapshot(&self) -> DataState<T> {
        self.tx.borrow().clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    /// The fetch succeeded and the cache now holds the server value.
    Refreshed,
    /// The fetch failed; the cached value (if any) is still shown.
    Failed(String),
    /// The load was cancelled before the fetch finished.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<T> {
    pub state: DataState<T>,
    pub remote: RemoteStatus,
}

impl<T> Reconciled<T> {
    pub fn is_offline(&self) -> bool {
        matches!(self.remote, RemoteStatus::Failed(_))
    }
}

/// Result of a local-first write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Saved locally and accepted by the server.
    Synced,
    /// Saved locally only. The server push failed with the given reason
    /// and is not retried.
    LocalOnly(String),
}

/// Reconciles cached values with the server for one user.
#[derive(Debug, Clone)]
pub struct SyncReconciler {
    cache: Arc<CacheManager>,
    locks: Arc<KeyLocks>,
}

impl SyncReconciler {
    pub fn new(cache: Arc<CacheManager>, locks: Arc<KeyLocks>) -> Self {
        Self { cache, locks }
    }

    /// Open the cache namespace of the session's user below `cache_root`.
    pub fn for_session(cache_root: &Path, session: &SessionData) -> Result<Self> {
        let cache = CacheManager::for_user(cache_root, session.user_id())
            .with_context(|| format!("Failed to open cache for user {}", session.user_id()))?;
        Ok(Self::new(Arc::new(cache), Arc::new(KeyLocks::new())))
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub fn locks(&self) -> &Arc<KeyLocks> {
        &self.locks
    }

    /// Publish the cached value for `key` right away, then try the server.
    ///
    /// A successful fetch overwrites the cache and supersedes the cached
    /// value. A failed fetch keeps whatever was published from the cache,
    /// or publishes `Empty` when there was nothing cached. Only one load or
    /// write per key runs at a time. Once `cancel` fires nothing further is
    /// written or published.
    pub async fn load_with_fallback<T, F, Fut>(
        &self,
        key: &CacheKey,
        remote_fetch: F,
        view: &ViewState<T>,
        cancel: &CancellationToken,
    ) -> Reconciled<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Self::cancelled(key, view),
            guard = self.locks.acquire(key) => guard,
        };

        let had_cache = match self.cache.load::<T>(key) {
            Ok(Some(cached)) => {
                debug!(key = %key, age = %cached.age_display(), "Publishing cached value");
                view.publish(cached.into());
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(key = %key, error = %e, "Ignoring unreadable cache entry");
                false
            }
        };

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Self::cancelled(key, view),
            res = remote_fetch() => res,
        };

        match fetched {
            Ok(data) => {
                if let Err(e) = self.cache.save(key, &data) {
                    warn!(key = %key, error = %e, "Failed to cache fetched value");
                }
                view.publish(DataState::Fresh { data });
                info!(key = %key, "Refreshed from server");
                Reconciled {
                    state: view.snapshot(),
                    remote: RemoteStatus::Refreshed,
                }
            }
            Err(e) => {
                warn!(key = %key, had_cache, error = %format!("{:#}", e), "Remote fetch failed, keeping cached value");
                if !had_cache {
                    view.publish(DataState::Empty);
                }
                Reconciled {
                    state: view.snapshot(),
                    remote: RemoteStatus::Failed(format!("{:#}", e)),
                }
            }
        }
    }

    fn cancelled<T: Clone>(key: &CacheKey, view: &ViewState<T>) -> Reconciled<T> {
        debug!(key = %key, "Load cancelled");
        Reconciled {
            state: view.snapshot(),
            remote: RemoteStatus::Cancelled,
        }
    }

    /// Save `value` locally, then push it with `push`.
    ///
    /// The local save must succeed. A failed push leaves the local value in
    /// place and is reported as `PushOutcome::LocalOnly`.
    pub async fn store_and_push<T, F, Fut>(&self, key: &CacheKey, value: &T, push: F) -> Result<PushOutcome>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let _guard = self.locks.acquire(key).await;

        self.cache
            .save(key, value)
            .with_context(|| format!("Failed to save {} locally", key))?;

        match push().await {
            Ok(()) => {
                info!(key = %key, "Saved and synced");
                Ok(PushOutcome::Synced)
            }
            Err(e) => {
                warn!(key = %key, error = %format!("{:#}", e), "Saved locally, server update failed");
                Ok(PushOutcome::LocalOnly(format!("{:#}", e)))
            }
        }
    }

    /// Apply `change` to the cached value under the key lock, after the
    /// server has confirmed a write. Returns false when nothing is cached.
    pub async fn amend_cached<T, F>(&self, key: &CacheKey, change: F) -> Result<bool>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T),
    {
        let _guard = self.locks.acquire(key).await;
        let Some(mut cached) = self.cache.load::<T>(key)? else {
            return Ok(false);
        };
        change(&mut cached.data);
        self.cache.save(key, &cached.data)?;
        Ok(true)
    }

    /// Like `amend_cached`, but starts from `T::default()` when nothing is
    /// cached yet, so a confirmed write is never dropped from the cache.
    pub async fn amend_or_default<T, F>(&self, key: &CacheKey, change: F) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T),
    {
        let _guard = self.locks.acquire(key).await;
        let mut value = self.cache.load::<T>(key)?.map(|c| c.data).unwrap_or_default();
        change(&mut value);
        self.cache.save(key, &value)
    }
}
