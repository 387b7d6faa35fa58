use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{BudgetProfile, EarningEntry, ExpenseEntry, User};

use super::keys::sanitize_segment;
use super::CacheKey;

/// Consider cache stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

/// Subdirectory of the cache root holding one directory per user.
const USERS_DIR: &str = "users";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// File-backed key-value cache for a single user.
#[derive(Debug)]
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    /// Open the cache namespace of `user_id` below the cache root.
    pub fn for_user(cache_root: &Path, user_id: &str) -> Result<Self> {
        Self::new(cache_root.join(USERS_DIR).join(sanitize_segment(user_id)))
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key.file_stem()))
    }

    pub fn load<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", key))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", key))?;

        Ok(Some(cached))
    }

    /// Overwrite the value stored under `key`. The file is written to a
    /// temporary sibling first and renamed, so readers never see a torn write.
    pub fn save<T: Serialize>(&self, key: &CacheKey, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let path = self.cache_path(key);
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write cache file: {}", key))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace cache file: {}", key))?;
        debug!(key = %key, "Cache entry saved");
        Ok(())
    }

    // ===== User =====

    pub fn load_user(&self) -> Result<Option<CachedData<User>>> {
        self.load(&CacheKey::UserData)
    }

    pub fn save_user(&self, user: &User) -> Result<()> {
        self.save(&CacheKey::UserData, user)
    }

    // ===== Budget =====

    pub fn load_budget(&self) -> Result<Option<CachedData<BudgetProfile>>> {
        self.load(&CacheKey::UserBudget)
    }

    pub fn save_budget(&self, budget: &BudgetProfile) -> Result<()> {
        self.save(&CacheKey::UserBudget, budget)
    }

    // ===== Expenses =====

    pub fn load_expenses(&self) -> Result<Option<CachedData<Vec<ExpenseEntry>>>> {
        self.load(&CacheKey::Expenses)
    }

    pub fn save_expenses(&self, expenses: &[ExpenseEntry]) -> Result<()> {
        self.save(&CacheKey::Expenses, &expenses)
    }

    // ===== Earnings =====

    pub fn load_earnings(&self, user_id: &str) -> Result<Option<CachedData<Vec<EarningEntry>>>> {
        self.load(&CacheKey::earnings(user_id))
    }

    pub fn save_earnings(&self, user_id: &str, entries: &[EarningEntry]) -> Result<()> {
        self.save(&CacheKey::earnings(user_id), &entries)
    }

    // ===== Cache Age Information =====

    /// Helper to load cache and log errors without failing
    fn load_age<T>(&self, name: &str, loader: impl FnOnce() -> Result<Option<CachedData<T>>>) -> Option<String> {
        match loader() {
            Ok(Some(cached)) => Some(cached.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }

    pub fn get_cache_ages(&self) -> CacheAges {
        CacheAges {
            budget: self.load_age("budget", || self.load_budget()),
            expenses: self.load_age("expenses", || self.load_expenses()),
            user: self.load_age("user", || self.load_user()),
        }
    }
}

#[derive(Debug, Default)]
pub struct CacheAges {
    pub budget: Option<String>,
    pub expenses: Option<String>,
    pub user: Option<String>,
}

impl CacheAges {
    /// Age of the cached budget, falling back to the expenses, or "never"
    pub fn last_updated(&self) -> String {
        [&self.budget, &self.expenses]
            .into_iter()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
