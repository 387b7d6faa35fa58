//! Local-only earnings ledger.
//!
//! Earnings are logged on the device under `earnings_<userId>` and summed
//! per month for display. They are never sent to the server.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::{CacheKey, CacheManager, KeyLocks};
use crate::models::EarningEntry;

/// Per-month totals for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsSummary {
    pub year: i32,
    /// Index 0 is January.
    pub monthly: [f64; 12],
    pub current_month_total: f64,
}

impl EarningsSummary {
    /// Sum `entries` for `year`; `month` (1-12) selects the current-month total.
    /// Entries from other years are ignored.
    pub fn for_month(entries: &[EarningEntry], year: i32, month: u32) -> Self {
        let mut monthly = [0.0; 12];
        for entry in entries.iter().filter(|e| e.date.year() == year) {
            if entry.amount.is_finite() {
                monthly[entry.date.month0() as usize] += entry.amount;
            }
        }
        let current_month_total = month
            .checked_sub(1)
            .and_then(|m| monthly.get(m as usize).copied())
            .unwrap_or(0.0);

        Self {
            year,
            monthly,
            current_month_total,
        }
    }

    pub fn at(entries: &[EarningEntry], now: DateTime<Utc>) -> Self {
        Self::for_month(entries, now.year(), now.month())
    }

    pub fn year_total(&self) -> f64 {
        self.monthly.iter().sum()
    }
}

pub struct EarningsLedger {
    cache: Arc<CacheManager>,
    locks: Arc<KeyLocks>,
    user_id: String,
}

impl EarningsLedger {
    pub fn new(cache: Arc<CacheManager>, locks: Arc<KeyLocks>, user_id: &str) -> Self {
        Self {
            cache,
            locks,
            user_id: user_id.to_string(),
        }
    }

    fn key(&self) -> CacheKey {
        CacheKey::earnings(&self.user_id)
    }

    /// All logged entries. An unreadable ledger reads as empty.
    pub fn entries(&self) -> Vec<EarningEntry> {
        match self.cache.load_earnings(&self.user_id) {
            Ok(Some(cached)) => cached.data,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Failed to read earnings ledger");
                Vec::new()
            }
        }
    }

    /// Append an entry. The read-modify-write holds the key lock so two
    /// concurrent adds cannot drop each other's entry.
    pub async fn add(&self, amount: f64, source: Option<&str>) -> Result<EarningEntry> {
        let _guard = self.locks.acquire(&self.key()).await;

        let mut entries = match self.cache.load_earnings(&self.user_id) {
            Ok(Some(cached)) => cached.data,
            Ok(None) => Vec::new(),
            Err(e) => return Err(e).context("Refusing to overwrite unreadable earnings ledger"),
        };

        let entry = EarningEntry::new(amount, source, Utc::now());
        entries.push(entry.clone());
        self.cache
            .save_earnings(&self.user_id, &entries)
            .context("Could not save earning")?;

        info!(user_id = %self.user_id, amount = entry.amount, source = %entry.source, "Earning logged");
        Ok(entry)
    }

    pub fn summary(&self, now: DateTime<Utc>) -> EarningsSummary {
        EarningsSummary::at(&self.entries(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(amount: f64, date: &str) -> EarningEntry {
        EarningEntry::new(amount, Some("Freelance"), date.parse().expect("date"))
    }

    #[test]
    fn test_summary_buckets_by_month() {
        let entries = vec![
            entry(100.0, "2024-01-15T10:00:00Z"),
            entry(50.0, "2024-01-20T10:00:00Z"),
            entry(75.0, "2024-03-01T00:00:00Z"),
            entry(999.0, "2023-03-01T00:00:00Z"),
        ];
        let s = EarningsSummary::for_month(&entries, 2024, 3);
        assert_eq!(s.monthly[0], 150.0);
        assert_eq!(s.monthly[1], 0.0);
        assert_eq!(s.monthly[2], 75.0);
        assert_eq!(s.current_month_total, 75.0);
        assert_eq!(s.year_total(), 225.0);
    }

    #[test]
    fn test_summary_invalid_month_is_zero() {
        let entries = vec![entry(10.0, "2024-01-01T00:00:00Z")];
        assert_eq!(EarningsSummary::for_month(&entries, 2024, 0).current_month_total, 0.0);
        assert_eq!(EarningsSummary::for_month(&entries, 2024, 13).current_month_total, 0.0);
    }

    #[tokio::test]
    async fn test_ledger_add_persists_locally() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = Arc::new(CacheManager::for_user(dir.path(), "u1").expect("cache"));
        let ledger = EarningsLedger::new(Arc::clone(&cache), Arc::new(KeyLocks::new()), "u1");

        assert!(ledger.entries().is_empty());
        ledger.add(500.0, Some("Tutoring")).await.expect("add");
        ledger.add(250.0, None).await.expect("add");

        let entries = ledger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].source, "Other");
        assert!(dir.path().join("users/u1/earnings_u1.json").exists());

        let summary = ledger.summary(Utc::now());
        assert_eq!(summary.current_month_total, 750.0);
    }

    #[tokio::test]
    async fn test_concurrent_adds_keep_every_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = Arc::new(CacheManager::for_user(dir.path(), "u1").expect("cache"));
        let ledger = Arc::new(EarningsLedger::new(cache, Arc::new(KeyLocks::new()), "u1"));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move { ledger.add(10.0 + i as f64, None).await })
            })
            .collect();
        for task in futures::future::join_all(tasks).await {
            task.expect("join").expect("add");
        }

        assert_eq!(ledger.entries().len(), 8);
    }

    #[tokio::test]
    async fn test_corrupt_ledger_is_not_overwritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = Arc::new(CacheManager::for_user(dir.path(), "u1").expect("cache"));
        let path = dir.path().join("users/u1/earnings_u1.json");
        std::fs::write(&path, "garbage").expect("write");

        let ledger = EarningsLedger::new(cache, Arc::new(KeyLocks::new()), "u1");
        assert!(ledger.add(10.0, None).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "garbage");
    }
}
