use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default source label when the user leaves it blank.
pub const DEFAULT_EARNING_SOURCE: &str = "Other";

/// A locally logged earning. Never sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningEntry {
    pub id: String,
    pub amount: f64,
    pub source: String,
    pub date: DateTime<Utc>,
}

impl EarningEntry {
    /// The id is the creation time in milliseconds.
    pub fn new(amount: f64, source: Option<&str>, date: DateTime<Utc>) -> Self {
        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_EARNING_SOURCE);
        Self {
            id: date.timestamp_millis().to_string(),
            amount,
            source: source.to_string(),
            date,
        }
    }
}
