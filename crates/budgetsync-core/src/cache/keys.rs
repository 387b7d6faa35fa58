use std::fmt;

/// Name of a cached value inside a user's cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    UserData,
    UserBudget,
    Expenses,
    Earnings(String),
}

impl CacheKey {
    pub fn earnings(user_id: &str) -> Self {
        CacheKey::Earnings(user_id.to_string())
    }

    /// File stem used on disk. Characters outside `[A-Za-z0-9_-]` are
    /// replaced so a user id can never escape the cache directory.
    pub fn file_stem(&self) -> String {
        match self {
            CacheKey::UserData => "userData".to_string(),
            CacheKey::UserBudget => "userBudget".to_string(),
            CacheKey::Expenses => "expenses".to_string(),
            CacheKey::Earnings(user_id) => format!("earnings_{}", sanitize_segment(user_id)),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

pub(crate) fn sanitize_segment(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
