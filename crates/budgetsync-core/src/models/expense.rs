use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed expense category set. `Savings` entries feed the emergency fund
/// instead of counting as spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExpenseCategory {
    Housing,
    Food,
    Transportation,
    Utilities,
    Entertainment,
    Healthcare,
    Shopping,
    Subscription,
    Savings,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 10] = [
        ExpenseCategory::Housing,
        ExpenseCategory::Food,
        ExpenseCategory::Transportation,
        ExpenseCategory::Utilities,
        ExpenseCategory::Entertainment,
        ExpenseCategory::Healthcare,
        ExpenseCategory::Shopping,
        ExpenseCategory::Subscription,
        ExpenseCategory::Savings,
        ExpenseCategory::Other,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExpenseCategory::Housing => "Housing",
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Transportation => "Transportation",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::Entertainment => "Entertainment",
            ExpenseCategory::Healthcare => "Healthcare",
            ExpenseCategory::Shopping => "Shopping",
            ExpenseCategory::Subscription => "Subscription",
            ExpenseCategory::Savings => "Savings",
            ExpenseCategory::Other => "Other",
        }
    }

    /// Case-insensitive lookup. Returns `None` for names outside the set.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|c| c.name().eq_ignore_ascii_case(s))
    }

    pub fn is_savings(&self) -> bool {
        matches!(self, ExpenseCategory::Savings)
    }
}

impl From<String> for ExpenseCategory {
    fn from(s: String) -> Self {
        Self::parse(&s).unwrap_or(ExpenseCategory::Other)
    }
}

impl From<ExpenseCategory> for String {
    fn from(c: ExpenseCategory) -> Self {
        c.name().to_string()
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A recorded expense. Amount and category are fixed once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}

/// Payload for `POST /api/expenses`.
#[derive(Debug, Clone, Serialize)]
pub struct NewExpense {
    pub amount: f64,
    pub category: ExpenseCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}
