//! Budget profile created during onboarding and edited from settings.

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentFrequency {
    Weekly,
    BiWeekly,
    Monthly,
}

impl PaymentFrequency {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Some(Self::Weekly),
            "bi-weekly" | "biweekly" => Some(Self::BiWeekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentFrequency::Weekly => write!(f, "Weekly"),
            PaymentFrequency::BiWeekly => write!(f, "Bi-weekly"),
            PaymentFrequency::Monthly => write!(f, "Monthly"),
        }
    }
}

/// One per user. Never deleted, only overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProfile {
    #[serde(default)]
    pub monthly_income: f64,
    #[serde(default)]
    pub payment_frequency: Option<PaymentFrequency>,
    #[serde(default)]
    pub spending_categories: Vec<String>,
    #[serde(default)]
    pub target_savings_rate: f64,
    #[serde(default)]
    pub emergency_fund_goal: f64,
    #[serde(default)]
    pub annual_savings_goal: f64,
}

impl BudgetProfile {
    pub fn new(monthly_income: f64, payment_frequency: PaymentFrequency) -> Self {
        Self {
            monthly_income,
            payment_frequency: Some(payment_frequency),
            spending_categories: Vec::new(),
            target_savings_rate: 0.0,
            emergency_fund_goal: 0.0,
            annual_savings_goal: 0.0,
        }
    }

    /// Add the category if absent, remove it if present.
    pub fn toggle_category(&mut self, name: &str) {
        if let Some(pos) = self.spending_categories.iter().position(|c| c == name) {
            self.spending_categories.remove(pos);
        } else {
            self.spending_categories.push(name.to_string());
        }
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.spending_categories.iter().any(|c| c == name)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::default();
        if !self.monthly_income.is_finite() || self.monthly_income < 0.0 {
            err.push("monthlyIncome", "Monthly Income must be a non-negative number");
        }
        if !(0.0..=100.0).contains(&self.target_savings_rate) {
            err.push("targetSavingsRate", "Target Savings Rate must be between 0 and 100");
        }
        if !self.emergency_fund_goal.is_finite() || self.emergency_fund_goal < 0.0 {
            err.push("emergencyFundGoal", "Emergency Fund Goal must be a non-negative number");
        }
        if !self.annual_savings_goal.is_finite() || self.annual_savings_goal < 0.0 {
            err.push("annualSavingsGoal", "Annual Savings Goal must be a non-negative number");
        }
        err.into_result()
    }
}

/// Partial update from the settings screen. Fields left as `None` keep their
/// existing value; frequency and categories are never touched.
#[derive(Debug, Clone, Default)]
pub struct BudgetEdit {
    pub monthly_income: Option<f64>,
    pub target_savings_rate: Option<f64>,
    pub emergency_fund_goal: Option<f64>,
    pub annual_savings_goal: Option<f64>,
}

impl BudgetEdit {
    pub fn apply_to(&self, existing: &BudgetProfile) -> BudgetProfile {
        BudgetProfile {
            monthly_income: self.monthly_income.unwrap_or(existing.monthly_income),
            target_savings_rate: self.target_savings_rate.unwrap_or(existing.target_savings_rate),
            emergency_fund_goal: self.emergency_fund_goal.unwrap_or(existing.emergency_fund_goal),
            annual_savings_goal: self.annual_savings_goal.unwrap_or(existing.annual_savings_goal),
            ..existing.clone()
        }
    }
}
