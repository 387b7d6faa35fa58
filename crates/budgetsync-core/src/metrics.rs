//! Dashboard calculations.
//!
//! Everything here is a pure function of a `BudgetProfile` and a list of
//! `ExpenseEntry` values. Expenses in the `Savings` category count toward
//! the emergency fund, not toward spending.

use serde::Serialize;

use crate::models::{BudgetProfile, ExpenseEntry};

/// Sum of expense amounts outside the Savings category.
pub fn total_spent(expenses: &[ExpenseEntry]) -> f64 {
    expenses
        .iter()
        .filter(|e| !e.category.is_savings())
        .map(|e| e.amount)
        .sum()
}

/// Sum of expense amounts in the Savings category.
pub fn emergency_fund_saved(expenses: &[ExpenseEntry]) -> f64 {
    expenses
        .iter()
        .filter(|e| e.category.is_savings())
        .map(|e| e.amount)
        .sum()
}

pub fn available_balance(monthly_income: f64, total_spent: f64, emergency_fund_saved: f64) -> f64 {
    monthly_income - total_spent - emergency_fund_saved
}

/// Share of income already used, 0 when there is no income.
pub fn spend_percentage(monthly_income: f64, total_spent: f64, emergency_fund_saved: f64) -> f64 {
    if monthly_income > 0.0 {
        (total_spent + emergency_fund_saved) / monthly_income * 100.0
    } else {
        0.0
    }
}

/// Share of income not spent, 0 when there is no income.
pub fn actual_savings_rate(monthly_income: f64, total_spent: f64) -> f64 {
    if monthly_income > 0.0 {
        (monthly_income - total_spent) / monthly_income * 100.0
    } else {
        0.0
    }
}

/// Rounded percentage toward the emergency fund goal, clamped to 0..=100.
/// A goal of zero (or less) reports 0 rather than "met".
pub fn emergency_progress(saved: f64, goal: f64) -> u8 {
    if goal <= 0.0 || !goal.is_finite() || !saved.is_finite() {
        return 0;
    }
    (saved / goal * 100.0).round().clamp(0.0, 100.0) as u8
}

pub fn emergency_remaining(saved: f64, goal: f64) -> f64 {
    (goal - saved).max(0.0)
}

/// Expected monthly savings shown while onboarding. `None` until both the
/// income and the rate are positive.
pub fn savings_estimate(monthly_income: f64, savings_rate: f64) -> Option<f64> {
    if monthly_income > 0.0 && savings_rate > 0.0 {
        Some(monthly_income * savings_rate / 100.0)
    } else {
        None
    }
}

/// The add-expense flow refuses expenses larger than what is left.
pub fn exceeds_available(amount: f64, available: f64) -> bool {
    amount > available
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressTier {
    Starting,
    Building,
    Halfway,
    Almost,
    Met,
}

impl ProgressTier {
    pub fn from_progress(progress: u8) -> Self {
        match progress {
            100.. => ProgressTier::Met,
            75.. => ProgressTier::Almost,
            50.. => ProgressTier::Halfway,
            25.. => ProgressTier::Building,
            _ => ProgressTier::Starting,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ProgressTier::Starting => "Great start! Every bit counts towards your financial security.",
            ProgressTier::Building => "You're making progress! Keep up the momentum.",
            ProgressTier::Halfway => "Halfway there! Your future self will thank you.",
            ProgressTier::Almost => "Almost there! You're so close to reaching your goal!",
            ProgressTier::Met => "Congratulations! You've reached your emergency fund goal. Keep it up!",
        }
    }
}

/// Suggested split of the non-savings budget. Every selected category gets
/// the same share; this is a display aid, not a planner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAllocation {
    pub savings_amount: f64,
    pub remaining_budget: f64,
    pub amount_per_category: f64,
    pub allocations: Vec<(String, f64)>,
}

impl CategoryAllocation {
    pub fn compute(profile: &BudgetProfile) -> Self {
        let savings_amount = profile.monthly_income * profile.target_savings_rate / 100.0;
        let remaining_budget = profile.monthly_income - savings_amount;
        let count = profile.spending_categories.len();
        let amount_per_category = if count > 0 {
            remaining_budget / count as f64
        } else {
            0.0
        };
        let allocations = profile
            .spending_categories
            .iter()
            .map(|c| (c.clone(), amount_per_category))
            .collect();

        Self {
            savings_amount,
            remaining_budget,
            amount_per_category,
            allocations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub monthly_income: f64,
    pub total_spent: f64,
    pub emergency_fund_saved: f64,
    pub available_balance: f64,
    pub spend_percentage: f64,
    pub actual_savings_rate: f64,
    pub emergency_fund_goal: f64,
    pub emergency_progress: u8,
    pub emergency_remaining: f64,
}

impl DashboardMetrics {
    pub fn compute(profile: &BudgetProfile, expenses: &[ExpenseEntry]) -> Self {
        let income = profile.monthly_income;
        let spent = total_spent(expenses);
        let saved = emergency_fund_saved(expenses);

        Self {
            monthly_income: income,
            total_spent: spent,
            emergency_fund_saved: saved,
            available_balance: available_balance(income, spent, saved),
            spend_percentage: spend_percentage(income, spent, saved),
            actual_savings_rate: actual_savings_rate(income, spent),
            emergency_fund_goal: profile.emergency_fund_goal,
            emergency_progress: emergency_progress(saved, profile.emergency_fund_goal),
            emergency_remaining: emergency_remaining(saved, profile.emergency_fund_goal),
        }
    }

    pub fn is_goal_met(&self) -> bool {
        self.emergency_progress >= 100
    }

    pub fn progress_tier(&self) -> ProgressTier {
        ProgressTier::from_progress(self.emergency_progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseCategory, PaymentFrequency};
    use chrono::Utc;

    fn expense(amount: f64, category: ExpenseCategory) -> ExpenseEntry {
        ExpenseEntry {
            id: format!("{}-{}", category, amount),
            amount,
            category,
            description: None,
            date: Utc::now(),
        }
    }

    fn profile(income: f64) -> BudgetProfile {
        BudgetProfile::new(income, PaymentFrequency::Monthly)
    }

    #[test]
    fn test_zero_income_is_never_nan() {
        let expenses = vec![
            expense(100.0, ExpenseCategory::Food),
            expense(50.0, ExpenseCategory::Savings),
        ];
        let m = DashboardMetrics::compute(&profile(0.0), &expenses);
        assert_eq!(m.spend_percentage, 0.0);
        assert_eq!(m.actual_savings_rate, 0.0);
        assert!(m.spend_percentage.is_finite());
        assert!(m.actual_savings_rate.is_finite());
    }

    #[test]
    fn test_accounting_identity() {
        let cases: Vec<(f64, Vec<ExpenseEntry>)> = vec![
            (20000.0, vec![]),
            (
                20000.0,
                vec![
                    expense(1234.56, ExpenseCategory::Food),
                    expense(8000.0, ExpenseCategory::Housing),
                    expense(1500.25, ExpenseCategory::Savings),
                ],
            ),
            (
                500.0,
                vec![
                    expense(900.0, ExpenseCategory::Shopping),
                    expense(10.1, ExpenseCategory::Other),
                ],
            ),
            (0.0, vec![expense(0.3, ExpenseCategory::Savings)]),
        ];

        for (income, expenses) in cases {
            let m = DashboardMetrics::compute(&profile(income), &expenses);
            let sum = m.total_spent + m.emergency_fund_saved + m.available_balance;
            assert!((sum - income).abs() < 1e-9, "income {income}: got {sum}");
        }
    }

    #[test]
    fn test_savings_category_is_not_spending() {
        let expenses = vec![
            expense(300.0, ExpenseCategory::Food),
            expense(200.0, ExpenseCategory::Savings),
            expense(100.0, ExpenseCategory::Transportation),
        ];
        assert_eq!(total_spent(&expenses), 400.0);
        assert_eq!(emergency_fund_saved(&expenses), 200.0);

        let m = DashboardMetrics::compute(&profile(1000.0), &expenses);
        assert_eq!(m.available_balance, 400.0);
        assert_eq!(m.spend_percentage, 60.0);
        assert_eq!(m.actual_savings_rate, 60.0);
    }

    #[test]
    fn test_emergency_progress_scenarios() {
        assert_eq!(emergency_progress(6500.0, 10000.0), 65);
        assert_eq!(emergency_progress(12000.0, 10000.0), 100);
        assert_eq!(emergency_progress(0.0, 10000.0), 0);
        assert_eq!(emergency_progress(-50.0, 10000.0), 0);
        assert_eq!(emergency_progress(1.0, 3.0), 33);
        assert_eq!(emergency_progress(2.0, 3.0), 67);
    }

    #[test]
    fn test_emergency_progress_zero_goal() {
        assert_eq!(emergency_progress(500.0, 0.0), 0);
        assert_eq!(emergency_progress(0.0, 0.0), 0);
    }

    #[test]
    fn test_emergency_progress_always_in_range() {
        for saved in [0.0, 1.0, 99.4, 99.5, 5000.0, 1e12] {
            for goal in [-1.0, 0.0, 1.0, 100.0, 10000.0] {
                assert!(emergency_progress(saved, goal) <= 100);
            }
        }
    }

    #[test]
    fn test_allocation_scenario() {
        let mut p = profile(20000.0);
        p.target_savings_rate = 10.0;
        p.toggle_category("Housing");
        p.toggle_category("Food");
        p.toggle_category("Transportation");

        let a = CategoryAllocation::compute(&p);
        assert_eq!(a.savings_amount, 2000.0);
        assert_eq!(a.remaining_budget, 18000.0);
        assert_eq!(a.amount_per_category, 6000.0);
        assert_eq!(a.allocations.len(), 3);
        assert!(a.allocations.iter().all(|(_, amount)| *amount == 6000.0));
    }

    #[test]
    fn test_allocation_without_categories() {
        let a = CategoryAllocation::compute(&profile(1000.0));
        assert_eq!(a.amount_per_category, 0.0);
        assert!(a.allocations.is_empty());
        assert_eq!(a.remaining_budget, 1000.0);
    }

    #[test]
    fn test_goal_met_and_tiers() {
        let mut p = profile(30000.0);
        p.emergency_fund_goal = 10000.0;

        let m = DashboardMetrics::compute(&p, &[expense(12000.0, ExpenseCategory::Savings)]);
        assert!(m.is_goal_met());
        assert_eq!(m.emergency_remaining, 0.0);
        assert_eq!(m.progress_tier(), ProgressTier::Met);

        let m = DashboardMetrics::compute(&p, &[expense(6500.0, ExpenseCategory::Savings)]);
        assert_eq!(m.emergency_progress, 65);
        assert_eq!(m.emergency_remaining, 3500.0);
        assert_eq!(m.progress_tier(), ProgressTier::Halfway);

        assert_eq!(ProgressTier::from_progress(0), ProgressTier::Starting);
        assert_eq!(ProgressTier::from_progress(25), ProgressTier::Building);
        assert_eq!(ProgressTier::from_progress(80), ProgressTier::Almost);
    }

    #[test]
    fn test_savings_estimate_and_overspend_guard() {
        assert_eq!(savings_estimate(20000.0, 10.0), Some(2000.0));
        assert_eq!(savings_estimate(0.0, 10.0), None);
        assert_eq!(savings_estimate(20000.0, 0.0), None);

        assert!(exceeds_available(500.0, 499.99));
        assert!(!exceeds_available(500.0, 500.0));
    }
}
