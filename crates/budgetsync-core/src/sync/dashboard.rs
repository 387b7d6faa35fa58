//! Dashboard load: budget, profile and expenses reconciled concurrently.

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::ApiClient;
use crate::cache::{CacheAges, CacheKey};
use crate::metrics::{CategoryAllocation, DashboardMetrics};
use crate::models::{BudgetProfile, ExpenseEntry, User};

use super::reconciler::{Reconciled, SyncReconciler, ViewState};

/// The observable slots the dashboard renders from.
#[derive(Debug, Default)]
pub struct DashboardViews {
    pub budget: ViewState<BudgetProfile>,
    pub user: ViewState<User>,
    pub expenses: ViewState<Vec<ExpenseEntry>>,
}

#[derive(Debug)]
pub struct DashboardSnapshot {
    pub budget: Reconciled<BudgetProfile>,
    pub user: Reconciled<User>,
    pub expenses: Reconciled<Vec<ExpenseEntry>>,
    /// Present whenever a budget is available, cached or fresh.
    pub metrics: Option<DashboardMetrics>,
    pub allocation: Option<CategoryAllocation>,
    pub ages: CacheAges,
}

impl DashboardSnapshot {
    /// No budget anywhere: the user has to go through setup first.
    pub fn needs_onboarding(&self) -> bool {
        !self.budget.state.has_data()
    }

    /// At least one branch could not reach the server.
    pub fn is_offline(&self) -> bool {
        self.budget.is_offline() || self.user.is_offline() || self.expenses.is_offline()
    }

    pub fn expenses(&self) -> &[ExpenseEntry] {
        self.expenses.state.data().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Reconcile the three dashboard keys at once. Each branch falls back to
/// its own cache independently; one failing never blocks the others.
pub async fn load_dashboard(
    sync: &SyncReconciler,
    api: &ApiClient,
    views: &DashboardViews,
    cancel: &CancellationToken,
) -> DashboardSnapshot {
    let (budget, user, expenses) = tokio::join!(
        sync.load_with_fallback(
            &CacheKey::UserBudget,
            || async {
                api.fetch_budget()
                    .await?
                    .ok_or_else(|| anyhow!("No budget stored on the server"))
            },
            &views.budget,
            cancel,
        ),
        sync.load_with_fallback(&CacheKey::UserData, || api.fetch_me(), &views.user, cancel),
        sync.load_with_fallback(&CacheKey::Expenses, || api.fetch_expenses(), &views.expenses, cancel),
    );

    let no_expenses: Vec<ExpenseEntry> = Vec::new();
    let expense_list = expenses.state.data().unwrap_or(&no_expenses);
    let (metrics, allocation) = match budget.state.data() {
        Some(profile) => (
            Some(DashboardMetrics::compute(profile, expense_list)),
            Some(CategoryAllocation::compute(profile)),
        ),
        None => (None, None),
    };

    info!(
        budget_fresh = budget.state.is_fresh(),
        user_fresh = user.state.is_fresh(),
        expenses_fresh = expenses.state.is_fresh(),
        expense_count = expense_list.len(),
        "Dashboard loaded"
    );

    DashboardSnapshot {
        budget,
        user,
        expenses,
        metrics,
        allocation,
        ages: sync.cache().get_cache_ages(),
    }
}

impl DashboardViews {
    pub fn new() -> Self {
        Self::default()
    }
}
