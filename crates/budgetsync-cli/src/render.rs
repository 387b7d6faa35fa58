//! Plain-text output for each command.

use budgetsync_core::cache::CachedData;
use budgetsync_core::community;
use budgetsync_core::earnings::EarningsSummary;
use budgetsync_core::models::{
    Article, BudgetProfile, Category, CommunityPost, EarningEntry, ExpenseEntry, Job, User,
};
use budgetsync_core::sync::{DashboardSnapshot, DataState, PushOutcome, Reconciled, RemoteStatus};
use budgetsync_core::utils::{format_currency, format_date, format_percent, progress_bar, truncate_string};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Width of the emergency fund progress bar
const PROGRESS_WIDTH: usize = 30;

/// Maximum characters of post content shown in the feed
const POST_PREVIEW_CHARS: usize = 120;

/// One line describing where the shown data came from.
pub fn freshness<T>(reconciled: &Reconciled<T>) -> String {
    match (&reconciled.state, &reconciled.remote) {
        (DataState::Fresh { .. }, _) => "up to date".to_string(),
        (DataState::Stale { cached_at, .. }, RemoteStatus::Cancelled) => {
            format!("cached {}, refresh cancelled", age(*cached_at))
        }
        (DataState::Stale { cached_at, .. }, _) => {
            let saved = CachedData { data: (), cached_at: *cached_at };
            let note = if saved.is_stale() { ", may be out of date" } else { "" };
            format!("offline, showing data saved {}{}", saved.age_display(), note)
        }
        (DataState::Empty, _) | (DataState::Loading, _) => "no data".to_string(),
    }
}

fn age(cached_at: chrono::DateTime<chrono::Utc>) -> String {
    CachedData { data: (), cached_at }.age_display()
}

pub fn push_outcome(action: &str, outcome: &PushOutcome) {
    match outcome {
        PushOutcome::Synced => println!("{}.", action),
        PushOutcome::LocalOnly(reason) => {
            println!("{} on this device.", action);
            println!("Could not update the server ({}). Your changes are kept locally.", reason);
        }
    }
}

pub fn dashboard(snapshot: &DashboardSnapshot) {
    let name = snapshot
        .user
        .state
        .data()
        .map(|u| u.display_name().to_string())
        .unwrap_or_else(|| "Friend".to_string());
    println!("Hello, {}!", name);

    if snapshot.needs_onboarding() {
        println!();
        println!("You have not set up a budget yet.");
        println!("Run `budgetsync budget setup --income <amount> --frequency monthly` to get started.");
        return;
    }

    if snapshot.is_offline() {
        println!("({}; last updated {})", freshness(&snapshot.budget), snapshot.ages.last_updated());
    }

    if let Some(ref m) = snapshot.metrics {
        println!();
        println!("Monthly income      {:>16}", format_currency(m.monthly_income));
        println!("Spent               {:>16}", format_currency(m.total_spent));
        println!("Emergency fund      {:>16}", format_currency(m.emergency_fund_saved));
        println!("Available           {:>16}", format_currency(m.available_balance));
        println!("Used of income      {:>16}", format_percent(m.spend_percentage));
        println!("Savings rate        {:>16}", format_percent(m.actual_savings_rate));

        println!();
        println!(
            "Emergency fund {} {}% of {}",
            progress_bar(m.emergency_progress, PROGRESS_WIDTH),
            m.emergency_progress,
            format_currency(m.emergency_fund_goal)
        );
        if !m.is_goal_met() && m.emergency_fund_goal > 0.0 {
            println!("{} to go.", format_currency(m.emergency_remaining));
        }
        println!("{}", m.progress_tier().message());
    }

    if let Some(ref a) = snapshot.allocation {
        if !a.allocations.is_empty() {
            println!();
            println!("Suggested budget ({} after savings)", format_currency(a.remaining_budget));
            for (category, amount) in &a.allocations {
                println!("  {:<18}{:>16}", category, format_currency(*amount));
            }
        }
    }

    let recent: Vec<&ExpenseEntry> = snapshot.expenses().iter().rev().take(5).collect();
    if !recent.is_empty() {
        println!();
        println!("Recent expenses");
        for e in recent {
            expense_line(e);
        }
    }
}

pub fn budget(reconciled: &Reconciled<BudgetProfile>) {
    let Some(b) = reconciled.state.data() else {
        println!("No budget yet. Run `budgetsync budget setup` to create one.");
        return;
    };
    println!("Budget ({})", freshness(reconciled));
    println!("  Monthly income        {}", format_currency(b.monthly_income));
    println!(
        "  Paid                  {}",
        b.payment_frequency.map(|f| f.to_string()).unwrap_or_else(|| "-".to_string())
    );
    println!("  Target savings rate   {}", format_percent(b.target_savings_rate));
    println!("  Emergency fund goal   {}", format_currency(b.emergency_fund_goal));
    println!("  Annual savings goal   {}", format_currency(b.annual_savings_goal));
    if !b.spending_categories.is_empty() {
        println!("  Categories            {}", b.spending_categories.join(", "));
    }
}

fn expense_line(e: &ExpenseEntry) {
    println!(
        "  {}  {:<15}{:>14}  {}",
        format_date(&e.date),
        e.category.name(),
        format_currency(e.amount),
        e.description.as_deref().unwrap_or("")
    );
}

pub fn expenses(reconciled: &Reconciled<Vec<ExpenseEntry>>) {
    match reconciled.state.data() {
        Some(list) if !list.is_empty() => {
            println!("Expenses ({})", freshness(reconciled));
            for e in list {
                expense_line(e);
                println!("    id {}", e.id);
            }
        }
        _ => println!("No expenses recorded."),
    }
}

pub fn expense_added(e: &ExpenseEntry) {
    println!("Recorded {} for {}.", format_currency(e.amount), e.category);
}

pub fn earning_added(e: &EarningEntry) {
    println!("Logged {} from {}.", format_currency(e.amount), e.source);
}

pub fn earnings(summary: &EarningsSummary) {
    println!("Earnings {}", summary.year);
    for (month, total) in MONTHS.iter().zip(summary.monthly.iter()) {
        if *total > 0.0 {
            println!("  {}  {:>16}", month, format_currency(*total));
        }
    }
    println!("This month  {}", format_currency(summary.current_month_total));
    println!("This year   {}", format_currency(summary.year_total()));
}

pub fn post(p: &CommunityPost, viewer: &User) {
    let author = p.author.name().unwrap_or("Anonymous");
    let liked = if p.is_liked_by(&viewer.id) { " (liked)" } else { "" };
    println!("[{}] {} by {}", p.category, p.title, author);
    println!("  {}", truncate_string(&p.content, POST_PREVIEW_CHARS));
    println!("  {} likes{}, {} comments  id {}", p.like_count(), liked, p.comments.len(), p.id);
    for c in &p.comments {
        let editable = if community::can_modify(viewer, c.author.id()) { "*" } else { " " };
        println!(
            "   {}{}: {}  ({})",
            editable,
            c.author.name().unwrap_or("Anonymous"),
            c.text,
            c.id
        );
    }
}

pub fn posts(list: &[CommunityPost], viewer: &User) {
    if list.is_empty() {
        println!("No posts yet.");
        return;
    }
    for p in list {
        post(p, viewer);
        println!();
    }
}

pub fn articles(list: &[Article]) {
    for a in list {
        let read_time = a.read_time.as_deref().map(|t| format!(" ({})", t)).unwrap_or_default();
        println!("{}{}", a.title, read_time);
        println!("  {}", truncate_string(&a.content, POST_PREVIEW_CHARS));
    }
}

pub fn jobs(list: &[Job]) {
    if list.is_empty() {
        println!("No matching side jobs.");
        return;
    }
    for j in list {
        println!("{}", j.title);
        println!("  {}", j.description);
        let details: Vec<&str> = [j.pay_range.as_deref(), j.time_commitment.as_deref(), j.difficulty.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !details.is_empty() {
            println!("  {}", details.join(" | "));
        }
        if !j.tags.is_empty() {
            println!("  #{}", j.tags.join(" #"));
        }
    }
}

pub fn categories(list: &[Category]) {
    for c in list {
        println!("{}", c.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_freshness_labels() {
        let fresh = Reconciled {
            state: DataState::Fresh { data: 1 },
            remote: RemoteStatus::Refreshed,
        };
        assert_eq!(freshness(&fresh), "up to date");

        let stale = Reconciled {
            state: DataState::Stale {
                data: 1,
                cached_at: Utc::now() - Duration::minutes(5),
            },
            remote: RemoteStatus::Failed("connection refused".to_string()),
        };
        assert_eq!(freshness(&stale), "offline, showing data saved 5m ago");

        let empty: Reconciled<i32> = Reconciled {
            state: DataState::Empty,
            remote: RemoteStatus::Failed("offline".to_string()),
        };
        assert_eq!(freshness(&empty), "no data");

        let old = Reconciled {
            state: DataState::Stale {
                data: 1,
                cached_at: Utc::now() - Duration::hours(3),
            },
            remote: RemoteStatus::Failed("connection refused".to_string()),
        };
        assert_eq!(freshness(&old), "offline, showing data saved 3h ago, may be out of date");
    }
}
