//! End-to-end checks of the REST contract and the offline fallback,
//! run against a mock backend.

use std::sync::Arc;

use budgetsync_core::api::ApiClient;
use budgetsync_core::auth::SessionData;
use budgetsync_core::cache::{CacheKey, CacheManager, KeyLocks};
use budgetsync_core::errors::ErrorClass;
use budgetsync_core::models::{BudgetProfile, ExpenseCategory, NewExpense, PaymentFrequency, User};
use budgetsync_core::sync::{load_dashboard, DashboardViews, DataState, PushOutcome, RemoteStatus, SyncReconciler, ViewState};
use chrono::Utc;
use httpmock::prelude::*;
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// Nothing listens on port 1.
const UNREACHABLE: &str = "http://127.0.0.1:1";

fn session() -> SessionData {
    let user: User = serde_json::from_value(json!({ "_id": "u1", "name": "Ana", "email": "ana@example.com" }))
        .expect("user");
    SessionData::new("tok123".to_string(), user)
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url).expect("client").with_session(&session())
}

fn reconciler(root: &std::path::Path) -> SyncReconciler {
    SyncReconciler::for_session(root, &session()).expect("reconciler")
}

fn budget(income: f64) -> BudgetProfile {
    let mut b = BudgetProfile::new(income, PaymentFrequency::Monthly);
    b.target_savings_rate = 10.0;
    b.emergency_fund_goal = 10000.0;
    b
}

#[tokio::test]
async fn fetched_budget_replaces_cached_value() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/budget").header("authorization", "Bearer tok123");
            then.status(200).json_body(json!({
                "monthlyIncome": 30000,
                "paymentFrequency": "bi-weekly",
                "spendingCategories": ["Food"],
                "targetSavingsRate": 15,
                "emergencyFundGoal": 50000,
                "annualSavingsGoal": 0
            }));
        })
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let sync = reconciler(dir.path());
    sync.cache().save_budget(&budget(20000.0)).expect("seed");
    let api = client(&server.base_url());

    let view = ViewState::new();
    let result = sync
        .load_with_fallback(
            &CacheKey::UserBudget,
            || async { api.fetch_budget().await?.ok_or_else(|| anyhow::anyhow!("no budget")) },
            &view,
            &CancellationToken::new(),
        )
        .await;

    mock.assert_async().await;
    assert_eq!(result.remote, RemoteStatus::Refreshed);
    let fresh = result.state.data().expect("data");
    assert_eq!(fresh.monthly_income, 30000.0);
    assert_eq!(fresh.payment_frequency, Some(PaymentFrequency::BiWeekly));

    let cached = sync.cache().load_budget().expect("load").expect("present");
    assert_eq!(cached.data.monthly_income, 30000.0);
}

#[tokio::test]
async fn server_error_keeps_cached_budget() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/budget");
            then.status(500).json_body(json!({ "message": "Server error" }));
        })
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let sync = reconciler(dir.path());
    sync.cache().save_budget(&budget(20000.0)).expect("seed");
    let api = client(&server.base_url());

    let view = ViewState::new();
    let result = sync
        .load_with_fallback(
            &CacheKey::UserBudget,
            || async { api.fetch_budget().await?.ok_or_else(|| anyhow::anyhow!("no budget")) },
            &view,
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(result.remote, RemoteStatus::Failed(ref reason) if reason.contains("Server error")));
    assert!(matches!(view.snapshot(), DataState::Stale { ref data, .. } if data.monthly_income == 20000.0));
    assert_eq!(sync.cache().load_budget().expect("load").expect("present").data, budget(20000.0));
}

#[tokio::test]
async fn unreachable_server_keeps_cached_expenses() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sync = reconciler(dir.path());
    let api = client(UNREACHABLE);

    let cached: Vec<_> = serde_json::from_value(json!([
        { "_id": "e1", "amount": 500, "category": "Food", "date": "2024-03-01T00:00:00Z" }
    ]))
    .expect("expenses");
    sync.cache().save_expenses(&cached).expect("seed");

    let view = ViewState::new();
    let result = sync
        .load_with_fallback(&CacheKey::Expenses, || api.fetch_expenses(), &view, &CancellationToken::new())
        .await;

    assert!(result.is_offline());
    assert_eq!(result.state.data().map(Vec::len), Some(1));
}

#[tokio::test]
async fn offline_restart_renders_cached_dashboard() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sync = reconciler(dir.path());
    sync.cache().save_budget(&budget(20000.0)).expect("seed");

    let api = client(UNREACHABLE);
    let views = DashboardViews::new();
    let snapshot = load_dashboard(&sync, &api, &views, &CancellationToken::new()).await;

    assert!(!snapshot.needs_onboarding());
    assert!(snapshot.is_offline());
    let metrics = snapshot.metrics.as_ref().expect("metrics from cached budget");
    assert_eq!(metrics.monthly_income, 20000.0);
    assert_eq!(metrics.available_balance, 20000.0);
    assert!(snapshot.expenses().is_empty());
    assert!(snapshot.expenses.state.is_empty());
    assert!(snapshot.budget.state.data().is_some());
    assert!(snapshot.ages.budget.is_some());
}

#[tokio::test]
async fn dashboard_branches_fail_independently() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/budget");
            then.status(200).json_body(json!(null));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/auth/me");
            then.status(200).json_body(json!({ "user": { "_id": "u1", "name": "Ana", "role": "user" } }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/expenses");
            then.status(200).json_body(json!([
                { "_id": "e1", "amount": 300, "category": "Food", "date": "2024-03-01T00:00:00Z" },
                { "_id": "e2", "amount": 200, "category": "Savings", "date": "2024-03-02T00:00:00Z" }
            ]));
        })
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let sync = reconciler(dir.path());
    let api = client(&server.base_url());
    let views = DashboardViews::new();
    let snapshot = load_dashboard(&sync, &api, &views, &CancellationToken::new()).await;

    assert!(snapshot.needs_onboarding());
    assert!(snapshot.metrics.is_none());
    assert_eq!(snapshot.user.remote, RemoteStatus::Refreshed);
    assert_eq!(snapshot.user.state.data().map(|u| u.display_name()), Some("Ana"));
    assert_eq!(snapshot.expenses().len(), 2);
    assert!(sync.cache().load_budget().expect("load").is_none());
    assert_eq!(views.expenses.snapshot().data().map(Vec::len), Some(2));
}

#[tokio::test]
async fn unauthorized_is_an_auth_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/expenses");
            then.status(401).json_body(json!({ "message": "Token is not valid" }));
        })
        .await;

    let err = client(&server.base_url()).fetch_expenses().await.expect_err("401");
    assert_eq!(ErrorClass::of(&err), ErrorClass::Auth);
    assert!(format!("{:#}", err).contains("Token is not valid"));
}

#[tokio::test]
async fn protected_route_without_session_is_rejected_locally() {
    let api = ApiClient::new(UNREACHABLE).expect("client");
    let err = api.fetch_budget().await.expect_err("no session");
    assert_eq!(ErrorClass::of(&err), ErrorClass::Auth);
}

#[tokio::test]
async fn validation_errors_carry_server_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/signup");
            then.status(400).json_body(json!({ "errors": [{ "msg": "Please include a valid email" }] }));
        })
        .await;

    let api = ApiClient::new(&server.base_url()).expect("client");
    let err = api.signup("nope", "secret1", "ana").await.expect_err("400");
    assert_eq!(ErrorClass::of(&err), ErrorClass::Validation);
    assert!(format!("{:#}", err).contains("Please include a valid email"));
}

#[tokio::test]
async fn failed_write_is_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/expenses");
            then.status(503);
        })
        .await;

    let expense = NewExpense {
        amount: 150.0,
        category: ExpenseCategory::Food,
        description: None,
        date: Utc::now(),
    };
    let err = client(&server.base_url()).create_expense(&expense).await.expect_err("503");

    mock.assert_async().await;
    assert_eq!(ErrorClass::of(&err), ErrorClass::Connectivity);
}

#[tokio::test]
async fn budget_edit_is_kept_locally_when_push_fails() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/budget").header("authorization", "Bearer tok123");
            then.status(500);
        })
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let sync = reconciler(dir.path());
    let api = client(&server.base_url());
    let edited = budget(25000.0);

    let outcome = sync
        .store_and_push(&CacheKey::UserBudget, &edited, || api.update_budget(&edited))
        .await
        .expect("local save");

    mock.assert_async().await;
    assert!(matches!(outcome, PushOutcome::LocalOnly(_)));
    assert_eq!(sync.cache().load_budget().expect("load").expect("present").data, edited);
}

#[tokio::test]
async fn login_then_like_round_trip() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth/login")
                .json_body(json!({ "email": "ana@example.com", "password": "secret1" }));
            then.status(200).json_body(json!({
                "token": "jwt-abc",
                "user": { "id": "u1", "name": "Ana", "email": "ana@example.com", "role": "user" }
            }));
        })
        .await;
    let like = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/posts/p1/like").header("authorization", "Bearer jwt-abc");
            then.status(200).json_body(json!({
                "_id": "p1",
                "title": "Meal prep",
                "content": "Cook on Sundays",
                "category": "Savings Tips",
                "user": { "_id": "u2", "name": "Ben" },
                "likes": ["u1"],
                "comments": []
            }));
        })
        .await;

    let anon = ApiClient::new(&server.base_url()).expect("client");
    let auth = anon.login("ana@example.com", "secret1").await.expect("login");
    let session = SessionData::from(auth);
    assert_eq!(session.user_id(), "u1");

    let api = anon.with_session(&session);
    let post = api.toggle_like("p1").await.expect("like");
    like.assert_async().await;
    assert!(post.is_liked_by("u1"));
    assert_eq!(post.author.name(), Some("Ben"));
    assert!(!post.can_modify(&session.user));
}

#[tokio::test]
async fn concurrent_writers_share_key_locks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = Arc::new(CacheManager::for_user(dir.path(), "u1").expect("cache"));
    let locks = Arc::new(KeyLocks::new());
    let sync = SyncReconciler::new(Arc::clone(&cache), Arc::clone(&locks));

    let guard = locks.acquire(&CacheKey::UserBudget).await;
    let edited = budget(1.0);
    let write = sync.store_and_push(&CacheKey::UserBudget, &edited, || async { Ok(()) });
    tokio::pin!(write);
    assert!(tokio::time::timeout(std::time::Duration::from_millis(50), &mut write).await.is_err());
    assert!(cache.load_budget().expect("load").is_none());

    drop(guard);
    assert_eq!(write.await.expect("write"), PushOutcome::Synced);
}
