//! Application wiring for the command line client.
//!
//! `App` owns the configuration, the persisted session and the anonymous API
//! client. Commands that need an account build a session-bound client and a
//! per-user reconciler from the current session on demand.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use budgetsync_core::api::{ApiClient, ApiError};
use budgetsync_core::auth::{CredentialStore, Session, SessionData};
use budgetsync_core::cache::CacheKey;
use budgetsync_core::community::{filter_by_category, search_jobs};
use budgetsync_core::config::Config;
use budgetsync_core::earnings::{EarningsLedger, EarningsSummary};
use budgetsync_core::metrics::{exceeds_available, DashboardMetrics};
use budgetsync_core::models::{
    Article, AuthResponse, BudgetEdit, BudgetProfile, Category, CommunityPost, EarningEntry, ExpenseEntry, Job,
    NewExpense, PaymentFrequency, PostDraft, User,
};
use budgetsync_core::sync::{load_dashboard, DashboardSnapshot, DashboardViews, PushOutcome, Reconciled, SyncReconciler, ViewState};
use budgetsync_core::utils::format_currency;
use budgetsync_core::validation::{self, ValidationError};

/// Subdirectory of the cache root holding log files
const LOG_DIR: &str = "logs";

/// Root of the session file, the per-user caches and the logs.
pub fn cache_root() -> PathBuf {
    Config::cache_root().unwrap_or_else(|_| PathBuf::from("./cache"))
}

pub fn log_dir(cache_root: &Path) -> Option<PathBuf> {
    let dir = cache_root.join(LOG_DIR);
    std::fs::create_dir_all(&dir).ok().map(|_| dir)
}

/// Input collected by `budget setup`.
#[derive(Debug, Default)]
pub struct BudgetSetup {
    pub income: Option<f64>,
    pub frequency: Option<String>,
    pub categories: Vec<String>,
    pub savings_rate: f64,
    pub emergency_goal: f64,
    pub annual_goal: f64,
}

pub struct App {
    config: Config,
    config_path: Option<PathBuf>,
    session: Session,
    api: ApiClient,
    cache_root: PathBuf,
}

impl App {
    pub fn new(cache_root: PathBuf) -> Result<Self> {
        let config_path = match Config::config_path() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "No config directory, settings will not be saved");
                None
            }
        };
        Self::open(config_path, cache_root)
    }

    pub fn open(config_path: Option<PathBuf>, cache_root: PathBuf) -> Result<Self> {
        let config = match config_path.as_deref().map(Config::load_from).transpose() {
            Ok(c) => c.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        debug!(?cache_root, "Cache root configured");

        let mut session = Session::new(cache_root.clone());
        if let Err(e) = session.load() {
            warn!(error = %e, "Failed to load session");
        }

        let api = ApiClient::new(&config.api_base_url())?;

        Ok(Self {
            config,
            config_path,
            session,
            api,
            cache_root,
        })
    }

    fn save_config(&self) {
        let Some(ref path) = self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            warn!(error = %e, "Failed to save config");
        }
    }

    fn credentials(&self) -> CredentialStore {
        CredentialStore::for_server(self.api.base_url())
    }

    /// The logged-in session, or an auth error.
    pub fn session(&self) -> Result<&SessionData> {
        let data = self
            .session
            .current()
            .ok_or_else(|| anyhow::Error::new(ApiError::NoSession))?;
        if data.needs_refresh() {
            warn!(expires_at = %data.expires_at(), "Session expires soon, log in again to renew it");
        }
        Ok(data)
    }

    /// Whether the stored session has expired and only cached data can be shown.
    pub fn is_offline_session(&self) -> bool {
        self.session.current().is_none() && self.session.last_known().is_some()
    }

    /// Session-bound API client and reconciler for the current user.
    fn connect(&self) -> Result<(ApiClient, SyncReconciler)> {
        let session = self.session()?;
        let api = self.api.with_session(session);
        let sync = SyncReconciler::for_session(&self.cache_root, session)?;
        Ok((api, sync))
    }

    /// Like `connect`, but an expired session still opens its user's cache.
    /// The client then has no token, so remote reads fail locally and the
    /// reconciler falls back to the cached values.
    fn connect_cached(&self) -> Result<(ApiClient, SyncReconciler)> {
        let last = self
            .session
            .last_known()
            .ok_or_else(|| anyhow::Error::new(ApiError::NoSession))?;
        let api = match self.session.current() {
            Some(valid) => self.api.with_session(valid),
            None => self.api.clone(),
        };
        if !api.is_authenticated() {
            warn!(user_id = %last.user_id(), "Session expired, showing cached data only");
        }
        let sync = SyncReconciler::for_session(&self.cache_root, last)?;
        Ok((api, sync))
    }

    // ===== Authentication =====

    fn prompt_line(label: &str) -> Result<String> {
        print!("{}: ", label);
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn prompt_password() -> Result<String> {
        let password = rpassword::prompt_password("Password: ")?;
        Ok(password)
    }

    /// Environment first, then the keychain when "remember me" is on, then a prompt.
    fn password_for(&self, email: &str) -> Result<String> {
        if let Some(password) = Config::env_password() {
            return Ok(password);
        }
        if self.config.remember_me && self.config.last_email.as_deref() == Some(email) {
            match self.credentials().get_password(email) {
                Ok(password) => return Ok(password),
                Err(e) => debug!(error = %e, "No remembered password"),
            }
        }
        Self::prompt_password()
    }

    pub async fn login(&mut self, email: Option<String>, remember: bool) -> Result<User> {
        let email = match email.or_else(|| self.config.default_email()) {
            Some(email) => email,
            None => Self::prompt_line("Email")?,
        };
        let password = self.password_for(&email)?;
        validation::validate_login(&email, &password)?;

        let auth = self.api.login(email.trim(), &password).await?;
        let remember = remember || self.config.remember_me;
        if remember {
            if let Err(e) = self.credentials().store(&email, &password) {
                warn!(error = %e, "Failed to store credentials");
            }
        }
        self.config.remember_me = remember;
        self.start_session(email, auth).await
    }

    pub async fn login_google(&mut self, id_token: &str) -> Result<User> {
        if id_token.trim().is_empty() {
            return Err(ValidationError::single("idToken", "Google ID token is required").into());
        }
        let auth = self.api.login_google(id_token.trim()).await?;
        let email = auth.user.email.clone().unwrap_or_default();
        self.start_session(email, auth).await
    }

    pub async fn signup(&mut self, email: &str, username: &str) -> Result<User> {
        let password = match Config::env_password() {
            Some(password) => password,
            None => Self::prompt_password()?,
        };
        validation::validate_signup(email, &password, username)?;

        let auth = self.api.signup(email.trim(), &password, username.trim()).await?;
        self.start_session(email.to_string(), auth).await
    }

    /// Persist a new session. The auth endpoints return the user without a
    /// role, so the full profile is read from `/api/auth/me` before saving.
    async fn start_session(&mut self, email: String, auth: AuthResponse) -> Result<User> {
        let mut data = SessionData::from(auth);
        match self.api.with_session(&data).fetch_me().await {
            Ok(profile) if profile.id == data.user.id => data.user = profile,
            Ok(profile) => warn!(expected = %data.user.id, got = %profile.id, "Profile does not match the login"),
            Err(e) => warn!(error = %e, "Failed to fetch profile, role unknown"),
        }
        let user = data.user.clone();

        if !email.is_empty() {
            self.config.last_email = Some(email);
        }
        self.save_config();

        match SyncReconciler::for_session(&self.cache_root, &data) {
            Ok(sync) => {
                if let Err(e) = sync.cache().save_user(&user) {
                    warn!(error = %e, "Failed to cache user profile");
                }
            }
            Err(e) => warn!(error = %e, "Failed to open user cache"),
        }

        self.session.update(data);
        self.session.save().context("Failed to save session")?;
        info!(user_id = %user.id, role = ?user.role, "Login successful");
        Ok(user)
    }

    /// Forget the session. Cached budget data stays on disk for the next login.
    pub async fn logout(&mut self) -> Result<()> {
        if let Ok(session) = self.session() {
            let api = self.api.with_session(session);
            if let Err(e) = api.logout().await {
                warn!(error = %e, "Server logout failed");
            }
        }

        if self.config.remember_me {
            if let Some(ref email) = self.config.last_email {
                if let Err(e) = self.credentials().delete(email) {
                    debug!(error = %e, "No stored credentials to delete");
                }
            }
            self.config.remember_me = false;
            self.save_config();
        }

        self.session.clear()?;
        info!("Logged out");
        Ok(())
    }

    // ===== Dashboard and budget =====

    pub async fn dashboard(&self, cancel: &CancellationToken) -> Result<DashboardSnapshot> {
        let (api, sync) = self.connect_cached()?;
        let views = DashboardViews::new();
        Ok(load_dashboard(&sync, &api, &views, cancel).await)
    }

    pub async fn budget(&self, cancel: &CancellationToken) -> Result<Reconciled<BudgetProfile>> {
        let (api, sync) = self.connect_cached()?;
        let view: ViewState<BudgetProfile> = ViewState::new();
        Ok(sync
            .load_with_fallback(
                &CacheKey::UserBudget,
                || async {
                    api.fetch_budget()
                        .await?
                        .ok_or_else(|| anyhow!("No budget stored on the server"))
                },
                &view,
                cancel,
            )
            .await)
    }

    pub async fn setup_budget(&self, setup: BudgetSetup) -> Result<PushOutcome> {
        let frequency = match setup.frequency.as_deref() {
            Some(raw) => Some(PaymentFrequency::parse(raw).ok_or_else(|| {
                ValidationError::single("paymentFrequency", format!("Unknown payment frequency: {}", raw))
            })?),
            None => None,
        };
        validation::validate_onboarding(setup.income, frequency)?;

        let mut profile = BudgetProfile::new(setup.income.unwrap_or_default(), frequency.unwrap_or(PaymentFrequency::Monthly));
        for raw in &setup.categories {
            let name = validation::parse_category(raw)?.name();
            if !profile.has_category(name) {
                profile.toggle_category(name);
            }
        }
        profile.target_savings_rate = setup.savings_rate;
        profile.emergency_fund_goal = setup.emergency_goal;
        profile.annual_savings_goal = setup.annual_goal;
        profile.validate()?;

        let (api, sync) = self.connect()?;
        sync.store_and_push(&CacheKey::UserBudget, &profile, || api.update_budget(&profile))
            .await
    }

    /// Merge `edit` into the current budget, keeping frequency and categories.
    pub async fn edit_budget(&self, edit: BudgetEdit) -> Result<PushOutcome> {
        let (api, sync) = self.connect()?;

        let existing = match sync.cache().load_budget() {
            Ok(Some(cached)) => cached.data,
            other => {
                if let Err(e) = other {
                    warn!(error = %e, "Cached budget unreadable, fetching from server");
                }
                api.fetch_budget()
                    .await?
                    .ok_or_else(|| anyhow!("No budget yet. Run `budgetsync budget setup` first."))?
            }
        };

        let updated = edit.apply_to(&existing);
        updated.validate()?;
        sync.store_and_push(&CacheKey::UserBudget, &updated, || api.update_budget(&updated))
            .await
    }

    // ===== Expenses =====

    pub async fn expenses(&self, cancel: &CancellationToken) -> Result<Reconciled<Vec<ExpenseEntry>>> {
        let (api, sync) = self.connect_cached()?;
        let view: ViewState<Vec<ExpenseEntry>> = ViewState::new();
        Ok(sync
            .load_with_fallback(&CacheKey::Expenses, || api.fetch_expenses(), &view, cancel)
            .await)
    }

    /// Record an expense. Amounts above the available balance are refused.
    pub async fn add_expense(&self, amount: &str, category: &str, description: Option<String>) -> Result<ExpenseEntry> {
        let amount = validation::parse_amount("amount", amount)?;
        let category = validation::parse_category(category)?;
        let expense = NewExpense {
            amount,
            category,
            description: description.filter(|d| !d.trim().is_empty()),
            date: Utc::now(),
        };
        validation::validate_expense(&expense)?;

        let (api, sync) = self.connect()?;
        if let Ok(Some(budget)) = sync.cache().load_budget() {
            let expenses = sync
                .cache()
                .load_expenses()
                .ok()
                .flatten()
                .map(|c| c.data)
                .unwrap_or_default();
            let metrics = DashboardMetrics::compute(&budget.data, &expenses);
            if exceeds_available(amount, metrics.available_balance) {
                return Err(ValidationError::single(
                    "amount",
                    format!(
                        "Amount exceeds your available balance of {}",
                        format_currency(metrics.available_balance)
                    ),
                )
                .into());
            }
        }

        let created = api.create_expense(&expense).await?;
        info!(id = %created.id, amount = created.amount, category = %created.category, "Expense recorded");

        // The server has the expense now; a cache failure must not report the add as failed.
        let entry = created.clone();
        if let Err(e) = sync
            .amend_or_default(&CacheKey::Expenses, |list: &mut Vec<ExpenseEntry>| list.push(entry))
            .await
        {
            warn!(error = %format!("{:#}", e), "Expense saved on the server but not cached");
        }
        Ok(created)
    }

    pub async fn delete_expense(&self, id: &str) -> Result<()> {
        let (api, sync) = self.connect()?;
        api.delete_expense(id).await?;
        if let Err(e) = sync
            .amend_cached(&CacheKey::Expenses, |list: &mut Vec<ExpenseEntry>| list.retain(|e| e.id != id))
            .await
        {
            warn!(error = %format!("{:#}", e), "Expense deleted on the server but still cached");
        }
        Ok(())
    }

    // ===== Earnings =====

    /// Earnings never leave this device, so an expired session still works.
    fn ledger(&self) -> Result<EarningsLedger> {
        let session = self
            .session
            .last_known()
            .ok_or_else(|| anyhow::Error::new(ApiError::NoSession))?;
        let sync = SyncReconciler::for_session(&self.cache_root, session)?;
        Ok(EarningsLedger::new(
            Arc::clone(sync.cache()),
            Arc::clone(sync.locks()),
            session.user_id(),
        ))
    }

    pub async fn add_earning(&self, amount: &str, source: Option<&str>) -> Result<EarningEntry> {
        let amount = validation::parse_amount("amount", amount)?;
        self.ledger()?.add(amount, source).await
    }

    pub fn earnings_summary(&self) -> Result<EarningsSummary> {
        Ok(self.ledger()?.summary(Utc::now()))
    }

    // ===== Community =====

    async fn find_post(api: &ApiClient, post_id: &str) -> Result<CommunityPost> {
        api.fetch_posts()
            .await?
            .into_iter()
            .find(|p| p.id == post_id)
            .ok_or_else(|| ApiError::NotFound(format!("Post {}", post_id)).into())
    }

    pub async fn posts(&self, category: &str) -> Result<Vec<CommunityPost>> {
        let (api, _) = self.connect()?;
        let posts = api.fetch_posts().await?;
        Ok(filter_by_category(&posts, category).into_iter().cloned().collect())
    }

    pub async fn new_post(&self, title: &str, content: &str, category: &str) -> Result<CommunityPost> {
        validation::validate_post(content)?;
        let (api, _) = self.connect()?;
        let draft = PostDraft {
            title: title.trim().to_string(),
            content: content.trim().to_string(),
            category: category.trim().to_string(),
        };
        api.create_post(&draft).await
    }

    pub async fn edit_post(
        &self,
        post_id: &str,
        title: Option<String>,
        content: Option<String>,
        category: Option<String>,
    ) -> Result<CommunityPost> {
        let (api, _) = self.connect()?;
        let post = Self::find_post(&api, post_id).await?;
        if !post.can_modify(&self.session()?.user) {
            bail!(ApiError::AccessDenied("Only the author or an admin can edit this post".into()));
        }

        let draft = PostDraft {
            title: title.unwrap_or(post.title),
            content: content.unwrap_or(post.content),
            category: category.unwrap_or(post.category),
        };
        validation::validate_post(&draft.content)?;
        api.update_post(post_id, &draft).await
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<()> {
        let (api, _) = self.connect()?;
        let post = Self::find_post(&api, post_id).await?;
        if !post.can_modify(&self.session()?.user) {
            bail!(ApiError::AccessDenied("Only the author or an admin can delete this post".into()));
        }
        api.delete_post(post_id).await
    }

    pub async fn toggle_like(&self, post_id: &str) -> Result<CommunityPost> {
        let (api, _) = self.connect()?;
        api.toggle_like(post_id).await
    }

    pub async fn comment(&self, post_id: &str, text: &str) -> Result<CommunityPost> {
        validation::validate_comment(text)?;
        let (api, _) = self.connect()?;
        api.add_comment(post_id, text.trim()).await
    }

    pub async fn edit_comment(&self, post_id: &str, comment_id: &str, text: &str) -> Result<CommunityPost> {
        validation::validate_comment(text)?;
        let (api, _) = self.connect()?;
        let post = Self::find_post(&api, post_id).await?;
        if !post.can_modify_comment(&self.session()?.user, comment_id) {
            bail!(ApiError::AccessDenied("Only the commenter or an admin can edit this comment".into()));
        }
        api.edit_comment(post_id, comment_id, text.trim()).await
    }

    pub async fn delete_comment(&self, post_id: &str, comment_id: &str) -> Result<CommunityPost> {
        let (api, _) = self.connect()?;
        let post = Self::find_post(&api, post_id).await?;
        if !post.can_modify_comment(&self.session()?.user, comment_id) {
            bail!(ApiError::AccessDenied("Only the commenter or an admin can delete this comment".into()));
        }
        api.delete_comment(post_id, comment_id).await
    }

    // ===== Curated content =====

    pub async fn articles(&self) -> Result<Vec<Article>> {
        self.api.fetch_articles().await
    }

    pub async fn jobs(&self, query: &str) -> Result<Vec<Job>> {
        let jobs = self.api.fetch_jobs().await?;
        Ok(search_jobs(&jobs, query).into_iter().cloned().collect())
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.api.fetch_categories().await
    }

    pub async fn add_category(&self, name: &str) -> Result<Category> {
        validation::validate_category_name(name)?;
        let session = self.session()?;
        if !session.user.is_admin() {
            bail!(ApiError::AccessDenied("Only admins can add categories".into()));
        }
        self.api.with_session(session).create_category(name.trim()).await
    }
}
