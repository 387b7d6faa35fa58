//! API client for the budgeting REST backend.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests against the auth, budget, expense, community and content routes.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::SessionData;
use crate::models::{
    Article, ArticlesResponse, AuthResponse, BudgetProfile, Category, CategoryCreated,
    CommunityPost, ExpenseEntry, Job, JobsResponse, NewExpense, PostDraft, User,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) reads.
/// Writes are never retried.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
    username: &'a str,
}

#[derive(Debug, Serialize)]
struct GoogleLoginRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Serialize)]
struct CommentRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct CategoryRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: User,
}

/// API client for the budgeting backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl ApiClient {
    /// Create a new unauthenticated API client for `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: None,
        })
    }

    /// Create a client bound to the given session, sharing the connection pool.
    pub fn with_session(&self, session: &SessionData) -> Self {
        Self {
            client: self.client.clone(),
            base_url: Arc::clone(&self.base_url),
            token: Some(Arc::from(session.token.as_str())),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    fn require_token(&self) -> Result<()> {
        if self.token.is_none() {
            return Err(ApiError::NoSession.into());
        }
        Ok(())
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .send()
                .await
                .map_err(ApiError::from)
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .map_err(|e| ApiError::InvalidResponse(e.to_string()))
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    /// Send a single write request. At-most-once: no retry on any failure.
    async fn write<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let url = self.url(path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .headers(self.auth_headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        Self::check_response(response).await
    }

    async fn write_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let response = self.write(method, path, body).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    // ===== Authentication =====

    pub async fn signup(&self, email: &str, password: &str, username: &str) -> Result<AuthResponse> {
        let body = SignupRequest { email, password, username };
        self.write_json(Method::POST, "/api/auth/signup", Some(&body))
            .await
            .context("Signup failed")
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let body = LoginRequest { email, password };
        self.write_json(Method::POST, "/api/auth/login", Some(&body))
            .await
            .context("Login failed")
    }

    pub async fn login_google(&self, id_token: &str) -> Result<AuthResponse> {
        let body = GoogleLoginRequest { id_token };
        self.write_json(Method::POST, "/api/auth/google", Some(&body))
            .await
            .context("Google login failed")
    }

    /// Tokens are stateless; the server only acknowledges the logout.
    pub async fn logout(&self) -> Result<()> {
        self.require_token()?;
        self.write::<()>(Method::POST, "/api/auth/logout", None).await?;
        Ok(())
    }

    pub async fn fetch_me(&self) -> Result<User> {
        self.require_token()?;
        let resp: MeResponse = self.get("/api/auth/me").await?;
        Ok(resp.user)
    }

    // ===== Budget =====

    /// Returns `None` when the server has no budget stored for the user.
    pub async fn fetch_budget(&self) -> Result<Option<BudgetProfile>> {
        self.require_token()?;
        let budget: Option<BudgetProfile> = self.get("/api/budget").await?;
        debug!(found = budget.is_some(), "Budget fetched");
        Ok(budget)
    }

    pub async fn update_budget(&self, budget: &BudgetProfile) -> Result<()> {
        self.require_token()?;
        self.write(Method::PUT, "/api/budget", Some(budget)).await?;
        Ok(())
    }

    // ===== Expenses =====

    pub async fn fetch_expenses(&self) -> Result<Vec<ExpenseEntry>> {
        self.require_token()?;
        let expenses: Vec<ExpenseEntry> = self.get("/api/expenses").await?;
        debug!(count = expenses.len(), "Expenses fetched");
        Ok(expenses)
    }

    pub async fn create_expense(&self, expense: &NewExpense) -> Result<ExpenseEntry> {
        self.require_token()?;
        self.write_json(Method::POST, "/api/expenses", Some(expense)).await
    }

    pub async fn delete_expense(&self, id: &str) -> Result<()> {
        self.require_token()?;
        self.write::<()>(Method::DELETE, &format!("/api/expenses/{}", id), None)
            .await?;
        Ok(())
    }

    // ===== Community =====

    pub async fn fetch_posts(&self) -> Result<Vec<CommunityPost>> {
        self.require_token()?;
        self.get("/api/posts").await
    }

    pub async fn create_post(&self, draft: &PostDraft) -> Result<CommunityPost> {
        self.require_token()?;
        self.write_json(Method::POST, "/api/posts", Some(draft)).await
    }

    pub async fn update_post(&self, post_id: &str, draft: &PostDraft) -> Result<CommunityPost> {
        self.require_token()?;
        self.write_json(Method::PUT, &format!("/api/posts/{}", post_id), Some(draft))
            .await
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<()> {
        self.require_token()?;
        self.write::<()>(Method::DELETE, &format!("/api/posts/{}", post_id), None)
            .await?;
        Ok(())
    }

    /// Toggle the caller's like. Returns the updated post.
    pub async fn toggle_like(&self, post_id: &str) -> Result<CommunityPost> {
        self.require_token()?;
        self.write_json::<_, ()>(Method::POST, &format!("/api/posts/{}/like", post_id), None)
            .await
    }

    pub async fn add_comment(&self, post_id: &str, text: &str) -> Result<CommunityPost> {
        self.require_token()?;
        let body = CommentRequest { text };
        self.write_json(Method::POST, &format!("/api/posts/{}/comment", post_id), Some(&body))
            .await
    }

    pub async fn edit_comment(&self, post_id: &str, comment_id: &str, text: &str) -> Result<CommunityPost> {
        self.require_token()?;
        let body = CommentRequest { text };
        self.write_json(
            Method::PUT,
            &format!("/api/posts/{}/comment/{}", post_id, comment_id),
            Some(&body),
        )
        .await
    }

    pub async fn delete_comment(&self, post_id: &str, comment_id: &str) -> Result<CommunityPost> {
        self.require_token()?;
        self.write_json::<_, ()>(
            Method::DELETE,
            &format!("/api/posts/{}/comment/{}", post_id, comment_id),
            None,
        )
        .await
    }

    // ===== Curated content =====

    pub async fn fetch_articles(&self) -> Result<Vec<Article>> {
        let resp: ArticlesResponse = self.get("/api/articles").await?;
        Ok(resp.articles)
    }

    pub async fn fetch_jobs(&self) -> Result<Vec<Job>> {
        let resp: JobsResponse = self.get("/api/jobs").await?;
        Ok(resp.jobs)
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.get("/api/categories").await
    }

    /// Admin only; the server rejects duplicates with a 400.
    pub async fn create_category(&self, name: &str) -> Result<Category> {
        self.require_token()?;
        let body = CategoryRequest { name };
        let resp: CategoryCreated = self
            .write_json(Method::POST, "/api/categories", Some(&body))
            .await?;
        Ok(resp.category)
    }
}
