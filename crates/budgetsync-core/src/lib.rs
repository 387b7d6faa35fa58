//! budgetsync core library.
//!
//! Offline-first client core for a personal budgeting service:
//!
//! - `api`: REST client for the budgeting backend
//! - `auth`: persisted sessions and keychain credentials
//! - `cache`: per-user JSON cache with single-flight key locks
//! - `sync`: stale-while-revalidate reconciler and dashboard loader
//! - `metrics`: pure dashboard calculations
//! - `earnings`: local-only earnings ledger
//! - `community`: post permissions, likes and feed filtering

pub mod api;
pub mod auth;
pub mod cache;
pub mod community;
pub mod config;
pub mod earnings;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod sync;
pub mod utils;
pub mod validation;

pub use api::{ApiClient, ApiError};
pub use auth::{CredentialStore, Session, SessionData};
pub use cache::{CacheKey, CacheManager, CachedData};
pub use config::Config;
pub use errors::ErrorClass;
pub use metrics::DashboardMetrics;
pub use sync::{DataState, PushOutcome, Reconciled, RemoteStatus, SyncReconciler, ViewState};
