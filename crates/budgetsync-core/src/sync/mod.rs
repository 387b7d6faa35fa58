//! Offline-first synchronisation.
//!
//! Every read goes through [`SyncReconciler::load_with_fallback`]: the cached
//! value is shown first, then replaced by the server's value when the fetch
//! succeeds. Writes go local first and are pushed once, without retry.

pub mod dashboard;
pub mod reconciler;

pub use dashboard::{load_dashboard, DashboardSnapshot, DashboardViews};
pub use reconciler::{DataState, PushOutcome, Reconciled, RemoteStatus, SyncReconciler, ViewState};
