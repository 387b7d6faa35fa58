//! REST API client module for the budgeting backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! budget, expense, community and content endpoints.
//!
//! Protected routes use a JWT bearer token obtained from the auth
//! endpoints and carried in an explicit `SessionData`.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
