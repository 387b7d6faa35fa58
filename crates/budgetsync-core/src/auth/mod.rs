//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `Session`: Token-based session persisted to the cache root
//! - `SessionData`: the explicit session context handed to the API client
//!   and the per-user cache
//! - `CredentialStore`: OS-level credential storage via keyring
//!
//! Tokens issued by the backend are valid for seven days.

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData};
