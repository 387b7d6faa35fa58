//! Classification of failures for the caller.

use std::fmt;

use crate::api::ApiError;
use crate::validation::ValidationError;

/// How a failure should be handled by whoever shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input. Shown next to the input; the user can fix and resubmit.
    Validation,
    /// Missing, expired or rejected credentials. The user has to log in again.
    Auth,
    /// The server could not be reached or answered with an error. Reads fall
    /// back to the cache.
    Connectivity,
    /// Anything else, e.g. a local write that failed.
    Other,
}

impl ErrorClass {
    pub fn of(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.downcast_ref::<ValidationError>().is_some() {
                return ErrorClass::Validation;
            }
            if let Some(api) = cause.downcast_ref::<ApiError>() {
                return Self::of_api(api);
            }
            if cause.downcast_ref::<reqwest::Error>().is_some() {
                return ErrorClass::Connectivity;
            }
        }
        ErrorClass::Other
    }

    fn of_api(err: &ApiError) -> Self {
        match err {
            ApiError::Validation(_) => ErrorClass::Validation,
            ApiError::Unauthorized(_) | ApiError::NoSession => ErrorClass::Auth,
            ApiError::AccessDenied(_)
            | ApiError::NotFound(_)
            | ApiError::RateLimited
            | ApiError::ServerError(_)
            | ApiError::NetworkError(_)
            | ApiError::InvalidResponse(_) => ErrorClass::Connectivity,
        }
    }

    pub fn is_recoverable_by_cache(&self) -> bool {
        *self == ErrorClass::Connectivity
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorClass::Validation => "invalid input",
            ErrorClass::Auth => "authentication required",
            ErrorClass::Connectivity => "server unavailable",
            ErrorClass::Other => "error",
        };
        f.write_str(label)
    }
}
