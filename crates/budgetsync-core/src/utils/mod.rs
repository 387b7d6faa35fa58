//! Utility functions for display formatting.

pub mod format;

pub use format::{format_currency, format_date, format_percent, progress_bar, truncate_string};
