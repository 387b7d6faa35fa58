//! Client-side input validation.
//!
//! Mirrors the server's request rules so obviously bad input is rejected
//! inline before any network call is made.

use thiserror::Error;

use crate::models::{ExpenseCategory, NewExpense, PaymentFrequency};

/// Minimum password length accepted at signup.
const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// One or more invalid fields. Recoverable by correcting the input.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", self.summary())]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut err = Self::default();
        err.push(field, message);
        err
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub fn validate_signup(email: &str, password: &str, username: &str) -> Result<(), ValidationError> {
    let mut err = ValidationError::default();
    if !looks_like_email(email) {
        err.push("email", "Please include a valid email");
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        err.push("password", "Password must be at least 6 characters long");
    }
    if username.trim().is_empty() {
        err.push("username", "Username is required");
    }
    err.into_result()
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    let mut err = ValidationError::default();
    if email.trim().is_empty() {
        err.push("email", "Email or Username is required");
    }
    if password.is_empty() {
        err.push("password", "Password is required");
    }
    err.into_result()
}

/// Parse a user-typed amount, requiring a finite number greater than zero.
pub fn parse_amount(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::single(field, "Amount is required"));
    }
    match raw.replace(',', "").parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(ValidationError::single(field, "Enter a valid amount")),
    }
}

pub fn validate_expense(expense: &NewExpense) -> Result<(), ValidationError> {
    if !expense.amount.is_finite() || expense.amount <= 0.0 {
        return Err(ValidationError::single("amount", "Enter a valid amount"));
    }
    Ok(())
}

pub fn parse_category(raw: &str) -> Result<ExpenseCategory, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::single("category", "Category is required"));
    }
    ExpenseCategory::parse(raw)
        .ok_or_else(|| ValidationError::single("category", format!("Unknown category: {}", raw.trim())))
}

/// Onboarding requires an income and a pay frequency before moving on.
pub fn validate_onboarding(
    monthly_income: Option<f64>,
    frequency: Option<PaymentFrequency>,
) -> Result<(), ValidationError> {
    let mut err = ValidationError::default();
    match monthly_income {
        Some(v) if v.is_finite() && v > 0.0 => {}
        _ => err.push("monthlyIncome", "Please enter your monthly income"),
    }
    if frequency.is_none() {
        err.push("paymentFrequency", "Please select how often you get paid");
    }
    err.into_result()
}

pub fn validate_post(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::single("content", "Content is required"));
    }
    Ok(())
}

pub fn validate_comment(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::single("text", "Comment text is required"));
    }
    Ok(())
}

pub fn validate_category_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::single("name", "Category name is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_rules() {
        assert!(validate_signup("jo@example.com", "secret1", "jo").is_ok());

        let err = validate_signup("not-an-email", "123", " ").unwrap_err();
        assert!(err.has_field("email"));
        assert!(err.has_field("password"));
        assert!(err.has_field("username"));
        assert_eq!(err.errors.len(), 3);
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a b@c.co"));
        assert!(!looks_like_email("a@.co"));
    }

    #[test]
    fn test_login_requires_both_fields() {
        assert!(validate_login("jo", "pw").is_ok());
        let err = validate_login("", "").unwrap_err();
        assert_eq!(err.errors.len(), 2);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("amount", "250.50"), Ok(250.5));
        assert_eq!(parse_amount("amount", "1,500"), Ok(1500.0));
        assert!(parse_amount("amount", "").is_err());
        assert!(parse_amount("amount", "0").is_err());
        assert!(parse_amount("amount", "-5").is_err());
        assert!(parse_amount("amount", "abc").is_err());
        assert!(parse_amount("amount", "NaN").is_err());
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("food"), Ok(ExpenseCategory::Food));
        assert!(parse_category("").unwrap_err().has_field("category"));
        assert!(parse_category("Pets").is_err());
    }

    #[test]
    fn test_onboarding_requires_income_and_frequency() {
        assert!(validate_onboarding(Some(20000.0), Some(PaymentFrequency::Monthly)).is_ok());
        let err = validate_onboarding(Some(0.0), None).unwrap_err();
        assert!(err.has_field("monthlyIncome"));
        assert!(err.has_field("paymentFrequency"));
    }

    #[test]
    fn test_error_display_joins_messages() {
        let mut err = ValidationError::default();
        err.push("a", "first");
        err.push("b", "second");
        assert_eq!(err.to_string(), "first; second");
    }

    #[test]
    fn test_text_rules() {
        assert!(validate_post("  ").is_err());
        assert!(validate_comment("ok").is_ok());
        assert!(validate_category_name("").is_err());
    }
}
