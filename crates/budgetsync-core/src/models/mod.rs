//! Data models for budgetsync entities.
//!
//! - `BudgetProfile`, `BudgetEdit`: the user's budget settings
//! - `ExpenseEntry`, `NewExpense`, `ExpenseCategory`: recorded spending
//! - `EarningEntry`: locally logged income
//! - `CommunityPost`, `Comment`: the community feed
//! - `Article`, `Job`, `Category`: admin-curated content
//! - `User`, `AuthResponse`: accounts

pub mod budget;
pub mod community;
pub mod content;
pub mod earning;
pub mod expense;
pub mod user;

pub use budget::{BudgetEdit, BudgetProfile, PaymentFrequency};
pub use community::{AuthorRef, Comment, CommunityPost, PostDraft};
pub use content::{Article, ArticlesResponse, Category, CategoryCreated, Job, JobsResponse};
pub use earning::{EarningEntry, DEFAULT_EARNING_SOURCE};
pub use expense::{ExpenseCategory, ExpenseEntry, NewExpense};
pub use user::{AuthResponse, Role, User};
