//! Core types and pure analytics for the expense tracker.
//!
//! Holds the expense data model, the aggregation functions behind every
//! report (totals, category sums, monthly series, savings rate), calendar
//! month arithmetic, currency formatting, list queries and CLI settings.

pub mod aggregator;
pub mod calendar;
pub mod error;
pub mod formatting;
pub mod models;
pub mod query;
pub mod settings;

pub use aggregator::{ExpenseAggregator, MonthBucket};
pub use error::{ExpenseError, Result};
pub use calendar::ExpenseDate;
pub use models::{Category, Expense, NewExpense};
