use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::ExpenseDate;
use crate::error::{ExpenseError, Result};

/// Color used for any category outside the canonical set.
pub const FALLBACK_CATEGORY_COLOR: &str = "#6b7280";

/// Spending category of an expense.
///
/// Parsing is total: any label outside the eight canonical names is kept
/// verbatim in [`Category::Unrecognized`] so that aggregation never drops or
/// rejects data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Food,
    Transportation,
    Entertainment,
    Health,
    Education,
    Shopping,
    Bills,
    Other,
    /// A label that is not one of the canonical categories.
    Unrecognized(String),
}

impl Category {
    /// The canonical categories, in display order.
    pub const CANONICAL: [Category; 8] = [
        Category::Food,
        Category::Transportation,
        Category::Entertainment,
        Category::Health,
        Category::Education,
        Category::Shopping,
        Category::Bills,
        Category::Other,
    ];

    /// Parse a raw label. Matching is exact and case-sensitive.
    pub fn parse(label: &str) -> Self {
        match label {
            "Food" => Category::Food,
            "Transportation" => Category::Transportation,
            "Entertainment" => Category::Entertainment,
            "Health" => Category::Health,
            "Education" => Category::Education,
            "Shopping" => Category::Shopping,
            "Bills" => Category::Bills,
            "Other" => Category::Other,
            other => Category::Unrecognized(other.to_string()),
        }
    }

    /// The label as it appears in the data.
    pub fn label(&self) -> &str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Other => "Other",
            Category::Unrecognized(raw) => raw,
        }
    }

    /// Hex color used when charting this category.
    pub fn color(&self) -> &'static str {
        match self {
            Category::Food => "#ef4444",
            Category::Transportation => "#3b82f6",
            Category::Entertainment => "#8b5cf6",
            Category::Health => "#10b981",
            Category::Education => "#f59e0b",
            Category::Shopping => "#ec4899",
            Category::Bills => "#6b7280",
            Category::Other => "#14b8a6",
            Category::Unrecognized(_) => FALLBACK_CATEGORY_COLOR,
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, Category::Unrecognized(_))
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Category::parse(label)
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::parse(&label)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Unrecognized(raw) => raw,
            other => other.label().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single recorded expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExpenseRecord", into = "ExpenseRecord")]
pub struct Expense {
    /// Opaque identifier assigned by the store.
    pub id: String,
    /// Short description shown in lists.
    pub title: String,
    /// Non-negative amount in US dollars.
    pub amount: f64,
    pub category: Category,
    /// When the expense occurred. For an all-day expense this is midnight UTC
    /// of its calendar day.
    pub date: DateTime<Utc>,
    /// The expense was recorded against a calendar day rather than an instant,
    /// so it belongs to that day's month in every timezone.
    pub all_day: bool,
    pub description: Option<String>,
    /// When the record was created, as opposed to when the expense occurred.
    pub created_at: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn expense_date(&self) -> ExpenseDate {
        if self.all_day {
            ExpenseDate::Day(self.date.date_naive())
        } else {
            ExpenseDate::Instant(self.date)
        }
    }
}

/// On-disk form of an [`Expense`]: one JSON object per line, with the date
/// kept as written (`YYYY-MM-DD` or RFC 3339).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub category: Category,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = ExpenseError;

    fn try_from(record: ExpenseRecord) -> Result<Self> {
        let date = ExpenseDate::parse(&record.date)
            .ok_or_else(|| ExpenseError::DateParse(record.date.clone()))?;
        Ok(Expense {
            id: record.id,
            title: record.title,
            amount: record.amount,
            category: record.category,
            date: date.to_utc(),
            all_day: date.is_day(),
            description: record.description,
            created_at: record.created_at,
        })
    }
}

impl From<Expense> for ExpenseRecord {
    fn from(expense: Expense) -> Self {
        let date = match expense.expense_date() {
            ExpenseDate::Day(day) => day.format("%Y-%m-%d").to_string(),
            ExpenseDate::Instant(instant) => instant.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        };
        ExpenseRecord {
            id: expense.id,
            title: expense.title,
            amount: expense.amount,
            category: expense.category,
            date,
            description: expense.description,
            created_at: expense.created_at,
        }
    }
}

/// Validated input for a new expense, before the store assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub title: String,
    pub amount: f64,
    pub category: Category,
    pub date: ExpenseDate,
    pub description: Option<String>,
}

impl NewExpense {
    /// Reject inputs that would violate the [`Expense`] data model.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ExpenseError::InvalidExpense(
                "title must not be empty".to_string(),
            ));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(ExpenseError::InvalidExpense(format!(
                "amount must be a non-negative number, got {}",
                self.amount
            )));
        }
        Ok(())
    }

    /// Attach an id and creation timestamp, producing a stored [`Expense`].
    pub fn into_expense(self, id: String, created_at: DateTime<Utc>) -> Expense {
        Expense {
            id,
            title: self.title.trim().to_string(),
            amount: self.amount,
            category: self.category,
            date: self.date.to_utc(),
            all_day: self.date.is_day(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            created_at: Some(created_at),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
