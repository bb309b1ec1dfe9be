//! Search, category filter and sort for the expense list.

use std::fmt;
use std::str::FromStr;

use crate::error::ExpenseError;
use crate::models::{Category, Expense};

/// Ordering applied to the expense list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Most recent first.
    #[default]
    Date,
    /// Largest amount first.
    Amount,
    /// Alphabetical by title, ignoring case.
    Title,
}

impl FromStr for SortKey {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "amount" => Ok(SortKey::Amount),
            "title" => Ok(SortKey::Title),
            other => Err(ExpenseError::Config(format!("unknown sort key: {other}"))),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Date => "date",
            SortKey::Amount => "amount",
            SortKey::Title => "title",
        })
    }
}

/// A list-view query: free-text search, optional category and sort order.
#[derive(Debug, Clone, Default)]
pub struct ExpenseQuery {
    /// Case-insensitive substring matched against title and description.
    pub search: String,
    /// `None` means all categories.
    pub category: Option<Category>,
    pub sort: SortKey,
}

impl ExpenseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Whether a single expense passes the search and category filters.
    pub fn matches(&self, expense: &Expense) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || expense.title.to_lowercase().contains(&needle)
            || expense
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
        let matches_category = self
            .category
            .as_ref()
            .map_or(true, |c| *c == expense.category);
        matches_search && matches_category
    }

    /// Filter and sort `expenses`. The sort is stable.
    pub fn apply<'a>(&self, expenses: &'a [Expense]) -> Vec<&'a Expense> {
        let mut selected: Vec<&Expense> = expenses.iter().filter(|e| self.matches(e)).collect();
        match self.sort {
            SortKey::Date => selected.sort_by(|a, b| b.date.cmp(&a.date)),
            SortKey::Amount => selected.sort_by(|a, b| b.amount.total_cmp(&a.amount)),
            SortKey::Title => {
                selected.sort_by_cached_key(|e| e.title.to_lowercase());
            }
        }
        selected
    }
}

/// Distinct categories in first-seen order, for populating a filter menu.
pub fn distinct_categories(expenses: &[Expense]) -> Vec<Category> {
    let mut seen: Vec<Category> = Vec::new();
    for expense in expenses {
        if !seen.contains(&expense.category) {
            seen.push(expense.category.clone());
        }
    }
    seen
}
