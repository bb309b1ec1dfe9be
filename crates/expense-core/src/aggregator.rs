//! Expense analytics: totals, category sums, monthly series and derived
//! financial metrics.
//!
//! Every function here is pure. Callers pass in a snapshot of expenses (and,
//! for time series, an explicit reference instant) and get a freshly computed
//! value back; nothing is cached between calls.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

use crate::calendar::{month_bounds, month_label, shift_months, ExpenseDate};
use crate::models::{Category, Expense};

/// Number of months shown in trend views by default.
pub const DEFAULT_MONTH_WINDOW: usize = 6;

/// Monthly income assumed when none is configured.
pub const DEFAULT_MONTHLY_INCOME: f64 = 5000.0;

// ── CompensatedSum ────────────────────────────────────────────────────────────

/// Neumaier-compensated running sum, so that totals do not drift with the
/// order in which amounts are added.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

// ── MonthBucket ───────────────────────────────────────────────────────────────

/// Spending within one calendar month of a trailing window.
#[derive(Debug, Clone, Serialize)]
pub struct MonthBucket {
    pub year: i32,
    /// 1-based month number.
    pub month: u32,
    /// Display label, e.g. `"Jan 2024"`.
    pub label: String,
    /// First instant of the month (inclusive).
    pub start: DateTime<Utc>,
    /// Last instant of the month (inclusive).
    pub end: DateTime<Utc>,
    pub total: f64,
    /// Expenses that fall in this month, in input order.
    pub members: Vec<Expense>,
}

impl MonthBucket {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Whether `expense` belongs to this month. All-day expenses match on
    /// their calendar day; timed ones on `[start, end]`.
    pub fn includes(&self, expense: &Expense) -> bool {
        match expense.expense_date() {
            ExpenseDate::Day(day) => day.year() == self.year && day.month() == self.month,
            ExpenseDate::Instant(instant) => self.contains(instant),
        }
    }
}

// ── Derived views ─────────────────────────────────────────────────────────────

/// One category's slice of total spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub amount: f64,
    /// Share of the overall total, `0.0..=100.0`.
    pub percentage: f64,
    pub color: &'static str,
}

/// Month-over-month figures derived from a monthly series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpendingInsights {
    pub monthly_average: f64,
    pub current_month: f64,
    pub previous_month: f64,
    /// Percent change from the previous month; `0.0` when there is no
    /// positive previous-month spending to compare against.
    pub monthly_change_pct: f64,
    pub highest_month: f64,
    pub lowest_month: f64,
}

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_expenses: f64,
    pub income: f64,
    pub savings_rate: f64,
    pub remaining_budget: f64,
    /// Spending as a percentage of income; `0.0` when income is not positive.
    /// Not capped, so overspending reads above 100.
    pub budget_used_pct: f64,
    /// No budget is left, i.e. `remaining_budget <= 0`.
    pub over_budget: bool,
}

// ── ExpenseAggregator ─────────────────────────────────────────────────────────

/// Stateless collection of expense aggregation functions.
pub struct ExpenseAggregator;

impl ExpenseAggregator {
    /// Sum of all amounts. `0.0` for an empty slice.
    pub fn total_of(expenses: &[Expense]) -> f64 {
        let mut total = CompensatedSum::default();
        for expense in expenses {
            total.add(expense.amount);
        }
        total.value()
    }

    /// Total spent per category.
    ///
    /// Keys are exactly the categories present in `expenses`, including
    /// unrecognised labels; absent categories are not zero-filled.
    pub fn category_totals(expenses: &[Expense]) -> BTreeMap<Category, f64> {
        let mut sums: BTreeMap<Category, CompensatedSum> = BTreeMap::new();
        for expense in expenses {
            sums.entry(expense.category.clone())
                .or_default()
                .add(expense.amount);
        }
        sums.into_iter().map(|(k, v)| (k, v.value())).collect()
    }

    /// Bucket expenses into the `window_size` calendar months ending with the
    /// month that contains `reference`, oldest first.
    ///
    /// Month boundaries are computed in `reference`'s timezone. Months with no
    /// expenses are still present with a zero total, so the result always has
    /// `window_size` entries. Expenses outside the window are ignored.
    pub fn monthly_series<Z: TimeZone>(
        expenses: &[Expense],
        window_size: usize,
        reference: &DateTime<Z>,
    ) -> Vec<MonthBucket> {
        let tz = reference.timezone();
        let (ref_year, ref_month) = (reference.year(), reference.month());

        (0..window_size)
            .rev()
            .filter_map(|months_back| {
                let delta = i32::try_from(months_back).ok()?;
                let (year, month) = shift_months(ref_year, ref_month, -delta);
                let (start, end) = month_bounds(&tz, year, month)?;
                Some(Self::fill_bucket(
                    expenses,
                    year,
                    month,
                    start.with_timezone(&Utc),
                    end.with_timezone(&Utc),
                ))
            })
            .collect()
    }

    /// Percentage of `income` left after all expenses.
    ///
    /// Returns `0.0` when `income` is zero, negative or NaN.
    pub fn savings_rate(income: f64, expenses: &[Expense]) -> f64 {
        if income.is_nan() || income <= 0.0 {
            return 0.0;
        }
        let total = Self::total_of(expenses);
        ((income - total) / income) * 100.0
    }

    /// Chart color for a raw category label; unknown labels get the neutral
    /// fallback gray.
    pub fn category_color_of(label: &str) -> &'static str {
        Category::parse(label).color()
    }

    /// Categories ranked by amount spent, largest first, with their share of
    /// the total. Ties keep category order.
    pub fn category_breakdown(expenses: &[Expense]) -> Vec<CategoryShare> {
        let total = Self::total_of(expenses);
        let mut shares: Vec<CategoryShare> = Self::category_totals(expenses)
            .into_iter()
            .map(|(category, amount)| CategoryShare {
                percentage: if total > 0.0 {
                    amount / total * 100.0
                } else {
                    0.0
                },
                color: category.color(),
                category,
                amount,
            })
            .collect();
        // Stable sort: equal amounts stay in BTreeMap (category) order.
        shares.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        shares
    }

    /// The category with the highest spending, if any.
    pub fn top_category(expenses: &[Expense]) -> Option<(Category, f64)> {
        Self::category_breakdown(expenses)
            .into_iter()
            .next()
            .map(|share| (share.category, share.amount))
    }

    /// Average, extremes and month-over-month change for a monthly series.
    pub fn spending_insights(series: &[MonthBucket]) -> SpendingInsights {
        if series.is_empty() {
            return SpendingInsights::default();
        }

        let totals: Vec<f64> = series.iter().map(|b| b.total).collect();
        let mut sum = CompensatedSum::default();
        for &t in &totals {
            sum.add(t);
        }

        let current_month = totals.last().copied().unwrap_or(0.0);
        let previous_month = totals
            .len()
            .checked_sub(2)
            .map(|i| totals[i])
            .unwrap_or(0.0);
        let monthly_change_pct = if previous_month > 0.0 {
            (current_month - previous_month) / previous_month * 100.0
        } else {
            0.0
        };

        SpendingInsights {
            monthly_average: sum.value() / totals.len() as f64,
            current_month,
            previous_month,
            monthly_change_pct,
            highest_month: totals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            lowest_month: totals.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }

    /// Totals, savings rate and remaining budget for the given income.
    pub fn dashboard_summary(income: f64, expenses: &[Expense]) -> DashboardSummary {
        let total_expenses = Self::total_of(expenses);
        let remaining_budget = income - total_expenses;
        DashboardSummary {
            total_expenses,
            income,
            savings_rate: Self::savings_rate(income, expenses),
            remaining_budget,
            budget_used_pct: if income > 0.0 {
                total_expenses / income * 100.0
            } else {
                0.0
            },
            over_budget: remaining_budget <= 0.0,
        }
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn fill_bucket(
        expenses: &[Expense],
        year: i32,
        month: u32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> MonthBucket {
        let mut bucket = MonthBucket {
            year,
            month,
            label: month_label(year, month),
            start,
            end,
            total: 0.0,
            members: Vec::new(),
        };
        let members: Vec<Expense> = expenses
            .iter()
            .filter(|e| bucket.includes(e))
            .cloned()
            .collect();
        bucket.members = members;
        bucket.total = Self::total_of(&bucket.members);
        bucket
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
