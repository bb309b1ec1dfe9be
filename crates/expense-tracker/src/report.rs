//! Plain-text reports built from the aggregator's outputs.
//!
//! Each renderer returns a `String` so the binary can print it and tests can
//! inspect it.

use std::fmt::Write as _;

use expense_core::aggregator::{ExpenseAggregator, MonthBucket};
use expense_core::formatting::{format_currency, format_percentage, format_signed_percentage};
use expense_core::models::Expense;
use expense_core::query::{distinct_categories, ExpenseQuery};
use expense_core::settings::ALL_CATEGORIES;

const BUDGET_BAR_WIDTH: usize = 30;

/// Everything a report needs, computed once by the caller.
pub struct ReportInput<'a> {
    pub expenses: &'a [Expense],
    pub income: f64,
    pub query: ExpenseQuery,
    /// Monthly series ending at the reference month, oldest first.
    pub series: Vec<MonthBucket>,
}

/// Render the named view; unknown names fall back to the dashboard.
pub fn render_view(view: &str, input: &ReportInput<'_>) -> String {
    match view {
        "list" => render_list(input.expenses, &input.query),
        "analytics" => render_analytics(input.expenses, &input.series),
        "trends" => render_trends(&input.series),
        "categories" => render_categories(input.expenses),
        _ => render_dashboard(input.expenses, input.income),
    }
}

// ── Views ─────────────────────────────────────────────────────────────────────

pub fn render_dashboard(expenses: &[Expense], income: f64) -> String {
    let summary = ExpenseAggregator::dashboard_summary(income, expenses);
    let mut out = String::from("Financial Dashboard\n\n");
    let _ = writeln!(out, "{:<18}{:>16}", "Total Expenses", format_currency(summary.total_expenses));
    let _ = writeln!(out, "{:<18}{:>16}", "Monthly Income", format_currency(summary.income));
    let _ = writeln!(out, "{:<18}{:>16}", "Savings Rate", format_percentage(summary.savings_rate, 1));
    let _ = writeln!(out, "{:<18}{:>16}", "Remaining Budget", format_currency(summary.remaining_budget));

    let _ = writeln!(out, "\nBudget Progress");
    let _ = writeln!(
        out,
        "Spent: {}  Budget: {}",
        format_currency(summary.total_expenses),
        format_currency(summary.income)
    );
    let _ = writeln!(out, "{}", budget_bar(summary.budget_used_pct));
    let _ = writeln!(
        out,
        "{} of budget used  {}",
        format_percentage(summary.budget_used_pct, 1),
        if summary.over_budget { "Over budget" } else { "Under budget" }
    );

    let _ = writeln!(out, "\n{} expenses recorded", expenses.len());
    out
}

pub fn render_list(expenses: &[Expense], query: &ExpenseQuery) -> String {
    let mut out = String::new();
    let mut filters = vec![ALL_CATEGORIES.to_string()];
    filters.extend(distinct_categories(expenses).iter().map(|c| c.label().to_string()));
    let selected_filter = query
        .category
        .as_ref()
        .map_or(ALL_CATEGORIES, |c| c.label());
    let marked: Vec<String> = filters
        .iter()
        .map(|f| if f == selected_filter { format!("[{f}]") } else { f.clone() })
        .collect();
    let _ = writeln!(out, "Categories: {}\n", marked.join(" "));

    let selected = query.apply(expenses);
    if selected.is_empty() {
        out.push_str("No expenses match the current filters.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<16} {:<10} {:<24} {:<15} {:>12}",
        "ID", "Date", "Title", "Category", "Amount"
    );
    for expense in &selected {
        let _ = writeln!(
            out,
            "{:<16} {:<10} {:<24} {:<15} {:>12}",
            expense.id,
            expense.date.format("%Y-%m-%d"),
            truncate(&expense.title, 24),
            truncate(expense.category.label(), 15),
            format_currency(expense.amount)
        );
    }
    let owned: Vec<Expense> = selected.into_iter().cloned().collect();
    let _ = writeln!(
        out,
        "\n{} shown, total {}",
        owned.len(),
        format_currency(ExpenseAggregator::total_of(&owned))
    );
    out
}

pub fn render_analytics(expenses: &[Expense], series: &[MonthBucket]) -> String {
    let insights = ExpenseAggregator::spending_insights(series);
    let mut out = String::from("Financial Analytics\n\n");

    match ExpenseAggregator::top_category(expenses) {
        Some((category, amount)) => {
            let _ = writeln!(
                out,
                "{:<24}{} ({})",
                "Top Spending Category",
                category,
                format_currency(amount)
            );
        }
        None => {
            let _ = writeln!(out, "{:<24}-", "Top Spending Category");
        }
    }
    let _ = writeln!(
        out,
        "{:<24}{} over {} months",
        "Monthly Average",
        format_currency(insights.monthly_average),
        series.len()
    );
    let _ = writeln!(
        out,
        "{:<24}{} vs last month",
        "Monthly Change",
        format_signed_percentage(insights.monthly_change_pct, 1)
    );
    out
}

pub fn render_trends(series: &[MonthBucket]) -> String {
    let insights = ExpenseAggregator::spending_insights(series);
    let mut out = String::from("Monthly Breakdown\n\n");
    for bucket in series {
        let _ = writeln!(
            out,
            "{:<10}{:>14}  ({} expenses)",
            bucket.label,
            format_currency(bucket.total),
            bucket.members.len()
        );
    }
    let _ = writeln!(out, "\n{:<16}{:>14}", "Highest Month", format_currency(insights.highest_month));
    let _ = writeln!(out, "{:<16}{:>14}", "Lowest Month", format_currency(insights.lowest_month));
    let _ = writeln!(out, "{:<16}{:>14}", "Average", format_currency(insights.monthly_average));
    out
}

pub fn render_categories(expenses: &[Expense]) -> String {
    let shares = ExpenseAggregator::category_breakdown(expenses);
    if shares.is_empty() {
        return "No expenses recorded.\n".to_string();
    }

    let mut out = String::from("Category Analysis\n\n");
    for share in &shares {
        let _ = writeln!(
            out,
            "{:<15}{:>14} {:>8}  {}",
            truncate(share.category.label(), 15),
            format_currency(share.amount),
            format!("({})", format_percentage(share.percentage, 1)),
            share.color
        );
    }
    out
}

/// A text progress bar for `pct` percent, capped at full.
fn budget_bar(pct: f64) -> String {
    let ratio = (pct / 100.0).clamp(0.0, 1.0);
    let filled = ((ratio * BUDGET_BAR_WIDTH as f64).round() as usize).min(BUDGET_BAR_WIDTH);
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(BUDGET_BAR_WIDTH - filled)
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

// ── Tests ─────────────────────────────────────────────────────────────────────
