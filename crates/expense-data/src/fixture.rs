//! Sample expense set used for demos, tests and as the in-memory fallback
//! when the data file cannot be read.
//!
//! The data is only ever handed out by value; callers decide where it goes.

use chrono::{DateTime, TimeZone, Utc};
use expense_core::models::{Category, Expense};

fn jan_2024(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn sample(
    id: &str,
    title: &str,
    amount: f64,
    category: Category,
    day: u32,
    description: &str,
) -> Expense {
    Expense {
        id: id.to_string(),
        title: title.to_string(),
        amount,
        category,
        date: jan_2024(day),
        all_day: true,
        description: Some(description.to_string()),
        created_at: None,
    }
}

/// Eight expenses from January 2024, newest first.
pub fn sample_expenses() -> Vec<Expense> {
    vec![
        sample("1", "Grocery Shopping", 85.50, Category::Food, 15, "Weekly groceries from Whole Foods"),
        sample("2", "Gas Station", 45.20, Category::Transportation, 14, "Fuel for car"),
        sample("3", "Netflix Subscription", 15.99, Category::Entertainment, 13, "Monthly streaming subscription"),
        sample("4", "Coffee Shop", 12.75, Category::Food, 12, "Morning coffee and pastry"),
        sample("5", "Gym Membership", 49.99, Category::Health, 11, "Monthly gym membership fee"),
        sample("6", "Online Course", 89.99, Category::Education, 10, "React development course"),
        sample("7", "Restaurant Dinner", 67.80, Category::Food, 9, "Dinner with friends"),
        sample("8", "Uber Ride", 18.50, Category::Transportation, 8, "Ride to downtown"),
    ]
}
