mod bootstrap;
mod report;

use anyhow::Result;
use chrono::Utc;
use expense_core::aggregator::ExpenseAggregator;
use expense_core::calendar::{parse_calendar_date, ExpenseDate, TimezoneHandler};
use expense_core::error::ExpenseError;
use expense_core::formatting::format_currency;
use expense_core::models::{Category, NewExpense};
use expense_core::settings::{Command, Settings};
use expense_data::fixture::sample_expenses;
use expense_data::{open_store, ExpenseStore, InMemoryStore, Store};

use report::ReportInput;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level)?;
    for warning in &settings.warnings {
        tracing::warn!("{}", warning);
    }

    tracing::info!("Expense Tracker v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Income: {}, Months: {}, Timezone: {}",
        settings.view,
        settings.income,
        settings.months,
        settings.timezone
    );

    let mut store = if settings.demo {
        tracing::info!("Demo mode: using sample expenses");
        Store::Memory(InMemoryStore::with_expenses(sample_expenses()))
    } else {
        let path = settings
            .data_file
            .clone()
            .unwrap_or_else(bootstrap::default_data_path);
        open_store(&path, sample_expenses())
    };

    if let Some(command) = settings.command.clone() {
        return run_command(&mut store, command);
    }

    let expenses = store.snapshot();
    let handler = TimezoneHandler::new(&settings.timezone);
    let reference = match settings.reference_date.as_deref() {
        Some(raw) => handler.at_date(parse_calendar_date(raw)?),
        None => handler.now(),
    };
    let series =
        ExpenseAggregator::monthly_series(&expenses, settings.months as usize, &reference);

    let input = ReportInput {
        expenses: &expenses,
        income: settings.income,
        query: settings.expense_query(),
        series,
    };
    print!("{}", report::render_view(&settings.view, &input));

    if store.is_fallback() && !settings.demo {
        eprintln!("Note: data file unavailable, showing sample expenses.");
    }

    Ok(())
}

fn run_command(store: &mut Store, command: Command) -> Result<()> {
    if !store.is_persistent() {
        tracing::warn!("Changes will not be persisted: no writable data file");
    }

    match command {
        Command::Add {
            title,
            amount,
            category,
            date,
            description,
        } => {
            let date = match date.as_deref() {
                Some(raw) => ExpenseDate::parse(raw)
                    .ok_or_else(|| ExpenseError::DateParse(raw.to_string()))?,
                None => ExpenseDate::Instant(Utc::now()),
            };
            let added = store.add(NewExpense {
                title,
                amount,
                category: Category::parse(&category),
                date,
                description,
            })?;
            tracing::info!("Recorded expense {}", added.id);
            println!(
                "Added {} ({}, {}) as {}",
                added.title,
                format_currency(added.amount),
                added.category,
                added.id
            );
        }
        Command::Delete { id } => {
            if !store.delete(&id)? {
                return Err(ExpenseError::NotFound(id).into());
            }
            tracing::info!("Deleted expense {}", id);
            println!("Deleted expense {id}");
        }
    }

    Ok(())
}
