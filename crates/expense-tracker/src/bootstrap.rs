use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Root of the tracker's local state, `~/.expense-tracker/`.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".expense-tracker")
}

/// Ensure `~/.expense-tracker/` exists.
pub fn ensure_directories() -> anyhow::Result<()> {
    std::fs::create_dir_all(app_dir())?;
    Ok(())
}

/// Default expense data file, `~/.expense-tracker/expenses.jsonl`.
pub fn default_data_path() -> PathBuf {
    app_dir().join("expenses.jsonl")
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` is one of the CLI level names and is mapped to an
/// [`EnvFilter`] directive; unrecognised values fall back to `"info"`. Logs go
/// to stderr so that reports on stdout stay clean.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
