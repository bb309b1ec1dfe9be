use clap::{CommandFactory, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::aggregator::DEFAULT_MONTHLY_INCOME;
use crate::calendar::TimezoneHandler;
use crate::error::{ExpenseError, Result};
use crate::models::Category;
use crate::query::{ExpenseQuery, SortKey};

/// `--category` value that turns the category filter off.
pub const ALL_CATEGORIES: &str = "All";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Personal expense tracking and spending analytics
#[derive(Parser, Debug, Clone)]
#[command(
    name = "expense-tracker",
    about = "Personal expense tracking and spending analytics",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Report to print
    #[arg(long, default_value = "dashboard", value_parser = ["dashboard", "list", "analytics", "trends", "categories"])]
    pub view: String,

    /// Monthly income used for savings rate and remaining budget
    #[arg(long, default_value_t = DEFAULT_MONTHLY_INCOME)]
    pub income: f64,

    /// Number of months in trend views (1-60)
    #[arg(long, default_value = "6", value_parser = clap::value_parser!(u32).range(1..=60))]
    pub months: u32,

    /// Timezone for month boundaries (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Reference date (YYYY-MM-DD) that ends the trend window; defaults to today
    #[arg(long)]
    pub reference_date: Option<String>,

    /// Expense data file (JSON Lines), or a directory of them opened read-only
    #[arg(long, env = "EXPENSE_TRACKER_DATA")]
    pub data_file: Option<PathBuf>,

    /// Use the built-in sample expenses instead of the data file
    #[arg(long)]
    pub demo: bool,

    /// Only list expenses whose title or description contains this text
    #[arg(long, default_value = "")]
    pub search: String,

    /// Only list expenses in this category ("All" disables the filter)
    #[arg(long)]
    pub category: Option<String>,

    /// List ordering
    #[arg(long, default_value = "date", value_parser = ["date", "amount", "title"])]
    pub sort: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,

    /// Problems found while loading settings, reported once logging is up.
    #[arg(skip)]
    pub warnings: Vec<String>,
}

/// Mutating commands; without one the selected report is printed.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Record a new expense
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "Other")]
        category: String,
        /// Date of the expense (YYYY-MM-DD or RFC 3339); defaults to now
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an expense by id
    Delete { id: String },
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.expense-tracker/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".expense-tracker").join("last_used.json")
    }

    /// Load persisted params from an explicit path. A missing file yields
    /// `Default`.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ExpenseError::FileRead {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> std::io::Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation; accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                settings
                    .warnings
                    .push(format!("Could not clear {}: {}", config_path.display(), e));
            }
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path).unwrap_or_else(|e| {
            settings.warnings.push(format!(
                "Ignoring unreadable settings file {}: {}",
                config_path.display(),
                e
            ));
            LastUsedParams::default()
        });

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "income") {
            if let Some(v) = last.income {
                settings.income = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "months") {
            if let Some(v) = last.months.filter(|m| (1..=60).contains(m)) {
                settings.months = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            settings.warnings.push(format!(
                "Could not persist settings to {}: {}",
                config_path.display(),
                e
            ));
        }

        settings
    }

    /// The list query described by `--search`, `--category` and `--sort`.
    pub fn expense_query(&self) -> ExpenseQuery {
        ExpenseQuery::new()
            .search(self.search.clone())
            .category(self.category_filter())
            .sort(self.sort.parse().unwrap_or(SortKey::Date))
    }

    /// The `--category` filter; absent or `All` means every category.
    pub fn category_filter(&self) -> Option<Category> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty() && *label != ALL_CATEGORIES)
            .map(Category::parse)
    }

    /// Resolve `"auto"` sentinel values, check the timezone and category
    /// names, and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::calendar::get_system_timezone();
        }
        if !TimezoneHandler::validate_timezone(&settings.timezone) {
            settings.warnings.push(format!(
                "Unknown timezone \"{}\", using UTC",
                settings.timezone
            ));
            settings.timezone = "UTC".to_string();
        }

        if let Some(category) = settings.category_filter().filter(|c| !c.is_canonical()) {
            let known: Vec<String> = Category::CANONICAL
                .iter()
                .map(|c| c.label().to_string())
                .collect();
            settings.warnings.push(format!(
                "\"{}\" is not a standard category ({})",
                category,
                known.join(", ")
            ));
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            income: Some(s.income),
            months: Some(s.months),
            timezone: Some(s.timezone.clone()),
            view: Some(s.view.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
