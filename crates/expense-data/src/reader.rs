//! JSON Lines persistence for expenses.
//!
//! Each line of a data file holds one serialized [`Expense`]. Blank lines are
//! ignored and malformed lines are logged and skipped so that one bad record
//! never hides the rest of the file.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use expense_core::error::{ExpenseError, Result};
use expense_core::models::Expense;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

// ── Public API ────────────────────────────────────────────────────────────────

/// Every `.jsonl` file under `root`, in path order. Unreadable entries are
/// skipped; a missing `root` yields nothing.
pub fn find_jsonl_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| {
            entry
                .map_err(|e| debug!("Skipping {}: {}", root.display(), e))
                .ok()
        })
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "jsonl")
        })
        .map(DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Read every expense from a single JSONL file.
///
/// A missing file yields an empty list; any other I/O failure is an error.
pub fn read_expense_file(path: &Path) -> Result<Vec<Expense>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No expense file at {}, starting empty", path.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(ExpenseError::FileRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    Ok(parse_expense_lines(&content, path))
}

/// Load expenses from every `.jsonl` file under `data_path`.
///
/// Records whose id was already seen in an earlier file are dropped. The
/// result is sorted newest first.
pub fn load_expenses_from_dir(data_path: &Path) -> Vec<Expense> {
    let files = find_jsonl_files(data_path);
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut all: Vec<Expense> = Vec::new();

    for file_path in &files {
        match read_expense_file(file_path) {
            Ok(expenses) => {
                for expense in expenses {
                    if seen_ids.insert(expense.id.clone()) {
                        all.push(expense);
                    } else {
                        debug!("Skipping duplicate expense id {}", expense.id);
                    }
                }
            }
            Err(e) => warn!("{}", e),
        }
    }

    sort_newest_first(&mut all);
    debug!("Loaded {} expenses from {} files", all.len(), files.len());
    all
}

/// Append one expense as a new line, creating the file and its parent
/// directories if needed.
pub fn append_expense(path: &Path, expense: &Expense) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let line = serde_json::to_string(expense)?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Atomically replace the file contents with `expenses`, one per line.
pub fn write_expense_file(path: &Path, expenses: &[Expense]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut body = String::new();
    for expense in expenses {
        body.push_str(&serde_json::to_string(expense)?);
        body.push('\n');
    }

    // Write to a temp file then rename for atomicity.
    let tmp = path.with_extension("jsonl.tmp");
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Order expenses by date, most recent first.
pub fn sort_newest_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| b.date.cmp(&a.date));
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse_expense_lines(content: &str, source: &Path) -> Vec<Expense> {
    let mut expenses = Vec::new();
    let mut skipped = 0u64;

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Expense>(trimmed) {
            Ok(expense) => expenses.push(expense),
            Err(e) => {
                skipped += 1;
                warn!(
                    "Skipping malformed expense at {}:{}: {}",
                    source.display(),
                    index + 1,
                    e
                );
            }
        }
    }

    debug!(
        "File {}: {} parsed, {} skipped",
        source.display(),
        expenses.len(),
        skipped
    );
    expenses
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::sample_expenses;
    use tempfile::TempDir;

    const GOOD_LINE: &str =
        r#"{"id":"a","title":"Bus","amount":2.5,"category":"Transportation","date":"2024-02-01"}"#;

    #[test]
    fn test_find_jsonl_files_recursive_and_sorted() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("2024");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join("b.jsonl"), "").unwrap();
        std::fs::write(nested.join("a.jsonl"), "").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "").unwrap();

        let files = find_jsonl_files(tmp.path());
        assert_eq!(files.len(), 2);
        assert!(files.windows(2).all(|w| w[0] < w[1]));
        assert!(files.iter().all(|f| f.extension().unwrap() == "jsonl"));
    }

    #[test]
    fn test_find_jsonl_files_missing_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(find_jsonl_files(&tmp.path().join("nope")).is_empty());
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let expenses = read_expense_file(&tmp.path().join("missing.jsonl")).unwrap();
        assert!(expenses.is_empty());
    }

    #[test]
    fn test_read_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = read_expense_file(tmp.path()).unwrap_err();
        assert!(matches!(err, ExpenseError::FileRead { .. }));
    }

    #[test]
    fn test_read_skips_blank_and_malformed_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("expenses.jsonl");
        let content = format!("{GOOD_LINE}\n\n{{not json}}\n{{\"id\":\"b\"}}\n");
        std::fs::write(&path, content).unwrap();

        let expenses = read_expense_file(&path).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].id, "a");
    }

    #[test]
    fn test_write_then_read_preserves_records() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("expenses.jsonl");
        let expenses = sample_expenses();

        write_expense_file(&path, &expenses).unwrap();
        assert_eq!(read_expense_file(&path).unwrap(), expenses);
        assert!(!path.with_extension("jsonl.tmp").exists());
    }

    #[test]
    fn test_append_adds_a_line() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("expenses.jsonl");
        let expenses = sample_expenses();

        append_expense(&path, &expenses[0]).unwrap();
        append_expense(&path, &expenses[1]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert_eq!(read_expense_file(&path).unwrap(), expenses[..2].to_vec());
    }

    #[test]
    fn test_load_from_dir_dedupes_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let expenses = sample_expenses();
        // Oldest first on disk, with one record repeated across files.
        let mut reversed = expenses.clone();
        reversed.reverse();
        write_expense_file(&tmp.path().join("a.jsonl"), &reversed[..5]).unwrap();
        write_expense_file(&tmp.path().join("b.jsonl"), &reversed[4..]).unwrap();

        let loaded = load_expenses_from_dir(tmp.path());
        assert_eq!(loaded, expenses);
    }
}
