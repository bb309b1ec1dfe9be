//! Expense stores: the collaborators that supply expense snapshots to the
//! aggregator and accept add/delete operations.
//!
//! [`open_store`] tries the JSONL file store first and falls back to an
//! in-memory store seeded with caller-provided data when the file cannot be
//! read.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use expense_core::error::Result;
use expense_core::models::{Expense, NewExpense};
use tracing::{debug, info, warn};

use crate::reader::{
    append_expense, load_expenses_from_dir, read_expense_file, sort_newest_first,
    write_expense_file,
};

// ── ExpenseStore ──────────────────────────────────────────────────────────────

/// Supplier of expense snapshots and sink for add/delete operations.
pub trait ExpenseStore {
    /// A consistent copy of all expenses, newest first.
    fn snapshot(&self) -> Vec<Expense>;

    /// Validate and store a new expense, returning it with its assigned id.
    fn add(&mut self, expense: NewExpense) -> Result<Expense>;

    /// Remove the expense with `id`. Returns `false` if it did not exist.
    fn delete(&mut self, id: &str) -> Result<bool>;
}

/// Assign an id derived from the creation time in milliseconds, suffixed when
/// that id is already taken.
fn unique_id(existing: &[Expense], now: DateTime<Utc>) -> String {
    let base = now.timestamp_millis().to_string();
    let taken = |candidate: &str| existing.iter().any(|e| e.id == candidate);
    if !taken(&base) {
        return base;
    }
    (1u32..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}

// ── InMemoryStore ─────────────────────────────────────────────────────────────

/// Vector-backed store. Used for demos and as the fallback when the data file
/// is unavailable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    expenses: Vec<Expense>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an explicit set of expenses.
    pub fn with_expenses(mut expenses: Vec<Expense>) -> Self {
        sort_newest_first(&mut expenses);
        Self { expenses }
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }
}

impl ExpenseStore for InMemoryStore {
    fn snapshot(&self) -> Vec<Expense> {
        self.expenses.clone()
    }

    fn add(&mut self, expense: NewExpense) -> Result<Expense> {
        expense.validate()?;
        let now = Utc::now();
        let stored = expense.into_expense(unique_id(&self.expenses, now), now);
        self.expenses.push(stored.clone());
        sort_newest_first(&mut self.expenses);
        debug!("Added expense {} to in-memory store", stored.id);
        Ok(stored)
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        let before = self.expenses.len();
        self.expenses.retain(|e| e.id != id);
        Ok(self.expenses.len() != before)
    }
}

// ── JsonlStore ────────────────────────────────────────────────────────────────

/// Store persisted to a single JSON Lines file.
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    expenses: Vec<Expense>,
}

impl JsonlStore {
    /// Load the store from `path`. A missing file opens an empty store; the
    /// file is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut expenses = read_expense_file(&path)?;
        sort_newest_first(&mut expenses);
        info!("Loaded {} expenses from {}", expenses.len(), path.display());
        Ok(Self { path, expenses })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExpenseStore for JsonlStore {
    fn snapshot(&self) -> Vec<Expense> {
        self.expenses.clone()
    }

    fn add(&mut self, expense: NewExpense) -> Result<Expense> {
        expense.validate()?;
        let now = Utc::now();
        let stored = expense.into_expense(unique_id(&self.expenses, now), now);
        append_expense(&self.path, &stored)?;
        self.expenses.push(stored.clone());
        sort_newest_first(&mut self.expenses);
        debug!("Appended expense {} to {}", stored.id, self.path.display());
        Ok(stored)
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.expenses.iter().position(|e| e.id == id) else {
            return Ok(false);
        };
        let mut remaining = self.expenses.clone();
        remaining.remove(index);
        write_expense_file(&self.path, &remaining)?;
        self.expenses = remaining;
        debug!("Deleted expense {} from {}", id, self.path.display());
        Ok(true)
    }
}

// ── Store selection ───────────────────────────────────────────────────────────

/// The store actually in use after [`open_store`].
#[derive(Debug)]
pub enum Store {
    File(JsonlStore),
    /// Every JSONL file under a directory, merged. Changes are not persisted.
    Directory(InMemoryStore),
    /// In-memory fallback; changes are not persisted.
    Memory(InMemoryStore),
}

impl Store {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Store::Memory(_))
    }

    /// Whether `add` and `delete` reach disk.
    pub fn is_persistent(&self) -> bool {
        matches!(self, Store::File(_))
    }
}

impl ExpenseStore for Store {
    fn snapshot(&self) -> Vec<Expense> {
        match self {
            Store::File(s) => s.snapshot(),
            Store::Directory(s) | Store::Memory(s) => s.snapshot(),
        }
    }

    fn add(&mut self, expense: NewExpense) -> Result<Expense> {
        match self {
            Store::File(s) => s.add(expense),
            Store::Directory(s) | Store::Memory(s) => s.add(expense),
        }
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        match self {
            Store::File(s) => s.delete(id),
            Store::Directory(s) | Store::Memory(s) => s.delete(id),
        }
    }
}

/// Open the file store at `path`, falling back to an in-memory store seeded
/// with `fallback` when the file cannot be read.
///
/// A directory is read as a set of JSONL files and opened read-only.
pub fn open_store(path: &Path, fallback: Vec<Expense>) -> Store {
    if path.is_dir() {
        let expenses = load_expenses_from_dir(path);
        info!("Loaded {} expenses from directory {}", expenses.len(), path.display());
        return Store::Directory(InMemoryStore::with_expenses(expenses));
    }

    match JsonlStore::open(path) {
        Ok(store) => Store::File(store),
        Err(e) => {
            warn!(
                "Falling back to in-memory expenses ({} records): {}",
                fallback.len(),
                e
            );
            Store::Memory(InMemoryStore::with_expenses(fallback))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::sample_expenses;
    use chrono::TimeZone;
    use expense_core::calendar::ExpenseDate;
    use expense_core::error::ExpenseError;
    use expense_core::models::Category;
    use tempfile::TempDir;

    fn new_expense(title: &str, amount: f64, day: u32) -> NewExpense {
        NewExpense {
            title: title.to_string(),
            amount,
            category: Category::Shopping,
            date: ExpenseDate::Instant(Utc.with_ymd_and_hms(2024, 2, day, 0, 0, 0).unwrap()),
            description: Some("test".to_string()),
        }
    }

    // ── unique_id ─────────────────────────────────────────────────────────────

    #[test]
    fn test_unique_id_suffixes_collisions() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let mut existing = sample_expenses();
        assert_eq!(unique_id(&existing, now), "1700000000000");

        existing[0].id = "1700000000000".to_string();
        existing[1].id = "1700000000000-1".to_string();
        assert_eq!(unique_id(&existing, now), "1700000000000-2");
    }

    // ── InMemoryStore ─────────────────────────────────────────────────────────

    #[test]
    fn test_in_memory_seeded_snapshot_is_newest_first() {
        let mut seed = sample_expenses();
        seed.reverse();
        let store = InMemoryStore::with_expenses(seed);
        assert_eq!(store.snapshot(), sample_expenses());
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_in_memory_add_assigns_id_and_created_at() {
        let mut store = InMemoryStore::with_expenses(sample_expenses());
        let added = store.add(new_expense("Shoes", 120.0, 3)).unwrap();

        assert!(!added.id.is_empty());
        assert!(added.created_at.is_some());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 9);
        // February is newer than every January sample.
        assert_eq!(snapshot[0].id, added.id);
    }

    #[test]
    fn test_in_memory_add_ids_are_unique() {
        let mut store = InMemoryStore::new();
        let a = store.add(new_expense("A", 1.0, 1)).unwrap();
        let b = store.add(new_expense("B", 2.0, 2)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_in_memory_add_rejects_invalid() {
        let mut store = InMemoryStore::new();
        let err = store.add(new_expense("", 1.0, 1)).unwrap_err();
        assert!(matches!(err, ExpenseError::InvalidExpense(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_in_memory_delete() {
        let mut store = InMemoryStore::with_expenses(sample_expenses());
        assert!(store.delete("3").unwrap());
        assert!(!store.delete("3").unwrap());
        assert_eq!(store.len(), 7);
        assert!(store.snapshot().iter().all(|e| e.id != "3"));
    }

    // ── JsonlStore ────────────────────────────────────────────────────────────

    #[test]
    fn test_jsonl_store_persists_add_and_delete() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data").join("expenses.jsonl");

        let mut store = JsonlStore::open(&path).unwrap();
        assert!(store.snapshot().is_empty());
        let kept = store.add(new_expense("Kept", 10.0, 1)).unwrap();
        let dropped = store.add(new_expense("Dropped", 20.0, 2)).unwrap();
        assert!(store.delete(&dropped.id).unwrap());
        assert!(!store.delete("missing").unwrap());

        let reopened = JsonlStore::open(&path).unwrap();
        let snapshot = reopened.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, kept.id);
        assert_eq!(snapshot[0].title, "Kept");
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn test_jsonl_store_invalid_add_does_not_touch_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("expenses.jsonl");
        let mut store = JsonlStore::open(&path).unwrap();
        assert!(store.add(new_expense("Bad", -5.0, 1)).is_err());
        assert!(!path.exists());
    }

    // ── open_store ────────────────────────────────────────────────────────────

    #[test]
    fn test_open_store_uses_file_when_readable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("expenses.jsonl");
        crate::reader::write_expense_file(&path, &sample_expenses()[..2]).unwrap();

        let store = open_store(&path, sample_expenses());
        assert!(!store.is_fallback());
        assert!(store.is_persistent());
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn test_open_store_falls_back_to_fixture() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("expenses.jsonl");
        // Not valid UTF-8, so the file cannot be read as text.
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        let store = open_store(&path, sample_expenses());
        assert!(store.is_fallback());
        assert!(!store.is_persistent());
        assert_eq!(store.snapshot(), sample_expenses());
    }

    #[test]
    fn test_open_store_merges_a_directory() {
        let tmp = TempDir::new().unwrap();
        let expenses = sample_expenses();
        crate::reader::write_expense_file(&tmp.path().join("2024-a.jsonl"), &expenses[..3])
            .unwrap();
        crate::reader::write_expense_file(
            &tmp.path().join("archive").join("2024-b.jsonl"),
            &expenses[3..],
        )
        .unwrap();

        let store = open_store(tmp.path(), Vec::new());
        assert!(matches!(store, Store::Directory(_)));
        assert!(!store.is_fallback());
        assert!(!store.is_persistent());
        assert_eq!(store.snapshot(), expenses);
    }
}
