//! Expense collection layer for the expense tracker.
//!
//! Supplies expense snapshots to the analytics core: a JSON Lines file store,
//! an in-memory store, the sample fixture, and the loader that falls back from
//! one to the other.

pub mod fixture;
pub mod reader;
pub mod store;

pub use expense_core as core;
pub use store::{open_store, ExpenseStore, InMemoryStore, JsonlStore, Store};
