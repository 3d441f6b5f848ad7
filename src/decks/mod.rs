//! Leitner box flashcard scheduler
//!
//! This module provides:
//! - Deck and box data models
//! - Box assignment (promote/demote/reset) and weighted term picking
//! - The deck store contract with in-memory and SQLite implementations

pub mod algorithm;
pub mod memory;
pub mod models;
pub mod scheduler;
pub mod sqlite;
pub mod store;

pub use memory::MemoryDeckStore;
pub use models::*;
pub use scheduler::{Scheduler, SchedulerError};
pub use sqlite::SqliteDeckStore;
pub use store::{DeckStore, DeckStoreError};
