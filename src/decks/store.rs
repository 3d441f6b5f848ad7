//! Deck store contract
//!
//! A store owns all persisted scheduler state: decks, definitions and box
//! membership. Every term of a deck is in exactly one box. Implementations
//! must make `box_counts` a single consistent snapshot and `move_term` a
//! single atomic step, so a concurrent reader never sees a term missing
//! from every box.

use rand::RngCore;
use thiserror::Error;
use uuid::Uuid;

use super::models::{BoxCounts, Deck, DeckId};

#[derive(Error, Debug)]
pub enum DeckStoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deck not found: {0}")]
    DeckNotFound(DeckId),

    #[error("Invalid deck name")]
    InvalidName,

    #[error("Invalid term: terms must not be empty")]
    InvalidTerm,

    #[error("Invalid box: {0}")]
    InvalidBox(usize),
}

pub type Result<T> = std::result::Result<T, DeckStoreError>;

pub trait DeckStore: Send + Sync {
    // ==================== Decks ====================

    /// Create an empty deck with the next free id
    fn create_deck(&self, owner: Uuid, name: &str) -> Result<Deck>;

    /// Get a deck, only if it belongs to `owner`
    fn get_deck(&self, owner: Uuid, id: DeckId) -> Result<Option<Deck>>;

    /// All decks of `owner`, ordered by id
    fn list_decks(&self, owner: Uuid) -> Result<Vec<Deck>>;

    // ==================== Terms ====================

    /// Set a term's definition. A term new to the deck goes into box 0 in
    /// the same step. Returns true if the term was inserted.
    fn define(&self, deck_id: DeckId, term: &str, definition: &str) -> Result<bool>;

    /// Definition of a term, if the deck has it
    fn lookup(&self, deck_id: DeckId, term: &str) -> Result<Option<String>>;

    /// Define many terms at once. Returns the number of inserted terms.
    fn fill(&self, deck_id: DeckId, rows: &[(String, String)]) -> Result<usize> {
        let mut inserted = 0;
        for (term, definition) in rows {
            if self.define(deck_id, term, definition)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    // ==================== Boxes ====================

    /// Place a term in a box unless it already belongs to one.
    /// Returns true if the term was added.
    fn add_term_to_box(&self, deck_id: DeckId, term: &str, box_index: usize) -> Result<bool>;

    /// Cardinality of every box, read as one snapshot
    fn box_counts(&self, deck_id: DeckId) -> Result<BoxCounts>;

    /// A uniformly random member of a box, or `None` if the box is empty
    fn sample_from_box(
        &self,
        deck_id: DeckId,
        box_index: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Option<String>>;

    /// Atomically move a term from one box to another. Returns false, and
    /// changes nothing, if the term is not in `from` or either box is out of
    /// range. `from == to` never writes and returns false.
    fn move_term(&self, deck_id: DeckId, term: &str, from: usize, to: usize) -> Result<bool>;

    /// Members of a box in term order
    fn box_members(&self, deck_id: DeckId, box_index: usize) -> Result<Vec<String>>;
}

/// Trimmed, non-empty deck name
pub(crate) fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DeckStoreError::InvalidName);
    }
    Ok(name)
}

pub(crate) fn validate_term(term: &str) -> Result<()> {
    if term.is_empty() {
        return Err(DeckStoreError::InvalidTerm);
    }
    Ok(())
}
