//! In-memory deck store
//!
//! All state sits behind one mutex, so snapshots and moves are trivially
//! atomic. Used for tests and for sessions that do not need to persist.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rand::{Rng, RngCore};
use uuid::Uuid;

use super::models::{BoxCounts, Deck, DeckId, BOX_COUNT};
use super::store::{validate_name, validate_term, DeckStore, DeckStoreError, Result};

#[derive(Debug)]
struct DeckEntry {
    deck: Deck,
    definitions: HashMap<String, String>,
    boxes: [BTreeSet<String>; BOX_COUNT],
}

impl DeckEntry {
    fn new(deck: Deck) -> Self {
        Self {
            deck,
            definitions: HashMap::new(),
            boxes: Default::default(),
        }
    }

    fn box_of(&self, term: &str) -> Option<usize> {
        self.boxes.iter().position(|members| members.contains(term))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: DeckId,
    decks: BTreeMap<DeckId, DeckEntry>,
}

/// Deck store that keeps everything in process memory
#[derive(Debug, Default)]
pub struct MemoryDeckStore {
    state: Mutex<MemoryState>,
}

impl MemoryDeckStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| DeckStoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn define_locked(state: &mut MemoryState, deck_id: DeckId, term: &str, definition: &str) -> Result<bool> {
        validate_term(term)?;
        let entry = state
            .decks
            .get_mut(&deck_id)
            .ok_or(DeckStoreError::DeckNotFound(deck_id))?;

        entry.definitions.insert(term.to_string(), definition.to_string());
        if entry.box_of(term).is_some() {
            return Ok(false);
        }
        entry.boxes[0].insert(term.to_string());
        Ok(true)
    }
}

impl DeckStore for MemoryDeckStore {
    fn create_deck(&self, owner: Uuid, name: &str) -> Result<Deck> {
        let name = validate_name(name)?;
        let mut state = self.lock()?;
        state.last_id += 1;

        let deck = Deck {
            id: state.last_id,
            owner,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.decks.insert(deck.id, DeckEntry::new(deck.clone()));
        Ok(deck)
    }

    fn get_deck(&self, owner: Uuid, id: DeckId) -> Result<Option<Deck>> {
        let state = self.lock()?;
        Ok(state
            .decks
            .get(&id)
            .filter(|entry| entry.deck.owner == owner)
            .map(|entry| entry.deck.clone()))
    }

    fn list_decks(&self, owner: Uuid) -> Result<Vec<Deck>> {
        let state = self.lock()?;
        Ok(state
            .decks
            .values()
            .filter(|entry| entry.deck.owner == owner)
            .map(|entry| entry.deck.clone())
            .collect())
    }

    fn define(&self, deck_id: DeckId, term: &str, definition: &str) -> Result<bool> {
        let mut state = self.lock()?;
        Self::define_locked(&mut state, deck_id, term, definition)
    }

    fn lookup(&self, deck_id: DeckId, term: &str) -> Result<Option<String>> {
        let state = self.lock()?;
        Ok(state
            .decks
            .get(&deck_id)
            .and_then(|entry| entry.definitions.get(term).cloned()))
    }

    fn fill(&self, deck_id: DeckId, rows: &[(String, String)]) -> Result<usize> {
        let mut state = self.lock()?;
        if !state.decks.contains_key(&deck_id) {
            return Err(DeckStoreError::DeckNotFound(deck_id));
        }
        if rows.iter().any(|(term, _)| term.is_empty()) {
            return Err(DeckStoreError::InvalidTerm);
        }

        let mut inserted = 0;
        for (term, definition) in rows {
            if Self::define_locked(&mut state, deck_id, term, definition)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn add_term_to_box(&self, deck_id: DeckId, term: &str, box_index: usize) -> Result<bool> {
        validate_term(term)?;
        if box_index >= BOX_COUNT {
            return Err(DeckStoreError::InvalidBox(box_index));
        }

        let mut state = self.lock()?;
        let entry = state
            .decks
            .get_mut(&deck_id)
            .ok_or(DeckStoreError::DeckNotFound(deck_id))?;
        if entry.box_of(term).is_some() {
            return Ok(false);
        }
        entry.boxes[box_index].insert(term.to_string());
        Ok(true)
    }

    fn box_counts(&self, deck_id: DeckId) -> Result<BoxCounts> {
        let state = self.lock()?;
        let mut counts = [0u64; BOX_COUNT];
        if let Some(entry) = state.decks.get(&deck_id) {
            for (count, members) in counts.iter_mut().zip(entry.boxes.iter()) {
                *count = members.len() as u64;
            }
        }
        Ok(BoxCounts::new(counts))
    }

    fn sample_from_box(
        &self,
        deck_id: DeckId,
        box_index: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Option<String>> {
        let state = self.lock()?;
        let Some(members) = state
            .decks
            .get(&deck_id)
            .and_then(|entry| entry.boxes.get(box_index))
        else {
            return Ok(None);
        };
        if members.is_empty() {
            return Ok(None);
        }

        let offset = rng.gen_range(0..members.len());
        Ok(members.iter().nth(offset).cloned())
    }

    fn move_term(&self, deck_id: DeckId, term: &str, from: usize, to: usize) -> Result<bool> {
        if from == to || from >= BOX_COUNT || to >= BOX_COUNT {
            return Ok(false);
        }

        let mut state = self.lock()?;
        let Some(entry) = state.decks.get_mut(&deck_id) else {
            return Ok(false);
        };
        if !entry.boxes[from].remove(term) {
            return Ok(false);
        }
        entry.boxes[to].insert(term.to_string());
        Ok(true)
    }

    fn box_members(&self, deck_id: DeckId, box_index: usize) -> Result<Vec<String>> {
        let state = self.lock()?;
        Ok(state
            .decks
            .get(&deck_id)
            .and_then(|entry| entry.boxes.get(box_index))
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }
}
