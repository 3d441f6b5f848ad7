//! Term picker and box assignment over a deck store
//!
//! The scheduler holds no state of its own between calls. Every pick
//! re-reads the box counts, every move is a single store operation.

use std::sync::Arc;

use rand::RngCore;
use thiserror::Error;
use uuid::Uuid;

use super::algorithm::{choose_box, destination};
use super::models::{BoxCounts, Deck, DeckId, MoveOutcome, MoveSignal, Pick};
use super::store::{DeckStore, DeckStoreError};
use crate::config::SchedulerConfig;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error(transparent)]
    Store(#[from] DeckStoreError),

    #[error("Deck {0} has no terms")]
    EmptyDeck(DeckId),

    #[error("Deck {deck_id} changed while picking a term ({attempts} attempts)")]
    InconsistentSnapshot { deck_id: DeckId, attempts: u32 },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Leitner scheduler bound to a shared deck store
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<dyn DeckStore>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(store: Arc<dyn DeckStore>, config: SchedulerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn DeckStore> {
        &self.store
    }

    // ==================== Picking ====================

    /// Choose the next term to quiz
    pub fn pick(&self, deck_id: DeckId) -> Result<Pick> {
        self.pick_with_rng(deck_id, &mut rand::thread_rng())
    }

    /// Choose the next term using the given random source.
    ///
    /// Takes a fresh count snapshot for every attempt. When the chosen box
    /// turns out to be empty (a concurrent move emptied it) the whole
    /// sequence is retried up to `max_pick_attempts` times.
    pub fn pick_with_rng<R: RngCore>(&self, deck_id: DeckId, rng: &mut R) -> Result<Pick> {
        let attempts = self.config.max_pick_attempts.max(1);

        for attempt in 1..=attempts {
            let counts = self.store.box_counts(deck_id)?;
            let box_index = choose_box(&counts, rng).ok_or(SchedulerError::EmptyDeck(deck_id))?;

            if let Some(term) = self.store.sample_from_box(deck_id, box_index, rng)? {
                log::debug!("Picked '{}' from box {} of deck {}", term, box_index, deck_id);
                return Ok(Pick { box_index, term });
            }

            log::warn!(
                "Box {} of deck {} was empty at sampling time (attempt {}/{}), counts were {:?}",
                box_index,
                deck_id,
                attempt,
                attempts,
                counts.as_array()
            );
        }

        Err(SchedulerError::InconsistentSnapshot { deck_id, attempts })
    }

    // ==================== Box assignment ====================

    /// Apply a quiz outcome to a term currently in `current_box`
    pub fn move_term(
        &self,
        deck_id: DeckId,
        term: &str,
        current_box: usize,
        signal: MoveSignal,
    ) -> Result<MoveOutcome> {
        self.apply(deck_id, term, current_box, Some(signal))
    }

    /// Apply a numeric move code (0 reset, -1 demote, 1 promote).
    /// Unknown codes leave the term where it is.
    pub fn move_by_code(
        &self,
        deck_id: DeckId,
        term: &str,
        current_box: usize,
        code: i64,
    ) -> Result<MoveOutcome> {
        let signal = MoveSignal::from_code(code);
        if signal.is_none() {
            log::warn!("Ignoring unknown move code {} for '{}' in deck {}", code, term, deck_id);
        }
        self.apply(deck_id, term, current_box, signal)
    }

    fn apply(
        &self,
        deck_id: DeckId,
        term: &str,
        current_box: usize,
        signal: Option<MoveSignal>,
    ) -> Result<MoveOutcome> {
        let to = destination(current_box, signal);
        if to == current_box {
            return Ok(MoveOutcome::unchanged(current_box));
        }

        let moved = self.store.move_term(deck_id, term, current_box, to)?;
        if moved {
            log::debug!("Moved '{}' in deck {} from box {} to {}", term, deck_id, current_box, to);
        } else {
            log::debug!("'{}' is not in box {} of deck {}, nothing moved", term, current_box, deck_id);
        }

        Ok(MoveOutcome {
            from: current_box,
            to,
            moved,
        })
    }

    // ==================== Decks and terms ====================

    pub fn create_deck(&self, owner: Uuid, name: &str) -> Result<Deck> {
        let deck = self.store.create_deck(owner, name)?;
        log::info!("Created deck {} '{}' ({})", deck.id, deck.name, deck.key());
        Ok(deck)
    }

    pub fn get_deck(&self, owner: Uuid, deck_id: DeckId) -> Result<Option<Deck>> {
        Ok(self.store.get_deck(owner, deck_id)?)
    }

    pub fn list_decks(&self, owner: Uuid) -> Result<Vec<Deck>> {
        Ok(self.store.list_decks(owner)?)
    }

    /// Set a definition, adding the term to box 0 if it is new
    pub fn define(&self, deck_id: DeckId, term: &str, definition: &str) -> Result<bool> {
        Ok(self.store.define(deck_id, term, definition)?)
    }

    pub fn lookup(&self, deck_id: DeckId, term: &str) -> Result<Option<String>> {
        Ok(self.store.lookup(deck_id, term)?)
    }

    /// Initial population: every new term starts in box 0
    pub fn fill(&self, deck_id: DeckId, rows: &[(String, String)]) -> Result<usize> {
        let inserted = self.store.fill(deck_id, rows)?;
        log::info!(
            "Filled deck {} with {} rows ({} new terms)",
            deck_id,
            rows.len(),
            inserted
        );
        Ok(inserted)
    }

    pub fn box_counts(&self, deck_id: DeckId) -> Result<BoxCounts> {
        Ok(self.store.box_counts(deck_id)?)
    }

    pub fn box_members(&self, deck_id: DeckId, box_index: usize) -> Result<Vec<String>> {
        Ok(self.store.box_members(deck_id, box_index)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decks::memory::MemoryDeckStore;
    use crate::decks::models::BOX_COUNT;
    use crate::decks::sqlite::SqliteDeckStore;
    use crate::decks::store;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::thread;

    fn memory_scheduler() -> Scheduler {
        Scheduler::new(Arc::new(MemoryDeckStore::new()), SchedulerConfig::default())
    }

    fn deck_with_boxes(scheduler: &Scheduler, boxes: &[(&str, usize)]) -> DeckId {
        let deck = scheduler.create_deck(Uuid::new_v4(), "Test").unwrap();
        for (term, box_index) in boxes {
            scheduler.store().add_term_to_box(deck.id, term, *box_index).unwrap();
        }
        deck.id
    }

    /// Every term is in exactly one box
    fn assert_partitioned(scheduler: &Scheduler, deck_id: DeckId, expected_terms: usize) {
        let mut seen = HashSet::new();
        for box_index in 0..BOX_COUNT {
            for term in scheduler.box_members(deck_id, box_index).unwrap() {
                assert!(seen.insert(term.clone()), "'{}' is in two boxes", term);
            }
        }
        assert_eq!(seen.len(), expected_terms);
        assert_eq!(scheduler.box_counts(deck_id).unwrap().total() as usize, expected_terms);
    }

    /// Store whose every call fails, standing in for a lost connection
    struct UnavailableStore;

    impl DeckStore for UnavailableStore {
        fn create_deck(&self, _: Uuid, _: &str) -> store::Result<Deck> {
            Err(DeckStoreError::Unavailable("offline".into()))
        }
        fn get_deck(&self, _: Uuid, _: DeckId) -> store::Result<Option<Deck>> {
            Err(DeckStoreError::Unavailable("offline".into()))
        }
        fn list_decks(&self, _: Uuid) -> store::Result<Vec<Deck>> {
            Err(DeckStoreError::Unavailable("offline".into()))
        }
        fn define(&self, _: DeckId, _: &str, _: &str) -> store::Result<bool> {
            Err(DeckStoreError::Unavailable("offline".into()))
        }
        fn lookup(&self, _: DeckId, _: &str) -> store::Result<Option<String>> {
            Err(DeckStoreError::Unavailable("offline".into()))
        }
        fn add_term_to_box(&self, _: DeckId, _: &str, _: usize) -> store::Result<bool> {
            Err(DeckStoreError::Unavailable("offline".into()))
        }
        fn box_counts(&self, _: DeckId) -> store::Result<BoxCounts> {
            Err(DeckStoreError::Unavailable("offline".into()))
        }
        fn sample_from_box(&self, _: DeckId, _: usize, _: &mut dyn RngCore) -> store::Result<Option<String>> {
            Err(DeckStoreError::Unavailable("offline".into()))
        }
        fn move_term(&self, _: DeckId, _: &str, _: usize, _: usize) -> store::Result<bool> {
            Err(DeckStoreError::Unavailable("offline".into()))
        }
        fn box_members(&self, _: DeckId, _: usize) -> store::Result<Vec<String>> {
            Err(DeckStoreError::Unavailable("offline".into()))
        }
    }

    /// Reports a populated box 1 but never has anything to sample
    struct StaleCountsStore;

    impl DeckStore for StaleCountsStore {
        fn create_deck(&self, _: Uuid, _: &str) -> store::Result<Deck> {
            Err(DeckStoreError::InvalidName)
        }
        fn get_deck(&self, _: Uuid, _: DeckId) -> store::Result<Option<Deck>> {
            Ok(None)
        }
        fn list_decks(&self, _: Uuid) -> store::Result<Vec<Deck>> {
            Ok(Vec::new())
        }
        fn define(&self, deck_id: DeckId, _: &str, _: &str) -> store::Result<bool> {
            Err(DeckStoreError::DeckNotFound(deck_id))
        }
        fn lookup(&self, _: DeckId, _: &str) -> store::Result<Option<String>> {
            Ok(None)
        }
        fn add_term_to_box(&self, deck_id: DeckId, _: &str, _: usize) -> store::Result<bool> {
            Err(DeckStoreError::DeckNotFound(deck_id))
        }
        fn box_counts(&self, _: DeckId) -> store::Result<BoxCounts> {
            Ok(BoxCounts::new([0, 2, 0, 0, 0]))
        }
        fn sample_from_box(&self, _: DeckId, _: usize, _: &mut dyn RngCore) -> store::Result<Option<String>> {
            Ok(None)
        }
        fn move_term(&self, _: DeckId, _: &str, _: usize, _: usize) -> store::Result<bool> {
            Ok(false)
        }
        fn box_members(&self, _: DeckId, _: usize) -> store::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_pick_empty_deck() {
        let scheduler = memory_scheduler();
        let deck_id = deck_with_boxes(&scheduler, &[]);
        assert!(matches!(
            scheduler.pick(deck_id),
            Err(SchedulerError::EmptyDeck(id)) if id == deck_id
        ));
        // Unknown decks read as empty
        assert!(matches!(scheduler.pick(404), Err(SchedulerError::EmptyDeck(404))));
    }

    #[test]
    fn test_pick_only_box_zero() {
        let scheduler = memory_scheduler();
        let deck_id = deck_with_boxes(&scheduler, &[("a", 0), ("b", 0), ("c", 0), ("d", 0)]);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            assert_eq!(scheduler.pick_with_rng(deck_id, &mut rng).unwrap().box_index, 0);
        }
    }

    #[test]
    fn test_pick_single_populated_box() {
        let scheduler = memory_scheduler();
        let deck_id = deck_with_boxes(&scheduler, &[("x", 3), ("y", 3)]);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let pick = scheduler.pick_with_rng(deck_id, &mut rng).unwrap();
            assert_eq!(pick.box_index, 3);
            assert!(pick.term == "x" || pick.term == "y");
        }
    }

    #[test]
    fn test_pick_returns_member_of_chosen_box() {
        let scheduler = memory_scheduler();
        let deck_id = deck_with_boxes(&scheduler, &[("a", 0), ("b", 1), ("c", 2), ("d", 4)]);
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..500 {
            let pick = scheduler.pick_with_rng(deck_id, &mut rng).unwrap();
            let members = scheduler.box_members(deck_id, pick.box_index).unwrap();
            assert!(members.contains(&pick.term));
        }
    }

    #[test]
    fn test_pick_two_boxes_distribution() {
        let scheduler = memory_scheduler();
        let deck_id = deck_with_boxes(&scheduler, &[("a", 0), ("b", 1)]);
        let mut rng = StdRng::seed_from_u64(77);
        let mut box_zero = 0;
        for _ in 0..9_000 {
            if scheduler.pick_with_rng(deck_id, &mut rng).unwrap().box_index == 0 {
                box_zero += 1;
            }
        }
        // Cutoff for box 0 is 2/3
        let share = box_zero as f64 / 9_000.0;
        assert!((share - 2.0 / 3.0).abs() < 0.03, "share: {}", share);
    }

    #[test]
    fn test_pick_gives_up_on_inconsistent_snapshots() {
        let scheduler = Scheduler::new(
            Arc::new(StaleCountsStore),
            SchedulerConfig { max_pick_attempts: 4 },
        );
        assert!(matches!(
            scheduler.pick(1),
            Err(SchedulerError::InconsistentSnapshot { deck_id: 1, attempts: 4 })
        ));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let scheduler = Scheduler::new(
            Arc::new(StaleCountsStore),
            SchedulerConfig { max_pick_attempts: 0 },
        );
        assert!(matches!(
            scheduler.pick(1),
            Err(SchedulerError::InconsistentSnapshot { attempts: 1, .. })
        ));
    }

    #[test]
    fn test_store_errors_propagate() {
        let scheduler = Scheduler::new(Arc::new(UnavailableStore), SchedulerConfig::default());
        assert!(matches!(
            scheduler.pick(1),
            Err(SchedulerError::Store(DeckStoreError::Unavailable(_)))
        ));
        assert!(matches!(
            scheduler.move_term(1, "word", 1, MoveSignal::Promote),
            Err(SchedulerError::Store(DeckStoreError::Unavailable(_)))
        ));
        // A no-op never reaches the store
        assert_eq!(
            scheduler.move_term(1, "word", 4, MoveSignal::Promote).unwrap(),
            MoveOutcome::unchanged(4)
        );
    }

    #[test]
    fn test_promote_moves_term_up() {
        let scheduler = memory_scheduler();
        let deck_id = deck_with_boxes(&scheduler, &[("word", 2), ("other", 2)]);

        let outcome = scheduler.move_term(deck_id, "word", 2, MoveSignal::Promote).unwrap();
        assert_eq!(outcome, MoveOutcome { from: 2, to: 3, moved: true });
        assert_eq!(scheduler.box_members(deck_id, 2).unwrap(), vec!["other"]);
        assert_eq!(scheduler.box_members(deck_id, 3).unwrap(), vec!["word"]);
    }

    #[test]
    fn test_demote_in_box_zero_is_noop() {
        let scheduler = memory_scheduler();
        let deck_id = deck_with_boxes(&scheduler, &[("word", 0), ("other", 0)]);

        let outcome = scheduler.move_term(deck_id, "word", 0, MoveSignal::Demote).unwrap();
        assert_eq!(outcome, MoveOutcome::unchanged(0));
        assert_eq!(scheduler.box_members(deck_id, 0).unwrap(), vec!["other", "word"]);
    }

    #[test]
    fn test_promote_in_last_box_is_noop() {
        let scheduler = memory_scheduler();
        let deck_id = deck_with_boxes(&scheduler, &[("word", BOX_COUNT - 1)]);

        let outcome = scheduler
            .move_term(deck_id, "word", BOX_COUNT - 1, MoveSignal::Promote)
            .unwrap();
        assert!(!outcome.moved);
        assert_eq!(scheduler.box_counts(deck_id).unwrap(), BoxCounts::new([0, 0, 0, 0, 1]));
    }

    #[test]
    fn test_reset_from_any_box() {
        let scheduler = memory_scheduler();
        let deck_id = deck_with_boxes(&scheduler, &[("a", 1), ("b", 2), ("c", 3), ("d", 4)]);

        for (term, box_index) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            let outcome = scheduler.move_term(deck_id, term, box_index, MoveSignal::Reset).unwrap();
            assert_eq!(outcome.to, 0);
            assert!(outcome.moved);
        }
        assert_eq!(scheduler.box_counts(deck_id).unwrap(), BoxCounts::new([4, 0, 0, 0, 0]));
    }

    #[test]
    fn test_noop_move_is_idempotent() {
        let scheduler = memory_scheduler();
        let deck_id = deck_with_boxes(&scheduler, &[("word", 0), ("other", 2)]);
        let before: Vec<_> = (0..BOX_COUNT)
            .map(|i| scheduler.box_members(deck_id, i).unwrap())
            .collect();

        scheduler.move_term(deck_id, "word", 0, MoveSignal::Demote).unwrap();
        scheduler.move_term(deck_id, "word", 0, MoveSignal::Demote).unwrap();

        let after: Vec<_> = (0..BOX_COUNT)
            .map(|i| scheduler.box_members(deck_id, i).unwrap())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_unknown_move_code_is_noop() {
        let scheduler = memory_scheduler();
        let deck_id = deck_with_boxes(&scheduler, &[("word", 2)]);

        let outcome = scheduler.move_by_code(deck_id, "word", 2, 5).unwrap();
        assert_eq!(outcome, MoveOutcome::unchanged(2));

        let outcome = scheduler.move_by_code(deck_id, "word", 2, -1).unwrap();
        assert_eq!(outcome, MoveOutcome { from: 2, to: 1, moved: true });
    }

    #[test]
    fn test_out_of_range_box_does_not_corrupt() {
        let scheduler = memory_scheduler();
        let deck_id = deck_with_boxes(&scheduler, &[("word", 1)]);

        let outcome = scheduler.move_term(deck_id, "word", 9, MoveSignal::Demote).unwrap();
        assert_eq!(outcome, MoveOutcome { from: 9, to: 8, moved: false });
        let outcome = scheduler.move_term(deck_id, "word", 9, MoveSignal::Promote).unwrap();
        assert!(!outcome.moved);
        assert_partitioned(&scheduler, deck_id, 1);
        assert_eq!(scheduler.box_members(deck_id, 1).unwrap(), vec!["word"]);
    }

    #[test]
    fn test_define_and_fill_seed_box_zero() {
        let scheduler = memory_scheduler();
        let owner = Uuid::new_v4();
        let deck = scheduler.create_deck(owner, "Capitals").unwrap();

        let rows = vec![
            ("France".to_string(), "Paris".to_string()),
            ("Peru".to_string(), "Lima".to_string()),
        ];
        assert_eq!(scheduler.fill(deck.id, &rows).unwrap(), 2);
        assert!(scheduler.define(deck.id, "Chad", "N'Djamena").unwrap());

        assert_eq!(scheduler.box_counts(deck.id).unwrap(), BoxCounts::new([3, 0, 0, 0, 0]));
        assert_eq!(scheduler.lookup(deck.id, "Peru").unwrap().as_deref(), Some("Lima"));
        assert_eq!(scheduler.list_decks(owner).unwrap(), vec![deck.clone()]);
        assert_eq!(scheduler.get_deck(owner, deck.id).unwrap(), Some(deck));
    }

    #[test]
    fn test_study_session_keeps_partition() {
        let scheduler = Scheduler::new(
            Arc::new(SqliteDeckStore::open_in_memory().unwrap()),
            SchedulerConfig::default(),
        );
        let deck = scheduler.create_deck(Uuid::new_v4(), "Session").unwrap();
        let rows: Vec<_> = (0..12)
            .map(|i| (format!("term{}", i), format!("definition {}", i)))
            .collect();
        scheduler.fill(deck.id, &rows).unwrap();

        let mut rng = StdRng::seed_from_u64(2024);
        let signals = [MoveSignal::Promote, MoveSignal::Promote, MoveSignal::Demote, MoveSignal::Reset];
        for round in 0..300 {
            let pick = scheduler.pick_with_rng(deck.id, &mut rng).unwrap();
            let signal = signals[round % signals.len()];
            scheduler.move_term(deck.id, &pick.term, pick.box_index, signal).unwrap();
            assert_partitioned(&scheduler, deck.id, rows.len());
        }
    }

    #[test]
    fn test_concurrent_moves_and_picks() {
        let scheduler = memory_scheduler();
        let deck = scheduler.create_deck(Uuid::new_v4(), "Shared").unwrap();
        let rows: Vec<_> = (0..20).map(|i| (format!("t{}", i), String::new())).collect();
        scheduler.fill(deck.id, &rows).unwrap();

        let handles: Vec<_> = (0..4u64)
            .map(|seed| {
                let scheduler = scheduler.clone();
                thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(seed);
                    for i in 0..250 {
                        let pick = match scheduler.pick_with_rng(deck.id, &mut rng) {
                            Ok(pick) => pick,
                            Err(SchedulerError::InconsistentSnapshot { .. }) => continue,
                            Err(e) => panic!("unexpected error: {}", e),
                        };
                        let signal = if i % 3 == 0 { MoveSignal::Demote } else { MoveSignal::Promote };
                        scheduler
                            .move_term(deck.id, &pick.term, pick.box_index, signal)
                            .unwrap();
                        let counts = scheduler.box_counts(deck.id).unwrap();
                        assert_eq!(counts.total(), 20);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_partitioned(&scheduler, deck.id, 20);
    }
}
