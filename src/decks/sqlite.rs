//! SQLite deck store
//!
//! Each term is a single row in `cards` carrying its box number, so the
//! "exactly one box" invariant is enforced by the primary key. A move is one
//! conditional `UPDATE` and the box counts are one grouped `SELECT`, which
//! gives the atomicity the scheduler relies on without extra locking.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::models::{BoxCounts, Deck, DeckId, BOX_COUNT};
use super::store::{validate_name, validate_term, DeckStore, DeckStoreError, Result};

/// How long a statement waits on a lock held by another connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Deck store backed by a SQLite database file
pub struct SqliteDeckStore {
    conn: Mutex<Connection>,
}

impl SqliteDeckStore {
    /// Open (or create) the database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        log::debug!("Opened deck database at {:?}", db_path);
        Self::with_connection(conn)
    }

    /// A private database that lives as long as the store
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(&format!(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS decks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- One row per term; `box` is its current Leitner box
            CREATE TABLE IF NOT EXISTS cards (
                deck_id INTEGER NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
                term TEXT NOT NULL,
                definition TEXT,
                box INTEGER NOT NULL DEFAULT 0 CHECK (box >= 0 AND box < {box_count}),
                PRIMARY KEY (deck_id, term)
            );

            CREATE INDEX IF NOT EXISTS idx_decks_owner ON decks(owner);
            CREATE INDEX IF NOT EXISTS idx_cards_deck_box ON cards(deck_id, box);
            "#,
            box_count = BOX_COUNT
        ))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DeckStoreError::Unavailable("database connection lock poisoned".to_string()))
    }
}

fn ensure_deck(conn: &Connection, deck_id: DeckId) -> Result<()> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM decks WHERE id = ?1", params![deck_id], |row| row.get(0))
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(DeckStoreError::DeckNotFound(deck_id)),
    }
}

/// Insert a term into box 0 or update its definition in place
fn upsert_term(conn: &Connection, deck_id: DeckId, term: &str, definition: &str) -> Result<bool> {
    let existing: Option<i64> = conn
        .prepare_cached("SELECT box FROM cards WHERE deck_id = ?1 AND term = ?2")?
        .query_row(params![deck_id, term], |row| row.get(0))
        .optional()?;

    if existing.is_some() {
        conn.prepare_cached("UPDATE cards SET definition = ?3 WHERE deck_id = ?1 AND term = ?2")?
            .execute(params![deck_id, term, definition])?;
        return Ok(false);
    }

    conn.prepare_cached(
        "INSERT INTO cards (deck_id, term, definition, box) VALUES (?1, ?2, ?3, 0)",
    )?
    .execute(params![deck_id, term, definition])?;
    Ok(true)
}

fn row_to_deck(row: &Row) -> rusqlite::Result<Deck> {
    let owner: String = row.get(1)?;
    let created_at: String = row.get(3)?;

    let owner = Uuid::parse_str(&owner)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(Deck {
        id: row.get(0)?,
        owner,
        name: row.get(2)?,
        created_at,
    })
}

impl DeckStore for SqliteDeckStore {
    fn create_deck(&self, owner: Uuid, name: &str) -> Result<Deck> {
        let name = validate_name(name)?;
        let created_at = Utc::now();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO decks (owner, name, created_at) VALUES (?1, ?2, ?3)",
            params![owner.to_string(), name, created_at.to_rfc3339()],
        )?;

        Ok(Deck {
            id: conn.last_insert_rowid(),
            owner,
            name: name.to_string(),
            created_at,
        })
    }

    fn get_deck(&self, owner: Uuid, id: DeckId) -> Result<Option<Deck>> {
        let conn = self.lock()?;
        let deck = conn
            .query_row(
                "SELECT id, owner, name, created_at FROM decks WHERE id = ?1 AND owner = ?2",
                params![id, owner.to_string()],
                row_to_deck,
            )
            .optional()?;
        Ok(deck)
    }

    fn list_decks(&self, owner: Uuid) -> Result<Vec<Deck>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, owner, name, created_at FROM decks WHERE owner = ?1 ORDER BY id",
        )?;
        let decks = stmt
            .query_map(params![owner.to_string()], row_to_deck)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(decks)
    }

    fn define(&self, deck_id: DeckId, term: &str, definition: &str) -> Result<bool> {
        validate_term(term)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        ensure_deck(&tx, deck_id)?;
        let inserted = upsert_term(&tx, deck_id, term, definition)?;
        tx.commit()?;
        Ok(inserted)
    }

    fn lookup(&self, deck_id: DeckId, term: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let definition: Option<Option<String>> = conn
            .query_row(
                "SELECT definition FROM cards WHERE deck_id = ?1 AND term = ?2",
                params![deck_id, term],
                |row| row.get(0),
            )
            .optional()?;
        Ok(definition.flatten())
    }

    fn fill(&self, deck_id: DeckId, rows: &[(String, String)]) -> Result<usize> {
        if rows.iter().any(|(term, _)| term.is_empty()) {
            return Err(DeckStoreError::InvalidTerm);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        ensure_deck(&tx, deck_id)?;

        let mut inserted = 0;
        for (term, definition) in rows {
            if upsert_term(&tx, deck_id, term, definition)? {
                inserted += 1;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn add_term_to_box(&self, deck_id: DeckId, term: &str, box_index: usize) -> Result<bool> {
        validate_term(term)?;
        if box_index >= BOX_COUNT {
            return Err(DeckStoreError::InvalidBox(box_index));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        ensure_deck(&tx, deck_id)?;
        let changed = tx.execute(
            "INSERT OR IGNORE INTO cards (deck_id, term, definition, box) VALUES (?1, ?2, NULL, ?3)",
            params![deck_id, term, box_index as i64],
        )?;
        tx.commit()?;
        Ok(changed == 1)
    }

    fn box_counts(&self, deck_id: DeckId) -> Result<BoxCounts> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT box, COUNT(*) FROM cards WHERE deck_id = ?1 GROUP BY box",
        )?;
        let rows = stmt
            .query_map(params![deck_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut counts = [0u64; BOX_COUNT];
        for (box_index, count) in rows {
            if let Some(slot) = usize::try_from(box_index).ok().and_then(|i| counts.get_mut(i)) {
                *slot = count.max(0) as u64;
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
        if box_index >= BOX_COUNT {
            return Ok(None);
        }
        let box_index = box_index as i64;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM cards WHERE deck_id = ?1 AND box = ?2",
            params![deck_id, box_index],
            |row| row.get(0),
        )?;
        if count <= 0 {
            return Ok(None);
        }

        let offset = rng.gen_range(0..count);
        let term: Option<String> = tx
            .query_row(
                "SELECT term FROM cards WHERE deck_id = ?1 AND box = ?2 ORDER BY term LIMIT 1 OFFSET ?3",
                params![deck_id, box_index, offset],
                |row| row.get(0),
            )
            .optional()?;
        tx.commit()?;
        Ok(term)
    }

    fn move_term(&self, deck_id: DeckId, term: &str, from: usize, to: usize) -> Result<bool> {
        if from == to || from >= BOX_COUNT || to >= BOX_COUNT {
            return Ok(false);
        }

        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE cards SET box = ?4 WHERE deck_id = ?1 AND term = ?2 AND box = ?3",
            params![deck_id, term, from as i64, to as i64],
        )?;
        Ok(changed == 1)
    }

    fn box_members(&self, deck_id: DeckId, box_index: usize) -> Result<Vec<String>> {
        if box_index >= BOX_COUNT {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT term FROM cards WHERE deck_id = ?1 AND box = ?2 ORDER BY term",
        )?;
        let terms = stmt
            .query_map(params![deck_id, box_index as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(terms)
    }
}
