//! Data models for the Leitner box scheduler

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of mastery boxes per deck. Box 0 holds the least mastered terms.
pub const BOX_COUNT: usize = 5;

/// Decks are numbered from a single increasing counter
pub type DeckId = i64;

/// A named collection of term/definition pairs belonging to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: DeckId,
    pub owner: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Deck {
    /// The external base-36 key for this deck
    pub fn key(&self) -> String {
        deck_key(self.id)
    }
}

/// Render a deck id as its base-36 key (e.g. 35 -> "z", 36 -> "10")
pub fn deck_key(id: DeckId) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if id == 0 {
        return "0".to_string();
    }

    let negative = id < 0;
    let mut n = id.unsigned_abs();
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    if negative {
        buf.push(b'-');
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

/// Parse a base-36 deck key. Only positive ids are valid deck keys.
pub fn parse_deck_key(key: &str) -> Option<DeckId> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    match DeckId::from_str_radix(key, 36) {
        Ok(id) if id > 0 => Some(id),
        _ => None,
    }
}

/// Outcome of a quiz answer, applied to the term's current box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveSignal {
    /// Forgotten: back to box 0
    Reset,
    /// Down one box, stopping at box 0
    Demote,
    /// Up one box, stopping at the last box
    Promote,
}

impl MoveSignal {
    /// Decode the numeric form used by quiz forms (0, -1, +1).
    /// Any other value is not a signal.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Reset),
            -1 => Some(Self::Demote),
            1 => Some(Self::Promote),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Reset => 0,
            Self::Demote => -1,
            Self::Promote => 1,
        }
    }
}

impl fmt::Display for MoveSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reset => "reset",
            Self::Demote => "demote",
            Self::Promote => "promote",
        };
        f.write_str(name)
    }
}

impl FromStr for MoveSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reset" | "0" => Ok(Self::Reset),
            "demote" | "-1" => Ok(Self::Demote),
            "promote" | "1" | "+1" => Ok(Self::Promote),
            other => Err(format!(
                "unknown move '{}' (expected reset, demote or promote)",
                other
            )),
        }
    }
}

/// Population of every box in a deck, read as one snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxCounts(pub [u64; BOX_COUNT]);

impl BoxCounts {
    pub fn new(counts: [u64; BOX_COUNT]) -> Self {
        Self(counts)
    }

    pub fn get(&self, box_index: usize) -> u64 {
        self.0.get(box_index).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn as_array(&self) -> &[u64; BOX_COUNT] {
        &self.0
    }
}

/// The term chosen for the next question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    #[serde(rename = "box")]
    pub box_index: usize,
    pub term: String,
}

/// Result of applying a move signal to a term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub from: usize,
    pub to: usize,
    /// False when nothing changed: destination equals source, or the term
    /// was not in the source box
    pub moved: bool,
}

impl MoveOutcome {
    pub fn unchanged(box_index: usize) -> Self {
        Self {
            from: box_index,
            to: box_index,
            moved: false,
        }
    }
}
