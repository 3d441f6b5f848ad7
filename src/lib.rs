//! Boksen: a Leitner box flashcard scheduler
//!
//! Terms of a deck are spread over five boxes. Answering a term correctly
//! promotes it, missing it demotes or resets it, and the next question is
//! drawn with a strong bias toward the lower boxes. See [`decks`].

pub mod config;
pub mod decks;
