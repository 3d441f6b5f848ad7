pub mod boxes;
pub mod create;
pub mod decks;
pub mod define;
pub mod move_term;
pub mod pick;
pub mod quiz;
pub mod show;
