use anyhow::{Context, Result};

use boksen_lib::decks::MoveSignal;

use crate::app::App;
use crate::OutputFormat;

pub fn run(
    app: &App,
    deck: &str,
    term: &str,
    box_index: usize,
    signal: MoveSignal,
    format: &OutputFormat,
) -> Result<()> {
    let deck = app.find_deck(deck)?;
    let outcome = app
        .scheduler
        .move_term(deck.id, term, box_index, signal)
        .context("Failed to move term")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Plain => {
            if outcome.moved {
                println!("{}: box {} -> box {}", term, outcome.from, outcome.to);
            } else if outcome.from == outcome.to {
                println!("{}: stays in box {}", term, outcome.from);
            } else {
                println!("{}: not found in box {}, nothing moved", term, outcome.from);
            }
        }
    }

    Ok(())
}
