use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, deck: &str, term: &str, definition: &str, format: &OutputFormat) -> Result<()> {
    let deck = app.find_deck(deck)?;
    let inserted = app
        .scheduler
        .define(deck.id, term, definition)
        .context("Failed to save definition")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "deck": deck.key(),
                "term": term,
                "definition": definition,
                "added": inserted,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if inserted {
                println!("Added \"{}\" to \"{}\" (box 0)", term, deck.name);
            } else {
                println!("Updated \"{}\" in \"{}\"", term, deck.name);
            }
        }
    }

    Ok(())
}
