use anyhow::{bail, Context, Result};

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run(app: &App, deck: &str, term: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let deck = app.find_deck(deck)?;
    let Some(definition) = app
        .scheduler
        .lookup(deck.id, term)
        .context("Failed to look up term")?
    else {
        bail!("No term \"{}\" in deck \"{}\"", term, deck.name);
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "term": term, "definition": definition });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", paint(term, Color::BOLD, use_color));
            println!("{}", definition);
        }
    }

    Ok(())
}
