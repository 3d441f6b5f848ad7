use anyhow::Result;

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let decks = app.list_decks()?;

    match format {
        OutputFormat::Json => {
            let mut output = Vec::new();
            for deck in &decks {
                let counts = app.scheduler.box_counts(deck.id)?;
                output.push(serde_json::json!({
                    "id": deck.id,
                    "key": deck.key(),
                    "name": deck.name,
                    "createdAt": deck.created_at,
                    "boxes": counts.as_array(),
                    "termCount": counts.total(),
                }));
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if decks.is_empty() {
                println!("(no decks)");
                return Ok(());
            }
            for deck in &decks {
                let total = app.scheduler.box_counts(deck.id)?.total();
                println!(
                    "{}  {} ({} terms)",
                    paint(&format!("{:>4}", deck.key()), Color::DIM, use_color),
                    deck.name,
                    total
                );
            }
        }
    }

    Ok(())
}
