use anyhow::Result;

use boksen_lib::decks::BOX_COUNT;

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run(app: &App, deck: &str, list_terms: bool, format: &OutputFormat, use_color: bool) -> Result<()> {
    let deck = app.find_deck(deck)?;
    let counts = app.scheduler.box_counts(deck.id)?;

    match format {
        OutputFormat::Json => {
            let mut output = serde_json::json!({
                "deck": deck.key(),
                "counts": counts.as_array(),
                "total": counts.total(),
            });
            if list_terms {
                let members = (0..BOX_COUNT)
                    .map(|i| app.scheduler.box_members(deck.id, i))
                    .collect::<Result<Vec<_>, _>>()?;
                output["terms"] = serde_json::json!(members);
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", terminal::paint(&deck.name, terminal::Color::BOLD, use_color));
            println!("{}", terminal::render_box_counts(&counts, use_color));
            if list_terms {
                for box_index in 0..BOX_COUNT {
                    let members = app.scheduler.box_members(deck.id, box_index)?;
                    if members.is_empty() {
                        continue;
                    }
                    println!();
                    println!("{}", terminal::box_label(box_index, use_color));
                    for term in members {
                        println!("  {}", term);
                    }
                }
            }
        }
    }

    Ok(())
}
