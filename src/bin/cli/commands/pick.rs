use anyhow::Result;

use boksen_lib::decks::SchedulerError;

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run(app: &App, deck: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let deck = app.find_deck(deck)?;

    let pick = match app.scheduler.pick(deck.id) {
        Ok(pick) => pick,
        Err(SchedulerError::EmptyDeck(_)) => {
            match format {
                OutputFormat::Json => println!("null"),
                OutputFormat::Plain => println!("Deck \"{}\" has no terms yet", deck.name),
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pick)?),
        OutputFormat::Plain => {
            println!("{}  {}", terminal::box_label(pick.box_index, use_color), pick.term);
        }
    }

    Ok(())
}
