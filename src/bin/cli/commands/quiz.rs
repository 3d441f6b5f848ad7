use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use boksen_lib::decks::{MoveSignal, SchedulerError};

use crate::app::App;
use crate::render::terminal::{self, paint, Color};

/// What the learner answered for one question
enum Answer {
    Move(MoveSignal),
    Skip,
    Quit,
}

fn parse_answer(line: &str) -> Option<Answer> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(Answer::Move(MoveSignal::Promote)),
        "n" | "no" => Some(Answer::Move(MoveSignal::Demote)),
        "r" | "reset" => Some(Answer::Move(MoveSignal::Reset)),
        "s" | "skip" | "" => Some(Answer::Skip),
        "q" | "quit" => Some(Answer::Quit),
        _ => None,
    }
}

/// Read one line; `None` at end of input
fn prompt(input: &mut impl BufRead, text: &str) -> Result<Option<String>> {
    print!("{}", text);
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

pub fn run(app: &App, deck: &str, rounds: Option<usize>, use_color: bool) -> Result<()> {
    let deck = app.find_deck(deck)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!(
        "{} (y = knew it, n = missed, r = forgot completely, s = skip, q = quit)",
        paint(&deck.name, Color::BOLD, use_color)
    );

    let mut asked = 0;
    let mut correct = 0;
    while rounds.map_or(true, |limit| asked < limit) {
        let pick = match app.scheduler.pick(deck.id) {
            Ok(pick) => pick,
            Err(SchedulerError::EmptyDeck(_)) => {
                println!("Deck \"{}\" has no terms yet", deck.name);
                break;
            }
            Err(e) => return Err(e).context("Failed to pick a term"),
        };

        println!();
        println!("{}  {}", terminal::box_label(pick.box_index, use_color), paint(&pick.term, Color::BOLD, use_color));
        if prompt(&mut input, "(enter to reveal) ")?.is_none() {
            break;
        }

        let definition = app
            .scheduler
            .lookup(deck.id, &pick.term)
            .context("Failed to look up term")?
            .unwrap_or_default();
        println!("{}", paint(&definition, Color::CYAN, use_color));

        let answer = loop {
            let Some(line) = prompt(&mut input, "Did you know it? [y/n/r/s/q] ")? else {
                break Answer::Quit;
            };
            match parse_answer(&line) {
                Some(answer) => break answer,
                None => println!("Please answer y, n, r, s or q"),
            }
        };

        let signal = match answer {
            Answer::Move(signal) => signal,
            Answer::Skip => continue,
            Answer::Quit => break,
        };

        asked += 1;
        if signal == MoveSignal::Promote {
            correct += 1;
        }
        let outcome = app
            .scheduler
            .move_term(deck.id, &pick.term, pick.box_index, signal)
            .context("Failed to move term")?;
        if outcome.moved {
            println!("{}", paint(&format!("-> box {}", outcome.to), Color::DIM, use_color));
        }
    }

    println!();
    println!("{} answered, {} known", asked, correct);
    println!("{}", terminal::render_box_counts(&app.scheduler.box_counts(deck.id)?, use_color));
    Ok(())
}
