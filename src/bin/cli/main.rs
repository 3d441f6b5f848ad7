mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use boksen_lib::decks::MoveSignal;

#[derive(Parser)]
#[command(name = "boksen-cli", about = "Leitner box flashcards", version)]
struct Cli {
    /// Config file (default: <config dir>/boksen/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// List your decks
    Decks,

    /// Create a deck, optionally filled from a CSV file
    Create {
        /// Deck name
        name: String,
        /// Header-less CSV with term,definition rows
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Add a term or change its definition
    Define {
        /// Deck key or name (case-insensitive prefix match)
        deck: String,
        term: String,
        definition: String,
    },

    /// Show a term's definition
    Show {
        /// Deck key or name
        deck: String,
        term: String,
    },

    /// Show how many terms sit in each box
    Boxes {
        /// Deck key or name
        deck: String,
        /// Also list the terms of every box
        #[arg(long)]
        terms: bool,
    },

    /// Pick the next term to study
    Pick {
        /// Deck key or name
        deck: String,
    },

    /// Move a term after answering it
    Move {
        /// Deck key or name
        deck: String,
        term: String,
        /// Box the term is in now
        #[arg(long = "box")]
        box_index: usize,
        /// reset, demote or promote
        #[arg(allow_hyphen_values = true)]
        signal: MoveSignal,
    },

    /// Interactive study session
    Quiz {
        /// Deck key or name
        deck: String,
        /// Stop after this many questions
        #[arg(long)]
        rounds: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let app = app::App::new(cli.config.as_deref(), cli.database.as_deref())?;

    match cli.command {
        Command::Decks => {
            commands::decks::run(&app, &cli.format, use_color)?;
        }
        Command::Create { name, file } => {
            commands::create::run(&app, &name, file.as_deref(), &cli.format)?;
        }
        Command::Define { deck, term, definition } => {
            commands::define::run(&app, &deck, &term, &definition, &cli.format)?;
        }
        Command::Show { deck, term } => {
            commands::show::run(&app, &deck, &term, &cli.format, use_color)?;
        }
        Command::Boxes { deck, terms } => {
            commands::boxes::run(&app, &deck, terms, &cli.format, use_color)?;
        }
        Command::Pick { deck } => {
            commands::pick::run(&app, &deck, &cli.format, use_color)?;
        }
        Command::Move { deck, term, box_index, signal } => {
            commands::move_term::run(&app, &deck, &term, box_index, signal, &cli.format)?;
        }
        Command::Quiz { deck, rounds } => {
            commands::quiz::run(&app, &deck, rounds, use_color)?;
        }
    }

    Ok(())
}
