use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use boksen_lib::config::AppConfig;
use boksen_lib::decks::{parse_deck_key, Deck, Scheduler, SqliteDeckStore};

/// Shared application state for CLI commands
pub struct App {
    pub config: AppConfig,
    pub scheduler: Scheduler,
}

impl App {
    /// Load the config (creating it on first run) and open the database
    pub fn new(config_path: Option<&Path>, database: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path.to_path_buf(),
            None => AppConfig::default_path().context("Failed to get config directory")?,
        };
        let config = AppConfig::load_or_init(&config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?;

        let db_path = match database {
            Some(path) => path.to_path_buf(),
            None => config.database_path().context("Failed to get data directory")?,
        };
        let store = SqliteDeckStore::open(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        let scheduler = Scheduler::new(Arc::new(store), config.scheduler.clone());
        Ok(Self { config, scheduler })
    }

    /// List the current user's decks
    pub fn list_decks(&self) -> Result<Vec<Deck>> {
        self.scheduler
            .list_decks(self.config.user_id)
            .context("Failed to list decks")
    }

    /// Find a deck by key, or by name (case-insensitive prefix match)
    pub fn find_deck(&self, key_or_name: &str) -> Result<Deck> {
        if let Some(id) = parse_deck_key(key_or_name) {
            if let Some(deck) = self
                .scheduler
                .get_deck(self.config.user_id, id)
                .context("Failed to get deck")?
            {
                return Ok(deck);
            }
        }

        let decks = self.list_decks()?;
        let name_lower = key_or_name.to_lowercase();

        // Exact match first
        if let Some(deck) = decks.iter().find(|d| d.name.to_lowercase() == name_lower) {
            return Ok(deck.clone());
        }

        // Prefix match
        let matches: Vec<&Deck> = decks.iter()
            .filter(|d| d.name.to_lowercase().starts_with(&name_lower))
            .collect();

        match matches.len() {
            0 => bail!("No deck matching '{}'. Available decks:\n{}", key_or_name,
                decks.iter().map(|d| format!("  - {} ({})", d.name, d.key())).collect::<Vec<_>>().join("\n")),
            1 => Ok(matches[0].clone()),
            _ => bail!("Ambiguous deck name '{}'. Matches:\n{}", key_or_name,
                matches.iter().map(|d| format!("  - {} ({})", d.name, d.key())).collect::<Vec<_>>().join("\n")),
        }
    }
}
