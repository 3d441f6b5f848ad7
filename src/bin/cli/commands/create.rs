use std::path::Path;

use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

/// Read header-less `term,definition` rows
fn read_rows(path: &Path) -> Result<Vec<(String, String)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Bad CSV record {}", line + 1))?;
        let term = record.get(0).unwrap_or_default();
        if term.is_empty() {
            log::warn!("Skipping CSV record {} without a term", line + 1);
            continue;
        }
        let definition = record.get(1).unwrap_or_default();
        rows.push((term.to_string(), definition.to_string()));
    }
    Ok(rows)
}

pub fn run(app: &App, name: &str, file: Option<&Path>, format: &OutputFormat) -> Result<()> {
    // Parse first so a broken file does not leave an empty deck behind
    let rows = match file {
        Some(path) => read_rows(path)?,
        None => Vec::new(),
    };

    let deck = app
        .scheduler
        .create_deck(app.config.user_id, name)
        .context("Failed to create deck")?;
    let inserted = if rows.is_empty() {
        0
    } else {
        app.scheduler
            .fill(deck.id, &rows)
            .context("Failed to import terms")?
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "id": deck.id,
                "key": deck.key(),
                "name": deck.name,
                "imported": inserted,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Created deck \"{}\"", deck.name);
            println!("  Key: {}", deck.key());
            if file.is_some() {
                println!("  Imported {} terms into box 0", inserted);
            }
        }
    }

    Ok(())
}
