use crate::schema::CardRecord;
use anyhow::{bail, Context};
use crosscards_core::{CardCatalog, CardDefinition, GameConfig};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub const CARDS_FILE: &str = "cards.json";
pub const GAME_FILE: &str = "game.json";

/// Parses a JSON array of card records into definitions, in file order.
pub fn parse_card_records(raw: &str) -> anyhow::Result<Vec<CardDefinition>> {
    let records: Vec<CardRecord> = serde_json::from_str(raw).context("parse card list")?;
    records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            record
                .into_definition()
                .with_context(|| format!("card record #{idx}"))
        })
        .collect()
}

pub fn load_card_catalog(path: &Path) -> anyhow::Result<CardCatalog> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cards = parse_card_records(&raw).with_context(|| format!("parse {}", path.display()))?;
    let catalog = CardCatalog::new(cards).with_context(|| format!("build {}", path.display()))?;
    Ok(catalog)
}

/// Round rules from `game.json` in `dir`; defaults when the file is absent.
pub fn load_game_config(dir: &Path) -> anyhow::Result<GameConfig> {
    let path = dir.join(GAME_FILE);
    let config: GameConfig = if path.exists() {
        load_json(&path)?
    } else {
        GameConfig::default()
    };
    validate_game_config(&config).with_context(|| format!("validate {}", path.display()))?;
    Ok(config)
}

pub fn validate_game_config(config: &GameConfig) -> anyhow::Result<()> {
    if config.hand_size == 0 {
        bail!("hand_size must be at least 1");
    }
    if config.min_players < 2 {
        bail!("min_players must be at least 2, got {}", config.min_players);
    }
    Ok(())
}

/// Catalog and rules from an assets directory.
pub fn load_assets(dir: &Path) -> anyhow::Result<(CardCatalog, GameConfig)> {
    let catalog = load_card_catalog(&dir.join(CARDS_FILE))?;
    let config = load_game_config(dir)?;
    Ok((catalog, config))
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
