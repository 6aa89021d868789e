use crosscards_core::{Axis, CardId, GameConfig, SessionManager};
use crosscards_data::{load_assets, load_card_catalog, load_game_config, CARDS_FILE};
use std::path::PathBuf;
use std::sync::Arc;

fn assets_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("assets")
}

#[test]
fn shipped_catalog_loads_and_every_card_is_playable() {
    let catalog = load_card_catalog(&assets_root().join(CARDS_FILE)).expect("load catalog");
    assert!(catalog.len() >= 20);
    for card in catalog.cards() {
        assert!(
            !card.playable_axes().is_empty(),
            "{} cannot be played anywhere",
            card.id
        );
    }
}

#[test]
fn shipped_legacy_records_are_locked_to_their_axis() {
    let catalog = load_card_catalog(&assets_root().join(CARDS_FILE)).expect("load catalog");
    let lamppost = catalog.get(&CardId::new("lamppost")).expect("lamppost");
    assert_eq!(lamppost.playable_axes(), vec![Axis::Vertical]);
    let bench = catalog.get(&CardId::new("bench")).expect("bench");
    assert_eq!(bench.playable_axes(), vec![Axis::Horizontal]);
}

#[test]
fn shipped_rules_are_valid() {
    let config = load_game_config(&assets_root()).expect("load rules");
    assert!(config.hand_size >= 1);
    assert!(config.min_players >= 2);
}

#[test]
fn loaded_assets_deal_a_full_round() {
    let (catalog, config) = load_assets(&assets_root()).expect("load assets");
    let config = GameConfig {
        seed: Some(99),
        ..config
    };
    let hand_size = config.hand_size;
    let total = catalog.len();
    let mut manager = SessionManager::new(config, Arc::new(catalog));
    let mut outbox = Default::default();
    for id in ["p1", "p2", "p3"] {
        manager
            .add_player(id.into(), None, &mut outbox)
            .expect("join");
    }
    manager
        .start_game(&"p1".into(), &mut outbox)
        .expect("start");
    for id in ["p1", "p2", "p3"] {
        assert_eq!(manager.session().hand(&id.into()).len(), hand_size);
    }
    assert_eq!(manager.session().deck.len(), total - 3 * hand_size);
}
