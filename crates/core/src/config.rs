use serde::{Deserialize, Serialize};

/// Round rules. Every field has a default so a partial rules file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_hand_size")]
    pub hand_size: usize,
    #[serde(default = "default_min_players")]
    pub min_players: usize,
    /// Fixed shuffle seed; `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_hand_size() -> usize {
    5
}

fn default_min_players() -> usize {
    2
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            hand_size: default_hand_size(),
            min_players: default_min_players(),
            seed: None,
        }
    }
}
