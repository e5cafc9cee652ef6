use serde::{Deserialize, Serialize};

/// Selects which box-score rows feed the shared PER formula.
///
/// Season-to-date and game-level inputs must never be mixed within a single
/// PER computation: the player's stat line and the team context are always
/// built from the same selection of rows.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationGranularity {
    /// Every game before the reference date
    Season,
    /// A single game, identified by its id
    Game(i32)
}

impl AggregationGranularity {
    pub fn includes(&self, game_id: i32) -> bool {
        match self {
            AggregationGranularity::Season => true,
            AggregationGranularity::Game(id) => *id == game_id
        }
    }
}
