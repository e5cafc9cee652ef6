use crate::model::{
    constants::{DEFAULT_PLAYER_RANK_FEATURES, DEFAULT_RECENCY_K, MAX_RECENCY_K, MIN_RECENCY_K},
    error::{FeatureError, Result}
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Game types that never contribute to features or league constants.
/// Matching is case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameTypeFilter {
    excluded: BTreeSet<String>
}

impl GameTypeFilter {
    pub fn new<I, S>(game_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>
    {
        let excluded = game_types
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        Self { excluded }
    }

    pub fn excludes(&self, game_type: &str) -> bool {
        self.excluded.contains(&game_type.trim().to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.excluded.iter().map(String::as_str)
    }
}

/// League identity and the game types excluded for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueConfig {
    pub league: String,
    pub exclude_game_types: GameTypeFilter
}

impl LeagueConfig {
    pub fn new(league: &str, exclude_game_types: GameTypeFilter) -> Result<Self> {
        let league = league.trim();
        if league.is_empty() {
            return Err(FeatureError::InvalidConfigError("league must not be empty".to_string()));
        }

        Ok(Self {
            league: league.to_string(),
            exclude_game_types
        })
    }
}

/// Tunables for feature generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Decay constant (days) for recency weighting
    pub recency_k: f64,
    /// Number of `player_{n}_per` features emitted per team
    pub player_rank_features: usize
}

impl FeatureConfig {
    pub fn new(recency_k: f64, player_rank_features: usize) -> Result<Self> {
        if !(MIN_RECENCY_K..=MAX_RECENCY_K).contains(&recency_k) {
            return Err(FeatureError::InvalidConfigError(format!(
                "recency k must be within [{}, {}], found {}",
                MIN_RECENCY_K, MAX_RECENCY_K, recency_k
            )));
        }

        if player_rank_features == 0 {
            return Err(FeatureError::InvalidConfigError(
                "at least one player rank feature is required".to_string()
            ));
        }

        Ok(Self {
            recency_k,
            player_rank_features
        })
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            recency_k: DEFAULT_RECENCY_K,
            player_rank_features: DEFAULT_PLAYER_RANK_FEATURES
        }
    }
}
