use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use itertools::Itertools;

use crate::{
    database::db_structs::{BoxScoreStat, Game},
    model::{
        config::GameTypeFilter,
        error::{FeatureError, Result},
        league_constants::LeagueTotals
    }
};

/// Read access to historical box scores and game-day injury lists.
///
/// Every query takes the exclusion filter explicitly; implementations never
/// consult global league configuration.
pub trait GameLog {
    /// Box-score rows for `team_id` in `season` from games strictly before
    /// `as_of`, ascending by date.
    fn games_before(&self, team_id: i32, season: i32, as_of: NaiveDate, exclude: &GameTypeFilter) -> Vec<BoxScoreStat>;

    /// Every qualifying box-score row of a league season
    fn season_box_scores(&self, league: &str, season: i32, exclude: &GameTypeFilter) -> Vec<BoxScoreStat>;

    /// Players listed as injured for `team_id` on the given game
    fn injured_player_ids(&self, game_id: i32, team_id: i32) -> HashSet<i32>;

    fn league_totals(&self, league: &str, season: i32, exclude: &GameTypeFilter) -> LeagueTotals {
        LeagueTotals::from_box_scores(&self.season_box_scores(league, season, exclude))
    }
}

/// A validated, fully loaded game log
#[derive(Debug, Clone, Default)]
pub struct InMemoryGameLog {
    games: HashMap<i32, Game>,
    /// Sorted by (date, game, team, player)
    box_scores: Vec<BoxScoreStat>
}

impl InMemoryGameLog {
    /// Builds the log, rejecting box scores which do not line up with a known game
    /// or whose stat line is inconsistent.
    pub fn new(games: Vec<Game>, mut box_scores: Vec<BoxScoreStat>) -> Result<Self> {
        let games: HashMap<i32, Game> = games.into_iter().map(|g| (g.id, g)).collect();

        for row in &box_scores {
            let game = games.get(&row.game_id).ok_or(FeatureError::UnknownGameError {
                player_id: row.player_id,
                game_id: row.game_id
            })?;

            let reason = if row.game_date != game.date {
                Some(format!("dated {} but the game was played on {}", row.game_date, game.date))
            } else if row.team_id != game.home_team_id && row.team_id != game.away_team_id {
                Some(format!("team {} did not play in this game", row.team_id))
            } else {
                row.stats.validate()
            };

            if let Some(reason) = reason {
                return Err(FeatureError::MalformedBoxScoreError {
                    player_id: row.player_id,
                    game_id: row.game_id,
                    reason
                });
            }
        }

        box_scores.sort_by_key(|r| (r.game_date, r.game_id, r.team_id, r.player_id));

        Ok(Self { games, box_scores })
    }

    pub fn game(&self, game_id: i32) -> Option<&Game> {
        self.games.get(&game_id)
    }

    /// Games of a league season which should receive features, ordered by date
    pub fn target_games(&self, league: &str, season: i32, exclude: &GameTypeFilter) -> Vec<Game> {
        self.games
            .values()
            .filter(|g| g.league == league && g.season == season && !exclude.excludes(&g.game_type))
            .sorted_by_key(|g| (g.date, g.id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.box_scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.box_scores.is_empty()
    }

    fn qualifying_game(&self, game_id: i32, exclude: &GameTypeFilter) -> Option<&Game> {
        self.games.get(&game_id).filter(|g| !exclude.excludes(&g.game_type))
    }
}

impl GameLog for InMemoryGameLog {
    fn games_before(&self, team_id: i32, season: i32, as_of: NaiveDate, exclude: &GameTypeFilter) -> Vec<BoxScoreStat> {
        self.box_scores
            .iter()
            .take_while(|r| r.game_date < as_of)
            .filter(|r| r.team_id == team_id)
            .filter(|r| {
                self.qualifying_game(r.game_id, exclude)
                    .is_some_and(|g| g.season == season)
            })
            .cloned()
            .collect()
    }

    fn season_box_scores(&self, league: &str, season: i32, exclude: &GameTypeFilter) -> Vec<BoxScoreStat> {
        self.box_scores
            .iter()
            .filter(|r| {
                self.qualifying_game(r.game_id, exclude)
                    .is_some_and(|g| g.league == league && g.season == season)
            })
            .cloned()
            .collect()
    }

    fn injured_player_ids(&self, game_id: i32, team_id: i32) -> HashSet<i32> {
        self.games
            .get(&game_id)
            .and_then(|g| g.injuries_for(team_id))
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }
}
