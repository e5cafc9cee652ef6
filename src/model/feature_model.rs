use std::{
    collections::{HashMap, HashSet},
    sync::Arc
};

use chrono::NaiveDate;
use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    database::db_structs::{BoxScoreStat, Game},
    model::{
        config::{FeatureConfig, LeagueConfig},
        error::{FeatureError, Result},
        features::{FeatureSet, TeamStat},
        game_log::GameLog,
        injury::{compute_injury_features, InjuryFeatures},
        league_constants::{LeagueConstants, LeagueConstantsCache},
        per::{game_pers, ratio, season_pers, PlayerPerRecord},
        recency::{weighted_average, RecencySample},
        roster::{resolve_roster, RosterSnapshot},
        structures::{calc_weight::CalcWeight, time_period::TimePeriod}
    },
    utils::progress_utils::progress_bar
};

/// Features generated for one target game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameFeatures {
    pub game_id: i32,
    pub date: NaiveDate,
    pub home_team_id: i32,
    pub away_team_id: i32,
    pub features: FeatureSet
}

#[derive(Debug, Default)]
pub struct ProcessingResult {
    pub features: Vec<GameFeatures>,
    /// Target games whose features could not be generated
    pub failures: Vec<(i32, FeatureError)>
}

/// Turns historical box scores into point-in-time features for target games.
///
/// One processor is one feature-generation run: the league constants cache
/// lives exactly as long as the processor.
pub struct FeatureProcessor<'a, L: GameLog> {
    log: &'a L,
    league: &'a LeagueConfig,
    config: FeatureConfig,
    constants: LeagueConstantsCache
}

impl<'a, L> FeatureProcessor<'a, L>
where
    L: GameLog + Sync
{
    pub fn new(log: &'a L, league: &'a LeagueConfig, config: FeatureConfig) -> Self {
        FeatureProcessor {
            log,
            league,
            config,
            constants: LeagueConstantsCache::new()
        }
    }

    pub fn constants(&self) -> &LeagueConstantsCache {
        &self.constants
    }

    /// Builds constants for every season up front, failing on the first
    /// season without qualifying games
    pub fn warm<I>(&self, seasons: I) -> Result<()>
    where
        I: IntoIterator<Item = i32>
    {
        self.constants.warm(self.log, self.league, seasons)
    }

    pub fn get_constants(&self, season: i32) -> Result<Arc<LeagueConstants>> {
        self.constants.get_constants(self.log, self.league, season)
    }

    /// Generates features for every game in parallel.
    ///
    /// Constants for each season are built before the parallel pass. A season
    /// without qualifying games fails all of its target games.
    pub fn process(&self, games: &[Game]) -> ProcessingResult {
        for season in games.iter().map(|g| g.season).unique() {
            if let Err(e) = self.get_constants(season) {
                warn!("League constants unavailable for season {}: {}", season, e);
            }
        }

        info!("Generating features for {} games", games.len());
        let bar = progress_bar(games.len() as u64, "Generating game features".to_string());

        let results: Vec<(i32, Result<GameFeatures>)> = games
            .par_iter()
            .map(|game| {
                let result = self.process_game(game);
                bar.inc(1);

                (game.id, result)
            })
            .collect();

        bar.finish();

        let mut processed = ProcessingResult::default();
        for (game_id, result) in results {
            match result {
                Ok(features) => processed.features.push(features),
                Err(e) => {
                    warn!("Skipping game {}: {}", game_id, e);
                    processed.failures.push((game_id, e));
                }
            }
        }

        info!(
            "Generated features for {} games ({} failed)",
            processed.features.len(),
            processed.failures.len()
        );

        processed
    }

    /// Features for one target game, using only games strictly before its date
    pub fn process_game(&self, game: &Game) -> Result<GameFeatures> {
        let constants = self.get_constants(game.season)?;

        let home = self.team_stats(game.home_team_id, game, &constants)?;
        let away = self.team_stats(game.away_team_id, game, &constants)?;

        let mut features = FeatureSet::new();
        features.insert_team_stats(&home, &away)?;

        debug!("Game {}: {} features", game.id, features.len());

        Ok(GameFeatures {
            game_id: game.id,
            date: game.date,
            home_team_id: game.home_team_id,
            away_team_id: game.away_team_id,
            features
        })
    }

    pub fn resolve_roster(&self, team_id: i32, season: i32, as_of: NaiveDate) -> RosterSnapshot {
        let rows = self.team_rows(team_id, season, as_of);

        resolve_roster(team_id, as_of, &rows)
    }

    pub fn compute_injury_features(
        &self,
        team_id: i32,
        season: i32,
        as_of: NaiveDate,
        injured_player_ids: &HashSet<i32>
    ) -> Result<InjuryFeatures> {
        let constants = self.get_constants(season)?;
        let rows = self.team_rows(team_id, season, as_of);
        let snapshot = resolve_roster(team_id, as_of, &rows);
        let pers = season_pers(&rows, as_of, &constants)?;

        Ok(compute_injury_features(&snapshot, &pers, injured_player_ids))
    }

    /// Recency-weighted game-level PER for one player.
    /// Fails with [`FeatureError::EmptySequenceError`] when no game qualifies.
    pub fn player_form(
        &self,
        player_id: i32,
        team_rows: &[BoxScoreStat],
        as_of: NaiveDate,
        constants: &LeagueConstants
    ) -> Result<f64> {
        let samples = game_pers(player_id, team_rows, constants)?
            .into_iter()
            .map(|record| RecencySample::new(record.per, record.minutes, record.as_of_date, as_of))
            .collect::<Result<Vec<_>>>()?;

        weighted_average(&samples, self.config.recency_k)
    }

    fn team_rows(&self, team_id: i32, season: i32, as_of: NaiveDate) -> Vec<BoxScoreStat> {
        self.log
            .games_before(team_id, season, as_of, &self.league.exclude_game_types)
    }

    fn team_stats(&self, team_id: i32, game: &Game, constants: &LeagueConstants) -> Result<Vec<TeamStat>> {
        let rows = self.team_rows(team_id, game.season, game.date);
        let snapshot = resolve_roster(team_id, game.date, &rows);
        let pers = season_pers(&rows, game.date, constants)?;

        let mut stats = Vec::with_capacity(self.config.player_rank_features + 10);

        stats.push(TeamStat::new(
            "teamPer",
            TimePeriod::Season,
            CalcWeight::WeightedMpg,
            team_per(&snapshot, &pers)
        ));
        stats.push(TeamStat::new(
            "startersPer",
            TimePeriod::Season,
            CalcWeight::Raw,
            starters_per(&snapshot, &pers)
        ));

        for n in 1..=self.config.player_rank_features {
            let per = snapshot
                .ranked(n)
                .and_then(|p| pers.get(&p.player_id))
                .map_or(0.0, |r| r.per);

            stats.push(TeamStat::new(format!("player_{}_per", n), TimePeriod::Season, CalcWeight::Raw, per));
        }

        stats.push(TeamStat::new(
            "teamPerForm",
            TimePeriod::None,
            CalcWeight::Recency,
            self.team_form(&snapshot, &rows, constants)?
        ));

        let injured = self.log.injured_player_ids(game.id, team_id);
        stats.extend(compute_injury_features(&snapshot, &pers, &injured).to_team_stats());

        Ok(stats)
    }

    /// MPG-weighted mean of rotation players' recency-weighted form.
    /// A player with no usable games contributes a form of 0.
    fn team_form(&self, snapshot: &RosterSnapshot, rows: &[BoxScoreStat], constants: &LeagueConstants) -> Result<f64> {
        let mut weighted = 0.0;
        let mut minutes = 0.0;

        for player in snapshot.rotation() {
            let form = match self.player_form(player.player_id, rows, snapshot.as_of_date, constants) {
                Ok(form) => form,
                Err(FeatureError::EmptySequenceError) => {
                    debug!("No usable games for player {}, form defaults to 0", player.player_id);
                    0.0
                }
                Err(e) => return Err(e)
            };

            weighted += form * player.minutes_per_game;
            minutes += player.minutes_per_game;
        }

        Ok(ratio(weighted, minutes).unwrap_or(0.0))
    }
}

/// MPG-weighted season PER over rotation players with a PER
fn team_per(snapshot: &RosterSnapshot, pers: &HashMap<i32, PlayerPerRecord>) -> f64 {
    let (weighted, minutes) = snapshot
        .rotation()
        .filter_map(|p| pers.get(&p.player_id).map(|r| (r.per * p.minutes_per_game, p.minutes_per_game)))
        .fold((0.0, 0.0), |(w, m), (pw, pm)| (w + pw, m + pm));

    ratio(weighted, minutes).unwrap_or(0.0)
}

fn starters_per(snapshot: &RosterSnapshot, pers: &HashMap<i32, PlayerPerRecord>) -> f64 {
    let values = snapshot
        .starters()
        .filter_map(|p| pers.get(&p.player_id).map(|r| r.per))
        .collect_vec();

    ratio(values.iter().sum(), values.len() as f64).unwrap_or(0.0)
}
