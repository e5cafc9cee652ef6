use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock}
};

use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    database::db_structs::{BoxScoreStat, StatLine},
    model::{
        config::{GameTypeFilter, LeagueConfig},
        constants::FREE_THROW_POSSESSION_FACTOR,
        error::{FeatureError, Result},
        game_log::GameLog,
        per::{compute_aper, compute_uper, pace, ratio, TeamGameContext}
    }
};

/// Raw league sums over every qualifying box-score row of a season
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LeagueTotals {
    /// Distinct (game, team) pairs
    pub team_games: usize,
    pub stats: StatLine
}

impl LeagueTotals {
    pub fn from_box_scores(rows: &[BoxScoreStat]) -> Self {
        LeagueTotals {
            team_games: rows.iter().map(|r| (r.game_id, r.team_id)).unique().count(),
            stats: rows.iter().map(|r| &r.stats).sum()
        }
    }

    /// Per-team-game averages
    pub fn averages(&self) -> StatLine {
        let n = self.team_games as f64;
        let s = &self.stats;

        StatLine {
            mp: s.mp / n,
            fg: s.fg / n,
            fga: s.fga / n,
            three_p: s.three_p / n,
            ft: s.ft / n,
            fta: s.fta / n,
            trb: s.trb / n,
            orb: s.orb / n,
            ast: s.ast / n,
            stl: s.stl / n,
            blk: s.blk / n,
            tov: s.tov / n,
            pf: s.pf / n
        }
    }
}

/// League normalization constants for one season. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueConstants {
    pub league: String,
    pub season: i32,
    pub team_games: usize,
    pub lg_ast: f64,
    pub lg_fg: f64,
    pub lg_ft: f64,
    pub lg_fta: f64,
    pub lg_pf: f64,
    pub lg_pts: f64,
    pub lg_fga: f64,
    pub lg_orb: f64,
    pub lg_tov: f64,
    pub lg_trb: f64,
    /// Value of possession
    pub vop: f64,
    pub drb_pct: f64,
    pub factor: f64,
    pub lg_pace: f64,
    /// Minutes-weighted league average aPER
    pub lg_aper: f64
}

impl LeagueConstants {
    /// Builds the constants from every qualifying row of the season.
    ///
    /// VOP, DRB%, factor and pace come from the raw totals first. Every
    /// player-season's aPER is then computed with those and averaged by
    /// minutes to obtain `lg_aper`. This is a single pass and not iterated
    /// to a fixed point.
    pub fn compute(league: &str, season: i32, rows: &[BoxScoreStat]) -> Result<Self> {
        let insufficient = || FeatureError::DataInsufficientError {
            league: league.to_string(),
            season
        };

        let totals = LeagueTotals::from_box_scores(rows);
        if totals.team_games == 0 || totals.stats.mp <= 0.0 {
            return Err(insufficient());
        }

        let mut constants = Self::from_totals(league, season, &totals);
        constants.lg_aper = Self::league_aper(rows, &constants)?;

        if !(constants.lg_aper > 0.0) || !constants.lg_aper.is_finite() {
            return Err(insufficient());
        }

        Ok(constants)
    }

    /// Everything except `lg_aper`, which is left at zero
    fn from_totals(league: &str, season: i32, totals: &LeagueTotals) -> Self {
        let avg = totals.averages();
        let lg_pts = avg.points();

        let vop = ratio(
            lg_pts,
            avg.fga - avg.orb + avg.tov + FREE_THROW_POSSESSION_FACTOR * avg.fta
        )
        .unwrap_or(0.0);
        let drb_pct = ratio(avg.trb - avg.orb, avg.trb).unwrap_or(0.0);
        let factor = match (ratio(avg.ast, avg.fg), ratio(avg.fg, avg.ft)) {
            (Some(ast_per_fg), Some(fg_per_ft)) => (2.0 / 3.0) - (0.5 * ast_per_fg) / (2.0 * fg_per_ft),
            _ => 2.0 / 3.0
        };

        LeagueConstants {
            league: league.to_string(),
            season,
            team_games: totals.team_games,
            lg_ast: avg.ast,
            lg_fg: avg.fg,
            lg_ft: avg.ft,
            lg_fta: avg.fta,
            lg_pf: avg.pf,
            lg_pts,
            lg_fga: avg.fga,
            lg_orb: avg.orb,
            lg_tov: avg.tov,
            lg_trb: avg.trb,
            vop,
            drb_pct,
            factor,
            lg_pace: pace(totals.stats.possessions(), totals.stats.mp),
            lg_aper: 0.0
        }
    }

    fn league_aper(rows: &[BoxScoreStat], constants: &LeagueConstants) -> Result<f64> {
        let team_contexts: HashMap<i32, TeamGameContext> = rows
            .iter()
            .into_group_map_by(|r| r.team_id)
            .into_iter()
            .map(|(team_id, team_rows)| (team_id, TeamGameContext::from_box_scores(team_rows)))
            .collect();

        let mut weighted = 0.0;
        let mut minutes = 0.0;

        // Sorted so the floating point sum is reproducible
        for ((player_id, team_id), player_rows) in rows
            .iter()
            .into_group_map_by(|r| (r.player_id, r.team_id))
            .into_iter()
            .sorted_by_key(|(key, _)| *key)
        {
            let line: StatLine = player_rows.iter().map(|r| &r.stats).sum();
            let team_ctx = team_contexts.get(&team_id).copied().unwrap_or_default();

            let aper = compute_uper(&line, &team_ctx, constants).and_then(|u| compute_aper(u, team_ctx.pace, constants));

            match aper {
                Ok(aper) => {
                    weighted += aper * line.mp;
                    minutes += line.mp;
                }
                Err(e) if e.is_recoverable() => {
                    debug!("Excluding player {} (team {}) from league aPER: {}", player_id, team_id, e);
                }
                Err(e) => return Err(e)
            }
        }

        Ok(ratio(weighted, minutes).unwrap_or(0.0))
    }
}

/// Per-(league, season, exclusions) constants, scoped to one processing run.
///
/// Safe for concurrent readers. Warm every needed season before a parallel
/// pass so the cache is read-only while features are generated.
#[derive(Debug, Default)]
pub struct LeagueConstantsCache {
    entries: RwLock<HashMap<(String, i32, GameTypeFilter), Arc<LeagueConstants>>>
}

impl LeagueConstantsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached constants, computing them on first use.
    /// Failures are not cached.
    pub fn get_constants<L>(&self, log: &L, league: &LeagueConfig, season: i32) -> Result<Arc<LeagueConstants>>
    where
        L: GameLog + ?Sized
    {
        let key = (league.league.clone(), season, league.exclude_game_types.clone());

        if let Some(constants) = self.entries.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            return Ok(Arc::clone(constants));
        }

        let rows = log.season_box_scores(&league.league, season, &league.exclude_game_types);
        let constants = Arc::new(LeagueConstants::compute(&league.league, season, &rows)?);

        info!(
            "Built league constants for {} {}: {} team games, VOP {:.4}, DRB% {:.4}, factor {:.4}, pace {:.2}, lg aPER {:.4}",
            league.league,
            season,
            constants.team_games,
            constants.vop,
            constants.drb_pct,
            constants.factor,
            constants.lg_pace,
            constants.lg_aper
        );

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        Ok(Arc::clone(entries.entry(key).or_insert(constants)))
    }

    /// Builds constants for each season up front
    pub fn warm<L, I>(&self, log: &L, league: &LeagueConfig, seasons: I) -> Result<()>
    where
        L: GameLog + ?Sized,
        I: IntoIterator<Item = i32>
    {
        for season in seasons.into_iter().unique() {
            self.get_constants(log, league, season)?;
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_relative_eq;

    use crate::{
        database::db_structs::BoxScoreStat,
        model::{
            config::{GameTypeFilter, LeagueConfig},
            error::FeatureError,
            game_log::InMemoryGameLog,
            league_constants::{LeagueConstants, LeagueConstantsCache, LeagueTotals},
            per::{compute_per, season_pers}
        },
        utils::test_utils::{date, generate_box_score, generate_game}
    };

    /// One game, one 40 minute player per side with identical lines
    fn symmetric_rows() -> Vec<BoxScoreStat> {
        vec![
            generate_box_score(1, 1, 1, date(2024, 1, 2), 40.0),
            generate_box_score(2, 1, 2, date(2024, 1, 2), 40.0),
        ]
    }

    fn league() -> LeagueConfig {
        LeagueConfig::new("nba", GameTypeFilter::new(["preseason"])).unwrap()
    }

    fn log() -> InMemoryGameLog {
        let mut preseason = generate_game(2, 2024, date(2024, 1, 1), 1, 2);
        preseason.game_type = "preseason".to_string();

        let games = vec![generate_game(1, 2024, date(2024, 1, 2), 1, 2), preseason];
        let mut rows = symmetric_rows();
        rows.push(generate_box_score(1, 2, 1, date(2024, 1, 1), 48.0));
        rows.push(generate_box_score(2, 2, 2, date(2024, 1, 1), 10.0));

        InMemoryGameLog::new(games, rows).unwrap()
    }

    #[test]
    fn test_totals_count_team_games() {
        let mut rows = symmetric_rows();
        rows.push(generate_box_score(3, 1, 1, date(2024, 1, 2), 8.0));

        let totals = LeagueTotals::from_box_scores(&rows);

        assert_eq!(totals.team_games, 2);
        assert_relative_eq!(totals.stats.mp, 88.0);
        assert_relative_eq!(totals.averages().mp, 44.0);
    }

    #[test]
    fn test_constants_from_averages() {
        let constants = LeagueConstants::compute("nba", 2024, &symmetric_rows()).unwrap();

        // Each side: fg 10, fga 20, 3p 2, ft 4, fta 5, trb 8, orb 2, ast 5, tov 2
        assert_eq!(constants.team_games, 2);
        assert_relative_eq!(constants.lg_pts, 26.0);
        assert_relative_eq!(constants.vop, 26.0 / 22.2, epsilon = 1e-12);
        assert_relative_eq!(constants.drb_pct, 0.75);
        assert_relative_eq!(constants.factor, 2.0 / 3.0 - 0.05, epsilon = 1e-12);
        assert_relative_eq!(constants.lg_pace, 133.2, epsilon = 1e-9);
    }

    #[test]
    fn test_league_average_player_rates_15() {
        let rows = symmetric_rows();
        let constants = LeagueConstants::compute("nba", 2024, &rows).unwrap();
        assert!(constants.lg_aper > 0.0);

        let home = rows.iter().filter(|r| r.team_id == 1).cloned().collect::<Vec<_>>();
        let pers = season_pers(&home, date(2024, 1, 3), &constants).unwrap();

        assert_relative_eq!(pers[&1].per, 15.0, epsilon = 1e-9);
        assert_relative_eq!(compute_per(pers[&1].aper, &constants), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_rows_is_insufficient() {
        let result = LeagueConstants::compute("nba", 2024, &[]);

        assert!(matches!(
            result,
            Err(FeatureError::DataInsufficientError { season: 2024, .. })
        ));
    }

    #[test]
    fn test_no_minutes_is_insufficient() {
        let rows = vec![generate_box_score(1, 1, 1, date(2024, 1, 2), 0.0)];

        assert!(matches!(
            LeagueConstants::compute("nba", 2024, &rows),
            Err(FeatureError::DataInsufficientError { .. })
        ));
    }

    #[test]
    fn test_cache_reuses_constants() {
        let log = log();
        let league = league();
        let cache = LeagueConstantsCache::new();

        let first = cache.get_constants(&log, &league, 2024).unwrap();
        let second = cache.get_constants(&log, &league, 2024).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_applies_game_type_exclusions() {
        let log = log();
        let cache = LeagueConstantsCache::new();

        let constants = cache.get_constants(&log, &league(), 2024).unwrap();

        assert_eq!(*constants, LeagueConstants::compute("nba", 2024, &symmetric_rows()).unwrap());
    }

    #[test]
    fn test_cache_does_not_store_failures() {
        let log = log();
        let cache = LeagueConstantsCache::new();

        let result = cache.get_constants(&log, &league(), 2023);

        assert!(matches!(result, Err(FeatureError::DataInsufficientError { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_warm() {
        let log = log();
        let cache = LeagueConstantsCache::new();

        cache.warm(&log, &league(), [2024, 2024]).unwrap();
        assert_eq!(cache.len(), 1);

        assert!(cache.warm(&log, &league(), [2024, 2023]).is_err());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_keys_on_exclusions() {
        let log = log();
        let cache = LeagueConstantsCache::new();
        let everything = LeagueConfig::new("nba", GameTypeFilter::default()).unwrap();

        let regular = cache.get_constants(&log, &league(), 2024).unwrap();
        let all_games = cache.get_constants(&log, &everything, 2024).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(regular.team_games, 2);
        assert_eq!(all_games.team_games, 4);
        assert!(Arc::ptr_eq(&regular, &cache.get_constants(&log, &league(), 2024).unwrap()));
    }

}
