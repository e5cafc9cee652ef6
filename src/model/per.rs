use std::collections::HashMap;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use crate::{
    database::db_structs::{BoxScoreStat, StatLine},
    model::{
        constants::{FREE_THROW_POSSESSION_FACTOR, LEAGUE_AVERAGE_PER, PLAYERS_ON_COURT, REGULATION_MINUTES},
        error::{FeatureError, Result},
        league_constants::LeagueConstants,
        structures::aggregation_granularity::AggregationGranularity
    }
};

/// Team denominators for the PER formula
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeamGameContext {
    pub tm_fg: f64,
    pub tm_ast: f64,
    /// Possessions per 48 minutes
    pub pace: f64
}

impl TeamGameContext {
    /// Aggregates every given row. Callers select the rows (one game, or the
    /// season to date) so a context never mixes granularities.
    pub fn from_box_scores<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a BoxScoreStat>
    {
        let totals: StatLine = rows.into_iter().map(|r| &r.stats).sum();

        TeamGameContext {
            tm_fg: totals.fg,
            tm_ast: totals.ast,
            pace: pace(totals.possessions(), totals.mp)
        }
    }
}

/// Possessions per 48 minutes, given possessions and total player-minutes.
/// Player-minutes are divided by the five players on court so overtime
/// games are normalized.
pub fn pace(possessions: f64, player_minutes: f64) -> f64 {
    if player_minutes <= 0.0 {
        return 0.0;
    }

    REGULATION_MINUTES * possessions / (player_minutes / PLAYERS_ON_COURT)
}

/// `numerator / denominator`, or `None` when the denominator is zero.
/// A `None` makes the dependent formula term contribute nothing.
pub(crate) fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

fn finite(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FeatureError::NonFiniteError { what: what.to_string() })
    }
}

/// Unadjusted PER (Hollinger)
pub fn compute_uper(line: &StatLine, team_ctx: &TeamGameContext, constants: &LeagueConstants) -> Result<f64> {
    // Also rejects NaN minutes
    if !(line.mp > 0.0) {
        return Err(FeatureError::ZeroMinutesError);
    }

    let vop = constants.vop;
    let drb_pct = constants.drb_pct;
    let team_ast_ratio = ratio(team_ctx.tm_ast, team_ctx.tm_fg);

    let three_point_term = match (ratio(line.ast, line.fg), ratio(1.0, constants.lg_ast)) {
        (Some(ast_per_fg), Some(inv_lg_ast)) => {
            line.three_p * inv_lg_ast * (2.0 / 3.0) * (1.0 - 0.5 * ast_per_fg * inv_lg_ast)
        }
        _ => 0.0
    };
    let assist_term = (2.0 / 3.0) * line.ast;
    let field_goal_term = team_ast_ratio.map_or(0.0, |r| (2.0 - constants.factor * r) * line.fg);
    let free_throw_term =
        team_ast_ratio.map_or(0.0, |r| line.ft * 0.5 * (1.0 + (1.0 - r) + (2.0 / 3.0) * r));

    let turnover_term = vop * line.tov;
    let missed_fg_term = vop * drb_pct * (line.fga - line.fg);
    let missed_ft_term = vop
        * FREE_THROW_POSSESSION_FACTOR
        * (FREE_THROW_POSSESSION_FACTOR + (1.0 - FREE_THROW_POSSESSION_FACTOR) * drb_pct)
        * (line.fta - line.ft);
    let defensive_rebound_term = vop * (1.0 - drb_pct) * (line.trb - line.orb);
    let offensive_rebound_term = vop * drb_pct * line.orb;
    let steal_term = vop * line.stl;
    let block_term = vop * drb_pct * line.blk;
    let foul_term = match (ratio(constants.lg_ft, constants.lg_pf), ratio(constants.lg_fta, constants.lg_pf)) {
        (Some(ft_per_pf), Some(fta_per_pf)) => {
            line.pf * (ft_per_pf - FREE_THROW_POSSESSION_FACTOR * fta_per_pf * vop)
        }
        _ => 0.0
    };

    let total = three_point_term + assist_term + field_goal_term + free_throw_term
        - turnover_term
        - missed_fg_term
        - missed_ft_term
        + defensive_rebound_term
        + offensive_rebound_term
        + steal_term
        + block_term
        - foul_term;

    finite(total / line.mp, "uPER")
}

/// Pace-adjusted PER
pub fn compute_aper(uper: f64, team_pace: f64, constants: &LeagueConstants) -> Result<f64> {
    if !(team_pace > 0.0) || !team_pace.is_finite() {
        return Err(FeatureError::InvalidPaceError { pace: team_pace });
    }

    finite(uper * (constants.lg_pace / team_pace), "aPER")
}

/// Normalizes aPER so the league's minutes-weighted average is 15.
/// `lg_aper` is validated positive when the constants are built.
pub fn compute_per(aper: f64, constants: &LeagueConstants) -> f64 {
    aper * (LEAGUE_AVERAGE_PER / constants.lg_aper)
}

/// A PER computation for one player at one granularity.
/// Only valid for the reference date it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerPerRecord {
    pub player_id: i32,
    pub granularity: AggregationGranularity,
    pub as_of_date: NaiveDate,
    pub minutes: f64,
    pub uper: f64,
    pub aper: f64,
    pub per: f64
}

fn per_record(
    player_id: i32,
    line: &StatLine,
    team_ctx: &TeamGameContext,
    granularity: AggregationGranularity,
    as_of_date: NaiveDate,
    constants: &LeagueConstants
) -> Result<PlayerPerRecord> {
    let uper = compute_uper(line, team_ctx, constants)?;
    let aper = compute_aper(uper, team_ctx.pace, constants)?;
    let per = finite(compute_per(aper, constants), "PER")?;

    Ok(PlayerPerRecord {
        player_id,
        granularity,
        as_of_date,
        minutes: line.mp,
        uper,
        aper,
        per
    })
}

/// Computes one player's PER from a single team's box-score rows.
///
/// `granularity` selects the rows: the player's stat line and the team
/// context are built from the same selection.
pub fn player_per(
    player_id: i32,
    team_rows: &[BoxScoreStat],
    granularity: AggregationGranularity,
    as_of_date: NaiveDate,
    constants: &LeagueConstants
) -> Result<PlayerPerRecord> {
    let selected = team_rows.iter().filter(|r| granularity.includes(r.game_id)).collect_vec();
    let team_ctx = TeamGameContext::from_box_scores(selected.iter().copied());
    let line: StatLine = selected
        .iter()
        .filter(|r| r.player_id == player_id)
        .map(|r| &r.stats)
        .sum();

    per_record(player_id, &line, &team_ctx, granularity, as_of_date, constants)
}

/// Season-to-date PER for every player in `team_rows`.
///
/// Player-periods with zero minutes or an unusable pace are left out of the
/// result; any other failure aborts the team.
pub fn season_pers(
    team_rows: &[BoxScoreStat],
    as_of_date: NaiveDate,
    constants: &LeagueConstants
) -> Result<HashMap<i32, PlayerPerRecord>> {
    let team_ctx = TeamGameContext::from_box_scores(team_rows);
    let mut records = HashMap::new();

    for (player_id, rows) in team_rows
        .iter()
        .into_group_map_by(|r| r.player_id)
        .into_iter()
        .sorted_by_key(|(id, _)| *id)
    {
        let line: StatLine = rows.iter().map(|r| &r.stats).sum();

        match per_record(
            player_id,
            &line,
            &team_ctx,
            AggregationGranularity::Season,
            as_of_date,
            constants
        ) {
            Ok(record) => {
                records.insert(player_id, record);
            }
            Err(e) if e.is_recoverable() => {
                debug!("Excluding player {} from season PER: {}", player_id, e);
            }
            Err(e) => return Err(e)
        }
    }

    Ok(records)
}

/// Game-level PER for each game the player appeared in, ascending by date.
/// Each game uses that game's own team context.
pub fn game_pers(player_id: i32, team_rows: &[BoxScoreStat], constants: &LeagueConstants) -> Result<Vec<PlayerPerRecord>> {
    let by_game = team_rows.iter().into_group_map_by(|r| r.game_id);
    let mut records = Vec::new();

    for (game_id, rows) in by_game.into_iter().sorted_by_key(|(_, rows)| (rows[0].game_date, rows[0].game_id)) {
        let Some(player_row) = rows.iter().find(|r| r.player_id == player_id) else {
            continue;
        };

        let team_ctx = TeamGameContext::from_box_scores(rows.iter().copied());

        match per_record(
            player_id,
            &player_row.stats,
            &team_ctx,
            AggregationGranularity::Game(game_id),
            player_row.game_date,
            constants
        ) {
            Ok(record) => records.push(record),
            Err(e) if e.is_recoverable() => {
                debug!("Excluding player {} game {} from game PER: {}", player_id, game_id, e);
            }
            Err(e) => return Err(e)
        }
    }

    Ok(records)
}
