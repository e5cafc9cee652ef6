use std::collections::HashSet;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::{
    database::db_structs::BoxScoreStat,
    model::{constants::ROTATION_MIN_MPG, structures::position::Position}
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub player_id: i32,
    /// Most recently listed position
    pub position: Option<Position>,
    pub games_played: u32,
    pub total_minutes: f64,
    pub minutes_per_game: f64,
    pub starter_games: u32,
    pub is_starter: bool,
    pub last_game_date: NaiveDate
}

impl RosterEntry {
    pub fn is_rotation(&self) -> bool {
        self.minutes_per_game >= ROTATION_MIN_MPG
    }
}

/// A team's roster as of a reference date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterSnapshot {
    pub team_id: i32,
    pub as_of_date: NaiveDate,
    /// Distinct games the team played before `as_of_date`
    pub team_games: u32,
    /// Ordered by MPG descending, ties by player id
    pub players: Vec<RosterEntry>
}

impl RosterSnapshot {
    pub fn get(&self, player_id: i32) -> Option<&RosterEntry> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    /// The player with the n-th highest MPG, starting at 1
    pub fn ranked(&self, n: usize) -> Option<&RosterEntry> {
        n.checked_sub(1).and_then(|i| self.players.get(i))
    }

    pub fn rotation(&self) -> impl Iterator<Item = &RosterEntry> {
        self.players.iter().filter(|p| p.is_rotation())
    }

    pub fn starters(&self) -> impl Iterator<Item = &RosterEntry> {
        self.players.iter().filter(|p| p.is_starter)
    }

    pub fn rotation_mpg(&self) -> f64 {
        self.rotation().map(|p| p.minutes_per_game).sum()
    }

    pub fn max_mpg(&self) -> f64 {
        self.players.first().map_or(0.0, |p| p.minutes_per_game)
    }
}

/// Resolves the roster of `team_id` from box-score rows.
///
/// Only rows for the team dated strictly before `as_of_date` are used, so
/// same-day and future games can never leak into the snapshot. Pure: the
/// input rows are not modified and their order does not matter.
pub fn resolve_roster(team_id: i32, as_of_date: NaiveDate, rows: &[BoxScoreStat]) -> RosterSnapshot {
    let eligible = rows
        .iter()
        .filter(|r| r.team_id == team_id && r.game_date < as_of_date)
        .sorted_by_key(|r| (r.game_date, r.game_id, r.player_id))
        .collect_vec();

    let team_games = eligible.iter().map(|r| r.game_id).unique().count() as u32;

    // Zero-minute lines are not appearances
    let mut players = eligible
        .into_iter()
        .filter(|r| r.stats.mp > 0.0)
        .into_group_map_by(|r| r.player_id)
        .into_iter()
        .map(|(player_id, appearances)| {
            let games_played = appearances.iter().map(|r| r.game_id).unique().count() as u32;
            let total_minutes: f64 = appearances.iter().map(|r| r.stats.mp).sum();
            let starter_games = appearances
                .iter()
                .filter(|r| r.starter)
                .map(|r| r.game_id)
                .unique()
                .count() as u32;
            let position = appearances
                .iter()
                .filter(|r| r.position.is_some())
                .max_by_key(|r| (r.game_date, r.game_id))
                .and_then(|r| r.position);
            let last_game_date = appearances
                .iter()
                .map(|r| r.game_date)
                .max()
                .unwrap_or(as_of_date);

            RosterEntry {
                player_id,
                position,
                games_played,
                total_minutes,
                minutes_per_game: total_minutes / games_played as f64,
                starter_games,
                is_starter: false,
                last_game_date
            }
        })
        .collect_vec();

    players.sort_by(|a, b| {
        b.minutes_per_game
            .total_cmp(&a.minutes_per_game)
            .then(a.player_id.cmp(&b.player_id))
    });

    let starters = select_starters(&players);
    for player in players.iter_mut() {
        player.is_starter = starters.contains(&player.player_id);
    }

    RosterSnapshot {
        team_id,
        as_of_date,
        team_games,
        players
    }
}

/// Top starters per position group by starts, each of whom must have started
/// more than half of their own games. No padding when fewer qualify.
fn select_starters(players: &[RosterEntry]) -> HashSet<i32> {
    let mut starters = HashSet::new();

    for position in Position::iter() {
        let selected = players
            .iter()
            .filter(|p| p.position == Some(position))
            .filter(|p| p.starter_games * 2 > p.games_played)
            .sorted_by(|a, b| {
                b.starter_games
                    .cmp(&a.starter_games)
                    .then(b.minutes_per_game.total_cmp(&a.minutes_per_game))
                    .then(a.player_id.cmp(&b.player_id))
            })
            .take(position.starter_slots())
            .map(|p| p.player_id);

        starters.extend(selected);
    }

    starters
}
