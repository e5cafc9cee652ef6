use crate::model::{constants::FREE_THROW_POSSESSION_FACTOR, structures::position::Position};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    iter::Sum,
    ops::{Add, AddAssign}
};

/// Counting stats from one box-score line, or the sum of several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub mp: f64,
    pub fg: f64,
    pub fga: f64,
    pub three_p: f64,
    pub ft: f64,
    pub fta: f64,
    pub trb: f64,
    pub orb: f64,
    pub ast: f64,
    pub stl: f64,
    pub blk: f64,
    pub tov: f64,
    pub pf: f64
}

impl StatLine {
    /// Three-pointers are already counted once in FG
    pub fn points(&self) -> f64 {
        2.0 * self.fg + self.three_p + self.ft
    }

    pub fn possessions(&self) -> f64 {
        self.fga - self.orb + self.tov + FREE_THROW_POSSESSION_FACTOR * self.fta
    }

    /// Returns a description of the first inconsistency found, if any
    pub fn validate(&self) -> Option<String> {
        let fields = [
            ("MP", self.mp),
            ("FG", self.fg),
            ("FGA", self.fga),
            ("3P", self.three_p),
            ("FT", self.ft),
            ("FTA", self.fta),
            ("TRB", self.trb),
            ("ORB", self.orb),
            ("AST", self.ast),
            ("STL", self.stl),
            ("BLK", self.blk),
            ("TO", self.tov),
            ("PF", self.pf)
        ];

        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Some(format!("{} must be a non-negative number, found {}", name, value));
        }

        if self.fg > self.fga {
            return Some(format!("FG ({}) exceeds FGA ({})", self.fg, self.fga));
        }
        if self.ft > self.fta {
            return Some(format!("FT ({}) exceeds FTA ({})", self.ft, self.fta));
        }
        if self.three_p > self.fg {
            return Some(format!("3P ({}) exceeds FG ({})", self.three_p, self.fg));
        }
        if self.orb > self.trb {
            return Some(format!("ORB ({}) exceeds TRB ({})", self.orb, self.trb));
        }

        None
    }
}

impl Add for StatLine {
    type Output = StatLine;

    fn add(mut self, rhs: StatLine) -> StatLine {
        self += rhs;
        self
    }
}

impl AddAssign for StatLine {
    fn add_assign(&mut self, rhs: StatLine) {
        self.mp += rhs.mp;
        self.fg += rhs.fg;
        self.fga += rhs.fga;
        self.three_p += rhs.three_p;
        self.ft += rhs.ft;
        self.fta += rhs.fta;
        self.trb += rhs.trb;
        self.orb += rhs.orb;
        self.ast += rhs.ast;
        self.stl += rhs.stl;
        self.blk += rhs.blk;
        self.tov += rhs.tov;
        self.pf += rhs.pf;
    }
}

impl Sum for StatLine {
    fn sum<I: Iterator<Item = StatLine>>(iter: I) -> StatLine {
        iter.fold(StatLine::default(), |acc, line| acc + line)
    }
}

impl<'a> Sum<&'a StatLine> for StatLine {
    fn sum<I: Iterator<Item = &'a StatLine>>(iter: I) -> StatLine {
        iter.fold(StatLine::default(), |acc, line| acc + *line)
    }
}

/// One player's line in one game. Read-only once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxScoreStat {
    pub player_id: i32,
    pub game_id: i32,
    pub game_date: NaiveDate,
    pub team_id: i32,
    /// Listed position for this game, if the source provided one
    pub position: Option<Position>,
    pub starter: bool,
    #[serde(flatten)]
    pub stats: StatLine
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: i32,
    pub league: String,
    pub season: i32,
    pub date: NaiveDate,
    /// Free-form type, e.g. `regular`, `playoff`, `preseason`, `allstar`
    pub game_type: String,
    pub home_team_id: i32,
    pub away_team_id: i32,
    /// Injury lists attached to the game before tip-off
    pub home_injuries: Vec<i32>,
    pub away_injuries: Vec<i32>
}

impl Game {
    pub fn injuries_for(&self, team_id: i32) -> Option<&[i32]> {
        if team_id == self.home_team_id {
            Some(&self.home_injuries)
        } else if team_id == self.away_team_id {
            Some(&self.away_injuries)
        } else {
            None
        }
    }
}
