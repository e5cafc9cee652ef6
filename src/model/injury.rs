use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde::Serialize;

use crate::model::{
    constants::{
        INJURY_RECENCY_DAYS, INJURY_ROTATION_WEIGHT, INJURY_SEVERITY_WEIGHT, INJURY_TOP1_PER_WEIGHT, INJURY_TOP_N
    },
    features::TeamStat,
    per::{ratio, PlayerPerRecord},
    recency::days_between,
    roster::RosterSnapshot,
    structures::{calc_weight::CalcWeight, time_period::TimePeriod}
};

/// Injury metrics for one team as of game time.
///
/// With no injured players every metric is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InjuryFeatures {
    pub inj_min_lost: f64,
    pub team_rotation_mpg: f64,
    pub injury_severity: f64,
    pub inj_per_value: f64,
    pub inj_top1_per: f64,
    pub inj_top3_per_sum: f64,
    pub inj_rotation: u32,
    pub inj_impact: f64
}

impl InjuryFeatures {
    pub fn to_team_stats(&self) -> Vec<TeamStat> {
        vec![
            TeamStat::new("injMinLost", TimePeriod::None, CalcWeight::Raw, self.inj_min_lost),
            TeamStat::new("injurySeverity", TimePeriod::None, CalcWeight::Raw, self.injury_severity),
            TeamStat::new("injPerValue", TimePeriod::None, CalcWeight::WeightedMpgRecency, self.inj_per_value),
            TeamStat::new("injTop1Per", TimePeriod::None, CalcWeight::Raw, self.inj_top1_per),
            TeamStat::new("injTop3PerSum", TimePeriod::None, CalcWeight::Raw, self.inj_top3_per_sum),
            TeamStat::new("injRotation", TimePeriod::None, CalcWeight::Raw, self.inj_rotation as f64),
            TeamStat::new("inj_impact", TimePeriod::None, CalcWeight::Blend, self.inj_impact),
        ]
    }
}

/// `injMinLost / teamRotationMPG`, 0 for a team without rotation players
pub fn injury_severity(inj_min_lost: f64, team_rotation_mpg: f64) -> f64 {
    ratio(inj_min_lost, team_rotation_mpg).unwrap_or(0.0)
}

/// Fixed-weight blend of severity, best injured PER and injured rotation count
pub fn inj_impact(injury_severity: f64, inj_top1_per: f64, inj_rotation: u32) -> f64 {
    INJURY_SEVERITY_WEIGHT * injury_severity
        + INJURY_TOP1_PER_WEIGHT * inj_top1_per
        + INJURY_ROTATION_WEIGHT * inj_rotation as f64
}

/// Composes injury metrics from a roster snapshot and season-to-date PERs.
///
/// Injured players who are not on the snapshot contribute nothing; those
/// without a computable PER still count toward minutes lost and rotation.
pub fn compute_injury_features(
    snapshot: &RosterSnapshot,
    season_pers: &HashMap<i32, PlayerPerRecord>,
    injured_player_ids: &HashSet<i32>
) -> InjuryFeatures {
    let max_mpg = snapshot.max_mpg();
    let team_rotation_mpg = snapshot.rotation_mpg();

    let injured = injured_player_ids
        .iter()
        .sorted()
        .filter_map(|id| snapshot.get(*id))
        .collect_vec();

    let injured_rotation = injured.iter().filter(|p| p.is_rotation()).collect_vec();
    let inj_min_lost: f64 = injured_rotation.iter().map(|p| p.minutes_per_game).sum();
    let inj_rotation = injured_rotation.len() as u32;

    let mut inj_per_value = 0.0;
    let mut injured_pers = Vec::new();

    for player in &injured {
        let Some(record) = season_pers.get(&player.player_id) else {
            continue;
        };

        let mpg_weight = ratio(player.minutes_per_game, max_mpg).unwrap_or(0.0);
        let days_since = days_between(player.last_game_date, snapshot.as_of_date) as f64;
        let recency_weight = (-days_since / INJURY_RECENCY_DAYS).exp();

        inj_per_value += record.per * mpg_weight * recency_weight;
        injured_pers.push(record.per);
    }

    injured_pers.sort_by(|a, b| b.total_cmp(a));

    let inj_top1_per = injured_pers.first().copied().unwrap_or(0.0);
    let inj_top3_per_sum: f64 = injured_pers.iter().take(INJURY_TOP_N).sum();
    let severity = injury_severity(inj_min_lost, team_rotation_mpg);

    InjuryFeatures {
        inj_min_lost,
        team_rotation_mpg,
        injury_severity: severity,
        inj_per_value,
        inj_top1_per,
        inj_top3_per_sum,
        inj_rotation,
        inj_impact: inj_impact(severity, inj_top1_per, inj_rotation)
    }
}
