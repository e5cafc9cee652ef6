use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::model::{
    error::{FeatureError, Result},
    structures::{calc_weight::CalcWeight, perspective::Perspective, time_period::TimePeriod}
};

/// `{stat_name}|{time_period}|{calc_weight}|{perspective}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureKey {
    pub stat_name: String,
    pub time_period: TimePeriod,
    pub calc_weight: CalcWeight,
    pub perspective: Perspective
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.stat_name, self.time_period, self.calc_weight, self.perspective
        )
    }
}

/// One named statistic computed for a single team
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStat {
    pub stat_name: String,
    pub time_period: TimePeriod,
    pub calc_weight: CalcWeight,
    pub value: f64
}

impl TeamStat {
    pub fn new(stat_name: impl Into<String>, time_period: TimePeriod, calc_weight: CalcWeight, value: f64) -> Self {
        TeamStat {
            stat_name: stat_name.into(),
            time_period,
            calc_weight,
            value
        }
    }
}

/// Flat, insertion-ordered feature record for one target game
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureSet {
    values: IndexMap<String, f64>
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits the home, away and diff variants of one statistic.
    /// Non-finite values are rejected rather than written.
    pub fn insert_triplet(
        &mut self,
        stat_name: &str,
        time_period: TimePeriod,
        calc_weight: CalcWeight,
        home: f64,
        away: f64
    ) -> Result<()> {
        let entries = Perspective::iter()
            .map(|perspective| {
                let value = match perspective {
                    Perspective::Home => home,
                    Perspective::Away => away,
                    Perspective::Diff => home - away
                };
                let key = FeatureKey {
                    stat_name: stat_name.to_string(),
                    time_period,
                    calc_weight,
                    perspective
                };

                (key.to_string(), value)
            })
            .collect::<Vec<_>>();

        if let Some((key, _)) = entries.iter().find(|(_, value)| !value.is_finite()) {
            return Err(FeatureError::NonFiniteError { what: key.clone() });
        }

        self.values.extend(entries);

        Ok(())
    }

    /// Pairs the home and away statistics by position and emits each triplet.
    /// Both sides must list the same statistics in the same order.
    pub fn insert_team_stats(&mut self, home: &[TeamStat], away: &[TeamStat]) -> Result<()> {
        if home.len() != away.len() {
            return Err(FeatureError::InvalidConfigError(format!(
                "home and away produced different feature counts ({} vs {})",
                home.len(),
                away.len()
            )));
        }

        for (h, a) in home.iter().zip(away) {
            if h.stat_name != a.stat_name || h.time_period != a.time_period || h.calc_weight != a.calc_weight {
                return Err(FeatureError::InvalidConfigError(format!(
                    "home feature {} does not line up with away feature {}",
                    h.stat_name, a.stat_name
                )));
            }

            self.insert_triplet(&h.stat_name, h.time_period, h.calc_weight, h.value, a.value)?;
        }

        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
