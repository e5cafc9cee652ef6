use chrono::NaiveDate;

use crate::model::error::{FeatureError, Result};

/// One historical observation fed into the recency aggregator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencySample {
    pub value: f64,
    pub minutes: f64,
    /// Calendar days between the observation and the reference date
    pub days_since: i64
}

impl RecencySample {
    /// Fails if the observation is dated after the reference date
    pub fn new(value: f64, minutes: f64, game_date: NaiveDate, as_of: NaiveDate) -> Result<Self> {
        let days_since = days_between(game_date, as_of);
        if days_since < 0 {
            return Err(FeatureError::FutureSampleError { days_before: -days_since });
        }

        Ok(RecencySample {
            value,
            minutes,
            days_since
        })
    }
}

pub fn days_between(game_date: NaiveDate, as_of: NaiveDate) -> i64 {
    (as_of - game_date).num_days()
}

/// `minutes * exp(-days_since / k)`
pub fn recency_weight(minutes: f64, days_since: i64, k: f64) -> f64 {
    minutes * (-(days_since as f64) / k).exp()
}

/// Decayed, minutes-weighted mean of the samples.
///
/// Fails with [`FeatureError::EmptySequenceError`] when there is nothing to
/// weigh; the caller decides the fallback.
pub fn weighted_average(samples: &[RecencySample], k: f64) -> Result<f64> {
    if let Some(future) = samples.iter().find(|s| s.days_since < 0) {
        return Err(FeatureError::FutureSampleError {
            days_before: -future.days_since
        });
    }

    let weights = samples
        .iter()
        .map(|s| recency_weight(s.minutes, s.days_since, k))
        .collect::<Vec<_>>();
    let weight_total: f64 = weights.iter().sum();

    if !(weight_total > 0.0) {
        return Err(FeatureError::EmptySequenceError);
    }

    // Normalizing each weight first keeps a lone sample exact
    let average: f64 = samples
        .iter()
        .zip(&weights)
        .map(|(s, w)| s.value * (w / weight_total))
        .sum();

    if !average.is_finite() {
        return Err(FeatureError::NonFiniteError {
            what: "recency-weighted average".to_string()
        });
    }

    Ok(average)
}
