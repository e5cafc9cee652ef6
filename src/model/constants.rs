// PER normalization
pub const LEAGUE_AVERAGE_PER: f64 = 15.0;
pub const FREE_THROW_POSSESSION_FACTOR: f64 = 0.44;
pub const REGULATION_MINUTES: f64 = 48.0;
pub const PLAYERS_ON_COURT: f64 = 5.0;
// Roster resolution
pub const ROTATION_MIN_MPG: f64 = 10.0;
// Recency weighting
pub const DEFAULT_RECENCY_K: f64 = 15.0;
pub const MIN_RECENCY_K: f64 = 10.0;
pub const MAX_RECENCY_K: f64 = 25.0;
pub const DEFAULT_PLAYER_RANK_FEATURES: usize = 8;
// Injury impact
pub const INJURY_RECENCY_DAYS: f64 = 15.0;
pub const INJURY_TOP_N: usize = 3;
pub const INJURY_SEVERITY_WEIGHT: f64 = 0.45;
pub const INJURY_TOP1_PER_WEIGHT: f64 = 0.35;
pub const INJURY_ROTATION_WEIGHT: f64 = 0.20;
