use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("No qualifying games for league {league} season {season}")]
    DataInsufficientError { league: String, season: i32 },

    #[error("Player-period has zero minutes played")]
    ZeroMinutesError,

    #[error("Recency aggregation received no qualifying samples")]
    EmptySequenceError,

    #[error("Sample is dated {days_before} days after the reference date")]
    FutureSampleError { days_before: i64 },

    #[error("Team pace must be positive, found {pace}")]
    InvalidPaceError { pace: f64 },

    #[error("Non-finite value produced for {what}")]
    NonFiniteError { what: String },

    #[error("Box score for player {player_id} references unknown game {game_id}")]
    UnknownGameError { player_id: i32, game_id: i32 },

    #[error("Malformed box score for player {player_id} in game {game_id}: {reason}")]
    MalformedBoxScoreError {
        player_id: i32,
        game_id: i32,
        reason: String
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] tokio_postgres::Error)
}

impl FeatureError {
    /// Per-player numeric edge cases which are absorbed locally by excluding
    /// the player-period, rather than aborting team aggregation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FeatureError::ZeroMinutesError | FeatureError::InvalidPaceError { .. } | FeatureError::EmptySequenceError
        )
    }
}

pub type Result<T> = std::result::Result<T, FeatureError>;
