pub mod config;
pub mod constants;
pub mod error;
pub mod feature_model;
pub mod features;
pub mod game_log;
pub mod injury;
pub mod league_constants;
pub mod per;
pub mod recency;
pub mod roster;
pub mod structures;
