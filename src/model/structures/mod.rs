pub mod aggregation_granularity;
pub mod calc_weight;
pub mod perspective;
pub mod position;
pub mod time_period;
