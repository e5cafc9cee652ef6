use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Weighting scheme applied when the feature value was computed
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum CalcWeight {
    #[strum(serialize = "raw")]
    Raw,
    #[strum(serialize = "weighted_MPG")]
    WeightedMpg,
    #[strum(serialize = "recency")]
    Recency,
    #[strum(serialize = "weighted_MPG_recency")]
    WeightedMpgRecency,
    #[strum(serialize = "blend")]
    Blend
}
