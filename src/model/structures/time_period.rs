use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Time window a feature was aggregated over
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TimePeriod {
    Season,
    None
}
