use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use strum_macros::{Display, EnumIter};

/// Position group used for starter selection.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Position {
    Guard,
    Forward,
    Center
}

impl Position {
    /// Number of starting slots available to this position group
    pub fn starter_slots(&self) -> usize {
        match self {
            Position::Guard => 2,
            Position::Forward => 2,
            Position::Center => 1
        }
    }
}

impl TryFrom<&str> for Position {
    type Error = ();

    /// Box scores list positions like `PG`, `SF`, `C` or hybrids like `G-F`.
    /// Hybrids resolve to their first component.
    fn try_from(v: &str) -> Result<Self, Self::Error> {
        let primary = v.split(['-', '/']).next().unwrap_or("").trim().to_uppercase();

        match primary.as_str() {
            "PG" | "SG" | "G" => Ok(Position::Guard),
            "SF" | "PF" | "F" => Ok(Position::Forward),
            "C" => Ok(Position::Center),
            _ => Err(())
        }
    }
}
