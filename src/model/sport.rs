//! Sport types understood by the remote workout service.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A sport type the remote service accepts on a workout.
///
/// Serialized as the remote `sportTypeKey` (e.g. `"strength_training"`),
/// parsed through a case-insensitive alias table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Sport {
    Running,
    Strength,
    Cardio,
    Hiit,
}

impl Sport {
    /// The remote `sportTypeKey`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Strength => "strength_training",
            Self::Cardio => "cardio_training",
            Self::Hiit => "hiit",
        }
    }

    /// The remote `sportType` object embedded in payloads and segments.
    pub fn type_ref(self) -> SportTypeRef {
        let (id, display_order) = match self {
            Self::Running => (1, 1),
            Self::Strength => (20, 6),
            Self::Cardio => (6, 6),
            Self::Hiit => (33, 6),
        };
        SportTypeRef {
            sport_type_id: id,
            sport_type_key: self.key().to_string(),
            display_order,
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Returned when a sport name matches no alias.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sport type '{0}' (expected one of: running, strength_training, cardio_training, hiit)")]
pub struct UnknownSport(pub String);

impl FromStr for Sport {
    type Err = UnknownSport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase().replace(['-', ' '], "_");
        match token.as_str() {
            "running" | "run" => Ok(Self::Running),
            "strength" | "strength_training" => Ok(Self::Strength),
            "cardio" | "cardio_training" => Ok(Self::Cardio),
            "hiit" => Ok(Self::Hiit),
            _ => Err(UnknownSport(s.to_string())),
        }
    }
}

impl TryFrom<String> for Sport {
    type Error = UnknownSport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Sport> for String {
    fn from(sport: Sport) -> Self {
        sport.key().to_string()
    }
}

/// The remote representation of a sport type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportTypeRef {
    pub sport_type_id: u32,
    pub sport_type_key: String,
    pub display_order: u32,
}
