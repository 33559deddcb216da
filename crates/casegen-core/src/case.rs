use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Evaluation mode passed into every value-generation call.
///
/// `Normal` means no case was requested explicitly. `Null` and `Blank` have
/// cross-cutting semantics handled by every node; the remaining variants form
/// the boundary family and are only interpreted by leaf fields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldCase {
    #[default]
    Normal,
    Null,
    Blank,
    Min,
    Avg,
    Max,
}

impl FieldCase {
    /// Representative case used when a blank value must be derived.
    pub const DEFAULT: FieldCase = FieldCase::Avg;

    /// Boundary-value cases in enumeration order.
    pub const BOUNDARIES: [FieldCase; 3] = [FieldCase::Min, FieldCase::Avg, FieldCase::Max];

    /// True when the caller asked for a specific case.
    pub fn is_explicit(self) -> bool {
        self != FieldCase::Normal
    }

    pub fn is_boundary(self) -> bool {
        Self::BOUNDARIES.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldCase::Normal => "normal",
            FieldCase::Null => "null",
            FieldCase::Blank => "blank",
            FieldCase::Min => "min",
            FieldCase::Avg => "avg",
            FieldCase::Max => "max",
        }
    }
}

impl fmt::Display for FieldCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldCase {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" | "none" => Ok(FieldCase::Normal),
            "null" => Ok(FieldCase::Null),
            "blank" => Ok(FieldCase::Blank),
            "min" => Ok(FieldCase::Min),
            "avg" | "average" => Ok(FieldCase::Avg),
            "max" => Ok(FieldCase::Max),
            other => Err(CoreError::UnknownCase(other.to_string())),
        }
    }
}
