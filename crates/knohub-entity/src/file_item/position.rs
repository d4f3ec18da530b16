//! Drop position for drag-and-drop reordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where the dragged item lands relative to the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    /// Immediately before the drop target, in its scope.
    Before,
    /// Immediately after the drop target, in its scope.
    After,
    /// At the end of the drop target's children; target must be a folder.
    Inside,
}

impl DropPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Inside => "inside",
        }
    }
}

impl fmt::Display for DropPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DropPosition {
    type Err = knohub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "inside" => Ok(Self::Inside),
            _ => Err(knohub_core::AppError::validation(format!(
                "Invalid drop position: '{s}'. Expected one of: before, after, inside"
            ))),
        }
    }
}
