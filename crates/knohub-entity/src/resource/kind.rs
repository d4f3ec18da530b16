//! Resource category and tag enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resource_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Course,
    Tech,
    Info,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Tech => "tech",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = knohub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "course" => Ok(Self::Course),
            "tech" => Ok(Self::Tech),
            "info" => Ok(Self::Info),
            _ => Err(knohub_core::AppError::validation(format!(
                "Invalid resource type: '{s}'. Expected one of: course, tech, info"
            ))),
        }
    }
}

/// Highlight badge shown next to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resource_tag", rename_all = "lowercase")]
pub enum ResourceTag {
    New,
    Hot,
    Rec,
}

impl ResourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Hot => "Hot",
            Self::Rec => "Rec",
        }
    }
}

impl fmt::Display for ResourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceTag {
    type Err = knohub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "hot" => Ok(Self::Hot),
            "rec" => Ok(Self::Rec),
            _ => Err(knohub_core::AppError::validation(format!(
                "Invalid resource tag: '{s}'. Expected one of: New, Hot, Rec"
            ))),
        }
    }
}
