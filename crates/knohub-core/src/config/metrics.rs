//! Visitor metrics configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// How long a client IP counts as an active visitor.
    #[serde(default = "default_retention_hours")]
    pub visitor_retention_hours: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            visitor_retention_hours: default_retention_hours(),
        }
    }
}

fn default_retention_hours() -> u64 {
    24
}
