//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every section has defaults so a bare environment still boots.

pub mod app;
pub mod database;
pub mod logging;
pub mod metrics;
pub mod preview;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::metrics::MetricsConfig;
pub use self::preview::{CircuitPreviewConfig, DocumentPreviewConfig, PreviewConfig};
pub use self::storage::StorageConfig;

use crate::error::AppError;

/// Prefix for environment variable overrides (`KNOHUB__SERVER__PORT=9000`).
const ENV_PREFIX: &str = "KNOHUB";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Tree store connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// External preview tools.
    #[serde(default)]
    pub preview: PreviewConfig,
    /// Visitor metrics.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default`, an environment-specific overlay
    /// `config/{env}`, and `KNOHUB__`-prefixed environment variables.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Load configuration from a single file, without overlays.
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        let parsed: Self = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?
            .try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject values that cannot produce a working server.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.server.port == 0 {
            return Err(AppError::configuration("server.port must be non-zero"));
        }
        if self.server.request_timeout_seconds == 0 {
            return Err(AppError::configuration(
                "server.request_timeout_seconds must be positive",
            ));
        }
        if self.storage.upload_dir.trim().is_empty() {
            return Err(AppError::configuration("storage.upload_dir must be set"));
        }
        if self.storage.max_upload_size_bytes == 0 {
            return Err(AppError::configuration(
                "storage.max_upload_size_bytes must be positive",
            ));
        }
        if self.preview.circuit.timeout_seconds == 0 || self.preview.document.timeout_seconds == 0
        {
            return Err(AppError::configuration("preview timeouts must be positive"));
        }
        if self.metrics.visitor_retention_hours == 0 {
            return Err(AppError::configuration(
                "metrics.visitor_retention_hours must be positive",
            ));
        }
        Ok(())
    }
}
