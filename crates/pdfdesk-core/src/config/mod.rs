//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! optional TOML files and `PDFDESK__`-prefixed environment variables. Each
//! sub-module represents a logical configuration section, and every field
//! carries a default so an empty source yields a runnable server.

pub mod app;
pub mod converters;
pub mod logging;
pub mod storage;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, RateLimitConfig, ServerConfig};
pub use self::converters::{ConvertersConfig, ToolConfig};
pub use self::logging::LoggingConfig;
pub use self::storage::StorageConfig;
pub use self::worker::SweeperConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Artifact directories and limits.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Retention sweeper settings.
    #[serde(default)]
    pub sweeper: SweeperConfig,
    /// External converter binaries and timeouts.
    #[serde(default)]
    pub converters: ConvertersConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Sources, later ones overriding earlier ones: `config/default`,
    /// `config/<env>`, the explicit `path` (if any), then environment
    /// variables such as `PDFDESK__SERVER__PORT`.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let env = std::env::var("PDFDESK_ENV").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("PDFDESK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
