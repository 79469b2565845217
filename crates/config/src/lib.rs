pub mod env;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use models::{
    AppConfig, AuthConfig, AuthType, BatchConfig, DestinationConfig, LogConfig, LogLevel,
    MigrationConfig, OutputFormat, SourceConfig, TransferConfig,
};
pub use validation::{ConfigValidator, ValidationUtils};

use migrator_errors::MigratorError;

/// Configuration error type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration error enumeration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File error: {0}")]
    File(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<anyhow::Error> for ConfigError {
    fn from(err: anyhow::Error) -> Self {
        // 保留完整的错误链，底层错误中带有出错的字段名
        ConfigError::Configuration(format!("{err:#}"))
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::File(err.to_string())
    }
}

impl From<ConfigError> for MigratorError {
    fn from(err: ConfigError) -> Self {
        MigratorError::ConfigValidation(err.to_string())
    }
}
