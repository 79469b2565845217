use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use migrator_domain::{BatchSettings, MigrationTask, TransferSettings};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    batch::BatchConfig, catalog::MigrationConfig, logging::LogConfig, transfer::TransferConfig,
};
use crate::validation::ConfigValidator;
use crate::{ConfigError, ConfigResult};

/// 环境变量覆盖前缀，例如 `MIGRATOR__BATCH__MAX_CONCURRENT=8`
pub const ENV_PREFIX: &str = "MIGRATOR";
pub const ENV_SEPARATOR: &str = "__";

/// 文件反序列化的中间结构，用于区分缺失的 `migrations` 段
#[derive(Debug, Deserialize)]
struct RawAppConfig {
    migrations: Option<Vec<MigrationConfig>>,
    #[serde(default)]
    batch: BatchConfig,
    #[serde(default)]
    transfer: TransferConfig,
    #[serde(default)]
    logging: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub migrations: Vec<MigrationConfig>,
    pub batch: BatchConfig,
    pub transfer: TransferConfig,
    pub logging: LogConfig,
}

impl AppConfig {
    /// 从文件加载任务目录，格式由扩展名决定，并叠加环境变量覆盖
    pub fn load<P: AsRef<Path>>(config_path: P) -> ConfigResult<Self> {
        let path = config_path.as_ref();
        if !path.exists() {
            return Err(ConfigError::File(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let format = Self::detect_format(path)?;
        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::File(format!("invalid path: {}", path.display())))?;

        let builder = ConfigBuilder::builder()
            .add_source(File::new(path_str, format))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            );

        let raw: RawAppConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .with_context(|| format!("failed to deserialize {}", path.display()))?;

        let config = Self::from_raw(raw)?;
        info!(
            "loaded {} migrations from {}",
            config.migrations.len(),
            path.display()
        );
        Ok(config)
    }

    /// 从字符串加载，主要用于测试和内嵌配置
    pub fn from_str(content: &str, format: FileFormat) -> ConfigResult<Self> {
        let raw: RawAppConfig = ConfigBuilder::builder()
            .add_source(File::from_str(content, format))
            .build()?
            .try_deserialize()?;
        Self::from_raw(raw)
    }

    pub fn from_toml(toml_str: &str) -> ConfigResult<Self> {
        let raw: RawAppConfig = toml::from_str(toml_str)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawAppConfig) -> ConfigResult<Self> {
        let migrations = raw.migrations.ok_or_else(|| {
            ConfigError::Validation("configuration must contain a 'migrations' section".to_string())
        })?;

        let config = AppConfig {
            migrations,
            batch: raw.batch,
            transfer: raw.transfer,
            logging: raw.logging,
        };
        config.validate()?;
        Ok(config)
    }

    fn detect_format(path: &Path) -> ConfigResult<FileFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            Some("toml") => Ok(FileFormat::Toml),
            Some("json") => Ok(FileFormat::Json),
            other => Err(ConfigError::File(format!(
                "unsupported config format: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }

    /// 转换为领域任务列表，保持配置中的顺序
    pub fn migration_tasks(&self) -> ConfigResult<Vec<MigrationTask>> {
        self.migrations.iter().map(MigrationConfig::to_task).collect()
    }

    pub fn batch_settings(&self) -> BatchSettings {
        self.batch.to_settings()
    }

    pub fn transfer_settings(&self) -> TransferSettings {
        self.transfer.to_settings()
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.migrations.is_empty() {
            return Err(ConfigError::Validation("no migrations configured".to_string()));
        }

        let mut names = HashSet::new();
        for migration in &self.migrations {
            migration.validate()?;
            if !names.insert(migration.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate migration name: {}",
                    migration.name
                )));
            }
        }

        self.batch.validate()?;
        self.transfer.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
