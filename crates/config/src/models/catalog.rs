//! 迁移任务目录的配置结构及其到领域类型的转换

use migrator_domain::{
    AuthCredential, DestinationEndpoint, MigrationTask, SourceEndpoint, DEFAULT_BRANCH,
};
use serde::{Deserialize, Serialize};

use crate::env::{expand_env_value, expand_home};
use crate::validation::{ConfigValidator, ValidationUtils};
use crate::ConfigResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    None,
    Token,
    Basic,
    #[default]
    Ssh,
}

/// 认证配置
///
/// 字段缺失不在加载时报错，转换后的空值由凭据解析阶段按任务报告。
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(rename = "type", default)]
    pub auth_type: AuthType,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub ssh_key: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("AuthConfig")
            .field("auth_type", &self.auth_type)
            .field("token", &mask(&self.token))
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .field("ssh_key", &self.ssh_key)
            .finish()
    }
}

impl AuthConfig {
    /// 展开环境变量并转换为领域认证描述
    pub fn to_credential(&self) -> ConfigResult<AuthCredential> {
        let expand = |value: &Option<String>| -> ConfigResult<String> {
            match value {
                Some(v) => expand_env_value(v),
                None => Ok(String::new()),
            }
        };

        let credential = match self.auth_type {
            AuthType::None => AuthCredential::None,
            AuthType::Token => AuthCredential::token(expand(&self.token)?),
            AuthType::Basic => {
                AuthCredential::basic(expand(&self.username)?, expand(&self.password)?)
            }
            AuthType::Ssh => AuthCredential::ssh(
                self.ssh_key
                    .as_deref()
                    .filter(|k| !k.trim().is_empty())
                    .map(expand_home),
            ),
        };
        Ok(credential)
    }
}

fn credential_of(auth: &Option<AuthConfig>) -> ConfigResult<AuthCredential> {
    match auth {
        Some(auth) => auth.to_credential(),
        None => Ok(AuthCredential::None),
    }
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub url: String,
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub name: String,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl MigrationConfig {
    pub fn to_task(&self) -> ConfigResult<MigrationTask> {
        let source = SourceEndpoint::new(self.source.url.clone())
            .with_branch(self.source.branch.clone())
            .with_auth(credential_of(&self.source.auth)?);
        let destination = DestinationEndpoint::new(self.destination.url.clone())
            .with_create_if_missing(self.destination.create_if_missing)
            .with_auth(credential_of(&self.destination.auth)?);

        Ok(MigrationTask::new(self.name.clone(), source, destination)
            .with_options(self.options.clone()))
    }
}

impl ConfigValidator for MigrationConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.name, "migrations.name")?;
        ValidationUtils::validate_repository_url(
            &self.source.url,
            &format!("migrations[{}].source.url", self.name),
        )?;
        ValidationUtils::validate_repository_url(
            &self.destination.url,
            &format!("migrations[{}].destination.url", self.name),
        )?;
        // 环境变量必须在执行前可解析
        credential_of(&self.source.auth)?;
        credential_of(&self.destination.auth)?;
        Ok(())
    }
}
