use thiserror::Error;

/// 迁移错误类型定义
///
/// 除 `ConfigValidation` 外，所有错误都被限制在单个迁移任务内部，
/// 最终转换为失败的任务结果，不会中断整个批次。
#[derive(Debug, Clone, Error)]
pub enum MigratorError {
    #[error("配置验证失败: {0}")]
    ConfigValidation(String),
    #[error("凭据错误: {0}")]
    Credential(String),
    #[error("{operation} 执行失败: {diagnostics}")]
    Transfer {
        operation: String,
        diagnostics: String,
    },
    #[error("{operation} 超过时间限制 ({timeout_seconds}s)")]
    TransferTimeout {
        operation: String,
        timeout_seconds: u64,
    },
    #[error("意外错误: {0}")]
    Unexpected(String),
}

pub type MigratorResult<T> = Result<T, MigratorError>;

impl MigratorError {
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::ConfigValidation(msg.into())
    }
    pub fn credential<S: Into<String>>(msg: S) -> Self {
        Self::Credential(msg.into())
    }
    pub fn transfer<O: Into<String>, D: Into<String>>(operation: O, diagnostics: D) -> Self {
        Self::Transfer {
            operation: operation.into(),
            diagnostics: diagnostics.into(),
        }
    }
    pub fn timeout<O: Into<String>>(operation: O, timeout_seconds: u64) -> Self {
        Self::TransferTimeout {
            operation: operation.into(),
            timeout_seconds,
        }
    }
    pub fn unexpected<S: Into<String>>(msg: S) -> Self {
        Self::Unexpected(msg.into())
    }
    /// 错误分类，用于日志和结果报告
    pub fn category(&self) -> &'static str {
        match self {
            MigratorError::ConfigValidation(_) => "config",
            MigratorError::Credential(_) => "credential",
            MigratorError::Transfer { .. } => "transfer",
            MigratorError::TransferTimeout { .. } => "timeout",
            MigratorError::Unexpected(_) => "unexpected",
        }
    }
    pub fn is_timeout(&self) -> bool {
        matches!(self, MigratorError::TransferTimeout { .. })
    }
    pub fn user_message(&self) -> &str {
        match self {
            MigratorError::ConfigValidation(_) => "任务配置有误，请检查配置文件",
            MigratorError::Credential(_) => "认证信息缺失或无效",
            MigratorError::Transfer { .. } => "Git传输命令执行失败",
            MigratorError::TransferTimeout { .. } => "Git传输超时",
            MigratorError::Unexpected(_) => "迁移过程中发生意外错误",
        }
    }
}

impl From<std::io::Error> for MigratorError {
    fn from(err: std::io::Error) -> Self {
        MigratorError::Unexpected(err.to_string())
    }
}

impl From<anyhow::Error> for MigratorError {
    fn from(err: anyhow::Error) -> Self {
        MigratorError::Unexpected(err.to_string())
    }
}

#[cfg(test)]
mod tests;
