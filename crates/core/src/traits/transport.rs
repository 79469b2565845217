//! 镜像传输端口
//!
//! 实际的内容传输（拉取完整历史并镜像推送到目标）被视为外部操作，
//! 通过这个窄接口调用。每种操作一个方法，测试时可以替换为不依赖
//! 网络和git的假实现。
//!
//! 端口只负责执行命令并返回退出状态和输出；超时由调用方强制，
//! 非零退出码的分类也由调用方完成。

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use migrator_errors::MigratorResult;

/// 传输操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferOperation {
    MirrorFetch,
    MirrorPush,
    RemoteProbe,
}

impl TransferOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferOperation::MirrorFetch => "mirror-fetch",
            TransferOperation::MirrorPush => "mirror-push",
            TransferOperation::RemoteProbe => "remote-probe",
        }
    }
}

impl fmt::Display for TransferOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次传输调用的参数
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// 已注入凭据的连接URL
    pub url: String,
    /// 本地镜像仓库路径，探测操作为None
    pub local_path: Option<PathBuf>,
    /// 覆盖的环境变量
    pub environment: HashMap<String, String>,
    pub timeout: Duration,
    /// 任务选项，原样透传
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl TransferRequest {
    pub fn new<S: Into<String>>(url: S, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            local_path: None,
            environment: HashMap::new(),
            timeout,
            options: serde_json::Map::new(),
        }
    }

    pub fn with_local_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.local_path = Some(path.into());
        self
    }

    pub fn with_environment(mut self, environment: HashMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_options(mut self, options: serde_json::Map<String, serde_json::Value>) -> Self {
        self.options = options;
        self
    }
}

/// 外部命令的执行结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// 被信号终止时为None
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            ..Default::default()
        }
    }

    pub fn failure<S: Into<String>>(exit_code: i32, stderr: S) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// 失败时用于报告的诊断文本
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.exit_code {
            Some(code) => format!("退出码: {code}"),
            None => "进程被信号终止".to_string(),
        }
    }
}

/// 镜像传输端口
#[async_trait]
pub trait MirrorTransport: Send + Sync {
    /// 从源完整镜像拉取到 `request.local_path`
    async fn mirror_fetch(&self, request: &TransferRequest) -> MigratorResult<CommandOutput>;

    /// 将 `request.local_path` 的镜像完整推送到目标
    async fn mirror_push(&self, request: &TransferRequest) -> MigratorResult<CommandOutput>;

    /// 轻量的远端列举，用于可达性探测
    async fn remote_probe(&self, request: &TransferRequest) -> MigratorResult<CommandOutput>;

    fn name(&self) -> &str;

    /// 按操作类型分发
    async fn run(
        &self,
        operation: TransferOperation,
        request: &TransferRequest,
    ) -> MigratorResult<CommandOutput> {
        match operation {
            TransferOperation::MirrorFetch => self.mirror_fetch(request).await,
            TransferOperation::MirrorPush => self.mirror_push(request).await,
            TransferOperation::RemoteProbe => self.remote_probe(request).await,
        }
    }
}
