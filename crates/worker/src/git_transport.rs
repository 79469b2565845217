//! 基于git命令行的镜像传输实现

use std::ffi::OsString;
use std::process::Stdio;

use async_trait::async_trait;
use migrator_core::{CommandOutput, MirrorTransport, TransferOperation, TransferRequest};
use migrator_errors::{MigratorError, MigratorResult};
use tokio::process::Command;
use tracing::debug;

/// 任务选项中控制推送方式的键
pub const PUSH_MODE_OPTION: &str = "push_mode";

/// 推送方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    /// 推送所有引用并删除目标多余的引用
    Mirror,
    /// 只推送分支
    AllBranches,
}

impl PushMode {
    pub fn from_options(options: &serde_json::Map<String, serde_json::Value>) -> MigratorResult<Self> {
        match options.get(PUSH_MODE_OPTION).and_then(|v| v.as_str()) {
            None | Some("mirror") => Ok(PushMode::Mirror),
            Some("all") => Ok(PushMode::AllBranches),
            Some(other) => Err(MigratorError::unexpected(format!(
                "不支持的 {PUSH_MODE_OPTION}: {other}"
            ))),
        }
    }

    fn flag(&self) -> &'static str {
        match self {
            PushMode::Mirror => "--mirror",
            PushMode::AllBranches => "--all",
        }
    }
}

/// 调用本地git可执行文件
#[derive(Debug, Clone)]
pub struct GitTransport {
    git_binary: String,
}

impl GitTransport {
    pub fn new() -> Self {
        Self::with_binary("git")
    }

    pub fn with_binary<S: Into<String>>(git_binary: S) -> Self {
        Self {
            git_binary: git_binary.into(),
        }
    }

    /// 构造命令行参数；参数中含有凭据，不能写入日志
    pub fn build_args(
        operation: TransferOperation,
        request: &TransferRequest,
    ) -> MigratorResult<Vec<OsString>> {
        let local_path = || {
            request.local_path.clone().ok_or_else(|| {
                MigratorError::unexpected(format!("{operation} 缺少本地仓库路径"))
            })
        };

        let args: Vec<OsString> = match operation {
            TransferOperation::MirrorFetch => vec![
                "clone".into(),
                "--mirror".into(),
                request.url.clone().into(),
                local_path()?.into(),
            ],
            TransferOperation::MirrorPush => {
                let mode = PushMode::from_options(&request.options)?;
                vec![
                    "-C".into(),
                    local_path()?.into(),
                    "push".into(),
                    mode.flag().into(),
                    request.url.clone().into(),
                ]
            }
            TransferOperation::RemoteProbe => vec!["ls-remote".into(), request.url.clone().into()],
        };
        Ok(args)
    }

    async fn run_git(
        &self,
        operation: TransferOperation,
        request: &TransferRequest,
    ) -> MigratorResult<CommandOutput> {
        let args = Self::build_args(operation, request)?;
        debug!("执行git操作: operation={}, binary={}", operation, self.git_binary);

        let mut cmd = Command::new(&self.git_binary);
        cmd.args(&args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .envs(&request.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // 调用方超时后丢弃future时终止子进程
            .kill_on_drop(true);

        let output = cmd.output().await.map_err(|e| {
            MigratorError::unexpected(format!("启动 {} 失败: {e}", self.git_binary))
        })?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            "git操作结束: operation={}, exit_code={:?}",
            operation, result.exit_code
        );
        Ok(result)
    }
}

impl Default for GitTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MirrorTransport for GitTransport {
    async fn mirror_fetch(&self, request: &TransferRequest) -> MigratorResult<CommandOutput> {
        self.run_git(TransferOperation::MirrorFetch, request).await
    }

    async fn mirror_push(&self, request: &TransferRequest) -> MigratorResult<CommandOutput> {
        self.run_git(TransferOperation::MirrorPush, request).await
    }

    async fn remote_probe(&self, request: &TransferRequest) -> MigratorResult<CommandOutput> {
        self.run_git(TransferOperation::RemoteProbe, request).await
    }

    fn name(&self) -> &str {
        "git"
    }
}
