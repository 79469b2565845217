use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use migrator_core::{MigrationExecutor, MirrorTransport, TransferOperation, TransferRequest};
use migrator_domain::{MigrationTask, RemoteEndpoint, TransferSettings};
use migrator_errors::{MigratorError, MigratorResult};
use tempfile::TempDir;
use tracing::{debug, error, info, warn, Instrument, Span};

use crate::credentials::{CredentialResolver, PreparedCredential};

const WORKSPACE_PREFIX: &str = "repo-migrator-";
const MIRROR_DIR: &str = "repo.git";
const CLEANUP_ATTEMPTS: u32 = 3;
const CLEANUP_BACKOFF: Duration = Duration::from_millis(100);

/// 删除工作区目录，失败时退避重试
///
/// 超时后git子进程只是收到了kill信号，可能还在往目录里写文件，
/// 第一次删除会因此失败。目录已不存在视为成功。
pub(crate) async fn remove_workspace(path: &Path) -> io::Result<()> {
    let mut attempt = 1;
    loop {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) if attempt >= CLEANUP_ATTEMPTS => return Err(e),
            Err(e) => {
                debug!(
                    "删除工作区失败, 稍后重试: path={}, attempt={}, error={}",
                    path.display(),
                    attempt,
                    e
                );
                tokio::time::sleep(CLEANUP_BACKOFF * attempt).await;
                attempt += 1;
            }
        }
    }
}

/// 镜像迁移执行器
///
/// 在独占的临时工作区内先从源仓库镜像拉取，再镜像推送到目标仓库。
/// 工作区在任意退出路径上都会被删除。
pub struct MirrorTransferExecutor {
    transport: Arc<dyn MirrorTransport>,
    resolver: CredentialResolver,
    settings: TransferSettings,
    span: Span,
}

impl MirrorTransferExecutor {
    /// 创建新的镜像执行器
    pub fn new(transport: Arc<dyn MirrorTransport>, settings: TransferSettings) -> Self {
        Self {
            transport,
            resolver: CredentialResolver::new(settings.host_key_policy),
            settings,
            span: tracing::info_span!("mirror_transfer"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    /// 执行一次迁移，所有错误都在这里转换为 `false`
    pub async fn transfer(&self, task: &MigrationTask) -> bool {
        self.execute(task).await.is_ok()
    }

    fn create_workspace(&self) -> MigratorResult<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let workspace = match &self.settings.workspace_dir {
            Some(parent) => {
                std::fs::create_dir_all(parent).and_then(|_| builder.tempdir_in(parent))
            }
            None => builder.tempdir(),
        };
        workspace.map_err(|e| MigratorError::unexpected(format!("创建工作区失败: {e}")))
    }

    async fn run_legs(&self, task: &MigrationTask, mirror_path: &Path) -> MigratorResult<()> {
        let source = self.resolver.prepare(task.source.url(), task.source.auth())?;
        let fetch = TransferRequest::new(source.url.clone(), self.settings.timeout)
            .with_local_path(mirror_path)
            .with_environment(source.environment.clone())
            .with_options(task.options.clone());
        self.invoke(TransferOperation::MirrorFetch, &fetch, &source)
            .await?;
        info!("镜像拉取完成: task={}, source={}", task.name, task.source.url);

        let destination = self
            .resolver
            .prepare(task.destination.url(), task.destination.auth())?;
        let push = TransferRequest::new(destination.url.clone(), self.settings.timeout)
            .with_local_path(mirror_path)
            .with_environment(destination.environment.clone())
            .with_options(task.options.clone());
        self.invoke(TransferOperation::MirrorPush, &push, &destination)
            .await?;
        info!(
            "镜像推送完成: task={}, destination={}",
            task.name, task.destination.url
        );
        Ok(())
    }

    /// 调用传输端口并强制超时，非零退出码转换为传输错误
    async fn invoke(
        &self,
        operation: TransferOperation,
        request: &TransferRequest,
        credential: &PreparedCredential,
    ) -> MigratorResult<()> {
        let output = tokio::time::timeout(request.timeout, self.transport.run(operation, request))
            .await
            .map_err(|_| MigratorError::timeout(operation.as_str(), request.timeout.as_secs()))?
            .map_err(|e| match e {
                MigratorError::Unexpected(message) => {
                    MigratorError::Unexpected(credential.redact(&message))
                }
                other => other,
            })?;

        if output.is_success() {
            Ok(())
        } else {
            Err(MigratorError::transfer(
                operation.as_str(),
                credential.redact(&output.diagnostics()),
            ))
        }
    }
}

#[async_trait]
impl MigrationExecutor for MirrorTransferExecutor {
    async fn execute(&self, task: &MigrationTask) -> MigratorResult<()> {
        let span = self.span.clone();
        async {
            let start_time = Instant::now();
            info!(
                "开始迁移: task={}, source={}, destination={}",
                task.name, task.source.url, task.destination.url
            );

            let result = match self.create_workspace() {
                Ok(workspace) => {
                    let mirror_path = workspace.path().join(MIRROR_DIR);
                    let result = self.run_legs(task, &mirror_path).await;
                    let workspace_path = workspace.path().to_path_buf();
                    if workspace.close().is_err() {
                        if let Err(e) = remove_workspace(&workspace_path).await {
                            warn!("清理工作区失败: path={}, error={}", workspace_path.display(), e);
                        }
                    }
                    result
                }
                Err(e) => Err(e),
            };

            match &result {
                Ok(()) => info!(
                    "迁移成功: task={}, 耗时={}ms",
                    task.name,
                    start_time.elapsed().as_millis()
                ),
                Err(e) => error!(
                    "迁移失败: task={}, category={}, {}: {}",
                    task.name,
                    e.category(),
                    e.user_message(),
                    e
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn name(&self) -> &str {
        "mirror"
    }
}
