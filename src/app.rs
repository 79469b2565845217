use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use migrator_config::AppConfig;
use migrator_core::{MigrationExecutor, MirrorTransport};
use migrator_dispatcher::{BatchScheduler, ProgressFn, RetryCoordinator};
use migrator_domain::{BatchResult, MigrationTask};
use migrator_worker::{GitTransport, MirrorTransferExecutor, PreflightValidator};
use tracing::{info, info_span, warn};

/// 主应用程序
///
/// 按顺序执行：目标可达性检查、首轮迁移、失败任务重试。
pub struct MigrationApp {
    config: AppConfig,
    transport: Arc<dyn MirrorTransport>,
    skip_preflight: bool,
}

impl MigrationApp {
    /// 使用本地git命令创建应用实例
    pub fn new(config: AppConfig) -> Self {
        let transport = Arc::new(GitTransport::with_binary(config.transfer.git_binary.clone()));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: AppConfig, transport: Arc<dyn MirrorTransport>) -> Self {
        Self {
            config,
            transport,
            skip_preflight: false,
        }
    }

    pub fn skip_preflight(mut self, skip: bool) -> Self {
        self.skip_preflight = skip;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 运行整个批次并返回最终结果
    pub async fn run(&self, on_progress: &ProgressFn<'_>) -> Result<BatchResult> {
        let start_time = Instant::now();
        let tasks: Vec<Arc<MigrationTask>> = self
            .config
            .migration_tasks()
            .context("构建迁移任务失败")?
            .into_iter()
            .map(Arc::new)
            .collect();
        let batch = self.config.batch_settings();
        let transfer = self.config.transfer_settings();

        if self.skip_preflight {
            info!("已跳过目标仓库访问验证");
        } else {
            info!("验证目标仓库访问...");
            let validator = PreflightValidator::new(Arc::clone(&self.transport), &transfer)
                .with_max_concurrent(batch.max_concurrent)
                .with_span(info_span!("preflight"));
            let unreachable = validator.check_destinations(&tasks).await;
            if !unreachable.is_empty() {
                warn!("{} 个目标仓库无法验证访问，继续执行迁移", unreachable.len());
            }
        }

        info!("开始批量迁移 {} 个仓库...", tasks.len());
        let executor: Arc<dyn MigrationExecutor> = Arc::new(
            MirrorTransferExecutor::new(Arc::clone(&self.transport), transfer)
                .with_span(info_span!("mirror_transfer")),
        );

        let (result, failed) = BatchScheduler::new(Arc::clone(&executor))
            .with_span(info_span!("first_pass"))
            .run_first_pass(&tasks, &batch, on_progress)
            .await;
        let result = RetryCoordinator::new(executor)
            .with_span(info_span!("retry"))
            .run_retries(failed, &batch, result)
            .await;

        info!(
            "迁移完成 - 成功: {}, 失败: {}, 耗时: {}ms",
            result.success(),
            result.failed(),
            start_time.elapsed().as_millis()
        );
        Ok(result)
    }
}
