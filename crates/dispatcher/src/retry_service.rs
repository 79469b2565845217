use std::sync::Arc;

use migrator_core::MigrationExecutor;
use migrator_domain::{BatchResult, BatchSettings};
use tracing::{info, warn, Instrument, Span};

use crate::scheduler::{outcome_of, FailedTask};
use crate::worker_pool::WorkerPool;

/// 重试协调器
///
/// 只重试失败的任务。每一轮使用新的工作池，派发每个任务前先等待
/// `retry_delay`，所以重试是逐个进入工作池的，进入后并发执行。
/// 任务在第 `max_retries + 1` 次尝试后不再重试。
pub struct RetryCoordinator {
    executor: Arc<dyn MigrationExecutor>,
    span: Span,
}

impl RetryCoordinator {
    pub fn new(executor: Arc<dyn MigrationExecutor>) -> Self {
        Self {
            executor,
            span: tracing::info_span!("retry_coordinator"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub async fn run_retries(
        &self,
        failed: Vec<FailedTask>,
        settings: &BatchSettings,
        mut result: BatchResult,
    ) -> BatchResult {
        if !settings.retries_enabled() {
            if !failed.is_empty() {
                info!("重试已关闭，{} 个失败任务不再重试", failed.len());
            }
            return result;
        }

        let span = self.span.clone();
        async {
            let mut pending: Vec<FailedTask> = failed
                .into_iter()
                .filter(|f| settings.can_retry(f.attempt))
                .collect();
            let mut round = 0;

            while !pending.is_empty() {
                round += 1;
                let mut pool =
                    WorkerPool::new(Arc::clone(&self.executor), settings.max_concurrent);
                info!(
                    "开始第 {} 轮重试: 任务数={}, 最大并发={}",
                    round,
                    pending.len(),
                    pool.capacity()
                );
                for failed_task in pending.drain(..) {
                    if !settings.retry_delay.is_zero() {
                        tokio::time::sleep(settings.retry_delay).await;
                    }
                    let attempt = failed_task.attempt + 1;
                    info!("重试任务: task={}, attempt={}", failed_task.task.name, attempt);
                    pool.submit(failed_task.task, attempt);
                }

                while let Some(completion) = pool.next_completion().await {
                    let outcome = outcome_of(&completion);
                    let succeeded = outcome.success;
                    result.record_retry(outcome);

                    if succeeded {
                        info!(
                            "重试成功: task={}, attempt={}",
                            completion.task.name, completion.attempt
                        );
                    } else if settings.can_retry(completion.attempt) {
                        pending.push(FailedTask {
                            task: completion.task,
                            attempt: completion.attempt,
                        });
                    } else {
                        warn!(
                            "重试次数已用尽: task={}, attempts={}",
                            completion.task.name, completion.attempt
                        );
                    }
                }
            }

            info!(
                "重试结束: 成功={}, 失败={}",
                result.success(),
                result.failed()
            );
            result
        }
        .instrument(span)
        .await
    }
}
