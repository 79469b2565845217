use std::sync::Arc;
use std::time::Instant;

use migrator_core::MigrationExecutor;
use migrator_domain::{BatchResult, BatchSettings, MigrationTask, TaskOutcome};
use tracing::{error, info, Instrument, Span};

use crate::worker_pool::{Completion, WorkerPool};

/// 进度回调，参数为 (已完成数, 总数)
pub type ProgressFn<'a> = dyn Fn(usize, usize) + Send + Sync + 'a;

/// 首轮失败、等待重试的任务
#[derive(Debug, Clone)]
pub struct FailedTask {
    pub task: Arc<MigrationTask>,
    /// 最近一次失败的尝试序号，首轮为1
    pub attempt: u32,
}

/// 批次调度器，负责首轮执行
pub struct BatchScheduler {
    executor: Arc<dyn MigrationExecutor>,
    span: Span,
}

impl BatchScheduler {
    pub fn new(executor: Arc<dyn MigrationExecutor>) -> Self {
        Self {
            executor,
            span: tracing::info_span!("batch_scheduler"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// 把全部任务提交到有界工作池，按完成顺序汇总结果
    ///
    /// 结果只由当前的消费循环修改，进度回调对每个任务恰好调用一次。
    pub async fn run_first_pass(
        &self,
        tasks: &[Arc<MigrationTask>],
        settings: &BatchSettings,
        on_progress: &ProgressFn<'_>,
    ) -> (BatchResult, Vec<FailedTask>) {
        let span = self.span.clone();
        async {
            let total = tasks.len();
            let start_time = Instant::now();
            let mut result = BatchResult::new(total);
            let mut failed = Vec::new();
            let mut pool = WorkerPool::new(Arc::clone(&self.executor), settings.max_concurrent);
            info!(
                "开始批量迁移: 任务数={}, 最大并发={}",
                total,
                pool.capacity()
            );
            for task in tasks {
                pool.submit(Arc::clone(task), 1);
            }

            let mut completed = 0;
            while let Some(completion) = pool.next_completion().await {
                completed += 1;
                let outcome = outcome_of(&completion);
                if !outcome.success {
                    failed.push(FailedTask {
                        task: Arc::clone(&completion.task),
                        attempt: completion.attempt,
                    });
                }
                result.record_first_pass(outcome);
                on_progress(completed, total);
            }

            info!(
                "首轮迁移完成: 成功={}, 失败={}, 耗时={}ms",
                result.success(),
                result.failed(),
                start_time.elapsed().as_millis()
            );
            (result, failed)
        }
        .instrument(span)
        .await
    }
}

/// 把一次执行结果转换为任务结果记录
pub(crate) fn outcome_of(completion: &Completion) -> TaskOutcome {
    let name = completion.task.name.clone();
    match completion.error() {
        None => TaskOutcome::succeeded(name, completion.attempt),
        Some(err) => {
            if completion.is_fault() {
                error!(
                    "任务执行异常终止: task={}, attempt={}, error={}",
                    name, completion.attempt, err
                );
            }
            TaskOutcome::failed(name, completion.attempt, err.to_string())
        }
    }
}
