//! 有界工作池
//!
//! 每个提交的任务都是独立的tokio任务，执行前先获取信号量许可，
//! 因此同时运行的迁移数不会超过许可数。完成结果由唯一的消费者
//! 按完成顺序取出。

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use migrator_core::MigrationExecutor;
use migrator_domain::MigrationTask;
use migrator_errors::{MigratorError, MigratorResult};
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::debug;

/// 一次执行的结果
#[derive(Debug)]
pub struct Completion {
    pub task: Arc<MigrationTask>,
    pub attempt: u32,
    /// 外层错误表示执行过程panic或被取消
    pub outcome: Result<MigratorResult<()>, JoinError>,
}

impl Completion {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Ok(Ok(())))
    }

    /// 失败原因；成功时为None
    pub fn error(&self) -> Option<MigratorError> {
        match &self.outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.clone()),
            Err(join_error) => Some(MigratorError::unexpected(describe_fault(join_error))),
        }
    }

    /// 执行没有正常返回
    pub fn is_fault(&self) -> bool {
        self.outcome.is_err()
    }
}

fn describe_fault(join_error: &JoinError) -> String {
    if join_error.is_panic() {
        format!("执行过程panic: {join_error}")
    } else {
        format!("执行被取消: {join_error}")
    }
}

pub struct WorkerPool {
    executor: Arc<dyn MigrationExecutor>,
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl WorkerPool {
    /// 创建容量为 `max_concurrent` 的工作池，容量至少为1
    pub fn new(executor: Arc<dyn MigrationExecutor>, max_concurrent: usize) -> Self {
        let capacity = max_concurrent.max(1);
        Self {
            executor,
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 提交任务，超出容量的任务在池内排队
    pub fn submit(&mut self, task: Arc<MigrationTask>, attempt: u32) {
        let executor = Arc::clone(&self.executor);
        let semaphore = Arc::clone(&self.semaphore);
        let running = Arc::clone(&task);

        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| MigratorError::unexpected(format!("工作池已关闭: {e}")))?;
            debug!("开始执行: task={}, attempt={}", running.name, attempt);
            executor.execute(&running).await
        });

        self.in_flight.push(
            async move {
                let outcome = handle.await;
                Completion {
                    task,
                    attempt,
                    outcome,
                }
            }
            .boxed(),
        );
    }

    /// 取出下一个完成的任务，池为空时返回None
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.in_flight.next().await
    }
}
