//! 批次调度
//!
//! 首轮执行和重试轮次先后进行，每一轮都在独立的有界工作池中并发执行。

pub mod retry_service;
pub mod scheduler;
pub mod worker_pool;

pub use retry_service::RetryCoordinator;
pub use scheduler::{BatchScheduler, FailedTask, ProgressFn};
pub use worker_pool::{Completion, WorkerPool};
