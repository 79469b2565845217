//! 批次结果聚合
//!
//! `BatchResult` 在批次开始时创建，只由调度器和重试协调器修改，
//! 返回给调用方后不再变化。任何时刻批次结束后都满足：
//! `success + failed == total` 且 `failed == failed_names.len()`。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 单个任务的执行结果记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub name: String,
    pub success: bool,
    /// 产生该结果的尝试序号，首轮为1
    pub attempt: u32,
    /// 是否经过重试
    pub retry: bool,
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl TaskOutcome {
    pub fn succeeded<S: Into<String>>(name: S, attempt: u32) -> Self {
        Self {
            name: name.into(),
            success: true,
            attempt,
            retry: false,
            error: None,
            finished_at: Utc::now(),
        }
    }

    pub fn failed<S: Into<String>, E: Into<String>>(name: S, attempt: u32, error: E) -> Self {
        Self {
            name: name.into(),
            success: false,
            attempt,
            retry: false,
            error: Some(error.into()),
            finished_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    total: usize,
    success: usize,
    failed: usize,
    failed_names: Vec<String>,
    details: Vec<TaskOutcome>,
}

impl BatchResult {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            success: 0,
            failed: 0,
            failed_names: Vec::new(),
            details: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn success(&self) -> usize {
        self.success
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn failed_names(&self) -> &[String] {
        &self.failed_names
    }

    pub fn details(&self) -> &[TaskOutcome] {
        &self.details
    }

    pub fn detail(&self, name: &str) -> Option<&TaskOutcome> {
        self.details.iter().find(|d| d.name == name)
    }

    /// 所有任务都已成功
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// 计数器与失败列表是否一致
    pub fn is_consistent(&self) -> bool {
        self.success + self.failed == self.total && self.failed == self.failed_names.len()
    }

    /// 记录首轮结果
    pub fn record_first_pass(&mut self, outcome: TaskOutcome) {
        if outcome.success {
            self.success += 1;
        } else {
            self.failed += 1;
            if !self.failed_names.contains(&outcome.name) {
                self.failed_names.push(outcome.name.clone());
            }
        }
        self.details.push(outcome);
    }

    /// 合并一次重试的结果，原地更新对应的明细记录
    ///
    /// 成功时只有当名字仍在失败列表中才调整计数器，同一任务被重复驱动时
    /// 不会破坏计数。返回计数器是否发生变化。
    pub fn record_retry(&mut self, outcome: TaskOutcome) -> bool {
        let mut reconciled = false;

        if outcome.success {
            if let Some(pos) = self.failed_names.iter().position(|n| *n == outcome.name) {
                self.failed_names.remove(pos);
                self.failed -= 1;
                self.success += 1;
                reconciled = true;
            } else {
                warn!("重试成功的任务 {} 不在失败列表中，忽略计数更新", outcome.name);
            }
        }

        match self.details.iter_mut().find(|d| d.name == outcome.name) {
            Some(detail) => {
                detail.success = outcome.success;
                detail.attempt = outcome.attempt;
                detail.retry = true;
                detail.error = outcome.error;
                detail.finished_at = outcome.finished_at;
            }
            None => {
                self.details.push(TaskOutcome {
                    retry: true,
                    ..outcome
                });
            }
        }

        reconciled
    }
}
