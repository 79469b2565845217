use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 批次执行参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// 同时执行的迁移数上限，必须大于0
    pub max_concurrent: usize,
    pub retry_on_failure: bool,
    /// 首轮之后允许的重试次数
    pub max_retries: u32,
    /// 每次重试派发前的等待时间
    pub retry_delay: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            retry_on_failure: true,
            max_retries: 2,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl BatchSettings {
    /// 是否会进行重试轮次
    pub fn retries_enabled(&self) -> bool {
        self.retry_on_failure && self.max_retries > 0
    }

    /// 第 `attempt` 次尝试失败后是否还能再试一次
    pub fn can_retry(&self, attempt: u32) -> bool {
        self.retries_enabled() && attempt <= self.max_retries
    }
}

/// SSH密钥认证时的主机密钥校验策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyPolicy {
    /// 跳过主机密钥校验（首次信任），安全性最低
    #[default]
    Skip,
    /// 接受未知主机并记录，拒绝已变更的主机密钥
    AcceptNew,
    /// 使用ssh默认的严格校验
    Strict,
}

impl HostKeyPolicy {
    /// 对应的 `StrictHostKeyChecking` 取值
    pub fn ssh_option(&self) -> &'static str {
        match self {
            HostKeyPolicy::Skip => "no",
            HostKeyPolicy::AcceptNew => "accept-new",
            HostKeyPolicy::Strict => "yes",
        }
    }
}

/// 传输调用参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    /// 每次传输调用的超时
    pub timeout: Duration,
    /// 可达性探测的超时
    pub probe_timeout: Duration,
    /// 临时工作区的父目录，None时使用系统临时目录
    pub workspace_dir: Option<PathBuf>,
    pub host_key_policy: HostKeyPolicy,
}

impl TransferSettings {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
    pub const MAX_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            probe_timeout: Self::MAX_PROBE_TIMEOUT,
            workspace_dir: None,
            host_key_policy: HostKeyPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_settings_default() {
        let settings = BatchSettings::default();
        assert_eq!(settings.max_concurrent, 3);
        assert!(settings.retry_on_failure);
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_can_retry_budget() {
        let settings = BatchSettings {
            max_retries: 2,
            ..Default::default()
        };
        assert!(settings.can_retry(1));
        assert!(settings.can_retry(2));
        assert!(!settings.can_retry(3));
    }

    #[test]
    fn test_host_key_policy_option() {
        assert_eq!(HostKeyPolicy::default(), HostKeyPolicy::Skip);
        assert_eq!(HostKeyPolicy::Skip.ssh_option(), "no");
        assert_eq!(HostKeyPolicy::AcceptNew.ssh_option(), "accept-new");
        assert_eq!(HostKeyPolicy::Strict.ssh_option(), "yes");
    }

    #[test]
    fn test_transfer_settings_default() {
        let settings = TransferSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(300));
        assert_eq!(settings.probe_timeout, Duration::from_secs(10));
        assert!(settings.workspace_dir.is_none());
    }

    #[test]
    fn test_retry_disabled() {
        let disabled = BatchSettings {
            retry_on_failure: false,
            ..Default::default()
        };
        assert!(!disabled.retries_enabled());
        assert!(!disabled.can_retry(1));

        let zero = BatchSettings {
            max_retries: 0,
            ..Default::default()
        };
        assert!(!zero.retries_enabled());
    }
}
