use std::time::Duration;

use migrator_domain::{HostKeyPolicy, TransferSettings};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::env::expand_home;
use crate::validation::{ConfigValidator, ValidationUtils};

pub const MAX_TRANSFER_TIMEOUT_SECONDS: u64 = 86_400;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransferConfig {
    pub timeout_seconds: u64,
    /// 超过10秒时会被截断
    pub probe_timeout_seconds: u64,
    pub git_binary: String,
    pub workspace_dir: Option<String>,
    pub host_key_policy: HostKeyPolicy,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 300,
            probe_timeout_seconds: 10,
            git_binary: "git".to_string(),
            workspace_dir: None,
            host_key_policy: HostKeyPolicy::Skip,
        }
    }
}

impl TransferConfig {
    pub fn to_settings(&self) -> TransferSettings {
        let mut probe_timeout = Duration::from_secs(self.probe_timeout_seconds);
        if probe_timeout > TransferSettings::MAX_PROBE_TIMEOUT {
            warn!(
                "transfer.probe_timeout_seconds={} exceeds the probe limit, clamped to {}s",
                self.probe_timeout_seconds,
                TransferSettings::MAX_PROBE_TIMEOUT.as_secs()
            );
            probe_timeout = TransferSettings::MAX_PROBE_TIMEOUT;
        }

        TransferSettings {
            timeout: Duration::from_secs(self.timeout_seconds),
            probe_timeout,
            workspace_dir: self.workspace_dir.as_deref().map(expand_home),
            host_key_policy: self.host_key_policy,
        }
    }
}

impl ConfigValidator for TransferConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_timeout_seconds(
            self.timeout_seconds,
            "transfer.timeout_seconds",
            MAX_TRANSFER_TIMEOUT_SECONDS,
        )?;
        if self.probe_timeout_seconds == 0 {
            return Err(crate::ConfigError::Validation(
                "transfer.probe_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        ValidationUtils::validate_not_empty(&self.git_binary, "transfer.git_binary")?;
        Ok(())
    }
}
