use std::time::Duration;

use migrator_domain::BatchSettings;
use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

pub const MAX_CONCURRENT_LIMIT: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    pub max_concurrent: usize,
    pub retry_on_failure: bool,
    pub max_retries: u32,
    /// 重试间隔（秒）
    pub retry_delay: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            retry_on_failure: true,
            max_retries: 2,
            retry_delay: 5,
        }
    }
}

impl BatchConfig {
    pub fn to_settings(&self) -> BatchSettings {
        BatchSettings {
            max_concurrent: self.max_concurrent,
            retry_on_failure: self.retry_on_failure,
            max_retries: self.max_retries,
            retry_delay: Duration::from_secs(self.retry_delay),
        }
    }
}

impl ConfigValidator for BatchConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_count(
            self.max_concurrent,
            "batch.max_concurrent",
            MAX_CONCURRENT_LIMIT,
        )?;
        Ok(())
    }
}
