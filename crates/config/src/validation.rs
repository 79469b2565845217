use crate::ConfigResult;

/// Trait for configuration validation
pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

/// General validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field_name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    /// Validate that a timeout lies in `1..=max_seconds`
    pub fn validate_timeout_seconds(
        timeout_seconds: u64,
        field_name: &str,
        max_seconds: u64,
    ) -> ConfigResult<()> {
        if timeout_seconds == 0 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if timeout_seconds > max_seconds {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be less than or equal to {max_seconds}"
            )));
        }
        Ok(())
    }

    /// Validate that a count lies in `1..=max`
    pub fn validate_count(count: usize, field_name: &str, max: usize) -> ConfigResult<()> {
        if count == 0 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if count > max {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be less than or equal to {max}"
            )));
        }
        Ok(())
    }

    /// Validate a repository URL.
    ///
    /// Accepts anything with a scheme (`https://`, `ssh://`, `file://`) as well as
    /// scp-like `user@host:path` remotes and local paths, which git also understands.
    pub fn validate_repository_url(url: &str, field_name: &str) -> ConfigResult<()> {
        Self::validate_not_empty(url, field_name)?;
        if url.chars().any(char::is_whitespace) {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must not contain whitespace"
            )));
        }
        Ok(())
    }
}
