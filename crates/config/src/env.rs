//! 配置值中的环境变量与家目录展开

use std::path::PathBuf;

use crate::{ConfigError, ConfigResult};

/// 展开 `${VAR}` 形式的取值；其它取值原样返回
///
/// 变量未设置或为空都视为配置错误。
pub fn expand_env_value(value: &str) -> ConfigResult<String> {
    match value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Some(var_name) => match std::env::var(var_name) {
            Ok(resolved) if !resolved.is_empty() => Ok(resolved),
            _ => Err(ConfigError::Environment(format!(
                "environment variable '{var_name}' is not set"
            ))),
        },
        None => Ok(value.to_string()),
    }
}

/// 展开路径开头的 `~`
pub fn expand_home(path: &str) -> PathBuf {
    let home = || std::env::var_os("HOME").map(PathBuf::from);

    if path == "~" {
        if let Some(home) = home() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_value_unchanged() {
        assert_eq!(expand_env_value("plain-token").unwrap(), "plain-token");
        assert_eq!(expand_env_value("${incomplete").unwrap(), "${incomplete");
    }

    #[test]
    fn test_expand_env_value() {
        std::env::set_var("MIGRATOR_TEST_ENV_EXPAND", "s3cr3t");
        assert_eq!(
            expand_env_value("${MIGRATOR_TEST_ENV_EXPAND}").unwrap(),
            "s3cr3t"
        );
    }

    #[test]
    fn test_missing_env_value_is_error() {
        std::env::remove_var("MIGRATOR_TEST_ENV_MISSING");
        let err = expand_env_value("${MIGRATOR_TEST_ENV_MISSING}").unwrap_err();
        assert!(matches!(err, ConfigError::Environment(_)));
        assert!(err.to_string().contains("MIGRATOR_TEST_ENV_MISSING"));
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(expand_home("~/.ssh/id_rsa"), PathBuf::from(home).join(".ssh/id_rsa"));
        }
        assert_eq!(expand_home("/etc/key"), PathBuf::from("/etc/key"));
        assert_eq!(expand_home("relative~/key"), PathBuf::from("relative~/key"));
    }
}
