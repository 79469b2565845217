#[cfg(test)]
mod error_tests {
    use crate::*;

    #[test]
    fn test_migrator_error_display() {
        let config_error = MigratorError::config_error("缺少 migrations 段");
        assert_eq!(config_error.to_string(), "配置验证失败: 缺少 migrations 段");

        let credential_error = MigratorError::credential("token 为空");
        assert_eq!(credential_error.to_string(), "凭据错误: token 为空");

        let transfer_error = MigratorError::transfer("mirror-fetch", "fatal: repository not found");
        assert_eq!(
            transfer_error.to_string(),
            "mirror-fetch 执行失败: fatal: repository not found"
        );

        let timeout_error = MigratorError::timeout("mirror-push", 300);
        assert_eq!(timeout_error.to_string(), "mirror-push 超过时间限制 (300s)");

        let unexpected_error = MigratorError::unexpected("磁盘已满");
        assert_eq!(unexpected_error.to_string(), "意外错误: 磁盘已满");
    }

    #[test]
    fn test_error_category() {
        assert_eq!(MigratorError::config_error("x").category(), "config");
        assert_eq!(MigratorError::credential("x").category(), "credential");
        assert_eq!(MigratorError::transfer("op", "x").category(), "transfer");
        assert_eq!(MigratorError::timeout("op", 1).category(), "timeout");
        assert_eq!(MigratorError::unexpected("x").category(), "unexpected");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: MigratorError = io_error.into();
        assert!(matches!(error, MigratorError::Unexpected(_)));
        assert!(!error.is_timeout());
    }

    #[test]
    fn test_user_message() {
        assert_eq!(
            MigratorError::timeout("mirror-fetch", 10).user_message(),
            "Git传输超时"
        );
        assert_eq!(
            MigratorError::credential("x").user_message(),
            "认证信息缺失或无效"
        );
    }
}
