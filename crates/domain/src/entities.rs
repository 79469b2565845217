use std::fmt;
use std::path::PathBuf;

/// 默认源分支
pub const DEFAULT_BRANCH: &str = "main";

/// 认证描述
///
/// 封闭的变体集合，每个使用点都必须穷尽匹配。字段是否有效由
/// `CredentialResolver` 在解析时检查，不在构造时拒绝。
#[derive(Clone, PartialEq, Eq, Default)]
pub enum AuthCredential {
    #[default]
    None,
    Token {
        token: String,
    },
    Basic {
        username: String,
        password: String,
    },
    Ssh {
        key_path: Option<PathBuf>,
    },
}

impl AuthCredential {
    pub fn token<S: Into<String>>(token: S) -> Self {
        Self::Token {
            token: token.into(),
        }
    }

    pub fn basic<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn ssh(key_path: Option<PathBuf>) -> Self {
        Self::Ssh { key_path }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuthCredential::None => "none",
            AuthCredential::Token { .. } => "token",
            AuthCredential::Basic { .. } => "basic",
            AuthCredential::Ssh { .. } => "ssh",
        }
    }
}

// 手写Debug，避免密钥出现在日志里
impl fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthCredential::None => write!(f, "None"),
            AuthCredential::Token { .. } => f.debug_struct("Token").field("token", &"***").finish(),
            AuthCredential::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            AuthCredential::Ssh { key_path } => {
                f.debug_struct("Ssh").field("key_path", key_path).finish()
            }
        }
    }
}

/// 可连接的远端：URL加认证描述
pub trait RemoteEndpoint {
    fn url(&self) -> &str;
    fn auth(&self) -> &AuthCredential;
}

/// 迁移源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEndpoint {
    pub url: String,
    pub branch: String,
    pub auth: AuthCredential,
}

impl SourceEndpoint {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            branch: DEFAULT_BRANCH.to_string(),
            auth: AuthCredential::None,
        }
    }

    pub fn with_branch<S: Into<String>>(mut self, branch: S) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_auth(mut self, auth: AuthCredential) -> Self {
        self.auth = auth;
        self
    }
}

impl RemoteEndpoint for SourceEndpoint {
    fn url(&self) -> &str {
        &self.url
    }

    fn auth(&self) -> &AuthCredential {
        &self.auth
    }
}

/// 迁移目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationEndpoint {
    pub url: String,
    pub create_if_missing: bool,
    pub auth: AuthCredential,
}

impl DestinationEndpoint {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            create_if_missing: true,
            auth: AuthCredential::None,
        }
    }

    pub fn with_create_if_missing(mut self, create_if_missing: bool) -> Self {
        self.create_if_missing = create_if_missing;
        self
    }

    pub fn with_auth(mut self, auth: AuthCredential) -> Self {
        self.auth = auth;
        self
    }
}

impl RemoteEndpoint for DestinationEndpoint {
    fn url(&self) -> &str {
        &self.url
    }

    fn auth(&self) -> &AuthCredential {
        &self.auth
    }
}

/// 单个迁移任务，从任务目录构造后不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationTask {
    /// 批次内唯一，作为重试和结果记录的关联键
    pub name: String,
    pub source: SourceEndpoint,
    pub destination: DestinationEndpoint,
    /// 透传给传输步骤的选项
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl MigrationTask {
    pub fn new<S: Into<String>>(
        name: S,
        source: SourceEndpoint,
        destination: DestinationEndpoint,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            destination,
            options: serde_json::Map::new(),
        }
    }

    pub fn with_options(mut self, options: serde_json::Map<String, serde_json::Value>) -> Self {
        self.options = options;
        self
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }
}
