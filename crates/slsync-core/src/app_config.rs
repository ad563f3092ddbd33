use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Everything needed to talk to a SelectLine deployment.
///
/// The remote API's exact shape varies per installation, so path segments,
/// query-parameter names, and the auth header are all configuration rather
/// than constants.
#[derive(Clone)]
pub struct SelectLineConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub app_key: String,
    pub login_path: String,
    pub groups_path: String,
    pub articles_path: String,
    /// Header the bearer token is attached to, e.g. `Authorization`.
    pub auth_header: String,
    /// Prefix in front of the token value, e.g. `"LoginId "` or `"Bearer "`.
    pub auth_prefix: String,
    pub page_param: String,
    pub page_size_param: String,
    pub group_filter_param: String,
    pub page_size: u32,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl std::fmt::Debug for SelectLineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectLineConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("app_key", &"[redacted]")
            .field("login_path", &self.login_path)
            .field("groups_path", &self.groups_path)
            .field("articles_path", &self.articles_path)
            .field("auth_header", &self.auth_header)
            .field("auth_prefix", &self.auth_prefix)
            .field("page_param", &self.page_param)
            .field("page_size_param", &self.page_size_param)
            .field("group_filter_param", &self.group_filter_param)
            .field("page_size", &self.page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Shared secret for the admin sync-trigger endpoints. `None` only in
    /// development, where the admin routes are left open for local work.
    pub admin_token: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub selectline: SelectLineConfig,
    /// Article attributes older than this are re-fetched on demand.
    pub enrich_max_age_days: i64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("admin_token", &self.admin_token.as_ref().map(|_| "[redacted]"))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("selectline", &self.selectline)
            .field("enrich_max_age_days", &self.enrich_max_age_days)
            .finish()
    }
}
