use std::path::PathBuf;

/// How the discovery client identifies itself upstream.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Pre-captured values copied from an existing app session. Never expire.
    Static {
        user_id: String,
        cookie: Option<String>,
        authorization: Option<String>,
    },
    /// Log in by email; the user confirms the login link sent to the inbox.
    Email { email: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Static {
                user_id,
                cookie,
                authorization,
            } => f
                .debug_struct("Static")
                .field("user_id", user_id)
                .field("cookie", &cookie.as_ref().map(|_| "[redacted]"))
                .field("authorization", &authorization.as_ref().map(|_| "[redacted]"))
                .finish(),
            Credentials::Email { email } => {
                f.debug_struct("Email").field("email", email).finish()
            }
        }
    }
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub refresh_minutes: Option<u64>,
    pub cache_path: Option<PathBuf>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub longitude: f64,
    pub latitude: f64,
    pub radius_km: f64,
    pub ifttt_key: String,
    pub ifttt_event: String,
    pub refresh_minutes: u64,
    pub cache_path: PathBuf,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub notify_interval_ms: u64,
    pub login_poll_secs: u64,
    pub login_max_polls: u32,
    pub api_base_url: String,
    pub webhook_base_url: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("credentials", &self.credentials)
            .field("longitude", &self.longitude)
            .field("latitude", &self.latitude)
            .field("radius_km", &self.radius_km)
            .field("ifttt_key", &"[redacted]")
            .field("ifttt_event", &self.ifttt_event)
            .field("refresh_minutes", &self.refresh_minutes)
            .field("cache_path", &self.cache_path)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("notify_interval_ms", &self.notify_interval_ms)
            .field("login_poll_secs", &self.login_poll_secs)
            .field("login_max_polls", &self.login_max_polls)
            .field("api_base_url", &self.api_base_url)
            .field("webhook_base_url", &self.webhook_base_url)
            .finish()
    }
}
