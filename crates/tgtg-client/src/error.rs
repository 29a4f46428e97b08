use thiserror::Error;

/// Errors returned by the discovery API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by discovery API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// An auth or startup response body did not match the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The discovery response itself could not be decoded. Signals an
    /// upstream contract change rather than a transient failure.
    #[error("discovery payload could not be decoded: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("email login was not confirmed after {attempts} polls")]
    LoginTimedOut { attempts: u32 },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl ClientError {
    /// Returns `true` when the error means the upstream response shape has
    /// changed and polling again will not help.
    #[must_use]
    pub fn is_contract_break(&self) -> bool {
        matches!(self, ClientError::Payload(_))
    }
}
