use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport failure. The URL is stripped because it embeds the webhook key.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("webhook answered with HTTP status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("invalid webhook URL: {0}")]
    InvalidUrl(String),

    #[error("dispatch queue is closed")]
    QueueClosed,
}
