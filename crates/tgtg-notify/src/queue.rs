//! Serialised, rate-limited dispatch.
//!
//! A single worker task drains an unbounded FIFO channel and hands each
//! notification to a [`WebhookSender`], keeping at least `min_interval`
//! (never less than [`MIN_INTERVAL`]) between the starts of consecutive
//! calls. Enqueueing never blocks and delivery failures are logged and
//! dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::error::NotifyError;
use crate::format::Notification;
use crate::webhook::WebhookSender;

pub const MIN_INTERVAL: Duration = Duration::from_millis(1_000);

enum Job {
    Deliver(Notification),
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct DispatchQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl DispatchQueue {
    /// Spawns the worker on the current Tokio runtime. Intervals shorter
    /// than [`MIN_INTERVAL`] are raised to it.
    #[must_use]
    pub fn start(sender: Arc<dyn WebhookSender>, min_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(rx, sender, min_interval.max(MIN_INTERVAL)));
        Self { tx }
    }

    /// Appends a notification to the tail of the queue.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::QueueClosed`] if the worker has stopped.
    pub fn enqueue(&self, notification: Notification) -> Result<(), NotifyError> {
        self.tx
            .send(Job::Deliver(notification))
            .map_err(|_| NotifyError::QueueClosed)
    }

    /// Resolves once every notification enqueued before this call has been
    /// attempted.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::QueueClosed`] if the worker has stopped.
    pub async fn flush(&self) -> Result<(), NotifyError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(Job::Flush(done_tx))
            .map_err(|_| NotifyError::QueueClosed)?;
        done_rx.await.map_err(|_| NotifyError::QueueClosed)
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Job>,
    sender: Arc<dyn WebhookSender>,
    min_interval: Duration,
) {
    let mut last_sent: Option<Instant> = None;

    while let Some(job) = rx.recv().await {
        match job {
            Job::Deliver(notification) => {
                if let Some(last) = last_sent {
                    tokio::time::sleep_until(last + min_interval).await;
                }
                last_sent = Some(Instant::now());

                if let Err(e) = sender.send(&notification).await {
                    tracing::warn!(error = %e, "notification delivery failed");
                }
            }
            Job::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    tracing::debug!("dispatch queue closed");
}
