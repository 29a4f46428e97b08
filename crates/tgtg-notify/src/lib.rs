//! Notifications for newly available items.
//!
//! [`format`] renders the message text, [`webhook`] delivers one message,
//! and [`queue`] serialises deliveries behind a minimum interval.
//! [`Notifier`] is the handle the refresh loop holds.

pub mod error;
pub mod format;
pub mod queue;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use tgtg_core::ItemRecord;

pub use error::NotifyError;
pub use format::{format_message, Notification};
pub use queue::{DispatchQueue, MIN_INTERVAL};
pub use webhook::{IftttWebhook, WebhookSender};

/// Cheap-to-clone handle over a running [`DispatchQueue`].
#[derive(Clone)]
pub struct Notifier {
    queue: DispatchQueue,
}

impl Notifier {
    #[must_use]
    pub fn start(sender: Arc<dyn WebhookSender>, min_interval: Duration) -> Self {
        Self {
            queue: DispatchQueue::start(sender, min_interval),
        }
    }

    /// Formats `item` and enqueues it. Returns as soon as the message is
    /// queued.
    pub fn notify(&self, item: &ItemRecord) {
        let notification = Notification::for_item(item);
        tracing::info!(item_id = %item.id(), "{}", notification.message);
        self.enqueue(notification);
    }

    pub fn send_test(&self) {
        self.enqueue(Notification::test());
    }

    /// Waits until everything queued so far has been attempted.
    pub async fn flush(&self) {
        if let Err(e) = self.queue.flush().await {
            tracing::warn!(error = %e, "could not drain notification queue");
        }
    }

    fn enqueue(&self, notification: Notification) {
        if let Err(e) = self.queue.enqueue(notification) {
            tracing::warn!(error = %e, "notification dropped");
        }
    }
}
