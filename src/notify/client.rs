use tokio::sync::mpsc::{Sender, error::TrySendError};

use super::Notification;

/// Cheap handle used to submit notifications without waiting for delivery.
#[derive(Clone)]
pub struct NotifierClient {
    tx: Sender<Notification>,
    recipient: String,
}

impl NotifierClient {
    pub fn new(tx: Sender<Notification>, recipient: impl Into<String>) -> Self {
        Self {
            tx,
            recipient: recipient.into(),
        }
    }

    pub fn notify(&self, message: impl Into<String>) -> bool {
        self.submit(Notification::new(self.recipient.clone(), message))
    }

    pub fn notify_with_attachment(
        &self,
        message: impl Into<String>,
        attachment: Option<std::path::PathBuf>,
    ) -> bool {
        self.submit(Notification::new(self.recipient.clone(), message).with_attachment(attachment))
    }

    /// Queues a notification. Returns `false` if it had to be dropped.
    pub fn submit(&self, notification: Notification) -> bool {
        // Use try_send to avoid blocking the monitor loop.
        match self.tx.try_send(notification) {
            Ok(()) => true,
            Err(TrySendError::Full(n)) => {
                log::error!("Notification queue full, dropping: {}", n.message);
                false
            }
            Err(TrySendError::Closed(n)) => {
                log::error!("Notification service stopped, dropping: {}", n.message);
                false
            }
        }
    }
}
