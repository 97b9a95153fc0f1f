use std::time::Duration;

use log::{error, info};
use tokio::sync::mpsc::Receiver;

use super::{DeliveryFailed, Notification, Notifier};

/// Drains the notification queue, one send at a time, each under its own
/// timeout. Failed sends are logged and dropped; nothing is retried.
pub struct NotifierService {
    notifier: Box<dyn Notifier>,
    rx: Receiver<Notification>,
    send_timeout: Duration,
}

impl NotifierService {
    pub fn new(notifier: Box<dyn Notifier>, rx: Receiver<Notification>, send_timeout: Duration) -> Self {
        Self {
            notifier,
            rx,
            send_timeout,
        }
    }

    /// Runs until every [`super::NotifierClient`] has been dropped and the
    /// queue is empty. Returns the number of successful deliveries.
    pub async fn run(mut self) -> usize {
        info!("Notifier service started ({})", self.notifier.name());
        let mut delivered = 0;

        while let Some(notification) = self.rx.recv().await {
            match self.deliver(&notification).await {
                Ok(()) => delivered += 1,
                Err(e) => error!(
                    "Failed to deliver notification via {}: {e}",
                    self.notifier.name()
                ),
            }
        }

        info!("Notifier service stopped");
        delivered
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryFailed> {
        tokio::time::timeout(self.send_timeout, self.notifier.send(notification))
            .await
            .map_err(|_| DeliveryFailed::Timeout(self.send_timeout))?
    }
}
