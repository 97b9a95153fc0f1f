//! Outbound notifications to the operator.
//!
//! The monitor never talks to a transport directly. It hands a
//! [`Notification`] to a [`NotifierClient`], which queues it for the
//! [`NotifierService`]. The service performs the actual [`Notifier::send`]
//! under a timeout and logs failures.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

pub mod client;
pub mod service;
pub mod telegram;

pub use client::NotifierClient;
pub use service::NotifierService;
pub use telegram::TelegramNotifier;

use crate::config::{NotifierConfig, NotifierKind};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryFailed {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
    #[error("Transport answered {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Send did not finish within {0:?}")]
    Timeout(Duration),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Request URLs embed transport credentials (the Telegram bot token), so they
// never make it into an error that gets logged.
impl From<reqwest::Error> for DeliveryFailed {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub message: String,
    /// File to attach, usually a log capture.
    pub attachment: Option<PathBuf>,
}

impl Notification {
    pub fn new(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            message: message.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Option<PathBuf>) -> Self {
        self.attachment = attachment;
        self
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, notification: &Notification) -> Result<(), DeliveryFailed>;
}

/// Writes notifications to the daemon log. Used when no chat transport is
/// configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, notification: &Notification) -> Result<(), DeliveryFailed> {
        match &notification.attachment {
            Some(path) => log::warn!("NOTIFY {} (attachment: {path:?})", notification.message),
            None => log::warn!("NOTIFY {}", notification.message),
        }
        Ok(())
    }
}

pub fn from_config(config: &NotifierConfig) -> Box<dyn Notifier> {
    match config.kind {
        NotifierKind::Telegram => Box::new(TelegramNotifier::from_config(config)),
        NotifierKind::Log => Box::new(LogNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notification = Notification::new("", "web is down")
            .with_attachment(Some(PathBuf::from("logs/web.log")));
        assert!(LogNotifier.send(&notification).await.is_ok());
    }

    #[test]
    fn test_from_config_picks_transport() {
        let mut config = NotifierConfig::default();
        assert_eq!(from_config(&config).name(), "log");

        config.kind = NotifierKind::Telegram;
        config.bot_token = Some("123:abc".to_string());
        assert_eq!(from_config(&config).name(), "telegram");
    }
}
