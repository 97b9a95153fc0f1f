//! Telegram Bot API transport.

use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};

use super::{DeliveryFailed, Notification, Notifier};
use crate::config::NotifierConfig;

/// Escapes `text` so Telegram shows it literally under `parse_mode`.
///
/// Unknown or absent parse modes leave the text untouched.
pub fn escape_markup(parse_mode: Option<&str>, text: &str) -> String {
    let special: &[char] = match parse_mode {
        Some(mode) if mode.eq_ignore_ascii_case("html") => {
            return text
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
        }
        Some(mode) if mode.eq_ignore_ascii_case("markdown") => &['_', '*', '`', '['],
        Some(mode) if mode.eq_ignore_ascii_case("markdownv2") => &[
            '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}',
            '.', '!',
        ],
        _ => return text.to_string(),
    };

    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct TelegramNotifier {
    api_url: String,
    bot_token: String,
    parse_mode: Option<String>,
    attach_logs: bool,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn from_config(config: &NotifierConfig) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone().unwrap_or_default(),
            parse_mode: config.parse_mode.clone(),
            attach_logs: config.attach_logs,
            client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.bot_token)
    }

    async fn check(response: reqwest::Response) -> Result<(), DeliveryFailed> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryFailed::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_message(&self, notification: &Notification) -> Result<(), DeliveryFailed> {
        let mut payload = serde_json::json!({
            "chat_id": notification.recipient,
            "text": notification.message,
        });
        if let Some(parse_mode) = &self.parse_mode {
            payload["parse_mode"] = serde_json::Value::String(parse_mode.clone());
        }

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await?;
        Self::check(response).await
    }

    async fn send_document(
        &self,
        recipient: &str,
        path: &std::path::Path,
    ) -> Result<(), DeliveryFailed> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "container.log".to_string());

        let form = Form::new()
            .text("chat_id", recipient.to_string())
            .part("document", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        Self::check(response).await
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, notification: &Notification) -> Result<(), DeliveryFailed> {
        self.send_message(notification).await?;
        debug!("Telegram message sent");

        if let (true, Some(path)) = (self.attach_logs, &notification.attachment) {
            self.send_document(&notification.recipient, path).await?;
            debug!("Telegram document {path:?} sent");
        }
        Ok(())
    }
}
