//! Text of the failure notification.

use serde::Serialize;

use super::capture::{CaptureUnavailable, LogReference};
use super::classifier::FailureEvent;
use crate::notify::telegram::escape_markup;
use crate::template::render_template;

pub const DEFAULT_FAILURE_TEMPLATE: &str = "\u{1f6a8} Container failure on ${ host }
${ name }: ${ previous_state } \u{2192} ${ current_state }
Status: ${ status }
{% if log_file %}\u{1f4c4} Logs saved to ${ log_file }{% else %}\u{26a0}\u{fe0f} Log capture unavailable: ${ capture_error }{% endif %}";

/// Values offered to the failure template, already escaped for the
/// transport's markup.
#[derive(Debug, Serialize)]
struct FailureContext {
    host: String,
    name: String,
    previous_state: String,
    current_state: String,
    status: String,
    log_file: Option<String>,
    capture_error: Option<String>,
}

impl FailureContext {
    fn new(
        host: &str,
        event: &FailureEvent,
        capture: Result<&LogReference, &CaptureUnavailable>,
        markup: Option<&str>,
    ) -> Self {
        let escape = |text: &str| escape_markup(markup, text);
        Self {
            host: escape(host),
            name: escape(&event.name),
            previous_state: escape(event.previous_state.as_ref()),
            current_state: escape(event.current_state.as_ref()),
            status: escape(&event.status),
            log_file: capture.ok().map(|r| escape(&r.path.display().to_string())),
            capture_error: capture.err().map(|e| escape(&e.to_string())),
        }
    }

    fn plain(&self) -> String {
        let last_line = match (&self.log_file, &self.capture_error) {
            (Some(file), _) => format!("\u{1f4c4} Logs saved to {file}"),
            (None, Some(e)) => format!("\u{26a0}\u{fe0f} Log capture unavailable: {e}"),
            (None, None) => "\u{26a0}\u{fe0f} Log capture unavailable".to_string(),
        };
        format!(
            "\u{1f6a8} Container failure on {}\n{}: {} \u{2192} {}\nStatus: {}\n{last_line}",
            self.host, self.name, self.previous_state, self.current_state, self.status
        )
    }
}

#[derive(Debug, Clone)]
pub struct AlertFormatter {
    template: String,
    host: String,
    markup: Option<String>,
}

impl AlertFormatter {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            template: DEFAULT_FAILURE_TEMPLATE.to_string(),
            host: host.into(),
            markup: None,
        }
    }

    /// Escapes every template value for `markup` (a Telegram `parse_mode`).
    /// Markup written in the template itself is kept as is.
    pub fn with_markup(mut self, markup: Option<&str>) -> Self {
        self.markup = markup.map(str::to_string);
        self
    }

    /// Uses a custom template. It is rendered once against a sample failure so
    /// broken templates are caught at startup.
    pub fn with_template(mut self, template: impl Into<String>) -> Result<Self, minijinja::Error> {
        let template = template.into();
        let sample = FailureEvent {
            name: "sample".to_string(),
            previous_state: crate::runtime::ContainerState::Running,
            current_state: crate::runtime::ContainerState::Exited,
            status: "Exited (1)".to_string(),
        };
        let missing = CaptureUnavailable::Timeout(std::time::Duration::from_secs(30));
        render_template(
            &template,
            FailureContext::new(&self.host, &sample, Err(&missing), self.markup.as_deref()),
        )?;

        self.template = template;
        Ok(self)
    }

    pub fn failure(
        &self,
        event: &FailureEvent,
        capture: Result<&LogReference, &CaptureUnavailable>,
    ) -> String {
        let ctx = FailureContext::new(&self.host, event, capture, self.markup.as_deref());
        match render_template(&self.template, &ctx) {
            Ok(message) => message,
            Err(e) => {
                log::error!("Unable to render failure template, using the built-in text: {e}");
                ctx.plain()
            }
        }
    }
}
