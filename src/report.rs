//! One-shot readers of container state: the `status` report and the startup
//! announcement. Neither touches the monitor's state.

use crate::monitor::ContainerInspector;
use crate::notify::NotifierClient;
use crate::notify::telegram::escape_markup;
use crate::runtime::{ContainerSnapshot, ContainerState};

pub fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Human readable health report, one entry per container.
pub fn health_report(snapshot: &ContainerSnapshot) -> String {
    if snapshot.is_empty() {
        return "\u{274c} No containers found or error getting container list".to_string();
    }

    let mut report = String::from("\u{1f3e5} Container Health Report\n\n");
    for record in snapshot.sorted() {
        let emoji = if record.state == ContainerState::Running {
            "\u{2705}"
        } else {
            "\u{274c}"
        };
        report.push_str(&format!("{emoji} {}\n   {}\n\n", record.name, record.status));
    }
    report.trim_end().to_string()
}

pub fn startup_message(host: &str, snapshot: &ContainerSnapshot) -> String {
    if snapshot.is_empty() {
        return format!(
            "\u{1f916} dockwatch started on {host}, but no containers could be listed yet"
        );
    }
    format!(
        "\u{1f916} dockwatch started on {host}: watching {} containers ({} running)",
        snapshot.len(),
        snapshot.running_count()
    )
}

/// Sends the startup announcement, escaped for the transport's `markup`.
/// Runs once, beside the monitor loop.
pub async fn announce_startup(
    inspector: ContainerInspector,
    notifier: NotifierClient,
    markup: Option<String>,
) {
    let snapshot = inspector.list_all().await;
    let message = startup_message(&hostname(), &snapshot);
    log::info!("{message}");
    notifier.notify(escape_markup(markup.as_deref(), &message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRuntime, snapshot};
    use std::sync::Arc;
    use std::time::Duration;
    use crate::runtime::ContainerState::*;

    #[test]
    fn test_health_report_lists_every_container() {
        let report = health_report(&snapshot(&[("web", Running), ("db", Exited)]));
        assert_eq!(
            report,
            "\u{1f3e5} Container Health Report\n\n\
             \u{274c} db\n   exited for a while\n\n\
             \u{2705} web\n   running for a while"
        );
    }

    #[test]
    fn test_health_report_without_containers() {
        assert!(health_report(&ContainerSnapshot::new()).contains("No containers found"));
    }

    #[test]
    fn test_startup_message() {
        let message = startup_message("nas", &snapshot(&[("web", Running), ("db", Exited)]));
        assert_eq!(
            message,
            "\u{1f916} dockwatch started on nas: watching 2 containers (1 running)"
        );
        assert!(startup_message("nas", &ContainerSnapshot::new()).contains("no containers"));
    }

    #[tokio::test]
    async fn test_announcement_is_queued() {
        let runtime = FakeRuntime::new();
        runtime.push_listing(&[("web", Running)]);
        let inspector = ContainerInspector::new(Arc::new(runtime), Duration::from_secs(10));
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);

        announce_startup(inspector, NotifierClient::new(tx, "42"), None).await;

        let sent = rx.recv().await.expect("announcement");
        assert_eq!(sent.recipient, "42");
        assert!(sent.message.contains("watching 1 containers (1 running)"));
    }

    #[tokio::test]
    async fn test_announcement_is_escaped_for_markup() {
        let runtime = FakeRuntime::new();
        runtime.push_listing(&[("web", Running)]);
        let inspector = ContainerInspector::new(Arc::new(runtime), Duration::from_secs(10));
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);

        announce_startup(
            inspector,
            NotifierClient::new(tx, "42"),
            Some("MarkdownV2".to_string()),
        )
        .await;

        let sent = rx.recv().await.expect("announcement");
        assert!(sent.message.ends_with(r"\(1 running\)"), "{}", sent.message);
    }

    #[test]
    fn test_hostname_is_never_empty() {
        assert!(!hostname().is_empty());
    }
}
