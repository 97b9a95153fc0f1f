//! Fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::notify::{DeliveryFailed, Notification, Notifier};
use crate::runtime::{
    ContainerRecord, ContainerRuntime, ContainerSnapshot, ContainerState, RuntimeUnavailable,
};

pub fn record(name: &str, state: ContainerState) -> ContainerRecord {
    ContainerRecord::new(name, state, format!("{state} for a while"))
}

pub fn snapshot(entries: &[(&str, ContainerState)]) -> ContainerSnapshot {
    entries
        .iter()
        .map(|(name, state)| record(name, *state))
        .collect()
}

/// Scripted container runtime.
///
/// Every `list_all` call pops the next scripted listing; once the script is
/// exhausted the last listing is repeated.
#[derive(Default)]
pub struct FakeRuntime {
    listings: Mutex<VecDeque<Option<Vec<ContainerRecord>>>>,
    last: Mutex<Option<Vec<ContainerRecord>>>,
    logs: Mutex<Option<String>>,
    list_delay: Option<Duration>,
    log_delay: Option<Duration>,
    pub log_requests: Mutex<Vec<(String, usize)>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful listing.
    pub fn push_listing(&self, records: &[(&str, ContainerState)]) -> &Self {
        let records = records.iter().map(|(n, s)| record(n, *s)).collect();
        self.listings.lock().unwrap().push_back(Some(records));
        self
    }

    /// Queue a failed listing.
    pub fn push_outage(&self) -> &Self {
        self.listings.lock().unwrap().push_back(None);
        self
    }

    pub fn with_logs(self, logs: &str) -> Self {
        *self.logs.lock().unwrap() = Some(logs.to_string());
        self
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn with_log_delay(mut self, delay: Duration) -> Self {
        self.log_delay = Some(delay);
        self
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_all(
        &self,
        _include_stopped: bool,
    ) -> Result<Vec<ContainerRecord>, RuntimeUnavailable> {
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.listings.lock().unwrap().pop_front();
        let listing = match next {
            Some(listing) => {
                *self.last.lock().unwrap() = listing.clone();
                listing
            }
            None => self.last.lock().unwrap().clone(),
        };
        listing.ok_or(RuntimeUnavailable::Timeout(Duration::from_secs(10)))
    }

    async fn tail_logs(&self, name: &str, max_lines: usize) -> Result<String, RuntimeUnavailable> {
        self.log_requests
            .lock()
            .unwrap()
            .push((name.to_string(), max_lines));
        if let Some(delay) = self.log_delay {
            tokio::time::sleep(delay).await;
        }
        self.logs
            .lock()
            .unwrap()
            .clone()
            .ok_or(RuntimeUnavailable::Timeout(Duration::from_secs(30)))
    }
}

/// Notifier that remembers everything it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    fail: bool,
    delay: Option<Duration>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, notification: &Notification) -> Result<(), DeliveryFailed> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err(DeliveryFailed::Rejected {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(())
    }
}

/// Unique scratch directory under the system temp dir.
pub fn scratch_dir(prefix: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("dockwatch-{prefix}-{}", uuid::Uuid::now_v7()))
}
