use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use log::{debug, error, info, warn};
use tokio::sync::watch;

use super::alert::AlertFormatter;
use super::capture::LogCapture;
use super::classifier::{FailureEvent, classify};
use super::cooldown::CooldownLedger;
use super::inspector::ContainerInspector;
use crate::notify::NotifierClient;
use crate::runtime::ContainerSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing observed yet. The next tick only records a baseline.
    WarmingUp,
    Running,
}

/// Everything the monitor remembers between two ticks. Only the monitor's own
/// tick writes to it.
#[derive(Debug)]
pub struct MonitorState {
    pub previous_snapshot: ContainerSnapshot,
    pub cooldown_ledger: CooldownLedger,
}

impl MonitorState {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            previous_snapshot: ContainerSnapshot::new(),
            cooldown_ledger: CooldownLedger::new(cooldown),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub interval: Duration,
    pub grace_period: Duration,
    pub cooldown: Duration,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub phase: Phase,
    pub containers: usize,
    pub failures: usize,
    pub notified: usize,
    pub suppressed: usize,
    pub recovered: usize,
    pub evicted: usize,
    /// No usable data from the runtime; state left untouched.
    pub skipped: bool,
}

impl TickReport {
    fn new(phase: Phase) -> Self {
        Self {
            phase,
            containers: 0,
            failures: 0,
            notified: 0,
            suppressed: 0,
            recovered: 0,
            evicted: 0,
            skipped: false,
        }
    }

    fn log(&self) {
        match self.phase {
            Phase::WarmingUp => info!("Baseline recorded: {} containers", self.containers),
            Phase::Running if self.skipped => warn!("Health check skipped, no data from runtime"),
            Phase::Running => info!(
                "Health check done: {} containers, {} failures ({} notified, {} suppressed), {} recovered",
                self.containers, self.failures, self.notified, self.suppressed, self.recovered
            ),
        }
    }
}

pub struct HealthMonitor {
    phase: Phase,
    state: MonitorState,
    settings: MonitorSettings,
    inspector: ContainerInspector,
    capture: LogCapture,
    formatter: AlertFormatter,
    notifier: NotifierClient,
}

impl HealthMonitor {
    pub fn new(
        settings: MonitorSettings,
        inspector: ContainerInspector,
        capture: LogCapture,
        formatter: AlertFormatter,
        notifier: NotifierClient,
    ) -> Self {
        Self {
            phase: Phase::WarmingUp,
            state: MonitorState::new(settings.cooldown),
            settings,
            inspector,
            capture,
            formatter,
            notifier,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Runs one tick. `now` is the monotonic time used for cooldowns.
    pub async fn tick(&mut self, now: Instant) -> TickReport {
        match self.phase {
            Phase::WarmingUp => self.record_baseline().await,
            Phase::Running => self.check(now).await,
        }
    }

    /// How long to sleep after a tick that ran in `phase`.
    fn delay_after(&self, phase: Phase) -> Duration {
        match phase {
            Phase::WarmingUp => self.settings.grace_period,
            Phase::Running => self.settings.interval,
        }
    }

    async fn record_baseline(&mut self) -> TickReport {
        let mut report = TickReport::new(Phase::WarmingUp);
        // Containers that are already down at startup are not reported.
        let snapshot = self.inspector.list_all().await;
        report.containers = snapshot.len();
        report.skipped = snapshot.is_empty();

        self.state.previous_snapshot = snapshot;
        self.phase = Phase::Running;
        report
    }

    async fn check(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::new(Phase::Running);

        let current = match self.inspector.try_list_all().await {
            Ok(snapshot) if snapshot.is_empty() => {
                warn!("Container runtime listed no containers, keeping previous state");
                report.skipped = true;
                return report;
            }
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Container runtime unavailable, keeping previous state: {e}");
                report.skipped = true;
                return report;
            }
        };
        report.containers = current.len();

        let events = classify(&self.state.previous_snapshot, &current);
        report.failures = events.len();

        for event in &events {
            if !self.state.cooldown_ledger.should_notify(&event.name, now) {
                debug!("Alert for {} suppressed, still cooling down", event.name);
                report.suppressed += 1;
                continue;
            }
            self.alert(event).await;
            // Recorded even if delivery later fails so the same failure is
            // not re-sent every tick.
            self.state.cooldown_ledger.record_notified(&event.name, now);
            report.notified += 1;
        }

        for record in current.records() {
            if self
                .state
                .cooldown_ledger
                .clear_if_recovered(&record.name, record.state)
            {
                info!("Container {} is running again", record.name);
                report.recovered += 1;
            }
        }

        report.evicted = self.state.cooldown_ledger.evict_vanished(&current, now);
        self.state.previous_snapshot = current;
        report
    }

    async fn alert(&self, event: &FailureEvent) {
        warn!(
            "Container {} went from {} to {} ({})",
            event.name, event.previous_state, event.current_state, event.status
        );

        let capture = self.capture.capture(&event.name).await;
        if let Err(e) = &capture {
            error!("Log capture for {} failed: {e}", event.name);
        }

        let message = self.formatter.failure(event, capture.as_ref());
        self.notifier
            .notify_with_attachment(message, capture.ok().map(|r| r.path));
    }

    /// Ticks forever until `shutdown` flips to `true`. A tick in progress is
    /// always allowed to finish.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Health monitor started (interval {:?}, grace period {:?}, cooldown {:?})",
            self.settings.interval, self.settings.grace_period, self.settings.cooldown
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let phase = self.phase;
            let now = tokio::time::Instant::now().into_std();
            match AssertUnwindSafe(self.tick(now)).catch_unwind().await {
                Ok(report) => report.log(),
                Err(_) => error!("Health check panicked, continuing with the next one"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.delay_after(phase)) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        warn!("Shutdown channel closed, stopping health monitor");
                        break;
                    }
                }
            }
        }

        info!("Health monitor stopped");
    }
}
