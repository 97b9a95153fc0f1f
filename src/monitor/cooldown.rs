use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::runtime::{ContainerSnapshot, ContainerState};

/// Remembers when each container was last alerted about so that a flapping
/// container does not page the operator every tick.
///
/// Times are monotonic [`Instant`]s; wall clock adjustments never shorten or
/// extend a cooldown.
#[derive(Debug)]
pub struct CooldownLedger {
    cooldown: Duration,
    last_notified: HashMap<String, Instant>,
}

impl CooldownLedger {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_notified: HashMap::new(),
        }
    }

    /// `false` while `name` is still inside its cooldown window.
    pub fn should_notify(&self, name: &str, now: Instant) -> bool {
        match self.last_notified.get(name) {
            Some(last) => now.saturating_duration_since(*last) >= self.cooldown,
            None => true,
        }
    }

    pub fn record_notified(&mut self, name: &str, now: Instant) {
        self.last_notified.insert(name.to_string(), now);
    }

    /// Drops the entry for `name` once it is running again. Returns whether an
    /// entry was removed.
    pub fn clear_if_recovered(&mut self, name: &str, state: ContainerState) -> bool {
        if state != ContainerState::Running {
            return false;
        }
        self.last_notified.remove(name).is_some()
    }

    /// Forgets containers that are gone from the runtime and whose cooldown has
    /// run out. Those entries can no longer suppress anything.
    pub fn evict_vanished(&mut self, current: &ContainerSnapshot, now: Instant) -> usize {
        if current.is_empty() {
            return 0;
        }
        let cooldown = self.cooldown;
        let before = self.last_notified.len();
        self.last_notified.retain(|name, last| {
            current.contains(name) || now.saturating_duration_since(*last) < cooldown
        });
        before - self.last_notified.len()
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.last_notified.contains_key(name)
    }

    #[cfg(test)]
    pub fn last_notified(&self, name: &str) -> Option<Instant> {
        self.last_notified.get(name).copied()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.last_notified.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.last_notified.is_empty()
    }
}
