use std::collections::HashMap;

/// Lifecycle state of a container as far as the monitor cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerState {
    Running,
    Exited,
    Dead,
    Stopped,
    Paused,
    // Anything the runtime reports that we don't recognise
    Unknown,
}

impl ContainerState {
    /// Maps a runtime state string into a `ContainerState`.
    ///
    /// This never fails: values outside the known set (including docker's
    /// `created`, `restarting` and `removing`) become `Unknown`.
    pub fn from_runtime(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            "stopped" => Self::Stopped,
            "paused" => Self::Paused,
            _ => Self::Unknown,
        }
    }

    /// States that count as "down" when a container was running before.
    pub fn is_down(self) -> bool {
        matches!(
            self,
            Self::Exited | Self::Dead | Self::Stopped | Self::Paused
        )
    }
}

impl AsRef<str> for ContainerState {
    fn as_ref(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Stopped => "stopped",
            Self::Paused => "paused",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub name: String,
    pub state: ContainerState,
    /// Human readable status such as "Up 3 hours" or "Exited (1) 2 minutes ago"
    pub status: String,
}

impl ContainerRecord {
    #[cfg(test)]
    pub fn new(name: impl Into<String>, state: ContainerState, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state,
            status: status.into(),
        }
    }
}

/// Point-in-time view of every container the runtime knows about, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSnapshot {
    inner: HashMap<String, ContainerRecord>,
}

impl ContainerSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: ContainerRecord) {
        self.inner.insert(record.name.clone(), record);
    }

    pub fn get(&self, name: &str) -> Option<&ContainerRecord> {
        self.inner.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ContainerRecord> {
        self.inner.values()
    }

    pub fn running_count(&self) -> usize {
        self.records()
            .filter(|r| r.state == ContainerState::Running)
            .count()
    }

    /// Records sorted by name, for stable presentation.
    pub fn sorted(&self) -> Vec<&ContainerRecord> {
        let mut records: Vec<_> = self.inner.values().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }
}

impl FromIterator<ContainerRecord> for ContainerSnapshot {
    fn from_iter<T: IntoIterator<Item = ContainerRecord>>(iter: T) -> Self {
        let mut snapshot = Self::new();
        for record in iter {
            snapshot.insert(record);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_parsing_is_lenient() {
        assert_eq!(ContainerState::from_runtime("running"), ContainerState::Running);
        assert_eq!(ContainerState::from_runtime(" Exited\n"), ContainerState::Exited);
        assert_eq!(ContainerState::from_runtime("DEAD"), ContainerState::Dead);
        assert_eq!(ContainerState::from_runtime("paused"), ContainerState::Paused);
        assert_eq!(ContainerState::from_runtime("stopped"), ContainerState::Stopped);
        assert_eq!(ContainerState::from_runtime("restarting"), ContainerState::Unknown);
        assert_eq!(ContainerState::from_runtime(""), ContainerState::Unknown);
        assert_eq!(ContainerState::from_runtime("???"), ContainerState::Unknown);
    }

    #[test]
    fn test_down_states() {
        assert!(!ContainerState::Running.is_down());
        assert!(!ContainerState::Unknown.is_down());
        assert!(ContainerState::Exited.is_down());
        assert!(ContainerState::Dead.is_down());
        assert!(ContainerState::Stopped.is_down());
        assert!(ContainerState::Paused.is_down());
    }

    #[test]
    fn test_snapshot_keeps_last_record_per_name() {
        let snapshot: ContainerSnapshot = [
            ContainerRecord::new("web", ContainerState::Running, "Up 1 hour"),
            ContainerRecord::new("db", ContainerState::Exited, "Exited (0)"),
            ContainerRecord::new("web", ContainerState::Dead, "Dead"),
        ]
        .into_iter()
        .collect();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("web").map(|r| r.state), Some(ContainerState::Dead));
        assert_eq!(snapshot.running_count(), 0);
        let names: Vec<_> = snapshot.sorted().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["db", "web"]);
    }
}
