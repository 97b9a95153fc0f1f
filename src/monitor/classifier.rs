use crate::runtime::{ContainerSnapshot, ContainerState};

/// A container that went from running to down between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEvent {
    pub name: String,
    pub previous_state: ContainerState,
    pub current_state: ContainerState,
    pub status: String,
}

/// Diffs two snapshots and returns the failures, sorted by container name.
///
/// Only containers present in `current` are considered. A container that
/// vanished from the listing is untracked from then on, not failed: the
/// runtime's listing is authoritative. Containers seen for the first time, or
/// that were already down, never produce an event.
pub fn classify(previous: &ContainerSnapshot, current: &ContainerSnapshot) -> Vec<FailureEvent> {
    let mut events: Vec<FailureEvent> = current
        .records()
        .filter_map(|now| {
            let before = previous.get(&now.name)?;
            (before.state == ContainerState::Running && now.state.is_down()).then(|| {
                FailureEvent {
                    name: now.name.clone(),
                    previous_state: before.state,
                    current_state: now.state,
                    status: now.status.clone(),
                }
            })
        })
        .collect();

    events.sort_by(|a, b| a.name.cmp(&b.name));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ContainerState::*;
    use crate::testing::snapshot;

    const ALL: [ContainerState; 6] = [Running, Exited, Dead, Stopped, Paused, Unknown];

    #[test]
    fn test_running_to_exited_is_a_failure() {
        let previous = snapshot(&[("a", Running)]);
        let current = snapshot(&[("a", Exited)]);

        let events = classify(&previous, &current);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "a");
        assert_eq!(events[0].previous_state, Running);
        assert_eq!(events[0].current_state, Exited);
        assert_eq!(events[0].status, "exited for a while");
    }

    #[test]
    fn test_every_transition_pair() {
        for before in ALL {
            for after in ALL {
                let events = classify(&snapshot(&[("a", before)]), &snapshot(&[("a", after)]));
                let expected = before == Running && matches!(after, Exited | Dead | Stopped | Paused);
                assert_eq!(
                    !events.is_empty(),
                    expected,
                    "transition {before} -> {after}"
                );
            }
        }
    }

    #[test]
    fn test_new_container_is_not_a_failure() {
        let events = classify(&snapshot(&[]), &snapshot(&[("a", Exited)]));
        assert!(events.is_empty());
    }

    #[test]
    fn test_vanished_container_is_not_a_failure() {
        let events = classify(&snapshot(&[("a", Running)]), &snapshot(&[("b", Running)]));
        assert!(events.is_empty());
    }

    #[test]
    fn test_result_is_sorted_and_independent_of_insertion_order() {
        let previous = snapshot(&[("c", Running), ("a", Running), ("b", Running), ("d", Exited)]);
        let current = snapshot(&[("b", Dead), ("d", Exited), ("a", Paused), ("c", Running)]);
        let shuffled_previous = snapshot(&[("d", Exited), ("b", Running), ("c", Running), ("a", Running)]);
        let shuffled_current = snapshot(&[("c", Running), ("a", Paused), ("d", Exited), ("b", Dead)]);

        let events = classify(&previous, &current);
        let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(events, classify(&shuffled_previous, &shuffled_current));
    }

    #[test]
    fn test_inputs_are_untouched() {
        let previous = snapshot(&[("a", Running)]);
        let current = snapshot(&[("a", Exited)]);
        let (before_prev, before_cur) = (previous.clone(), current.clone());

        let _ = classify(&previous, &current);
        assert_eq!(previous, before_prev);
        assert_eq!(current, before_cur);
    }
}
