//! Hysteresis control of the resource factor.
//!
//! The factor moves by at most one unit per invocation: up while the
//! workload is above [`HIGH_WORKLOAD_THRESHOLD`], down while it is below
//! [`LOW_WORKLOAD_THRESHOLD`], and not at all inside the band. Reaching
//! [`MAX_RESOURCE_FACTOR`] from below counts as one critical alert.

use serde::Serialize;

use crate::limits::{
    HIGH_WORKLOAD_THRESHOLD, LOW_WORKLOAD_THRESHOLD, MAX_RESOURCE_FACTOR, MIN_RESOURCE_FACTOR,
};
use crate::state::MonitorState;

/// Which way the policy moves the factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Up,
    Down,
    Hold,
}

/// Pure policy: the step for a workload level and current factor.
pub fn decide(workload: u64, factor: u64) -> Step {
    if workload > HIGH_WORKLOAD_THRESHOLD && factor < MAX_RESOURCE_FACTOR {
        Step::Up
    } else if workload < LOW_WORKLOAD_THRESHOLD && factor > MIN_RESOURCE_FACTOR {
        Step::Down
    } else {
        Step::Hold
    }
}

/// Result of one controller run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub workload: u64,
    pub step: Step,
    /// Factor the run started from.
    pub previous_factor: u64,
    /// Factor after the step.
    pub resource_factor: u64,
    /// This run pushed the factor to its maximum.
    pub saturated: bool,
}

/// Run the policy once against the shared state.
///
/// Takes the blocking section for the whole run and reads the workload
/// through a brief nested spin-lock acquisition. Must be called from a
/// context that is allowed to sleep.
pub fn adjust(state: &MonitorState) -> Decision {
    let mut control = state.lock_control();
    let workload = control.sample().workload_level();
    let previous_factor = control.resource_factor();
    let step = decide(workload, previous_factor);

    let saturated = match step {
        Step::Up => control.step_up(),
        Step::Down => {
            control.step_down();
            false
        }
        Step::Hold => false,
    };
    let resource_factor = control.resource_factor();
    drop(control);

    match step {
        Step::Up => tracing::info!(
            workload,
            resource_factor,
            "Workload high, increasing resource factor"
        ),
        Step::Down => tracing::info!(
            workload,
            resource_factor,
            "Workload low, decreasing resource factor"
        ),
        Step::Hold => tracing::info!(workload, resource_factor, "Workload stable"),
    }
    if saturated {
        tracing::warn!(
            critical_alerts = state.critical_alerts(),
            "Critical alert: maximum resources reached"
        );
    }

    Decision {
        workload,
        step,
        previous_factor,
        resource_factor,
        saturated,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::limits::INITIAL_RESOURCE_FACTOR;

    #[test]
    fn band_edges_hold() {
        assert_eq!(decide(80, 5), Step::Hold);
        assert_eq!(decide(20, 5), Step::Hold);
        assert_eq!(decide(50, 5), Step::Hold);
        assert_eq!(decide(81, 5), Step::Up);
        assert_eq!(decide(19, 5), Step::Down);
    }

    #[test]
    fn bounds_hold() {
        assert_eq!(decide(100, MAX_RESOURCE_FACTOR), Step::Hold);
        assert_eq!(decide(0, MIN_RESOURCE_FACTOR), Step::Hold);
    }

    #[test]
    fn high_workload_saturates_and_alerts_once() {
        let state = MonitorState::new();
        state.inject_workload(85);

        let mut saturations = 0;
        for _ in 0..12 {
            let before = state.resource_factor();
            let d = adjust(&state);
            assert!(d.resource_factor.abs_diff(before) <= 1);
            assert!((MIN_RESOURCE_FACTOR..=MAX_RESOURCE_FACTOR).contains(&d.resource_factor));
            if d.saturated {
                saturations += 1;
            }
        }

        assert_eq!(state.resource_factor(), MAX_RESOURCE_FACTOR);
        assert_eq!(saturations, 1);
        assert_eq!(state.critical_alerts(), 1);
    }

    #[test]
    fn five_runs_from_initial_reach_max() {
        let state = MonitorState::new();
        assert_eq!(state.resource_factor(), INITIAL_RESOURCE_FACTOR);
        state.inject_workload(85);
        for _ in 0..5 {
            adjust(&state);
        }
        assert_eq!(state.resource_factor(), MAX_RESOURCE_FACTOR);
        assert!(state.critical_alerts() >= 1);
    }

    #[test]
    fn low_workload_floors_at_min() {
        let state = MonitorState::new();
        state.inject_workload(10);
        for _ in 0..4 {
            assert_matches!(adjust(&state).step, Step::Down);
        }
        assert_eq!(state.resource_factor(), MIN_RESOURCE_FACTOR);

        let d = adjust(&state);
        assert_eq!(d.step, Step::Hold);
        assert_eq!(state.resource_factor(), MIN_RESOURCE_FACTOR);
    }

    #[test]
    fn re_saturation_counts_again() {
        let state = MonitorState::new();
        state.inject_workload(90);
        for _ in 0..5 {
            adjust(&state);
        }
        assert_eq!(state.critical_alerts(), 1);

        state.inject_workload(5);
        adjust(&state);
        assert_eq!(state.resource_factor(), MAX_RESOURCE_FACTOR - 1);

        state.inject_workload(90);
        let d = adjust(&state);
        assert!(d.saturated);
        assert_eq!(state.critical_alerts(), 2);
    }

    #[test]
    fn stable_band_leaves_factor_alone() {
        let state = MonitorState::new();
        state.inject_workload(50);
        for _ in 0..10 {
            assert_eq!(adjust(&state).step, Step::Hold);
        }
        assert_eq!(state.resource_factor(), INITIAL_RESOURCE_FACTOR);
        assert_eq!(state.critical_alerts(), 0);
    }

    #[test]
    fn concurrent_runs_step_by_one_unit() {
        let state = MonitorState::new();
        let saturations = std::sync::atomic::AtomicU64::new(0);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..2_000u64 {
                    state.inject_workload(if i % 3 == 0 { 5 } else { 95 });
                }
            });
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        let d = adjust(&state);
                        let expected = match d.step {
                            Step::Up => d.previous_factor + 1,
                            Step::Down => d.previous_factor - 1,
                            Step::Hold => d.previous_factor,
                        };
                        assert_eq!(d.resource_factor, expected);
                        assert!(
                            (MIN_RESOURCE_FACTOR..=MAX_RESOURCE_FACTOR)
                                .contains(&d.resource_factor)
                        );
                        if d.saturated {
                            saturations.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        assert_eq!(
            state.critical_alerts(),
            saturations.load(std::sync::atomic::Ordering::Relaxed)
        );
    }
}
