//! The shared monitor record and its two synchronisation domains.
//!
//! [`MonitorState`] is constructed once at load time and shared by
//! reference (`Arc`) with every component. Its fields are split into two
//! lock domains with disjoint ownership:
//!
//! - [`SampleState`] behind a [`spin::Mutex`] -- the non-blocking section.
//!   It busy-waits instead of parking, is the only lock the periodic sampler
//!   may take, and is only held for plain field updates.
//! - [`ControlState`] behind a [`parking_lot::Mutex`] -- the blocking
//!   section, taken by the controller and by interface readers.
//!
//! The two monotonic counters live outside both locks as atomics.
//!
//! # Lock order
//!
//! Code that needs both domains at once takes the blocking section first
//! and the spin lock second, and releases the spin lock before the blocking
//! section. Nothing may wait on the blocking section while holding the spin
//! lock. [`RestrictedView`] enforces the sampler side of this: it carries no
//! path to the blocking section at all.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::{Mutex, MutexGuard};

use crate::limits::{
    INITIAL_RESOURCE_FACTOR, MAX_RESOURCE_FACTOR, MAX_WORKLOAD_LEVEL, MIN_RESOURCE_FACTOR,
};
use crate::snapshot::Snapshot;

/// Simulated GPU temperature for a workload level.
pub fn gpu_temp_for(level: u64) -> u64 {
    50 + level / 2
}

/// Simulated memory pressure for a workload level.
pub fn memory_pressure_for(level: u64) -> u64 {
    level * 2 / 3
}

/// Fields owned by the non-blocking section.
#[derive(Debug, Clone, Copy)]
pub struct SampleState {
    workload_level: u64,
    gpu_temp_celsius: u64,
    memory_pressure_percent: u64,
    last_check: Option<Instant>,
}

impl Default for SampleState {
    fn default() -> Self {
        Self {
            workload_level: 0,
            gpu_temp_celsius: gpu_temp_for(0),
            memory_pressure_percent: memory_pressure_for(0),
            last_check: None,
        }
    }
}

impl SampleState {
    pub fn workload_level(&self) -> u64 {
        self.workload_level
    }

    pub fn gpu_temp_celsius(&self) -> u64 {
        self.gpu_temp_celsius
    }

    pub fn memory_pressure_percent(&self) -> u64 {
        self.memory_pressure_percent
    }

    /// When the sampler last fired, if it has fired at all.
    pub fn last_check(&self) -> Option<Instant> {
        self.last_check
    }

    /// Set the workload (clamped to [`MAX_WORKLOAD_LEVEL`]) and recompute
    /// both derived metrics from it.
    pub(crate) fn set_workload_level(&mut self, level: u64) -> u64 {
        let level = level.min(MAX_WORKLOAD_LEVEL);
        self.workload_level = level;
        self.gpu_temp_celsius = gpu_temp_for(level);
        self.memory_pressure_percent = memory_pressure_for(level);
        level
    }

    pub(crate) fn mark_checked(&mut self, now: Instant) {
        self.last_check = Some(now);
    }
}

/// Fields owned by the blocking section.
#[derive(Debug, Clone, Copy)]
pub struct ControlState {
    resource_factor: u64,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            resource_factor: INITIAL_RESOURCE_FACTOR,
        }
    }
}

/// The process-wide monitor record.
#[derive(Debug, Default)]
pub struct MonitorState {
    sample: spin::Mutex<SampleState>,
    control: Mutex<ControlState>,
    critical_alerts: AtomicU64,
    timer_ticks: AtomicU64,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slice of the state that is legal to touch from the sampler's
    /// restricted context.
    pub fn restricted(&self) -> RestrictedView<'_> {
        RestrictedView {
            sample: &self.sample,
            timer_ticks: &self.timer_ticks,
        }
    }

    /// Enter the blocking section. May sleep while another holder is active.
    pub fn lock_control(&self) -> ControlGuard<'_> {
        ControlGuard {
            guard: self.control.lock(),
            state: self,
        }
    }

    /// Replace the workload with an injected value and recompute the
    /// derived metrics in the same critical section. Returns the stored
    /// (clamped) level.
    pub fn inject_workload(&self, level: u64) -> u64 {
        self.sample.lock().set_workload_level(level)
    }

    /// Copy of the sample fields, read under the spin lock.
    pub fn sample(&self) -> SampleState {
        *self.sample.lock()
    }

    pub fn workload_level(&self) -> u64 {
        self.sample.lock().workload_level
    }

    pub fn resource_factor(&self) -> u64 {
        self.control.lock().resource_factor
    }

    pub fn critical_alerts(&self) -> u64 {
        self.critical_alerts.load(Ordering::Relaxed)
    }

    pub fn timer_ticks(&self) -> u64 {
        self.timer_ticks.load(Ordering::Relaxed)
    }

    /// Capture every field consistently: blocking section first, spin lock
    /// nested inside, both released before the caller formats anything.
    pub fn snapshot(&self) -> Snapshot {
        let control = self.lock_control();
        let sample = control.sample();
        let resource_factor = control.resource_factor();
        let critical_alerts = self.critical_alerts();
        let timer_ticks = self.timer_ticks();
        drop(control);

        Snapshot {
            workload_level: sample.workload_level,
            resource_factor,
            critical_alerts,
            gpu_temp_celsius: sample.gpu_temp_celsius,
            memory_pressure_percent: sample.memory_pressure_percent,
            timer_ticks,
            since_last_sample_ms: sample
                .last_check
                .map(|t| t.elapsed().as_millis() as u64),
        }
    }
}

/// Non-blocking access for the periodic sampler.
///
/// Exposes the spin-locked sample fields and the tick counter only; the
/// blocking section is unreachable through this type.
#[derive(Clone, Copy)]
pub struct RestrictedView<'a> {
    sample: &'a spin::Mutex<SampleState>,
    timer_ticks: &'a AtomicU64,
}

impl RestrictedView<'_> {
    /// Run `f` inside the non-blocking section.
    pub(crate) fn with_sample<R>(&self, f: impl FnOnce(&mut SampleState) -> R) -> R {
        let mut guard = self.sample.lock();
        f(&mut guard)
    }

    /// Increment the tick counter, returning the new count.
    pub(crate) fn bump_ticks(&self) -> u64 {
        self.timer_ticks.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Held blocking section over [`ControlState`].
pub struct ControlGuard<'a> {
    guard: MutexGuard<'a, ControlState>,
    state: &'a MonitorState,
}

impl ControlGuard<'_> {
    pub fn resource_factor(&self) -> u64 {
        self.guard.resource_factor
    }

    /// Brief nested read of the sample fields; the spin lock is released
    /// before this returns.
    pub fn sample(&self) -> SampleState {
        *self.state.sample.lock()
    }

    /// Step the factor up by one. Returns `true` when this step reached
    /// [`MAX_RESOURCE_FACTOR`], in which case the alert counter was bumped.
    pub(crate) fn step_up(&mut self) -> bool {
        debug_assert!(self.guard.resource_factor < MAX_RESOURCE_FACTOR);
        self.guard.resource_factor += 1;
        let saturated = self.guard.resource_factor == MAX_RESOURCE_FACTOR;
        if saturated {
            self.state.critical_alerts.fetch_add(1, Ordering::Relaxed);
        }
        saturated
    }

    pub(crate) fn step_down(&mut self) {
        debug_assert!(self.guard.resource_factor > MIN_RESOURCE_FACTOR);
        self.guard.resource_factor -= 1;
    }
}
