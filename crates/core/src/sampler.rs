//! One firing of the periodic sampler.
//!
//! [`Sampler::fire`] is the body of the timer callback. It only receives a
//! [`RestrictedView`], so it can reach the spin-locked sample fields and
//! the tick counter but never the blocking section. It does not allocate.
//! Handing the controller off to the deferred worker is the caller's job,
//! after `fire` returns and the spin lock is released.

use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::limits::{
    MAX_WORKLOAD_LEVEL, PERTURB_DELTA_MAX, PERTURB_DELTA_MIN, PERTURB_EVERY_TICKS,
};
use crate::state::RestrictedView;

/// Outcome of a single firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Tick count after this firing.
    pub count: u64,
    /// Set on firings that perturbed the workload.
    pub perturbed: Option<Perturbation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Perturbation {
    pub delta: i64,
    pub level: u64,
}

/// Simulated metrics source. Owns its pseudo-random generator, so the
/// sequence of workload deltas is fully determined by the seed.
pub struct Sampler {
    rng: SmallRng,
}

impl Sampler {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Record the firing time, bump the tick counter and, once every
    /// [`PERTURB_EVERY_TICKS`] firings, nudge the workload by a bounded
    /// random delta, recomputing the derived metrics with it.
    pub fn fire(&mut self, view: RestrictedView<'_>, now: Instant) -> Tick {
        let rng = &mut self.rng;

        let tick = view.with_sample(|sample| {
            sample.mark_checked(now);
            let count = view.bump_ticks();

            let perturbed = (count % PERTURB_EVERY_TICKS == 0).then(|| {
                let delta = rng.random_range(PERTURB_DELTA_MIN..=PERTURB_DELTA_MAX);
                let target = apply_delta(sample.workload_level(), delta);
                let level = sample.set_workload_level(target);
                Perturbation { delta, level }
            });

            Tick { count, perturbed }
        });

        match tick.perturbed {
            Some(p) => tracing::debug!(
                ticks = tick.count,
                delta = p.delta,
                workload = p.level,
                "Sampler perturbed workload"
            ),
            None => tracing::trace!(ticks = tick.count, "Sampler tick"),
        }

        tick
    }
}

/// Apply a signed delta to a level, clamped to `[0, MAX_WORKLOAD_LEVEL]`.
pub fn apply_delta(level: u64, delta: i64) -> u64 {
    let moved = level as i64 + delta;
    moved.clamp(0, MAX_WORKLOAD_LEVEL as i64) as u64
}
