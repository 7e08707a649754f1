//! Periodic firing of the sampler.
//!
//! [`PeriodicTimer`] drives a callback on a fixed period from a dedicated
//! task. The callback is handed a [`RestrictedView`] of the monitor state
//! and nothing else, so it can only reach the non-blocking section. Late
//! ticks are skipped rather than bunched up.

use std::sync::Arc;
use std::time::Duration;

use automon_core::state::{MonitorState, RestrictedView};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct PeriodicTimer {
    period: Duration,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicTimer {
    /// Start firing `on_fire` every `period`, first one `period` from now.
    pub fn start<F>(period: Duration, state: Arc<MonitorState>, mut on_fire: F) -> Self
    where
        F: FnMut(RestrictedView<'_>, std::time::Instant) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    fired_at = interval.tick() => {
                        on_fire(state.restricted(), fired_at.into_std());
                    }
                }
            }
        });

        tracing::info!(interval_ms = period.as_millis() as u64, "Periodic timer started");

        Self {
            period,
            cancel,
            handle,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stop the schedule and wait until no firing is in flight.
    pub async fn cancel(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Periodic timer task terminated abnormally");
        }
        tracing::info!("Periodic timer stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[tokio::test]
    async fn fires_repeatedly_until_cancelled() {
        let state = Arc::new(MonitorState::new());
        let fired = Arc::new(AtomicU64::new(0));

        let timer = PeriodicTimer::start(Duration::from_millis(5), Arc::clone(&state), {
            let fired = Arc::clone(&fired);
            move |_view: RestrictedView<'_>, _at: std::time::Instant| {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(80)).await;
        timer.cancel().await;

        let after_cancel = fired.load(Ordering::SeqCst);
        assert!(after_cancel >= 2, "expected several firings, got {after_cancel}");

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(fired.load(Ordering::SeqCst), after_cancel);
    }
}
