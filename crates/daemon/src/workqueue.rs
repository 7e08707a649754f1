//! Deferred execution with at-most-one pending job.
//!
//! [`WorkQueue`] owns a single worker task. Producers hold a cloneable
//! [`WorkTrigger`] whose [`schedule`](WorkTrigger::schedule) never blocks:
//! the hand-off is a `try_send` into a one-slot channel, so triggers that
//! arrive while a run is already pending collapse into that run. The slot
//! frees as soon as the worker picks the job up, so a trigger that lands
//! during a run queues exactly one follow-up.
//!
//! The job itself runs on the blocking thread pool and may sleep.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of a hand-off attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// A run is now pending.
    Queued,
    /// A run was already pending; this trigger was absorbed into it.
    Coalesced,
    /// The queue has shut down.
    Closed,
}

/// Producer side of a [`WorkQueue`].
#[derive(Clone)]
pub struct WorkTrigger {
    name: &'static str,
    tx: mpsc::Sender<()>,
}

impl WorkTrigger {
    /// Request a run of the job. Safe to call from the sampler's
    /// restricted context: never waits, never fails loudly.
    pub fn schedule(&self) -> Handoff {
        match self.tx.try_send(()) {
            Ok(()) => Handoff::Queued,
            Err(TrySendError::Full(())) => {
                tracing::trace!(queue = self.name, "Deferred job already pending");
                Handoff::Coalesced
            }
            Err(TrySendError::Closed(())) => {
                tracing::warn!(queue = self.name, "Deferred job hand-off failed: queue closed");
                Handoff::Closed
            }
        }
    }
}

/// A single-worker deferred job queue.
pub struct WorkQueue {
    trigger: WorkTrigger,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl WorkQueue {
    /// Spawn the worker. `job` runs on the blocking pool, one run at a time.
    pub fn start<F>(name: &'static str, job: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_worker(name, rx, Arc::new(job), cancel.clone()));

        tracing::info!(queue = name, "Work queue created");

        Self {
            trigger: WorkTrigger { name, tx },
            cancel,
            handle,
        }
    }

    pub fn trigger(&self) -> WorkTrigger {
        self.trigger.clone()
    }

    /// Stop the worker and wait for it. A run already in progress completes
    /// first; a pending run that has not started is discarded. Once this
    /// returns the job is not running and never will again.
    pub async fn shutdown(self) {
        let name = self.trigger.name;
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!(queue = name, error = %e, "Work queue worker terminated abnormally");
        }
        tracing::info!(queue = name, "Work queue destroyed");
    }
}

async fn run_worker<F>(
    name: &'static str,
    mut rx: mpsc::Receiver<()>,
    job: Arc<F>,
    cancel: CancellationToken,
) where
    F: Fn() + Send + Sync + 'static,
{
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            msg = rx.recv() => {
                if msg.is_none() {
                    break;
                }
                let job = Arc::clone(&job);
                if let Err(e) = tokio::task::spawn_blocking(move || (*job)()).await {
                    tracing::error!(queue = name, error = %e, "Deferred job panicked");
                }
            }
        }
    }
    rx.close();
}
