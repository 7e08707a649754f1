//! Load and unload of the monitor.
//!
//! [`Monitor::load`] builds the shared state, starts the controller's work
//! queue, plugs the status device and attribute group into the host, and
//! finally starts the sampler. If a registration step fails, everything
//! acquired before it is released in reverse order and the first error is
//! returned; no partially loaded monitor survives.
//!
//! [`Monitor::unload`] stops the sampler, then drains the work queue, and
//! only then removes the interfaces and drops the state.

use std::sync::Arc;
use std::time::Instant;

use automon_core::controller;
use automon_core::limits::{ATTR_DIR_NAME, DEVICE_NAME};
use automon_core::sampler::Sampler;
use automon_core::state::{MonitorState, RestrictedView};

use crate::attrs::attribute_group;
use crate::config::MonitorConfig;
use crate::device::StatusDevice;
use crate::host::{AttrDir, DeviceNode, HostError, InterfaceHost};
use crate::timer::PeriodicTimer;
use crate::workqueue::WorkQueue;

/// Name of the controller's work queue.
const WORK_QUEUE_NAME: &str = "auto_monitor";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to register status device: {0}")]
    Device(#[source] HostError),

    #[error("Failed to create attribute directory: {0}")]
    AttrDir(#[source] HostError),

    #[error("Failed to create attribute group: {0}")]
    AttrGroup(#[source] HostError),
}

/// A loaded monitor. Dropping it without [`unload`](Self::unload) leaves
/// its tasks running; always unload.
pub struct Monitor {
    state: Arc<MonitorState>,
    host: Arc<dyn InterfaceHost>,
    device: DeviceNode,
    attr_dir: AttrDir,
    workqueue: WorkQueue,
    timer: PeriodicTimer,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("state", &self.state)
            .field("device", &self.device)
            .field("attr_dir", &self.attr_dir)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    pub async fn load(
        config: &MonitorConfig,
        host: Arc<dyn InterfaceHost>,
    ) -> Result<Self, LoadError> {
        tracing::info!(device = DEVICE_NAME, "Initializing monitor");

        let state = Arc::new(MonitorState::new());

        let workqueue = WorkQueue::start(WORK_QUEUE_NAME, {
            let state = Arc::clone(&state);
            move || {
                controller::adjust(&state);
            }
        });
        let trigger = workqueue.trigger();

        let device_ops = Arc::new(StatusDevice::new(Arc::clone(&state), trigger.clone()));
        let device = match host.register_device(DEVICE_NAME, device_ops) {
            Ok(node) => node,
            Err(e) => {
                tracing::error!(error = %e, "Failed to register status device");
                workqueue.shutdown().await;
                return Err(LoadError::Device(e));
            }
        };

        let attr_dir = match host.create_dir(ATTR_DIR_NAME) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create attribute directory");
                host.unregister_device(device);
                workqueue.shutdown().await;
                return Err(LoadError::AttrDir(e));
            }
        };

        if let Err(e) = host.create_group(&attr_dir, attribute_group(&state, &trigger)) {
            tracing::error!(error = %e, "Failed to create attribute group");
            host.remove_dir(attr_dir);
            host.unregister_device(device);
            workqueue.shutdown().await;
            return Err(LoadError::AttrGroup(e));
        }

        let timer = PeriodicTimer::start(config.sample_interval, Arc::clone(&state), {
            let mut sampler = Sampler::seeded(config.seed);
            move |view: RestrictedView<'_>, now: Instant| {
                sampler.fire(view, now);
                trigger.schedule();
            }
        });

        tracing::info!("Monitor loaded");

        Ok(Self {
            state,
            host,
            device,
            attr_dir,
            workqueue,
            timer,
        })
    }

    pub fn state(&self) -> &Arc<MonitorState> {
        &self.state
    }

    /// Tear down in dependency order: no firing or controller run can touch
    /// the state once the interfaces start going away.
    pub async fn unload(self) {
        tracing::info!("Unloading monitor");

        let Self {
            state,
            host,
            device,
            attr_dir,
            workqueue,
            timer,
        } = self;

        timer.cancel().await;
        workqueue.shutdown().await;

        host.remove_group(&attr_dir);
        host.remove_dir(attr_dir);
        tracing::info!("Attribute group removed");
        host.unregister_device(device);

        drop(state);
        tracing::info!("Monitor unloaded");
    }
}
