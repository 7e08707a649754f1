//! The status device: full snapshot on read, workload injection on write.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use automon_core::error::CoreError;
use automon_core::level::parse_level;
use automon_core::limits::DEVICE_NAME;
use automon_core::snapshot::read_at;
use automon_core::state::MonitorState;

use crate::host::DeviceOps;
use crate::workqueue::WorkTrigger;

/// Parse `payload`, store it as the new workload and queue a controller run
/// right away instead of waiting for the next tick. Nothing is modified
/// when parsing fails.
pub(crate) fn inject_workload(
    state: &MonitorState,
    trigger: &WorkTrigger,
    payload: &[u8],
    source: &'static str,
) -> Result<u64, CoreError> {
    let level = parse_level(payload).inspect_err(|e| {
        tracing::debug!(source, error = %e, "Rejected workload injection");
    })?;
    let level = state.inject_workload(level);
    tracing::info!(source, workload = level, "User injected workload");
    trigger.schedule();
    Ok(level)
}

pub struct StatusDevice {
    state: Arc<MonitorState>,
    trigger: WorkTrigger,
    open_handles: AtomicUsize,
}

impl StatusDevice {
    pub fn new(state: Arc<MonitorState>, trigger: WorkTrigger) -> Self {
        Self {
            state,
            trigger,
            open_handles: AtomicUsize::new(0),
        }
    }

    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }
}

impl DeviceOps for StatusDevice {
    fn open(&self) {
        let open = self.open_handles.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(device = DEVICE_NAME, open, "Device opened");
    }

    fn release(&self) {
        let open = self.open_handles.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::debug!(device = DEVICE_NAME, open, "Device closed");
    }

    /// Formats a fresh snapshot on every call.
    fn read(&self, offset: u64, max_len: usize) -> Result<Vec<u8>, CoreError> {
        let summary = self.state.snapshot().to_string();
        let chunk = read_at(summary.as_bytes(), offset, max_len);
        tracing::debug!(
            device = DEVICE_NAME,
            offset,
            max_len,
            summary_len = summary.len(),
            returned = chunk.len(),
            "Device read"
        );
        Ok(chunk.to_vec())
    }

    fn write(&self, payload: &[u8]) -> Result<usize, CoreError> {
        inject_workload(&self.state, &self.trigger, payload, "device")?;
        Ok(payload.len())
    }
}
