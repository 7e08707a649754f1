//! Per-field attribute entries over the monitor state.
//!
//! `current_workload` is read-write with the same write semantics as the
//! status device; `resource_factor` and `critical_alerts` are read-only.
//! Each show takes only the synchronisation its own field needs.

use std::sync::Arc;

use automon_core::error::CoreError;
use automon_core::limits::{ATTR_CRITICAL_ALERTS, ATTR_CURRENT_WORKLOAD, ATTR_RESOURCE_FACTOR};
use automon_core::state::MonitorState;

use crate::device::inject_workload;
use crate::host::{Attribute, AttributeOps};
use crate::workqueue::WorkTrigger;

struct CurrentWorkload {
    state: Arc<MonitorState>,
    trigger: WorkTrigger,
}

impl AttributeOps for CurrentWorkload {
    fn show(&self) -> String {
        format!("{}\n", self.state.workload_level())
    }

    fn store(&self, payload: &[u8]) -> Result<usize, CoreError> {
        inject_workload(&self.state, &self.trigger, payload, "attribute")?;
        Ok(payload.len())
    }
}

struct ResourceFactor {
    state: Arc<MonitorState>,
}

impl AttributeOps for ResourceFactor {
    fn show(&self) -> String {
        format!("{}\n", self.state.resource_factor())
    }
}

/// Lock-free: reads the atomic counter directly.
struct CriticalAlerts {
    state: Arc<MonitorState>,
}

impl AttributeOps for CriticalAlerts {
    fn show(&self) -> String {
        format!("{}\n", self.state.critical_alerts())
    }
}

/// The monitor's attribute group, in display order.
pub fn attribute_group(state: &Arc<MonitorState>, trigger: &WorkTrigger) -> Vec<Attribute> {
    vec![
        Attribute::new(
            ATTR_CURRENT_WORKLOAD,
            0o664,
            Arc::new(CurrentWorkload {
                state: Arc::clone(state),
                trigger: trigger.clone(),
            }),
        ),
        Attribute::new(
            ATTR_RESOURCE_FACTOR,
            0o444,
            Arc::new(ResourceFactor {
                state: Arc::clone(state),
            }),
        ),
        Attribute::new(
            ATTR_CRITICAL_ALERTS,
            0o444,
            Arc::new(CriticalAlerts {
                state: Arc::clone(state),
            }),
        ),
    ]
}
