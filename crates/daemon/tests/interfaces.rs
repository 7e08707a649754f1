//! Integration tests for the status device and attribute group, driven
//! through the registry the way the HTTP layer drives them.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;

use automon_core::error::CoreError;
use automon_core::limits::{
    ATTR_DIR_NAME, DEVICE_NAME, MAX_RESOURCE_FACTOR, MIN_RESOURCE_FACTOR,
};
use automon_daemon::config::MonitorConfig;
use automon_daemon::host::Registry;
use automon_daemon::module::Monitor;

/// Sampler effectively off, so only injected values move the workload.
async fn load_quiet() -> (Arc<Registry>, Monitor) {
    let registry = Arc::new(Registry::new());
    let config = MonitorConfig {
        sample_interval: Duration::from_secs(3600),
        seed: 1,
    };
    let monitor = Monitor::load(&config, registry.clone()).await.unwrap();
    (registry, monitor)
}

fn read_device(registry: &Registry) -> String {
    let mut file = registry.open(DEVICE_NAME).unwrap();
    String::from_utf8(file.read_to_end().unwrap()).unwrap()
}

fn show(registry: &Registry, attr: &str) -> String {
    registry
        .attribute(ATTR_DIR_NAME, attr)
        .unwrap()
        .show()
        .unwrap()
}

/// Keep injecting until the resource factor settles on `target`.
async fn inject_until<F>(mut inject: F, monitor: &Monitor, target: u64, max_rounds: usize)
where
    F: FnMut(),
{
    for _ in 0..max_rounds {
        inject();
        tokio::time::sleep(Duration::from_millis(10)).await;
        if monitor.state().resource_factor() == target {
            return;
        }
    }
    panic!(
        "resource factor stuck at {}, expected {target}",
        monitor.state().resource_factor()
    );
}

// ---------------------------------------------------------------------------
// Test: device read returns the formatted snapshot
// ---------------------------------------------------------------------------

#[tokio::test]
async fn device_read_formats_initial_snapshot() {
    let (registry, monitor) = load_quiet().await;

    assert_eq!(
        read_device(&registry),
        "Workload: 0%\n\
         Resource Factor: 5\n\
         Critical Alerts: 0\n\
         Simulated GPU Temp: 50C\n\
         Simulated Memory Pressure: 0%\n\
         Timer Ticks: 0\n"
    );

    monitor.unload().await;
}

#[tokio::test]
async fn device_partial_reads_and_end_of_data() {
    let (registry, monitor) = load_quiet().await;
    let full = read_device(&registry);

    let mut file = registry.open(DEVICE_NAME).unwrap();
    let prefix = file.read(8).unwrap();
    assert_eq!(prefix, &full.as_bytes()[..8]);

    file.seek(full.len() as u64);
    assert!(file.read(64).unwrap().is_empty());
    file.seek(full.len() as u64 + 10);
    assert!(file.read(64).unwrap().is_empty());

    drop(file);
    monitor.unload().await;
}

// ---------------------------------------------------------------------------
// Test: injection via the device drives the factor to saturation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn high_workload_via_device_saturates() {
    let (registry, monitor) = load_quiet().await;

    let mut file = registry.open(DEVICE_NAME).unwrap();
    inject_until(
        || {
            file.write(b"85").unwrap();
        },
        &monitor,
        MAX_RESOURCE_FACTOR,
        100,
    )
    .await;
    drop(file);

    let summary = read_device(&registry);
    assert!(summary.starts_with("Workload: 85%\n"));
    assert!(summary.contains("Simulated GPU Temp: 92C\n"));
    assert!(summary.contains("Simulated Memory Pressure: 56%\n"));
    assert!(monitor.state().critical_alerts() >= 1);

    monitor.unload().await;
}

// ---------------------------------------------------------------------------
// Test: injection via the attribute drives the factor to its floor
// ---------------------------------------------------------------------------

#[tokio::test]
async fn low_workload_via_attribute_floors() {
    let (registry, monitor) = load_quiet().await;
    let attr = registry.attribute(ATTR_DIR_NAME, "current_workload").unwrap();

    inject_until(
        || {
            attr.store(b"10\n").unwrap();
        },
        &monitor,
        MIN_RESOURCE_FACTOR,
        100,
    )
    .await;

    // Further runs must not push it lower.
    for _ in 0..5 {
        attr.store(b"10").unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(show(&registry, "resource_factor"), "1\n");
    assert_eq!(show(&registry, "current_workload"), "10\n");
    assert_eq!(show(&registry, "critical_alerts"), "0\n");

    monitor.unload().await;
}

// ---------------------------------------------------------------------------
// Test: rejected writes leave the state untouched
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_writes_are_rejected_without_mutation() {
    let (registry, monitor) = load_quiet().await;
    registry
        .attribute(ATTR_DIR_NAME, "current_workload")
        .unwrap()
        .store(b"42")
        .unwrap();
    let before = monitor.state().sample();

    let mut file = registry.open(DEVICE_NAME).unwrap();
    assert_matches!(file.write(b"abc"), Err(CoreError::Validation(_)));
    assert_matches!(file.write(b"-3"), Err(CoreError::Validation(_)));
    assert_matches!(file.write(&[b'7'; 300]), Err(CoreError::Validation(_)));
    drop(file);

    let attr = registry.attribute(ATTR_DIR_NAME, "current_workload").unwrap();
    assert_matches!(attr.store(b"lots"), Err(CoreError::Validation(_)));

    let after = monitor.state().sample();
    assert_eq!(after.workload_level(), before.workload_level());
    assert_eq!(after.gpu_temp_celsius(), before.gpu_temp_celsius());
    assert_eq!(
        after.memory_pressure_percent(),
        before.memory_pressure_percent()
    );

    monitor.unload().await;
}

#[tokio::test]
async fn out_of_range_write_is_clamped() {
    let (registry, monitor) = load_quiet().await;

    let mut file = registry.open(DEVICE_NAME).unwrap();
    assert_eq!(file.write(b"250").unwrap(), 3);
    drop(file);

    assert_eq!(show(&registry, "current_workload"), "100\n");
    monitor.unload().await;
}

#[tokio::test]
async fn read_only_attributes_refuse_stores() {
    let (registry, monitor) = load_quiet().await;

    for name in ["resource_factor", "critical_alerts"] {
        let attr = registry.attribute(ATTR_DIR_NAME, name).unwrap();
        assert!(!attr.is_writable());
        assert_matches!(attr.store(b"3"), Err(CoreError::ReadOnly(_)));
    }
    assert_eq!(show(&registry, "resource_factor"), "5\n");

    monitor.unload().await;
}

// ---------------------------------------------------------------------------
// Test: full reads stay whole while the workload changes underneath
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn full_reads_are_never_torn_by_concurrent_injection() {
    use std::sync::atomic::{AtomicBool, Ordering};

    let (registry, monitor) = load_quiet().await;
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let registry = Arc::clone(&registry);
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            let attr = registry.attribute(ATTR_DIR_NAME, "current_workload").unwrap();
            let mut flip = false;
            while !done.load(Ordering::Relaxed) {
                let payload: &[u8] = if flip { b"100" } else { b"0" };
                attr.store(payload).unwrap();
                flip = !flip;
            }
        })
    };

    for _ in 0..20_000 {
        let text = read_device(&registry);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6, "torn read: {text:?}");
        assert!(lines[0].starts_with("Workload: "), "torn read: {text:?}");
        assert!(lines[5].starts_with("Timer Ticks: "), "torn read: {text:?}");
        assert_eq!(text.matches("Timer Ticks").count(), 1, "torn read: {text:?}");
    }

    done.store(true, Ordering::Relaxed);
    writer.join().unwrap();
    monitor.unload().await;
}
