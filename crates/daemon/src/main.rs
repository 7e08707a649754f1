//! `automon-daemon` -- autonomous health monitor and resource adjuster.
//!
//! Samples a simulated workload on a fixed period, steps a resource factor
//! up or down with a hysteresis policy, and exposes the state through a
//! status device and an attribute directory served over HTTP.
//!
//! # Environment variables
//!
//! | Variable             | Required | Default     | Description                    |
//! |----------------------|----------|-------------|--------------------------------|
//! | `HOST`               | no       | `127.0.0.1` | HTTP bind address              |
//! | `PORT`               | no       | `7070`      | HTTP bind port                 |
//! | `SAMPLE_INTERVAL_MS` | no       | `100`       | Sampler period in milliseconds |
//! | `SAMPLE_SEED`        | no       | `24301`     | Seed of the simulated workload |

use std::net::SocketAddr;
use std::sync::Arc;

use automon_daemon::config::DaemonConfig;
use automon_daemon::host::{InterfaceHost, Registry};
use automon_daemon::logbuf::LogBuffer;
use automon_daemon::module::Monitor;
use automon_daemon::routes::{self, AppState};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let logs = LogBuffer::default();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "automon_daemon=info,automon_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(logs.clone())
                .with_ansi(false),
        )
        .init();

    let config = DaemonConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        host = %config.host,
        port = config.port,
        interval_ms = config.monitor.sample_interval.as_millis() as u64,
        seed = config.monitor.seed,
        "Starting automon-daemon",
    );

    let registry = Arc::new(Registry::new());
    let host: Arc<dyn InterfaceHost> = registry.clone();

    let monitor = Monitor::load(&config.monitor, host)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Monitor failed to load");
            std::process::exit(1);
        });

    let app = routes::router(AppState {
        registry,
        state: Arc::clone(monitor.state()),
        logs,
    });

    let addr = match config.host.parse() {
        Ok(ip) => SocketAddr::new(ip, config.port),
        Err(e) => {
            tracing::error!(host = %config.host, error = %e, "Invalid HOST address");
            monitor.unload().await;
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            monitor.unload().await;
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "Serving monitor interfaces");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    monitor.unload().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
