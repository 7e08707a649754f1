//! HTTP exposure of the interface host.
//!
//! | Method | Path                  | Effect                                   |
//! |--------|-----------------------|------------------------------------------|
//! | GET    | `/health`             | service health                           |
//! | GET    | `/dev/{name}`         | positional device read (`offset`, `len`) |
//! | POST   | `/dev/{name}`         | device write, raw body is the payload    |
//! | GET    | `/sys/{dir}`          | list attribute entries                   |
//! | GET    | `/sys/{dir}/{attr}`   | attribute show                           |
//! | PUT    | `/sys/{dir}/{attr}`   | attribute store                          |
//! | GET    | `/api/v1/snapshot`    | structured snapshot                      |
//! | GET    | `/api/v1/logs`        | recent daemon log lines (`lines`)        |

use std::sync::Arc;

use automon_core::snapshot::Snapshot;
use automon_core::state::MonitorState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::AppResult;
use crate::host::Registry;
use crate::logbuf::LogBuffer;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub state: Arc<MonitorState>,
    pub logs: LogBuffer,
}

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct WriteResult {
    pub written: usize,
}

#[derive(Debug, Serialize)]
pub struct AttrEntry {
    pub name: &'static str,
    /// Permission bits in octal, e.g. `"664"`.
    pub mode: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadParams {
    pub offset: Option<u64>,
    /// Maximum bytes to return; reads to the end when absent.
    pub len: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogParams {
    /// Number of trailing lines; defaults to [`DEFAULT_LOG_LINES`].
    pub lines: Option<usize>,
}

pub const DEFAULT_LOG_LINES: usize = 20;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

pub fn router(app: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/dev/{name}", get(read_device).post(write_device))
        .route("/sys/{dir}", get(list_attributes))
        .route("/sys/{dir}/{attr}", get(show_attribute).put(store_attribute))
        .route("/api/v1/snapshot", get(snapshot))
        .route("/api/v1/logs", get(recent_logs))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// GET /health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /dev/{name}?offset=&len=
async fn read_device(
    State(app): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<ReadParams>,
) -> AppResult<Response> {
    let mut file = app.registry.open(&name)?;
    file.seek(params.offset.unwrap_or(0));
    let bytes = match params.len {
        Some(len) => file.read(len)?,
        None => file.read_to_end()?,
    };
    Ok(([(CONTENT_TYPE, TEXT_PLAIN)], bytes).into_response())
}

/// POST /dev/{name}
async fn write_device(
    State(app): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> AppResult<Json<DataResponse<WriteResult>>> {
    let mut file = app.registry.open(&name)?;
    let written = file.write(&body)?;
    Ok(Json(DataResponse {
        data: WriteResult { written },
    }))
}

/// GET /sys/{dir}
async fn list_attributes(
    State(app): State<AppState>,
    Path(dir): Path<String>,
) -> AppResult<Json<DataResponse<Vec<AttrEntry>>>> {
    let entries = app
        .registry
        .list(&dir)?
        .into_iter()
        .map(|(name, mode)| AttrEntry {
            name,
            mode: format!("{mode:o}"),
        })
        .collect();
    Ok(Json(DataResponse { data: entries }))
}

/// GET /sys/{dir}/{attr}
async fn show_attribute(
    State(app): State<AppState>,
    Path((dir, attr)): Path<(String, String)>,
) -> AppResult<Response> {
    let text = app.registry.attribute(&dir, &attr)?.show()?;
    Ok(([(CONTENT_TYPE, TEXT_PLAIN)], text).into_response())
}

/// PUT /sys/{dir}/{attr}
async fn store_attribute(
    State(app): State<AppState>,
    Path((dir, attr)): Path<(String, String)>,
    body: Bytes,
) -> AppResult<Json<DataResponse<WriteResult>>> {
    let written = app.registry.attribute(&dir, &attr)?.store(&body)?;
    Ok(Json(DataResponse {
        data: WriteResult { written },
    }))
}

/// GET /api/v1/snapshot
async fn snapshot(State(app): State<AppState>) -> Json<DataResponse<Snapshot>> {
    Json(DataResponse {
        data: app.state.snapshot(),
    })
}

/// GET /api/v1/logs?lines=
async fn recent_logs(
    State(app): State<AppState>,
    Query(params): Query<LogParams>,
) -> Json<DataResponse<Vec<String>>> {
    Json(DataResponse {
        data: app.logs.tail(params.lines.unwrap_or(DEFAULT_LOG_LINES)),
    })
}
