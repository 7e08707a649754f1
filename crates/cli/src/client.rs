//! HTTP client for the daemon's device and attribute endpoints.

use anyhow::{bail, Context};
use serde::Deserialize;

/// Attribute directory the daemon registers.
const ATTR_DIR: &str = "auto_monitor";
/// Device node the daemon registers.
const DEVICE: &str = "auto_monitor";

pub struct MonitorClient {
    client: reqwest::Client,
    base_url: String,
}

/// Trailing log lines requested by [`MonitorClient::recent_logs`].
const LOG_LINES: usize = 20;

/// `{ "data": T }` envelope returned by the daemon's JSON endpoints.
#[derive(Debug, Deserialize)]
struct DataBody<T> {
    data: T,
}

/// Error body returned by the daemon.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl MonitorClient {
    /// * `base_url` - daemon root, e.g. `http://127.0.0.1:7070`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn device_url(&self) -> String {
        format!("{}/dev/{DEVICE}", self.base_url)
    }

    pub fn attribute_url(&self, name: &str) -> String {
        format!("{}/sys/{ATTR_DIR}/{name}", self.base_url)
    }

    pub fn logs_url(&self) -> String {
        format!("{}/api/v1/logs?lines={LOG_LINES}", self.base_url)
    }

    /// Read the full status text from the device.
    pub async fn read_device(&self) -> anyhow::Result<String> {
        let response = self
            .client
            .get(self.device_url())
            .send()
            .await
            .context("Failed to open device")?;
        text_or_error(response).await
    }

    pub async fn write_device(&self, payload: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(self.device_url())
            .body(payload.to_string())
            .send()
            .await
            .context("Failed to open device for writing")?;
        text_or_error(response).await.map(|_| ())
    }

    pub async fn read_attribute(&self, name: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .get(self.attribute_url(name))
            .send()
            .await
            .with_context(|| format!("Failed to open attribute {name}"))?;
        text_or_error(response).await
    }

    pub async fn write_attribute(&self, name: &str, payload: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .put(self.attribute_url(name))
            .body(payload.to_string())
            .send()
            .await
            .with_context(|| format!("Failed to open attribute {name} for writing"))?;
        text_or_error(response).await.map(|_| ())
    }

    /// The daemon's most recent log lines, oldest first.
    pub async fn recent_logs(&self) -> anyhow::Result<Vec<String>> {
        let response = self
            .client
            .get(self.logs_url())
            .send()
            .await
            .context("Failed to fetch daemon logs")?;
        let body = text_or_error(response).await?;
        let parsed: DataBody<Vec<String>> =
            serde_json::from_str(&body).context("Malformed log response")?;
        Ok(parsed.data)
    }
}

async fn text_or_error(response: reqwest::Response) -> anyhow::Result<String> {
    let status = response.status();
    let body = response.text().await.context("Failed to read response body")?;
    if status.is_success() {
        return Ok(body);
    }
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(err) => bail!("{status}: {}", err.error),
        Err(_) => bail!("{status}: {body}"),
    }
}
