//! Blocking client for the tracker server's REST API.

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use serde_json::{json, Value};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:4200";

/// HTTP client for a running `jumprun-server`.
pub struct TrackerClient {
    client: Client,
    base_url: String,
}

impl TrackerClient {
    /// # Arguments
    /// * `base_url` - Server URL (e.g., "http://localhost:4200")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn start(&self, plane: Option<&str>, hex: Option<&str>, dz: Option<&str>) -> Result<Value> {
        let body = json!({ "plane": plane, "hex": hex, "dz": dz });
        let response = self
            .client
            .post(self.url("/v1/trackers"))
            .json(&body)
            .send()
            .context("Failed to send start request")?;
        read_json(response)
    }

    pub fn stop(&self, hex: &str) -> Result<Value> {
        let response = self
            .client
            .delete(self.url(&format!("/v1/trackers/{}", hex)))
            .send()
            .context("Failed to send stop request")?;
        read_json(response)
    }

    pub fn status(&self, hex: &str) -> Result<Value> {
        let response = self
            .client
            .get(self.url(&format!("/v1/trackers/{}", hex)))
            .send()
            .context("Failed to fetch tracker status")?;
        read_json(response)
    }

    pub fn list(&self) -> Result<Value> {
        let response = self
            .client
            .get(self.url("/v1/trackers"))
            .send()
            .context("Failed to list trackers")?;
        read_json(response)
    }

    pub fn clear(&self) -> Result<Value> {
        let response = self
            .client
            .delete(self.url("/v1/trackers"))
            .send()
            .context("Failed to send clear request")?;
        read_json(response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn read_json(response: Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response.json().context("Server returned invalid JSON")?;
    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed");
        bail!("Server error ({}): {}", status.as_u16(), message);
    }
    Ok(body)
}
