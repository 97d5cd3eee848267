//! ADS-B Exchange HTTP client.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use jumprun_core::{AircraftHex, TelemetrySnapshot, TelemetrySource};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::record::{parse_aircraft, AdsbAircraft};

pub const DEFAULT_BASE_URL: &str = "https://adsbexchange-com1.p.rapidapi.com/v2";
pub const DEFAULT_RAPIDAPI_HOST: &str = "adsbexchange-com1.p.rapidapi.com";

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// HTTP client for the ADS-B Exchange RapidAPI.
#[derive(Clone)]
pub struct AdsbClient {
    client: Client,
    base_url: String,
    api_key: String,
    host: String,
}

impl AdsbClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        host: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            host: host.into(),
        })
    }

    /// Fetch the current record for one aircraft.
    ///
    /// `Ok(None)` when the response carries no aircraft; `Err` for transport
    /// failures, non-2xx statuses and bodies that are not JSON.
    pub async fn fetch_aircraft(&self, hex: &AircraftHex) -> Result<Option<AdsbAircraft>> {
        let url = format!("{}/hex/{}", self.base_url, hex);
        tracing::debug!("Requesting data for plane {} from URL: {}", hex, url);

        let response = self
            .client
            .get(&url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .send()
            .await
            .context("Failed to reach ADS-B Exchange")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "ADS-B Exchange request failed: {} {}",
                status,
                body
            ));
        }

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse ADS-B Exchange response")?;
        tracing::trace!("Raw ADS-B response: {}", payload);

        Ok(parse_aircraft(payload))
    }
}

impl TelemetrySource for AdsbClient {
    fn fetch<'a>(&'a self, hex: &'a AircraftHex) -> BoxFuture<'a, Option<TelemetrySnapshot>> {
        Box::pin(async move {
            match self.fetch_aircraft(hex).await {
                Ok(Some(aircraft)) => Some(aircraft.to_snapshot()),
                Ok(None) => {
                    tracing::debug!("No aircraft data found for {}", hex);
                    None
                }
                Err(err) => {
                    tracing::debug!("ADS-B fetch for {} failed: {:#}", hex, err);
                    None
                }
            }
        })
    }
}
