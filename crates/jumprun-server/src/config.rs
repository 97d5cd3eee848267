//! Server configuration from environment.

use std::env;
use std::time::Duration;

use jumprun_adsb::{DEFAULT_BASE_URL, DEFAULT_RAPIDAPI_HOST};
use jumprun_core::presets::MILE_HI;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// RapidAPI key for ADS-B Exchange; monitors cannot start without it
    pub rapidapi_key: Option<String>,
    pub rapidapi_host: String,
    pub adsb_base_url: String,
    /// Slack incoming webhook; monitors cannot start without it
    pub slack_webhook_url: Option<String>,
    /// Upper bound on how long a stop request waits for the loop to finish
    pub stop_timeout_secs: u64,
    /// Dropzone preset used when a start request names none
    pub default_dropzone: String,
    /// Without a webhook, write notifications to the log instead of refusing starts
    pub notify_to_log: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("JUMPRUN_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4200),
            rapidapi_key: non_empty_var("RAPIDAPI_KEY"),
            rapidapi_host: env::var("RAPIDAPI_HOST")
                .unwrap_or_else(|_| DEFAULT_RAPIDAPI_HOST.to_string()),
            adsb_base_url: env::var("ADSB_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            slack_webhook_url: non_empty_var("SLACK_WEBHOOK_URL"),
            stop_timeout_secs: env::var("JUMPRUN_STOP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(15),
            default_dropzone: env::var("JUMPRUN_DEFAULT_DZ")
                .unwrap_or_else(|_| MILE_HI.key.to_string()),
            notify_to_log: env::var("JUMPRUN_NOTIFY_LOG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
