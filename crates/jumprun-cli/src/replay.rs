//! Recorded flights for offline replay.
//!
//! One JSON value per line: a `TelemetrySnapshot` object, or `null` for a
//! poll that returned no data. Blank lines and `#` comments are skipped.

use anyhow::{Context, Result};
use jumprun_core::TelemetrySnapshot;
use std::fs;
use std::path::Path;

pub fn parse_replay(input: &str) -> Result<Vec<Option<TelemetrySnapshot>>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str::<Option<TelemetrySnapshot>>(line)
                .with_context(|| format!("Invalid snapshot on line {}", index + 1))
        })
        .collect()
}

pub fn load_replay(path: &Path) -> Result<Vec<Option<TelemetrySnapshot>>> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_replay(&input)
}
