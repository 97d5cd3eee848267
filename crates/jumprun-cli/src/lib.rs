//! jumprun CLI - command line tools for the jump plane tracker.
//!
//! - `track`: run one monitor in the foreground, printing notifications
//! - `replay`: feed a recorded flight through the classifier offline
//! - `start`/`stop`/`status`/`clear`: drive a running `jumprun-server`

pub mod control;
pub mod replay;

pub use control::TrackerClient;
pub use replay::{load_replay, parse_replay};

use anyhow::{bail, Result};
use jumprun_core::{presets, AircraftHex};

/// Resolve `--plane` / `--hex` into a hex and a display label.
pub fn resolve_target(plane: Option<&str>, hex: Option<&str>) -> Result<(AircraftHex, String)> {
    if let Some(key) = plane {
        let Some(preset) = presets::aircraft(key) else {
            bail!("Invalid plane {:?}", key);
        };
        let hex = preset.hex()?;
        return Ok((hex, preset.name.to_string()));
    }
    let Some(raw) = hex else {
        bail!("Either --plane or --hex is required");
    };
    let hex = AircraftHex::parse(raw)?;
    let label = presets::aircraft_name(&hex)
        .map(str::to_string)
        .unwrap_or_else(|| hex.to_string());
    Ok((hex, label))
}
