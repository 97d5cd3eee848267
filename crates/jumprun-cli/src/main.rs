//! `jumprun` command line tool.
//!
//! Usage:
//!   jumprun track --plane twin_otter
//!   jumprun replay --file flights/saturday.jsonl --hex A06796
//!   jumprun start --plane king_air --dz mile_hi

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jumprun_adsb::{AdsbClient, DEFAULT_BASE_URL, DEFAULT_RAPIDAPI_HOST};
use jumprun_cli::control::{TrackerClient, DEFAULT_SERVER_URL};
use jumprun_cli::{load_replay, resolve_target};
use jumprun_core::presets::{self, MILE_HI};
use jumprun_core::rules::{NO_DATA_BUDGET, POLL_INTERVAL};
use jumprun_core::{
    Notification, NotificationPort, ReplaySource, TelemetrySource, ThresholdConfig,
};
use jumprun_server::loops::poll_loop::{stop_channel, MonitorExit, MonitorSettings, PollLoop};

/// Track skydiving aircraft through their jump phases
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Track one aircraft in the foreground, printing notifications
    Track {
        #[command(flatten)]
        target: Target,

        /// Dropzone preset
        #[arg(long, default_value = MILE_HI.key)]
        dz: String,

        /// RapidAPI key for ADS-B Exchange
        #[arg(long, env = "RAPIDAPI_KEY", hide_env_values = true)]
        api_key: String,

        #[arg(long, env = "RAPIDAPI_HOST", default_value = DEFAULT_RAPIDAPI_HOST)]
        api_host: String,

        #[arg(long, env = "ADSB_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Seconds between polls
        #[arg(long, default_value_t = POLL_INTERVAL.as_secs())]
        interval: u64,
    },

    /// Run a recorded flight (JSON lines, `null` = no data) through the classifier
    Replay {
        #[arg(long)]
        file: PathBuf,

        /// Hex to label the replay with
        #[arg(long, default_value = "A06796")]
        hex: String,

        /// Dropzone preset
        #[arg(long, default_value = MILE_HI.key)]
        dz: String,
    },

    /// Ask a running server to start tracking
    Start {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        dz: Option<String>,

        #[command(flatten)]
        server: Server,
    },

    /// Ask a running server to stop tracking one aircraft
    Stop {
        /// ICAO hex of the aircraft
        hex: String,

        #[command(flatten)]
        server: Server,
    },

    /// Show one tracker, or all trackers when no hex is given
    Status {
        hex: Option<String>,

        #[command(flatten)]
        server: Server,
    },

    /// Stop every tracker on a running server
    Clear {
        #[command(flatten)]
        server: Server,
    },
}

#[derive(clap::Args, Debug)]
struct Target {
    /// Aircraft preset (king_air, twin_otter)
    #[arg(long, conflicts_with = "hex")]
    plane: Option<String>,

    /// ICAO hex address, e.g. A06796
    #[arg(long)]
    hex: Option<String>,
}

#[derive(clap::Args, Debug)]
struct Server {
    /// Tracker server URL
    #[arg(long, env = "JUMPRUN_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,jumprun_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Track {
            target,
            dz,
            api_key,
            api_host,
            base_url,
            interval,
        } => {
            let client = AdsbClient::new(base_url, api_key, api_host)?;
            let settings = MonitorSettings {
                poll_interval: Duration::from_secs(interval),
                no_data_budget: NO_DATA_BUDGET,
            };
            runtime()?.block_on(track(target, &dz, Arc::new(client), settings))
        }
        Command::Replay { file, hex, dz } => {
            let readings = load_replay(&file)?;
            println!("Replaying {} polls from {}", readings.len(), file.display());
            let source = Arc::new(ReplaySource::new(readings));
            let target = Target {
                plane: None,
                hex: Some(hex),
            };
            let settings = MonitorSettings {
                poll_interval: Duration::ZERO,
                no_data_budget: NO_DATA_BUDGET,
            };
            runtime()?.block_on(track(target, &dz, source, settings))
        }
        Command::Start { target, dz, server } => {
            let client = TrackerClient::new(server.server);
            let response =
                client.start(target.plane.as_deref(), target.hex.as_deref(), dz.as_deref())?;
            print_message(&response);
            Ok(())
        }
        Command::Stop { hex, server } => {
            let response = TrackerClient::new(server.server).stop(&hex)?;
            print_message(&response);
            Ok(())
        }
        Command::Status { hex, server } => {
            let client = TrackerClient::new(server.server);
            let response = match hex {
                Some(hex) => client.status(&hex)?,
                None => client.list()?,
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::Clear { server } => {
            let response = TrackerClient::new(server.server).clear()?;
            println!(
                "🛑 Stopped {} tracker(s)",
                response.get("stopped").and_then(|v| v.as_u64()).unwrap_or(0)
            );
            Ok(())
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

fn thresholds(dz: &str) -> Result<ThresholdConfig> {
    let preset = presets::dropzone(dz).with_context(|| format!("Invalid DZ {:?}", dz))?;
    let thresholds = preset.thresholds();
    thresholds.validate()?;
    Ok(thresholds)
}

/// Run one monitor until it gives up or Ctrl-C.
async fn track(
    target: Target,
    dz: &str,
    source: Arc<dyn TelemetrySource>,
    settings: MonitorSettings,
) -> Result<()> {
    let (hex, label) = resolve_target(target.plane.as_deref(), target.hex.as_deref())?;
    let thresholds = thresholds(dz)?;

    let port: Arc<dyn NotificationPort> =
        Arc::new(|notification: Notification| println!("{}", notification.render()));
    let (poll_loop, status) = PollLoop::new(hex.clone(), label, thresholds, source, port, settings);
    let (stop, signal) = stop_channel();

    println!("Tracking {} at {} (Ctrl-C to stop)", hex, dz);
    let mut task = tokio::spawn(poll_loop.run(signal));

    let exit = tokio::select! {
        exit = &mut task => exit?,
        _ = tokio::signal::ctrl_c() => {
            stop.stop();
            task.await?
        }
    };

    let status = status.borrow().clone();
    match exit {
        MonitorExit::Stopped => println!("Stopped after {} polls", status.polls),
        MonitorExit::Exhausted => println!(
            "Gave up after {} polls; last phase: {}",
            status.polls,
            status.phase.map(|phase| phase.as_str()).unwrap_or("none")
        ),
    }
    Ok(())
}

fn print_message(response: &serde_json::Value) {
    match response.get("message").and_then(|v| v.as_str()) {
        Some(message) => println!("{}", message),
        None => println!("{}", response),
    }
}
