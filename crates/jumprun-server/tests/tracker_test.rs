//! Tracker lifecycle tests against scripted telemetry.
//!
//! Run with: cargo test --test tracker_test

use std::sync::{Arc, Mutex};
use std::time::Duration;

use jumprun_core::presets::MILE_HI;
use jumprun_core::{
    AircraftHex, FlightPhase, Notification, NotificationKind, NotificationPort, ReplaySource,
    TelemetrySnapshot, TelemetrySource,
};
use jumprun_server::config::Config;
use jumprun_server::loops::poll_loop::{stop_channel, MonitorExit, MonitorSettings, PollLoop};
use jumprun_server::state::{AppState, StartRequest, TrackerState};

type Sent = Arc<Mutex<Vec<Notification>>>;

fn recorder() -> (Arc<dyn NotificationPort>, Sent) {
    let sent: Sent = Arc::new(Mutex::new(Vec::new()));
    let sink = sent.clone();
    let port: Arc<dyn NotificationPort> =
        Arc::new(move |notification: Notification| sink.lock().unwrap().push(notification));
    (port, sent)
}

fn reading(altitude: f64, vertical_speed: f64, ground_speed: f64) -> Option<TelemetrySnapshot> {
    Some(
        TelemetrySnapshot::default()
            .with_altitude(altitude)
            .with_vertical_speed(vertical_speed)
            .with_ground_speed(ground_speed),
    )
}

fn heading(snapshot: Option<TelemetrySnapshot>, track: f64) -> Option<TelemetrySnapshot> {
    snapshot.map(|s| s.with_track(track, 40.17, -105.2))
}

/// Taxi, climb through the hop-n-pop band, jump run, descent, landing.
fn load_flight() -> Vec<Option<TelemetrySnapshot>> {
    vec![
        reading(5000.0, 0.0, 10.0),
        reading(5400.0, 1200.0, 100.0),
        reading(6500.0, 1200.0, 110.0),
        reading(7500.0, 1200.0, 110.0),
        reading(9800.0, 1100.0, 110.0),
        reading(12_000.0, 1000.0, 110.0),
        heading(reading(17_000.0, 600.0, 110.0), 90.0),
        heading(reading(17_500.0, 0.0, 100.0), 300.0),
        heading(reading(15_000.0, -2500.0, 130.0), 120.0),
        reading(12_000.0, -2500.0, 130.0),
        reading(9000.0, -2500.0, 130.0),
        reading(5000.0, 0.0, 20.0),
    ]
}

#[tokio::test(start_paused = true)]
async fn test_full_load_announces_each_phase_once() {
    let source = Arc::new(ReplaySource::new(load_flight()));
    let (port, sent) = recorder();
    let (poll_loop, status) = PollLoop::new(
        AircraftHex::parse("A06796").unwrap(),
        "Twin Otter",
        MILE_HI.thresholds(),
        source.clone(),
        port,
        MonitorSettings::default(),
    );
    let (_stop, signal) = stop_channel();

    let exit = poll_loop.run(signal).await;

    assert_eq!(exit, MonitorExit::Exhausted);
    // 12 recorded readings, then 5 misses.
    assert_eq!(source.calls(), 17);

    let sent = sent.lock().unwrap();
    let phases: Vec<FlightPhase> = sent
        .iter()
        .filter_map(|n| match n.kind {
            NotificationKind::Transition { to, .. } => Some(to),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            FlightPhase::Landed,
            FlightPhase::Climbing,
            FlightPhase::AtHopNPopAltitude,
            FlightPhase::Climbing,
            FlightPhase::AtAltitude,
            FlightPhase::JumpRun,
            FlightPhase::Descending,
            FlightPhase::Landed,
        ]
    );
    assert_eq!(sent.last().map(|n| n.kind), Some(NotificationKind::Terminal));
    assert_eq!(status.borrow().phase, Some(FlightPhase::Landed));
}

#[tokio::test(start_paused = true)]
async fn test_unobservable_aircraft_stops_itself() {
    let source = Arc::new(ReplaySource::new(Vec::new()));
    let (port, sent) = recorder();
    let mut config = Config::from_env();
    config.default_dropzone = MILE_HI.key.to_string();
    let dyn_source: Arc<dyn TelemetrySource> = source.clone();
    let state = AppState::new(config, Some(dyn_source), Some(port));

    let response = state
        .start(&StartRequest {
            hex: Some("a65ddf".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(response.hex.as_str(), "A65DDF");

    tokio::time::sleep(Duration::from_secs(120)).await;

    let status = state.status(&response.hex);
    assert_eq!(status.state, TrackerState::Inactive);
    assert_eq!(status.phase, Some(FlightPhase::Landed));
    // A sixth poll never happens.
    assert_eq!(source.calls(), 5);

    let terminal: Vec<String> = sent
        .lock()
        .unwrap()
        .iter()
        .filter(|n| n.kind == NotificationKind::Terminal)
        .map(|n| n.text.clone())
        .collect();
    assert_eq!(terminal, vec!["Stopping tracking after 5 no data responses"]);
}

#[tokio::test(start_paused = true)]
async fn test_independent_monitors_do_not_share_state() {
    let flying = TelemetrySnapshot::default()
        .with_altitude(9000.0)
        .with_ground_speed(120.0);
    let source: Arc<dyn TelemetrySource> = Arc::new(ReplaySource::new(vec![Some(flying); 1000]));
    let (port, _sent) = recorder();
    let mut config = Config::from_env();
    config.default_dropzone = MILE_HI.key.to_string();
    let state = AppState::new(config, Some(source), Some(port)).with_settings(MonitorSettings {
        poll_interval: Duration::from_secs(10),
        no_data_budget: 5,
    });

    for plane in ["king_air", "twin_otter"] {
        state
            .start(&StartRequest {
                plane: Some(plane.to_string()),
                ..Default::default()
            })
            .unwrap();
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    let statuses = state.list();
    assert_eq!(statuses.len(), 2);
    assert!(statuses.iter().all(|s| s.state == TrackerState::Active));
    assert!(statuses.iter().all(|s| s.phase == Some(FlightPhase::Flying)));

    let king_air = AircraftHex::parse("ACBC30").unwrap();
    state.stop(&king_air).await;
    assert_eq!(state.status(&king_air).state, TrackerState::Inactive);
    assert_eq!(
        state.status(&AircraftHex::parse("A06796").unwrap()).state,
        TrackerState::Active
    );

    assert_eq!(state.clear().await, 1);
}
