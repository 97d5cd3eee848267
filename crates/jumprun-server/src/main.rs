//! Jump plane tracker - always-on backend with REST and Slack control.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jumprun_adsb::AdsbClient;
use jumprun_core::{NotificationPort, TelemetrySource};
use jumprun_server::api;
use jumprun_server::config::Config;
use jumprun_server::loops::notification_loop::run_notification_loop;
use jumprun_server::notify::{LogSink, QueueNotifier, SlackWebhook};
use jumprun_server::state::AppState;

const DISPATCH_DRAIN_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jumprun_server=debug".parse()?)
                .add_directive("jumprun_core=info".parse()?),
        )
        .init();

    tracing::info!("Starting jump plane tracker...");

    let config = Config::from_env();
    let port = config.server_port;
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let source: Option<Arc<dyn TelemetrySource>> = match config.rapidapi_key.as_deref() {
        Some(key) => {
            let client: Arc<dyn TelemetrySource> = Arc::new(AdsbClient::new(
                &config.adsb_base_url,
                key,
                &config.rapidapi_host,
            )?);
            Some(client)
        }
        None => {
            tracing::warn!("RAPIDAPI_KEY not set; trackers cannot be started");
            None
        }
    };

    let mut dispatcher = None;
    let notifier: Option<Arc<dyn NotificationPort>> =
        match (config.slack_webhook_url.as_deref(), config.notify_to_log) {
            (Some(url), _) => {
                let (queue, rx) = QueueNotifier::channel();
                let sink = SlackWebhook::new(url)?;
                dispatcher = Some(tokio::spawn(run_notification_loop(
                    sink,
                    rx,
                    shutdown_tx.subscribe(),
                )));
                let queue: Arc<dyn NotificationPort> = Arc::new(queue);
                Some(queue)
            }
            (None, true) => {
                tracing::warn!("SLACK_WEBHOOK_URL not set; notifications go to the log");
                let (queue, rx) = QueueNotifier::channel();
                dispatcher = Some(tokio::spawn(run_notification_loop(
                    LogSink,
                    rx,
                    shutdown_tx.subscribe(),
                )));
                let queue: Arc<dyn NotificationPort> = Arc::new(queue);
                Some(queue)
            }
            (None, false) => {
                tracing::warn!("SLACK_WEBHOOK_URL not set; trackers cannot be started");
                None
            }
        };

    let state = Arc::new(AppState::new(config, source, notifier));

    let app = api::routes()
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, stopping trackers");
    state.clear().await;
    let _ = shutdown_tx.send(());
    if let Some(dispatcher) = dispatcher {
        if tokio::time::timeout(Duration::from_secs(DISPATCH_DRAIN_SECS), dispatcher)
            .await
            .is_err()
        {
            tracing::warn!("Notification loop did not drain in time");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}
