//! Notification dispatch loop.
//!
//! Drains the outbound queue into a sink, one message at a time. Failed
//! deliveries are logged and dropped.

use tokio::sync::{broadcast, mpsc};

use jumprun_core::Notification;

use crate::notify::NotificationSink;

pub async fn run_notification_loop<S: NotificationSink>(
    sink: S,
    mut rx: mpsc::UnboundedReceiver<Notification>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Notification loop shutting down");
                break;
            }
            maybe_notification = rx.recv() => {
                match maybe_notification {
                    Some(notification) => deliver(&sink, &notification).await,
                    None => {
                        tracing::info!("Notification channel closed");
                        return;
                    }
                }
            }
        }
    }

    // Flush whatever was queued before shutdown.
    while let Ok(notification) = rx.try_recv() {
        deliver(&sink, &notification).await;
    }
}

async fn deliver<S: NotificationSink>(sink: &S, notification: &Notification) {
    if let Err(err) = sink.deliver(notification).await {
        tracing::warn!("Notification delivery failed: {:#}", err);
    }
}
