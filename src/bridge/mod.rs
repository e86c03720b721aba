//! Line-delimited JSON bridge between a UI process and the session manager.
//!
//! Requests arrive one per line on stdin and events leave one per line on stdout.
//! Logs go to stderr so they never interleave with the protocol.

pub mod handler;
pub mod messages;

pub use handler::BridgeHandler;
pub use messages::{BackgroundEvent, BridgeEvent, BridgeRequest, RecallDirection};

use crate::config::Config;
use crate::remote::client::{DashboardEndpoint, RemoteClient};
use crate::terminal::{SessionDefaults, SessionManager};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Polls system stats every `interval` until the receiving side goes away.
pub fn spawn_stats_poller<E>(
    endpoint: Arc<E>,
    interval: Duration,
    background: UnboundedSender<BackgroundEvent>,
) -> JoinHandle<()>
where
    E: DashboardEndpoint + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if background.is_closed() {
                break;
            }
            match endpoint.system_stats().await {
                Ok(stats) => {
                    if background.send(BackgroundEvent::SystemStats(stats)).is_err() {
                        break;
                    }
                }
                // Polling failures are only logged; the UI keeps its last sample.
                Err(e) => debug!(error = %e, "System stats poll failed"),
            }
        }
        debug!("Stats poller stopped");
    })
}

/// Serializes each event as one JSON line and flushes.
pub async fn write_events<W>(writer: &mut W, events: &[BridgeEvent]) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if events.is_empty() {
        return Ok(());
    }
    for event in events {
        let mut line = serde_json::to_vec(event).context("Failed to serialize bridge event")?;
        line.push(b'\n');
        writer
            .write_all(&line)
            .await
            .context("Failed to write bridge event")?;
    }
    writer.flush().await.context("Failed to flush bridge output")?;
    Ok(())
}

/// Greeting for the first session: the backend's welcome text, or the configured fallback.
pub async fn fetch_welcome<E: DashboardEndpoint>(endpoint: &E, fallback: &str) -> String {
    match endpoint.welcome().await {
        Ok(welcome) if !welcome.message.trim().is_empty() => welcome.message,
        Ok(_) => fallback.to_string(),
        Err(e) => {
            warn!(error = %e, "Could not fetch welcome message, using fallback");
            fallback.to_string()
        }
    }
}

/// Runs the bridge over the process's stdin and stdout until stdin closes.
pub async fn run_stdio(config: Config) -> anyhow::Result<()> {
    let client = Arc::new(
        RemoteClient::new(&config).context("Failed to build the remote API client")?,
    );
    info!(api_url = %client.base_url(), "Starting terminal bridge");

    let welcome = fetch_welcome(client.as_ref(), &config.welcome_message).await;
    let manager = SessionManager::new(SessionDefaults::from(&config), welcome);

    let (tx, mut rx) = mpsc::unbounded_channel::<BackgroundEvent>();
    let poller = config
        .stats_poll_interval
        .map(|interval| spawn_stats_poller(client.clone(), interval, tx.clone()));
    let mut handler = BridgeHandler::new(manager, client, tx);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    write_events(&mut stdout, &[BridgeEvent::Snapshot(handler.manager().snapshot())]).await?;

    loop {
        let events = tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handler.handle_line(&line),
                Ok(None) => {
                    info!("Input closed, shutting down bridge");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Failed to read from stdin");
                    break;
                }
            },
            Some(event) = rx.recv() => handler.handle_background(event),
        };
        write_events(&mut stdout, &events).await?;
    }

    if let Some(poller) = poller {
        poller.abort();
    }
    Ok(())
}
