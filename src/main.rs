mod config;
mod connection;
mod panel;
mod protocol;
mod session;
mod ui;
mod web;

use crate::config::{AppConfig, KRAD_PROTOCOL};
use crate::connection::{Connection, WsConnector};
use crate::session::Session;
use crate::web::AppState;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = Arc::new(AppConfig::from_env());

    tracing::info!(
        "Starting krad-panel on {} (mixer: {})",
        config.http_bind,
        config.krad_uri()
    );

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (actions_tx, actions_rx) = mpsc::unbounded_channel();
    let (updates_tx, _) = broadcast::channel(256);
    let (snapshot_tx, snapshot_rx) = watch::channel(None);

    let connection = Connection::new(config.krad_uri(), KRAD_PROTOCOL, WsConnector, events_tx);
    let session = Session::new(connection, config.reconnect_policy(), updates_tx.clone(), snapshot_tx);
    let session_task = tokio::spawn(session.run(events_rx, actions_rx));

    let state = AppState {
        config: config.clone(),
        snapshot: snapshot_rx,
        updates: updates_tx,
        actions: actions_tx,
    };

    web::serve(state).await?;

    session_task.abort();
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    let _ = fmt().with_env_filter(env_filter).try_init();
}
