use crate::config::AppConfig;
use crate::panel::{Panel, ViewUpdate};
use crate::session::UiAction;
use crate::ui;
use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use axum::{
    Json, Router,
    extract::{State, WebSocketUpgrade},
    response::{Html, IntoResponse},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub snapshot: watch::Receiver<Option<Panel>>,
    pub updates: broadcast::Sender<ViewUpdate>,
    pub actions: mpsc::UnboundedSender<UiAction>,
}

impl AppState {
    fn station_html(&self) -> String {
        self.snapshot
            .borrow()
            .as_ref()
            .map(ui::render_station)
            .unwrap_or_default()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/panel", get(panel))
        .route("/ws/panel", get(ws_panel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState) -> Result<()> {
    let addr: SocketAddr = state.config.http_bind.parse()?;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Panel listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(graceful_shutdown())
        .await?;

    Ok(())
}

async fn graceful_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down http server");
}

async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot.borrow().clone();
    Html(ui::render_html(&state.config.krad_uri(), snapshot.as_ref()))
}

async fn panel(State(state): State<AppState>) -> Json<Option<Panel>> {
    let snapshot = state.snapshot.borrow().clone();
    Json(snapshot)
}

async fn ws_panel(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: AppState) {
    let mut rx = state.updates.subscribe();
    if send_update(&mut socket, &reset(&state)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            update = rx.recv() => {
                let update = match update {
                    Ok(update) => update,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Panel viewer lagged by {skipped} updates, resetting");
                        reset(&state)
                    }
                    Err(RecvError::Closed) => break,
                };
                if send_update(&mut socket, &update).await.is_err() {
                    break;
                }
            }
            frame = socket.recv() => match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<UiAction>(&text) {
                    Ok(action) => {
                        if state.actions.send(action).is_err() {
                            break;
                        }
                    }
                    Err(err) => tracing::debug!("Ignoring panel action {text}: {err}"),
                },
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

fn reset(state: &AppState) -> ViewUpdate {
    ViewUpdate::Reset {
        html: state.station_html(),
    }
}

async fn send_update(socket: &mut WebSocket, update: &ViewUpdate) -> Result<(), ()> {
    let payload = serde_json::to_string(update).map_err(|_| ())?;
    socket.send(Message::Text(payload)).await.map_err(|_| ())
}
