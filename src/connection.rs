//! Control socket to the Krad server.
//!
//! `Connection` tracks the connected/connecting flags and owns at most one
//! attached socket. Sockets report their lifecycle as [`SocketEvent`]s tagged
//! with the generation they were opened under, so events from a socket that
//! has since been discarded never reach the session.

use crate::protocol::Command;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("socket task is gone")]
    SocketClosed,
    #[error("invalid endpoint {uri}: {reason}")]
    InvalidEndpoint { uri: String, reason: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum SocketEventKind {
    Open,
    Message(String),
    Close(Option<String>),
    Error(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SocketEvent {
    pub generation: u64,
    pub kind: SocketEventKind,
}

/// Where a socket delivers its lifecycle events.
#[derive(Clone, Debug)]
pub struct EventSender {
    generation: u64,
    tx: mpsc::UnboundedSender<SocketEvent>,
}

impl EventSender {
    pub fn emit(&self, kind: SocketEventKind) {
        let _ = self.tx.send(SocketEvent {
            generation: self.generation,
            kind,
        });
    }
}

pub trait Socket: Send {
    fn send_text(&mut self, text: String) -> Result<(), ConnectionError>;
    fn close(&mut self);
}

pub trait Connector: Send {
    type Socket: Socket;

    fn open(&mut self, uri: &str, protocol: &str, events: EventSender) -> Self::Socket;
}

/// Commands queued for the socket driver task.
enum Outgoing {
    Text(String),
    Close,
}

pub struct WsSocket {
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl Socket for WsSocket {
    fn send_text(&mut self, text: String) -> Result<(), ConnectionError> {
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| ConnectionError::SocketClosed)
    }

    fn close(&mut self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

#[derive(Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    type Socket = WsSocket;

    fn open(&mut self, uri: &str, protocol: &str, events: EventSender) -> WsSocket {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        tokio::spawn(drive_socket(
            uri.to_string(),
            protocol.to_string(),
            events,
            outgoing_rx,
        ));
        WsSocket {
            outgoing: outgoing_tx,
        }
    }
}

async fn drive_socket(
    uri: String,
    protocol: String,
    events: EventSender,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
) {
    let request = match build_request(&uri, &protocol) {
        Ok(request) => request,
        Err(err) => {
            events.emit(SocketEventKind::Error(err.to_string()));
            return;
        }
    };

    let stream = match connect_async(request).await {
        Ok((stream, _)) => stream,
        Err(err) => {
            events.emit(SocketEventKind::Error(err.to_string()));
            return;
        }
    };
    events.emit(SocketEventKind::Open);

    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            cmd = outgoing.recv() => match cmd {
                Some(Outgoing::Text(text)) => {
                    if let Err(err) = sink.send(Message::Text(text)).await {
                        events.emit(SocketEventKind::Error(err.to_string()));
                        break;
                    }
                }
                // Dropping the socket handle counts as a close.
                Some(Outgoing::Close) | None => {
                    let _ = sink.close().await;
                    break;
                }
            },
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => events.emit(SocketEventKind::Message(text)),
                Some(Ok(Message::Close(frame))) => {
                    events.emit(SocketEventKind::Close(frame.map(|f| f.reason.to_string())));
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    events.emit(SocketEventKind::Error(err.to_string()));
                    break;
                }
                None => {
                    events.emit(SocketEventKind::Close(None));
                    break;
                }
            },
        }
    }
}

fn build_request(
    uri: &str,
    protocol: &str,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, ConnectionError> {
    let invalid = |reason: String| ConnectionError::InvalidEndpoint {
        uri: uri.to_string(),
        reason,
    };
    let mut request = uri
        .into_client_request()
        .map_err(|err| invalid(err.to_string()))?;
    let value = HeaderValue::from_str(protocol).map_err(|err| invalid(err.to_string()))?;
    request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
    Ok(request)
}

pub struct Connection<C: Connector> {
    uri: String,
    protocol: String,
    connected: bool,
    connecting: bool,
    generation: u64,
    connector: C,
    socket: Option<C::Socket>,
    events: mpsc::UnboundedSender<SocketEvent>,
}

impl<C: Connector> Connection<C> {
    pub fn new(
        uri: impl Into<String>,
        protocol: impl Into<String>,
        connector: C,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) -> Self {
        let uri = uri.into();
        tracing::debug!("Created connection for {uri}");
        Self {
            uri,
            protocol: protocol.into(),
            connected: false,
            connecting: false,
            generation: 0,
            connector,
            socket: None,
            events,
        }
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[cfg(test)]
    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    #[cfg(test)]
    pub fn handlers_attached(&self) -> bool {
        self.socket.is_some()
    }

    pub fn connect(&mut self) {
        if self.connected {
            tracing::debug!("Tried to connect when already connected");
            return;
        }
        if self.connecting {
            tracing::debug!("Tried to connect but in the process of connecting");
            return;
        }

        self.connecting = true;
        self.generation += 1;
        tracing::info!("Connecting to {} ({})", self.uri, self.protocol);
        let events = EventSender {
            generation: self.generation,
            tx: self.events.clone(),
        };
        let socket = self.connector.open(&self.uri, &self.protocol, events);
        self.socket = Some(socket);
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
        self.connecting = false;
        tracing::info!("Disconnecting from {}", self.uri);
        if let Some(mut socket) = self.socket.take() {
            socket.close();
        }
    }

    /// Filters out events that belong to a socket that is no longer attached.
    pub fn accept(&self, event: SocketEvent) -> Option<SocketEventKind> {
        if self.socket.is_none() || event.generation != self.generation {
            tracing::debug!(
                "Dropping stale socket event from generation {}",
                event.generation
            );
            return None;
        }
        Some(event.kind)
    }

    pub fn on_open(&mut self) {
        self.connected = true;
        self.connecting = false;
        tracing::info!("Connected to {}", self.uri);
    }

    pub fn on_close(&mut self, reason: Option<&str>) {
        self.connected = false;
        self.connecting = false;
        self.socket = None;
        match reason {
            Some(reason) if !reason.is_empty() => {
                tracing::info!("Disconnected from {}: {reason}", self.uri)
            }
            _ => tracing::info!("Disconnected from {}", self.uri),
        }
    }

    pub fn on_message(&self, text: &str) {
        tracing::debug!("Got message: {text}");
    }

    pub fn on_error(&mut self, reason: &str) {
        tracing::warn!("Socket error on {}: {reason}", self.uri);
        self.disconnect();
    }

    pub fn send(&mut self, message: String) {
        if !self.connected {
            tracing::debug!("Not connected, dropping: {message}");
            return;
        }
        let Some(socket) = self.socket.as_mut() else {
            tracing::debug!("No socket attached, dropping: {message}");
            return;
        };
        tracing::debug!("Sending {message}");
        if let Err(err) = socket.send_text(message) {
            tracing::warn!("Send failed: {err}");
        }
    }
}

/// Something the panel can hand encoded commands to.
pub trait CommandSink {
    fn send_command(&mut self, command: &Command);
}

impl<C: Connector> CommandSink for Connection<C> {
    fn send_command(&mut self, command: &Command) {
        match serde_json::to_string(command) {
            Ok(text) => self.send(text),
            Err(err) => tracing::warn!("Failed to encode command: {err}"),
        }
    }
}

/// Exponential backoff for reconnect attempts. `max_attempts == 0` disables
/// reconnecting altogether.
#[derive(Clone, Debug)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }

    /// Delay before attempt number `attempt` (zero based), or `None` once
    /// the budget is spent.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt.min(16));
        let backoff = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let jitter_ms = (backoff.as_millis() as u64 / 10).max(1);
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms));
        Some((backoff + jitter).min(self.max_delay))
    }
}
