//! Owns the connection and the panel and runs them on one task.

use crate::connection::{Connection, Connector, ReconnectPolicy, SocketEvent, SocketEventKind};
use crate::panel::{Panel, ViewUpdate};
use crate::protocol::LinkControl;
use serde::Deserialize;
use std::future::pending;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, sleep_until};

/// A slider move coming from a browser.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UiAction {
    Portgroup {
        portgroup_name: String,
        control_name: String,
        value: i64,
    },
    Link {
        link_num: u32,
        control_name: LinkControl,
        value: i64,
    },
}

pub struct Session<C: Connector> {
    connection: Connection<C>,
    panel: Option<Panel>,
    policy: ReconnectPolicy,
    attempts: u32,
    reconnect_at: Option<Instant>,
    updates: broadcast::Sender<ViewUpdate>,
    snapshot: watch::Sender<Option<Panel>>,
}

impl<C: Connector> Session<C> {
    pub fn new(
        connection: Connection<C>,
        policy: ReconnectPolicy,
        updates: broadcast::Sender<ViewUpdate>,
        snapshot: watch::Sender<Option<Panel>>,
    ) -> Self {
        Self {
            connection,
            panel: None,
            policy,
            attempts: 0,
            reconnect_at: None,
            updates,
            snapshot,
        }
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection<C> {
        &self.connection
    }

    #[cfg(test)]
    pub fn panel(&self) -> Option<&Panel> {
        self.panel.as_ref()
    }

    pub fn connect(&mut self) {
        self.connection.connect();
    }

    pub fn handle_socket_event(&mut self, event: SocketEvent) {
        let Some(kind) = self.connection.accept(event) else {
            return;
        };
        match kind {
            SocketEventKind::Open => {
                self.connection.on_open();
                self.attempts = 0;
                self.reconnect_at = None;
                self.panel = Some(Panel::new());
            }
            SocketEventKind::Message(text) => {
                self.connection.on_message(&text);
                match self.panel.as_mut() {
                    Some(panel) => {
                        if let Err(err) = panel.got_messages(&text) {
                            tracing::warn!("Dropping malformed message batch: {err}");
                        }
                    }
                    None => tracing::debug!("Message arrived without a panel"),
                }
            }
            SocketEventKind::Close(reason) => {
                self.connection.on_close(reason.as_deref());
                self.retire_panel();
                self.schedule_reconnect();
            }
            SocketEventKind::Error(reason) => {
                self.connection.on_error(&reason);
                self.retire_panel();
                self.schedule_reconnect();
            }
        }
        self.publish();
    }

    pub fn handle_action(&mut self, action: UiAction) {
        let Some(panel) = self.panel.as_mut() else {
            tracing::debug!("Ignoring {action:?}, no station");
            return;
        };
        match action {
            UiAction::Portgroup {
                portgroup_name,
                control_name,
                value,
            } => panel.update_portgroup(&mut self.connection, &portgroup_name, &control_name, value),
            UiAction::Link {
                link_num,
                control_name,
                value,
            } => panel.update_link(&mut self.connection, link_num, control_name, value),
        }
        self.publish();
    }

    fn retire_panel(&mut self) {
        if let Some(mut panel) = self.panel.take() {
            panel.destroy();
            for update in panel.take_updates() {
                let _ = self.updates.send(update);
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        match self.policy.delay(self.attempts) {
            Some(delay) => {
                self.attempts += 1;
                tracing::info!(
                    "Reconnecting in {:?} (attempt {}/{})",
                    delay,
                    self.attempts,
                    self.policy.max_attempts
                );
                self.reconnect_at = Some(Instant::now() + delay);
            }
            None if self.policy.max_attempts > 0 => {
                tracing::warn!("Giving up after {} reconnect attempts", self.attempts);
            }
            None => {}
        }
    }

    fn publish(&mut self) {
        if let Some(panel) = self.panel.as_mut() {
            for update in panel.take_updates() {
                // No subscribers is fine; the snapshot still carries the state.
                let _ = self.updates.send(update);
            }
        }
        self.snapshot.send_replace(self.panel.clone());
    }

    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SocketEvent>,
        mut actions: mpsc::UnboundedReceiver<UiAction>,
    ) {
        self.connect();
        loop {
            let reconnect_at = self.reconnect_at;
            tokio::select! {
                Some(event) = events.recv() => self.handle_socket_event(event),
                action = actions.recv() => match action {
                    Some(action) => self.handle_action(action),
                    // The web front is gone.
                    None => break,
                },
                _ = wait_until(reconnect_at) => {
                    self.reconnect_at = None;
                    self.connect();
                }
            }
        }
        self.connection.disconnect();
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
