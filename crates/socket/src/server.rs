// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket accept loop and dispatch-detachable event queue.
//!
//! Shaped after the daemon's Unix+TCP dual accept loop: one task per
//! listener, one spawned task per connection, errors logged rather than
//! propagated out of the loop. Outbound events are queued until a dispatcher
//! attaches (`set_dispatch`) so a `hot` restart can briefly detach without
//! dropping client messages that arrive mid-restart.

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response as HandshakeResponse};
use tokio_tungstenite::tungstenite::Message as WsMessage;

use ew_core::id::ConnectionId;

use crate::connect_url::{self, ConnectUrl};
use crate::messages::{ClientMessage, ServerMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortStrategy {
    /// Reuse a port persisted from a previous run; falls back to an
    /// ephemeral port if it's no longer free.
    Persisted(u16),
    /// A port the user explicitly configured; failing to bind it is an
    /// error rather than a silent fallback.
    Configured(u16),
    /// Let the OS choose.
    Ephemeral,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configured port {port} is not available: {source}")]
    PortUnavailable { port: u16, source: std::io::Error },
    #[error("failed to bind an ephemeral port: {0}")]
    BindFailed(std::io::Error),
}

/// Binds according to the given strategy, returning the listener and the
/// port actually bound (which the caller should persist).
pub async fn bind(strategy: PortStrategy) -> Result<(TcpListener, u16), ServerError> {
    let addr_for = |port: u16| SocketAddr::from(([127, 0, 0, 1], port));
    match strategy {
        PortStrategy::Ephemeral => {
            let listener =
                TcpListener::bind(addr_for(0)).await.map_err(ServerError::BindFailed)?;
            let port = listener.local_addr().map_err(ServerError::BindFailed)?.port();
            Ok((listener, port))
        }
        PortStrategy::Configured(port) => {
            let listener = TcpListener::bind(addr_for(port))
                .await
                .map_err(|source| ServerError::PortUnavailable { port, source })?;
            Ok((listener, port))
        }
        PortStrategy::Persisted(port) => match TcpListener::bind(addr_for(port)).await {
            Ok(listener) => Ok((listener, port)),
            Err(_) => bind(PortStrategy::Ephemeral).await,
        },
    }
}

/// One event a connection handler produces for the orchestrator.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    Connected { connection: ConnectionId, connect_url: ConnectUrl },
    Disconnected { connection: ConnectionId },
    ClientMessage { connection: ConnectionId, message: ClientMessage },
    RejectedConnect { reason: String },
}

enum DispatchState {
    Attached(mpsc::UnboundedSender<ServerEvent>),
    Detached(Vec<ServerEvent>),
}

/// Queues `ServerEvent`s until a consumer attaches, and drains the backlog
/// the moment one does — so events during a brief `hot` restart aren't lost.
pub struct Dispatcher {
    state: Mutex<DispatchState>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self { state: Mutex::new(DispatchState::Detached(Vec::new())) }
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_dispatch(&self, tx: mpsc::UnboundedSender<ServerEvent>) {
        let mut state = self.state.lock();
        if let DispatchState::Detached(queued) = std::mem::replace(&mut *state, DispatchState::Detached(Vec::new())) {
            for event in queued {
                let _ = tx.send(event);
            }
        }
        *state = DispatchState::Attached(tx);
    }

    pub fn unset_dispatch(&self) {
        *self.state.lock() = DispatchState::Detached(Vec::new());
    }

    pub fn emit(&self, event: ServerEvent) {
        let mut state = self.state.lock();
        match &mut *state {
            DispatchState::Attached(tx) => {
                if tx.send(event).is_err() {
                    *state = DispatchState::Detached(Vec::new());
                }
            }
            DispatchState::Detached(queued) => queued.push(event),
        }
    }
}

struct ConnectionHandle {
    outgoing: mpsc::UnboundedSender<WsMessage>,
}

/// Tracks live connections and lets the engine send/broadcast to them.
pub struct Server {
    dispatcher: Arc<Dispatcher>,
    connections: Arc<Mutex<HashMap<ConnectionId, ConnectionHandle>>>,
    next_connection_id: AtomicU64,
    elm_watch_version: String,
}

impl Server {
    pub fn new(elm_watch_version: impl Into<String>) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new()),
            connections: Arc::new(Mutex::new(HashMap::new())),
            next_connection_id: AtomicU64::new(0),
            elm_watch_version: elm_watch_version.into(),
        }
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Accepts connections until the listener is closed. Call this inside a
    /// spawned task; it never returns under normal operation.
    pub async fn run(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let server = Arc::clone(&self);
                    tokio::spawn(async move {
                        server.handle_connection(stream, addr).await;
                    });
                }
                Err(err) => {
                    tracing::error!(error = %err, "websocket accept error");
                }
            }
        }
    }

    async fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let captured_uri = Arc::new(Mutex::new(None));
        let captured_for_callback = Arc::clone(&captured_uri);
        let callback = move |req: &Request, response: HandshakeResponse| {
            *captured_for_callback.lock() = Some(req.uri().to_string());
            Ok(response)
        };

        let ws_stream = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
            Ok(ws) => ws,
            Err(err) => {
                tracing::debug!(%addr, error = %err, "websocket handshake failed");
                return;
            }
        };

        let uri = captured_uri.lock().clone().unwrap_or_default();
        let connect_url = match connect_url::parse(&uri) {
            Ok(url) if url.elm_watch_version == self.elm_watch_version => url,
            Ok(url) => {
                self.dispatcher.emit(ServerEvent::RejectedConnect {
                    reason: format!(
                        "client elm-watch version {} does not match server version {}",
                        url.elm_watch_version, self.elm_watch_version
                    ),
                });
                return;
            }
            Err(err) => {
                self.dispatcher.emit(ServerEvent::RejectedConnect { reason: err.to_string() });
                return;
            }
        };

        let connection = ConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::SeqCst));
        let (mut write, mut read) = ws_stream.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<WsMessage>();
        self.connections.lock().insert(connection, ConnectionHandle { outgoing: outgoing_tx });

        self.dispatcher.emit(ServerEvent::Connected { connection, connect_url });

        let writer_task = tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                if write.send(message).await.is_err() {
                    break;
                }
            }
        });

        while let Some(frame) = read.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => self.dispatcher.emit(ServerEvent::ClientMessage { connection, message }),
                    Err(err) => tracing::warn!(%connection, error = %err, "unparseable client message"),
                },
                Ok(WsMessage::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }

        self.connections.lock().remove(&connection);
        self.dispatcher.emit(ServerEvent::Disconnected { connection });
        writer_task.abort();
    }

    pub fn send(&self, connection: ConnectionId, message: &ServerMessage) {
        let connections = self.connections.lock();
        if let Some(handle) = connections.get(&connection) {
            if let Ok(text) = serde_json::to_string(message) {
                let _ = handle.outgoing.send(WsMessage::Text(text));
            }
        }
    }

    pub fn broadcast(&self, targets: &[ConnectionId], message: &ServerMessage) {
        for connection in targets {
            self.send(*connection, message);
        }
    }
}
