// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires `Effect`s to their real executors and feeds completions back into
//! `update` as new `Msg`s — the only impure corner of the `hot` run loop.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use ew_compiler::CompilerAdapter;
use ew_core::clock::Clock;
use ew_core::effect::Effect;
use ew_core::id::TimerId;
use ew_core::model::Model;
use ew_engine::{compile, install};
use ew_socket::server::{Server, ServerEvent};
use ew_socket::messages::ServerMessage;
use ew_worker::Pool;

use crate::hot::{update, Config, Msg};
use crate::persist::{self, PersistedState};
use crate::watcher::{self, WatchedChange};

/// Everything the run loop needs beyond the pure state machine.
pub struct Runtime<A: CompilerAdapter, C: Clock> {
    /// `None` only for the instant inside `apply` between taking ownership
    /// via `Option::take` and putting the updated value back.
    pub model: Mutex<Option<Model<C>>>,
    pub config: Config,
    pub adapter: A,
    pub pool: Arc<Pool>,
    pub server: Arc<Server>,
    pub watch_root: PathBuf,
    pub bound_port: u16,
    installed_manifests: Mutex<HashSet<PathBuf>>,
}

impl<A: CompilerAdapter, C: Clock> Runtime<A, C> {
    pub fn new(
        model: Model<C>,
        config: Config,
        adapter: A,
        pool: Arc<Pool>,
        server: Arc<Server>,
        watch_root: PathBuf,
        bound_port: u16,
    ) -> Self {
        Self {
            model: Mutex::new(Some(model)),
            config,
            adapter,
            pool,
            server,
            watch_root,
            bound_port,
            installed_manifests: Mutex::new(HashSet::new()),
        }
    }

    /// Runs until `shutdown` fires. Spawns the WebSocket accept loop, the
    /// filesystem watcher, and the dispatch loop, then drives `update` off a
    /// single `Msg` channel so state mutation only ever happens on this task.
    pub async fn run(
        self: Arc<Self>,
        listener: tokio::net::TcpListener,
        mut shutdown: mpsc::Receiver<()>,
    ) {
        tokio::spawn(Arc::clone(&self.server).run(listener));

        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<Msg>();

        let (watch_tx, mut watch_rx) = mpsc::unbounded_channel::<WatchedChange>();
        let _watcher = match watcher::start(&self.watch_root, watch_tx) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                tracing::error!(error = %err, "failed to start filesystem watcher");
                None
            }
        };
        {
            let msg_tx = msg_tx.clone();
            tokio::spawn(async move {
                while let Some(change) = watch_rx.recv().await {
                    let _ = msg_tx.send(Msg::WatcherEvent { kind: change.kind, path: change.path });
                }
            });
        }

        let (server_tx, mut server_rx) = mpsc::unbounded_channel::<ServerEvent>();
        self.server.dispatcher().set_dispatch(server_tx);
        {
            let msg_tx = msg_tx.clone();
            let project = self.model.lock().as_ref().expect("model missing").project.clone();
            tokio::spawn(async move {
                while let Some(event) = server_rx.recv().await {
                    if let Some(msg) = translate_server_event(event, &project) {
                        let _ = msg_tx.send(msg);
                    }
                }
            });
        }

        loop {
            tokio::select! {
                Some(msg) = msg_rx.recv() => {
                    let effects = self.apply(msg);
                    for effect in effects {
                        self.clone().dispatch(effect, msg_tx.clone());
                    }
                }
                _ = shutdown.recv() => {
                    self.pool.terminate().await;
                    return;
                }
                else => return,
            }
        }
    }

    fn apply(&self, msg: Msg) -> Vec<Effect> {
        let mut guard = self.model.lock();
        let model = guard.take().expect("model missing between run loop ticks");
        let (next, effects) = update(msg, model, &self.config);
        *guard = Some(next);
        effects
    }

    fn dispatch(self: Arc<Self>, effect: Effect, msg_tx: mpsc::UnboundedSender<Msg>) {
        match effect {
            Effect::InstallDependencies { manifest } => {
                tokio::spawn(async move {
                    {
                        let mut installed = self.installed_manifests.lock();
                        if !installed.insert(manifest.clone()) {
                            return;
                        }
                    }
                    let error = install::install_dependencies(&self.adapter, &manifest).await;
                    let _ = msg_tx.send(Msg::InstallFinished { manifest, error });
                });
            }
            Effect::CompileOutput { manifest, output } => {
                tokio::spawn(async move {
                    let state = {
                        let guard = self.model.lock();
                        let model = guard.as_ref().expect("model missing");
                        model.project.find_output(&output).map(|(_, s)| s.clone())
                    };
                    let Some(state) = state else { return };
                    let status = compile::compile(&self.adapter, &manifest, &output, &state).await;
                    let _ = msg_tx.send(Msg::CompileFinished { output, status });
                });
            }
            Effect::PostprocessOutput { manifest: _, output } => {
                let pool = Arc::clone(&self.pool);
                tokio::spawn(async move {
                    let (state, code, compiled_timestamp) = {
                        let guard = self.model.lock();
                        let model = guard.as_ref().expect("model missing");
                        let Some((_, state)) = model.project.find_output(&output) else { return };
                        let code = state.pending_code.clone().unwrap_or_default();
                        (state.clone(), code, model.clock.epoch_ms())
                    };
                    let status =
                        compile::postprocess(&pool, &output, &state, code, compiled_timestamp).await;
                    let _ = msg_tx.send(Msg::PostprocessFinished { output, status });
                });
            }
            Effect::SleepBeforeNextAction { id } => {
                let debounce_ms = self.config.debounce_ms;
                tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_millis(debounce_ms)).await;
                    let _ = msg_tx.send(Msg::DebounceTimerFired { id });
                });
            }
            Effect::CancelTimer { id: _ } => {}
            Effect::ClearScreen => {
                print!("\x1b[2J\x1b[H");
            }
            Effect::PrintTimeline { events } => {
                for event in events {
                    tracing::info!(?event, "timeline event");
                }
            }
            Effect::Restart { reasons } => {
                tracing::info!(reasons = ?reasons, "restarting hot run");
            }
            Effect::SendStatus { connection, status } => {
                self.server.send(connection, &ServerMessage::StatusChanged { status });
            }
            Effect::PersistState => {
                let state = {
                    let guard = self.model.lock();
                    let model = guard.as_ref().expect("model missing");
                    let mut modes = std::collections::HashMap::new();
                    for (_, path, state) in model.project.iter_outputs() {
                        modes.insert(path.display_name().to_string(), state.compilation_mode);
                    }
                    PersistedState { port: Some(self.bound_port), compilation_modes: modes }
                };
                persist::save(&self.watch_root, &state);
            }
            Effect::Exit { code } => {
                tracing::info!(code, "exiting");
            }
        }
    }

    pub fn next_timer_id(&self) -> TimerId {
        self.model.lock().as_mut().expect("model missing").next_timer_id()
    }
}

fn translate_server_event(
    event: ServerEvent,
    project: &ew_core::project::Project,
) -> Option<Msg> {
    match event {
        ServerEvent::Connected { connection, connect_url } => {
            let output = project.find_by_display_name(&connect_url.target_name).cloned();
            Some(Msg::WebSocketConnected { connection, output })
        }
        ServerEvent::Disconnected { connection } => Some(Msg::WebSocketDisconnected { connection }),
        ServerEvent::ClientMessage { connection, message } => {
            Some(Msg::WebSocketClientMessage { connection, message })
        }
        ServerEvent::RejectedConnect { reason } => {
            tracing::warn!(reason = %reason, "rejected websocket connect");
            None
        }
    }
}
