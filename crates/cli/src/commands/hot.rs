// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `elm-watch hot`: watch the filesystem, recompile on change, serve live
//! reload over a WebSocket.

use std::sync::Arc;

use ew_core::clock::SystemClock;
use ew_core::model::Model;
use ew_compiler::ElmCompilerAdapter;
use ew_socket::server::{bind, PortStrategy, Server};
use ew_watch::hot::Config;
use ew_watch::{persist, Runtime};
use ew_worker::Pool;

use crate::exit::ExitError;

pub async fn run(targets: Vec<String>, port_override: Option<u16>) -> Result<(), ExitError> {
    let cwd = std::env::current_dir().map_err(|err| ExitError::bad_args(err.to_string()))?;
    let mut project = super::load_project(&cwd)?;
    super::select_targets(&mut project, &targets);

    for error in &project.elm_json_errors {
        crate::term::write_line(&crate::render::render_elm_json_error(error));
    }

    let watch_root = project.watch_root.clone();
    let persisted = persist::load(&watch_root);

    let port_strategy = match (port_override, persisted.port) {
        (Some(port), _) => PortStrategy::Configured(port),
        (None, Some(port)) => PortStrategy::Persisted(port),
        (None, None) => PortStrategy::Ephemeral,
    };
    let (listener, bound_port) =
        bind(port_strategy).await.map_err(|err| ExitError::bad_args(err.to_string()))?;

    crate::term::write_line(&format!(
        "elm-watch hot: watching {} targets in {} (port {bound_port})",
        project.elm_jsons.values().map(|o| o.len()).sum::<usize>(),
        watch_root.display(),
    ));

    let config = Config::default();
    let adapter = ElmCompilerAdapter::new();
    let server = Arc::new(Server::new(config.elm_watch_version.clone()));
    let worker_script = super::find_worker_script(&project);
    let pool = Arc::new(match worker_script {
        Some(script) => Pool::new(script),
        None => Pool::new(std::path::PathBuf::new()),
    });

    let model = Model::new(SystemClock, project);
    let runtime =
        Arc::new(Runtime::new(model, config, adapter, pool, server, watch_root, bound_port));

    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel(1);
    let mut run_handle = tokio::spawn(Arc::clone(&runtime).run(listener, shutdown_rx));

    let interrupted = tokio::select! {
        _ = tokio::signal::ctrl_c() => true,
        result = &mut run_handle => {
            if let Err(err) = result {
                tracing::error!(error = %err, "run loop task panicked");
            }
            false
        }
    };

    if interrupted {
        tracing::info!("received ctrl-c, shutting down");
        let _ = shutdown_tx.send(()).await;
        let _ = run_handle.await;
    }

    Ok(())
}
