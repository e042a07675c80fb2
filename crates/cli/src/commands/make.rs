// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `elm-watch make`: compile every enabled target once and exit.

use std::collections::HashMap;
use std::sync::Arc;

use ew_compiler::ElmCompilerAdapter;
use ew_core::clock::{Clock, SystemClock};
use ew_core::project::{CompilationMode, Status};
use ew_engine::actions::{get_output_actions, OutputAction};
use ew_engine::state_machine::{advance, Transition};
use ew_engine::{apply_compile_result, apply_postprocess_result, compile, install};
use ew_worker::Pool;

use crate::exit::{ExitError, ExitCode};
use crate::render;

pub async fn run(targets: Vec<String>, debug: bool, optimize: bool) -> Result<(), ExitError> {
    if debug && optimize {
        return Err(ExitError::bad_args("--debug and --optimize cannot be used together"));
    }

    let cwd = std::env::current_dir().map_err(|err| ExitError::bad_args(err.to_string()))?;
    let mut project = super::load_project(&cwd)?;
    super::select_targets(&mut project, &targets);

    let mode = if debug {
        Some(CompilationMode::Debug)
    } else if optimize {
        Some(CompilationMode::Optimize)
    } else {
        None
    };
    if let Some(mode) = mode {
        for (_, _, state) in project.iter_outputs_mut() {
            state.compilation_mode = mode;
        }
    }

    for error in &project.elm_json_errors {
        crate::term::write_line(&render::render_elm_json_error(error));
    }

    let adapter = ElmCompilerAdapter::new();
    let clock = SystemClock;
    let max_concurrent = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);

    for manifest in project.elm_jsons.keys().cloned().collect::<Vec<_>>() {
        if let Some(status) = install::install_dependencies(&adapter, &manifest).await {
            if let Some(outputs) = project.elm_jsons.get_mut(&manifest) {
                for state in outputs.values_mut() {
                    state.status = status.clone();
                    state.dirty = false;
                }
            }
        }
    }

    let worker_script = super::find_worker_script(&project);
    let pool = worker_script.map(Pool::new).map(Arc::new);

    loop {
        let picked = get_output_actions(&project, &HashMap::new(), max_concurrent);
        if picked.is_empty() {
            break;
        }

        for (output, action) in &picked {
            if let Some(state) = project.find_output_mut(output) {
                let transition = match action {
                    OutputAction::Compile => Transition::StartCompile,
                    OutputAction::Postprocess => Transition::StartPostprocess,
                };
                state.status = advance(&state.status, transition);
            }
        }

        let mut handles = Vec::new();
        for (output, action) in picked {
            let Some((manifest, state)) = project.find_output(&output) else { continue };
            let manifest = manifest.clone();
            let state = state.clone();
            match action {
                OutputAction::Compile => {
                    let adapter = adapter.clone();
                    handles.push(tokio::spawn(async move {
                        let status = compile::compile(&adapter, &manifest, &output, &state).await;
                        (output, status, false)
                    }));
                }
                OutputAction::Postprocess => {
                    let Some(pool) = pool.clone() else {
                        continue;
                    };
                    let code = state.pending_code.clone().unwrap_or_default();
                    let now_ms = clock.epoch_ms();
                    handles.push(tokio::spawn(async move {
                        let status = compile::postprocess(&pool, &output, &state, code, now_ms).await;
                        (output, status, true)
                    }));
                }
            }
        }

        for handle in handles {
            let Ok((output, status, was_postprocess)) = handle.await else { continue };
            if let Some(state) = project.find_output_mut(&output) {
                if was_postprocess {
                    apply_postprocess_result(state, status);
                } else {
                    apply_compile_result(state, status, clock.epoch_ms());
                }
            }
        }
    }

    if let Some(pool) = pool {
        pool.terminate().await;
    }

    let mut saw_error = !project.elm_json_errors.is_empty();
    for (_, output, state) in project.iter_outputs() {
        if project.disabled_outputs.contains(output) {
            continue;
        }
        match &state.status {
            Status::Success { .. } => {}
            Status::NotWrittenToDisk | Status::Interrupted => {}
            Status::ElmMakeErrors { errors } => {
                saw_error = true;
                for error in errors {
                    crate::term::write_line(&render::render_compile_error(error));
                }
            }
            other => {
                saw_error = true;
                crate::term::write_line(&format!("-- {} failed: {other:?}", output.display_name()));
            }
        }
    }

    if saw_error {
        Err(ExitError::new(ExitCode::CompileError, "compilation failed"))
    } else {
        Ok(())
    }
}
