// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Msg`/`update` for the `hot` orchestrator — a pure state machine. Every
//! side effect it decides on is returned as data (`ew_core::Effect`) for
//! `run_loop` to execute; completions come back in as another `Msg`.

use std::collections::HashMap;

use ew_core::clock::Clock;
use ew_core::effect::{ClientStatus, Effect};
use ew_core::event::{Event, WatcherEventKind};
use ew_core::id::ConnectionId;
use ew_core::model::{HotState, Model, NextAction};
use ew_core::project::{OutputPath, Status};
use ew_engine::actions::{get_output_actions, OutputAction};
use ew_engine::compile::{apply_compile_result, apply_postprocess_result};
use ew_engine::state_machine::{advance, Transition};
use ew_socket::messages::ClientMessage;

/// Run-time configuration threaded alongside the model; kept out of `Model`
/// itself since it never changes within one `hot` run.
#[derive(Debug, Clone)]
pub struct Config {
    pub max_concurrent: usize,
    pub elm_watch_version: String,
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            elm_watch_version: env!("CARGO_PKG_VERSION").to_string(),
            debounce_ms: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Msg {
    WatcherEvent { kind: WatcherEventKind, path: std::path::PathBuf },
    DebounceTimerFired { id: ew_core::id::TimerId },
    WebSocketConnected { connection: ConnectionId, output: Option<OutputPath> },
    WebSocketDisconnected { connection: ConnectionId },
    WebSocketClientMessage { connection: ConnectionId, message: ClientMessage },
    InstallFinished { manifest: std::path::PathBuf, error: Option<Status> },
    CompileFinished { output: OutputPath, status: Status },
    PostprocessFinished { output: OutputPath, status: Status },
}

/// `update(Msg, Model) -> (Model, Vec<Effect>)`.
pub fn update<C: Clock>(
    msg: Msg,
    mut model: Model<C>,
    config: &Config,
) -> (Model<C>, Vec<Effect>) {
    let mut effects = Vec::new();

    match msg {
        Msg::WatcherEvent { kind, path } => {
            let event = Event::WatcherEvent { date_epoch_ms: model.clock.epoch_ms(), kind, path };
            let pending = match &mut model.hot_state {
                HotState::DebouncePending { pending } => {
                    pending.push(event);
                    pending.clone()
                }
                _ => vec![event],
            };
            model.hot_state = HotState::DebouncePending { pending };
            let id = model.next_timer_id();
            effects.push(Effect::SleepBeforeNextAction { id });
        }

        Msg::DebounceTimerFired { id: _ } => {
            let pending = match std::mem::replace(&mut model.hot_state, HotState::Idle) {
                HotState::DebouncePending { pending } => pending,
                other => {
                    model.hot_state = other;
                    Vec::new()
                }
            };
            match classify(&pending, &model) {
                NextAction::Wait => {}
                NextAction::PrintNonInterestingEvents { events } => {
                    effects.push(Effect::PrintTimeline { events });
                }
                NextAction::Compile { events } => {
                    effects.push(Effect::PrintTimeline { events: events.clone() });
                    mark_dirty_for_events(&mut model, &events);
                }
                NextAction::Restart { events, reasons } => {
                    effects.push(Effect::PrintTimeline { events });
                    effects.push(Effect::ClearScreen);
                    effects.push(Effect::Restart { reasons });
                    model.hot_state = HotState::Restarting;
                    return (model, effects);
                }
            }
            effects.extend(schedule(&mut model, config));
        }

        Msg::WebSocketConnected { connection, output } => {
            let priority = model.clock.epoch_ms();
            model.connections.push(ew_core::project::WebSocketConnection {
                id: connection,
                output: output.clone(),
                priority,
            });
            if let Some(output) = output {
                if let Some((_, state)) = model.project.find_output(&output) {
                    effects.push(Effect::SendStatus {
                        connection,
                        status: status_to_client(&state.status),
                    });
                }
            }
        }

        Msg::WebSocketDisconnected { connection } => {
            model.connections.retain(|c| c.id != connection);
        }

        Msg::WebSocketClientMessage { connection, message } => match message {
            ClientMessage::ChangeCompilationMode { compilation_mode } => {
                if let Some(output) =
                    model.connections.iter().find(|c| c.id == connection).and_then(|c| c.output.clone())
                {
                    if let Some(state) = model.project.find_output_mut(&output) {
                        state.compilation_mode = compilation_mode;
                        state.dirty = true;
                        state.status = requeue(&state.status);
                    }
                    effects.extend(schedule(&mut model, config));
                }
            }
            ClientMessage::FocusedTabAcknowledge => {}
        },

        Msg::InstallFinished { manifest: _, error } => {
            if let Some(status) = error {
                for (_, _, state) in model.project.iter_outputs_mut() {
                    state.status = status.clone();
                }
            }
            effects.extend(schedule(&mut model, config));
        }

        Msg::CompileFinished { output, status } => {
            let now = model.clock.epoch_ms();
            if let Some(state) = model.project.find_output_mut(&output) {
                apply_compile_result(state, status, now);
                if !state.status.is_in_progress() {
                    broadcast_status(&model, &output, &mut effects);
                }
            }
            effects.extend(schedule(&mut model, config));
        }

        Msg::PostprocessFinished { output, status } => {
            if let Some(state) = model.project.find_output_mut(&output) {
                apply_postprocess_result(state, status);
                broadcast_status(&model, &output, &mut effects);
            }
            effects.extend(schedule(&mut model, config));
        }
    }

    if !model.project.iter_outputs().any(|(_, _, s)| s.status.is_in_progress() || s.dirty) {
        model.hot_state = HotState::Idle;
        effects.push(Effect::PersistState);
    }

    (model, effects)
}

/// Decides what a settled batch of filesystem events means for the project:
/// a config file change restarts the whole run; anything else either
/// matches an enabled output's inputs (compile) or doesn't (print and
/// ignore).
fn classify<C: Clock>(events: &[Event], model: &Model<C>) -> NextAction {
    if events.is_empty() {
        return NextAction::Wait;
    }

    let config_changed = events.iter().any(|event| match event {
        Event::WatcherEvent { path, .. } => *path == model.project.config_path,
        _ => false,
    });
    if config_changed {
        return NextAction::Restart {
            events: events.to_vec(),
            reasons: vec!["elm-watch.json changed".to_string()],
        };
    }

    let relevant = events.iter().any(|event| match event {
        Event::WatcherEvent { path, .. } => model
            .project
            .iter_outputs()
            .any(|(_, _, state)| state.inputs.contains(path) || state.all_related_elm_file_paths.contains(path)),
        _ => false,
    });

    if relevant {
        NextAction::Compile { events: events.to_vec() }
    } else {
        NextAction::PrintNonInterestingEvents { events: events.to_vec() }
    }
}

fn mark_dirty_for_events<C: Clock>(model: &mut Model<C>, events: &[Event]) {
    let changed_paths: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::WatcherEvent { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect();
    for (_, _, state) in model.project.iter_outputs_mut() {
        let touches_this_output = changed_paths
            .iter()
            .any(|p| state.inputs.contains(p) || state.all_related_elm_file_paths.contains(p));
        if touches_this_output {
            state.dirty = true;
            state.status = requeue(&state.status);
        }
    }
}

/// Marks a target for rebuild. A target with a compile/postprocess actually
/// running is routed through `Interrupt` instead of straight to `Enqueue` —
/// the process is still executing and must keep its concurrency slot until
/// it reports back, at which point the stale result is discarded and the
/// target re-enqueued (see `apply_compile_result`/`apply_postprocess_result`).
fn requeue(status: &Status) -> Status {
    match status {
        Status::ElmMake | Status::Postprocess => advance(status, Transition::Interrupt),
        _ => advance(status, Transition::Enqueue),
    }
}

fn priorities<C: Clock>(model: &Model<C>) -> HashMap<OutputPath, u64> {
    let mut map = HashMap::new();
    for connection in &model.connections {
        if let Some(output) = &connection.output {
            let entry = map.entry(output.clone()).or_insert(0);
            *entry = (*entry).max(connection.priority);
        }
    }
    map
}

fn schedule<C: Clock>(model: &mut Model<C>, config: &Config) -> Vec<Effect> {
    let mut effects = Vec::new();
    let priorities = priorities(model);
    let picked = get_output_actions(&model.project, &priorities, config.max_concurrent);
    if picked.is_empty() {
        return effects;
    }
    model.hot_state = HotState::Compiling;

    for (output, action) in picked {
        let manifest = match model.project.find_output(&output) {
            Some((manifest, _)) => manifest.clone(),
            None => continue,
        };
        let Some(state) = model.project.find_output_mut(&output) else { continue };
        match action {
            OutputAction::Compile => {
                state.status = advance(&state.status, Transition::StartCompile);
                effects.push(Effect::CompileOutput { manifest, output });
            }
            OutputAction::Postprocess => {
                state.status = advance(&state.status, Transition::StartPostprocess);
                effects.push(Effect::PostprocessOutput { manifest, output });
            }
        }
    }
    effects
}

fn status_to_client(status: &Status) -> ClientStatus {
    match status {
        Status::Success { .. } => ClientStatus::SuccessfullyCompiled,
        status if status.is_error() => ClientStatus::CompileError,
        _ => ClientStatus::Busy,
    }
}

fn broadcast_status<C: Clock>(model: &Model<C>, output: &OutputPath, effects: &mut Vec<Effect>) {
    let Some((_, state)) = model.project.find_output(output) else { return };
    let status = status_to_client(&state.status);
    for connection in model.connections.iter().filter(|c| c.output.as_ref() == Some(output)) {
        effects.push(Effect::SendStatus { connection: connection.id, status: status.clone() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ew_core::clock::FakeClock;
    use ew_core::project::{OutputState, Project};
    use indexmap::IndexMap;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn model_with_one_target() -> Model<FakeClock> {
        let mut outputs = IndexMap::new();
        outputs.insert(
            OutputPath::Real { absolute: PathBuf::from("main.js"), original: "main.js".into() },
            OutputState::new(vec![PathBuf::from("src/Main.elm")], None),
        );
        let project = Project {
            watch_root: PathBuf::from("/project"),
            config_path: PathBuf::from("/project/elm-watch.json"),
            elm_jsons: IndexMap::from([(PathBuf::from("/project/elm.json"), outputs)]),
            elm_json_errors: Vec::new(),
            disabled_outputs: HashSet::new(),
        };
        Model::new(FakeClock::new(), project)
    }

    #[test]
    fn watcher_event_starts_the_debounce_timer() {
        let model = model_with_one_target();
        let msg = Msg::WatcherEvent { kind: WatcherEventKind::Changed, path: PathBuf::from("src/Main.elm") };
        let (model, effects) = update(msg, model, &Config::default());
        assert!(matches!(model.hot_state, HotState::DebouncePending { .. }));
        assert!(effects.iter().any(|e| matches!(e, Effect::SleepBeforeNextAction { .. })));
    }

    #[test]
    fn settled_relevant_event_schedules_a_compile() {
        let model = model_with_one_target();
        let config = Config::default();
        let (model, _) = update(
            Msg::WatcherEvent { kind: WatcherEventKind::Changed, path: PathBuf::from("src/Main.elm") },
            model,
            &config,
        );
        let timer_id = ew_core::id::TimerId::new(0);
        let (model, effects) = update(Msg::DebounceTimerFired { id: timer_id }, model, &config);
        assert!(effects.iter().any(|e| matches!(e, Effect::CompileOutput { .. })));
        assert!(matches!(model.hot_state, HotState::Compiling));
    }

    #[test]
    fn config_file_change_triggers_restart() {
        let model = model_with_one_target();
        let config = Config::default();
        let (model, _) = update(
            Msg::WatcherEvent {
                kind: WatcherEventKind::Changed,
                path: PathBuf::from("/project/elm-watch.json"),
            },
            model,
            &config,
        );
        let timer_id = ew_core::id::TimerId::new(0);
        let (model, effects) = update(Msg::DebounceTimerFired { id: timer_id }, model, &config);
        assert!(matches!(model.hot_state, HotState::Restarting));
        assert!(effects.iter().any(|e| matches!(e, Effect::Restart { .. })));
    }

    #[test]
    fn file_change_during_a_running_compile_interrupts_rather_than_clobbers_it() {
        let mut model = model_with_one_target();
        let output =
            OutputPath::Real { absolute: PathBuf::from("main.js"), original: "main.js".into() };
        model.project.find_output_mut(&output).unwrap().status = Status::ElmMake;

        let events = vec![Event::WatcherEvent {
            date_epoch_ms: 0,
            kind: WatcherEventKind::Changed,
            path: PathBuf::from("src/Main.elm"),
        }];
        mark_dirty_for_events(&mut model, &events);

        let (_, state) = model.project.find_output(&output).unwrap();
        assert_eq!(state.status, Status::Interrupted);
        assert!(state.dirty);
    }

    #[test]
    fn a_compile_finishing_after_being_interrupted_is_requeued_not_applied() {
        let mut model = model_with_one_target();
        let output =
            OutputPath::Real { absolute: PathBuf::from("main.js"), original: "main.js".into() };
        model.project.find_output_mut(&output).unwrap().status = Status::Interrupted;
        let config = Config::default();

        let (model, effects) = update(
            Msg::CompileFinished {
                output: output.clone(),
                status: Status::Success { code: vec![1], compiled_timestamp: 1 },
            },
            model,
            &config,
        );

        // The stale "Success" never sticks: the target is requeued and
        // immediately picked back up for a fresh compile instead.
        assert!(effects.iter().any(|e| matches!(e, Effect::CompileOutput { .. })));
        let (_, state) = model.project.find_output(&output).unwrap();
        assert_eq!(state.status, Status::ElmMake);
    }
}
