// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects the run loop must perform on behalf of `update()`.
//!
//! `update(Msg, Model) -> (Model, Vec<Effect>)` is pure; every side effect —
//! spawning the compiler, writing to a socket, persisting state — is
//! described here and executed by `ew-watch::run_loop`, whose completion
//! posts a new `Msg` back onto the queue.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::event::Event;
use crate::id::{ConnectionId, TimerId};
use crate::project::OutputPath;

/// Status pushed to a connected browser client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum ClientStatus {
    Busy,
    SuccessfullyCompiled,
    CompileError,
    ClientError { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Run `elm install`-equivalent dependency resolution for one manifest.
    InstallDependencies { manifest: PathBuf },

    /// Run the compiler for one target.
    CompileOutput { manifest: PathBuf, output: OutputPath },

    /// Run the configured postprocess command (worker pool or external
    /// executable) for one target, whose compile already succeeded.
    PostprocessOutput { manifest: PathBuf, output: OutputPath },

    /// Start (or reset) the 10ms debounce timer.
    SleepBeforeNextAction { id: TimerId },

    /// Cancel a previously-started timer.
    CancelTimer { id: TimerId },

    /// Clear the terminal before a restart.
    ClearScreen,

    /// Print informational timeline events (file saves that didn't trigger
    /// a rebuild, websocket connects) without starting a compile.
    PrintTimeline { events: Vec<Event> },

    /// Tear down and relaunch the whole hot run.
    Restart { reasons: Vec<String> },

    /// Send one status message to one connected client.
    SendStatus { connection: ConnectionId, status: ClientStatus },

    /// Rewrite the persisted port/compilation-mode state file.
    PersistState,

    /// Exit the process (one-shot `make` run, or `hot` run told to stop).
    Exit { code: i32 },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::InstallDependencies { .. } => "install_dependencies",
            Effect::CompileOutput { .. } => "compile_output",
            Effect::PostprocessOutput { .. } => "postprocess_output",
            Effect::SleepBeforeNextAction { .. } => "sleep_before_next_action",
            Effect::CancelTimer { .. } => "cancel_timer",
            Effect::ClearScreen => "clear_screen",
            Effect::PrintTimeline { .. } => "print_timeline",
            Effect::Restart { .. } => "restart",
            Effect::SendStatus { .. } => "send_status",
            Effect::PersistState => "persist_state",
            Effect::Exit { .. } => "exit",
        }
    }

    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::InstallDependencies { manifest } => {
                vec![("manifest", manifest.display().to_string())]
            }
            Effect::CompileOutput { manifest, output } => vec![
                ("manifest", manifest.display().to_string()),
                ("output", output.display_name().to_string()),
            ],
            Effect::PostprocessOutput { manifest, output } => vec![
                ("manifest", manifest.display().to_string()),
                ("output", output.display_name().to_string()),
            ],
            Effect::SleepBeforeNextAction { id } => vec![("timer_id", id.0.to_string())],
            Effect::CancelTimer { id } => vec![("timer_id", id.0.to_string())],
            Effect::ClearScreen => vec![],
            Effect::PrintTimeline { events } => vec![("count", events.len().to_string())],
            Effect::Restart { reasons } => vec![("reasons", reasons.join("; "))],
            Effect::SendStatus { connection, .. } => vec![("connection", connection.to_string())],
            Effect::PersistState => vec![],
            Effect::Exit { code } => vec![("code", code.to_string())],
        }
    }

    /// Whether to log both "started" and "completed" for this effect, or
    /// collapse to a single "executed" line — the frequent, low-value
    /// effects (timers) stay terse.
    pub fn verbose(&self) -> bool {
        !matches!(self, Effect::SleepBeforeNextAction { .. } | Effect::CancelTimer { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_output_fields_include_manifest_and_output() {
        let effect = Effect::CompileOutput {
            manifest: PathBuf::from("elm.json"),
            output: OutputPath::Null,
        };
        let fields = effect.fields();
        assert!(fields.iter().any(|(k, _)| *k == "manifest"));
        assert!(fields.iter().any(|(k, v)| *k == "output" && v == "(null)"));
    }
}
