// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project and per-target data model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::id::ConnectionId;

/// Either a real absolute output path, or the "null" typecheck-only sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum OutputPath {
    /// A real artifact path. `original` preserves the user's written form
    /// (possibly relative, possibly containing `~`) for display and for
    /// matching against the WebSocket connect URL's `output` parameter.
    Real { absolute: PathBuf, original: String },
    /// Compile-only target; no artifact is written to disk.
    Null,
}

impl OutputPath {
    pub fn is_null(&self) -> bool {
        matches!(self, OutputPath::Null)
    }

    /// The string the WebSocket client names this target by.
    pub fn display_name(&self) -> &str {
        match self {
            OutputPath::Real { original, .. } => original,
            OutputPath::Null => "(null)",
        }
    }
}

/// Compilation mode, settable per-target at runtime via the WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilationMode {
    Standard,
    Debug,
    Optimize,
}

impl Default for CompilationMode {
    fn default() -> Self {
        CompilationMode::Standard
    }
}

impl CompilationMode {
    pub fn as_flag(&self) -> Option<&'static str> {
        match self {
            CompilationMode::Standard => None,
            CompilationMode::Debug => Some("--debug"),
            CompilationMode::Optimize => Some("--optimize"),
        }
    }
}

/// One rendered compiler error, already extracted from a structured report.
/// De-duplicated by `rendered` text when a batch is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileError {
    pub path: Option<PathBuf>,
    pub title: String,
    pub rendered: String,
}

/// How a child process that didn't run to a clean exit failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    ExitCode(i32),
    Signal(String),
    Unknown,
}

/// The current terminal or in-progress result for one target.
///
/// `QueuedFor*`/`ElmMake`/`Postprocess` are only ever observed *within* one
/// `update` step of the hot orchestrator — by the time control returns to
/// the caller, the status has already advanced past them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum Status {
    NotWrittenToDisk,
    QueuedForElmMake,
    ElmMake,
    QueuedForPostprocess,
    Postprocess,
    Interrupted,
    Success { code: Vec<u8>, compiled_timestamp: u64 },

    // -- compile-launch errors --
    ElmNotFoundError,
    CommandNotFoundError { command: String },
    OtherSpawnError { message: String },
    CreatingDummyFailed { message: String },

    // -- compile-result errors --
    UnexpectedElmMakeOutput { stdout: String, stderr: String },
    ElmMakeJsonParseError { message: String },
    ElmMakeErrorGeneral { title: String, message: String },
    ElmMakeErrors { errors: Vec<CompileError> },
    StdoutDecodeError { message: String },

    // -- postprocess errors --
    PostprocessNonZeroExit { reason: ExitReason, stderr: String },
    PostprocessStdinWriteError { message: String },
    ElmWatchNodeMissingScript,
    ElmWatchNodeImportError { message: String },
    ElmWatchNodeDefaultExportNotFunction { actual_type: String },
    ElmWatchNodeRunError { message: String },
    ElmWatchNodeBadReturnValue { actual_type: String },

    // -- generic decode error (corrupt persisted state, malformed IPC) --
    DecodeError { message: String },
}

impl Status {
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            Status::NotWrittenToDisk
                | Status::QueuedForElmMake
                | Status::ElmMake
                | Status::QueuedForPostprocess
                | Status::Postprocess
                | Status::Interrupted
                | Status::Success { .. }
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success { .. })
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Status::QueuedForElmMake
                | Status::ElmMake
                | Status::QueuedForPostprocess
                | Status::Postprocess
        )
    }

    /// Whether a process is actually running right now for this target —
    /// narrower than `is_in_progress`: a merely-queued target occupies no
    /// concurrency slot, but `Interrupted` still does, since the superseded
    /// process hasn't reported back yet.
    pub fn is_executing(&self) -> bool {
        matches!(self, Status::ElmMake | Status::Postprocess | Status::Interrupted)
    }
}

/// Per-target mutable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputState {
    /// Non-empty ordered list of entry-point file paths.
    pub inputs: Vec<PathBuf>,
    pub compilation_mode: CompilationMode,
    /// First token is either `elm-watch-node` (worker pool) or an external
    /// executable name.
    pub postprocess: Option<Vec<String>>,
    pub all_related_elm_file_paths: HashSet<PathBuf>,
    pub dirty: bool,
    pub status: Status,
    /// Compiled JS stashed between `CompileNeedsPostprocess` and
    /// `StartPostprocess` — `Status::QueuedForPostprocess` itself carries no
    /// payload, so the bytes have to live somewhere across that tick.
    pub pending_code: Option<Vec<u8>>,
}

impl OutputState {
    /// Construct a fresh, not-yet-compiled target. Panics in debug builds if
    /// `inputs` is empty — the project loader must never produce one.
    pub fn new(inputs: Vec<PathBuf>, postprocess: Option<Vec<String>>) -> Self {
        debug_assert!(!inputs.is_empty(), "OutputState.inputs must be non-empty");
        Self {
            inputs,
            compilation_mode: CompilationMode::Standard,
            postprocess,
            all_related_elm_file_paths: HashSet::new(),
            dirty: true,
            status: Status::NotWrittenToDisk,
            pending_code: None,
        }
    }

    pub fn uses_worker_postprocess(&self) -> bool {
        matches!(self.postprocess.as_deref(), Some([first, ..]) if first == "elm-watch-node")
    }
}

/// One configuration-level error attached to a specific output (duplicate
/// inputs, inputs that don't resolve, etc.) — carried in `elm_json_errors`
/// and reprinted every compile cycle until the config file changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElmJsonError {
    pub output: String,
    pub message: String,
}

/// Fully resolved, immutable-for-the-run project value the core receives
/// from the (out-of-scope) project-configuration loader.
#[derive(Debug, Clone)]
pub struct Project {
    pub watch_root: PathBuf,
    pub config_path: PathBuf,
    /// Manifest path (`elm.json`) → its targets, keyed by output path.
    /// Insertion-ordered: declaration order is the tie-break for equal
    /// connection priority.
    pub elm_jsons: IndexMap<PathBuf, IndexMap<OutputPath, OutputState>>,
    pub elm_json_errors: Vec<ElmJsonError>,
    pub disabled_outputs: HashSet<OutputPath>,
}

impl Project {
    pub fn iter_outputs(&self) -> impl Iterator<Item = (&PathBuf, &OutputPath, &OutputState)> {
        self.elm_jsons.iter().flat_map(|(manifest, outputs)| {
            outputs.iter().map(move |(path, state)| (manifest, path, state))
        })
    }

    pub fn iter_outputs_mut(
        &mut self,
    ) -> impl Iterator<Item = (&PathBuf, &OutputPath, &mut OutputState)> {
        self.elm_jsons.iter_mut().flat_map(|(manifest, outputs)| {
            outputs.iter_mut().map(move |(path, state)| (&*manifest, path, state))
        })
    }

    pub fn find_output(&self, path: &OutputPath) -> Option<(&PathBuf, &OutputState)> {
        self.elm_jsons.iter().find_map(|(manifest, outputs)| {
            outputs.get(path).map(|state| (manifest, state))
        })
    }

    pub fn find_output_mut(&mut self, path: &OutputPath) -> Option<&mut OutputState> {
        self.elm_jsons.values_mut().find_map(|outputs| outputs.get_mut(path))
    }

    /// Find an enabled output by the string a client names it with.
    pub fn find_by_display_name(&self, name: &str) -> Option<&OutputPath> {
        self.iter_outputs().map(|(_, path, _)| path).find(|p| p.display_name() == name)
    }

    pub fn disabled_display_names(&self) -> Vec<&str> {
        self.disabled_outputs.iter().map(|p| p.display_name()).collect()
    }

    pub fn enabled_display_names(&self) -> Vec<&str> {
        self.iter_outputs().map(|(_, path, _)| path.display_name()).collect()
    }
}

/// Metadata for one connected WebSocket client. The actual socket write
/// handle is owned by `ew-socket`/`ew-watch`, kept out of `ew-core` to avoid
/// a dependency from the data model onto the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSocketConnection {
    pub id: ConnectionId,
    /// `None` is the "error sentinel" form used for clients that failed the
    /// connect-URL handshake (wrong version, bad url, ...) but are still
    /// tracked so repeated bad connects don't leak resources.
    pub output: Option<OutputPath>,
    /// Connect-time timestamp; higher = more recently connected = higher
    /// priority when scheduling compilations.
    pub priority: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_state_starts_dirty_and_not_written() {
        let state = OutputState::new(vec![PathBuf::from("src/Main.elm")], None);
        assert!(state.dirty);
        assert_eq!(state.status, Status::NotWrittenToDisk);
    }

    #[test]
    fn uses_worker_postprocess_detects_elm_watch_node() {
        let mut state = OutputState::new(vec![PathBuf::from("src/Main.elm")], None);
        assert!(!state.uses_worker_postprocess());
        state.postprocess = Some(vec!["elm-watch-node".into(), "postprocess.js".into()]);
        assert!(state.uses_worker_postprocess());
        state.postprocess = Some(vec!["./postprocess.sh".into()]);
        assert!(!state.uses_worker_postprocess());
    }

    #[test]
    fn is_executing_excludes_queued_but_includes_interrupted() {
        assert!(!Status::QueuedForElmMake.is_executing());
        assert!(!Status::QueuedForPostprocess.is_executing());
        assert!(Status::ElmMake.is_executing());
        assert!(Status::Postprocess.is_executing());
        assert!(Status::Interrupted.is_executing());
    }

    #[test]
    fn status_is_error_excludes_in_progress_and_terminal_ok_states() {
        assert!(!Status::NotWrittenToDisk.is_error());
        assert!(!Status::ElmMake.is_error());
        assert!(!Status::Interrupted.is_error());
        assert!(!Status::Success { code: vec![], compiled_timestamp: 0 }.is_error());
        assert!(Status::ElmNotFoundError.is_error());
        assert!(Status::ElmMakeErrors { errors: vec![] }.is_error());
    }
}
