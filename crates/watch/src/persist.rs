// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persists the WebSocket port and per-target compilation modes across
//! `hot` restarts, in a single JSON file rewritten on every mutation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ew_core::project::CompilationMode;

const STATE_FILE_NAME: &str = "stuff.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedState {
    pub port: Option<u16>,
    #[serde(default)]
    pub compilation_modes: HashMap<String, CompilationMode>,
}

fn state_path(watch_root: &Path) -> PathBuf {
    watch_root.join("elm-stuff").join("elm-watch").join(STATE_FILE_NAME)
}

/// Reads the persisted state, returning the default (empty) state if the
/// file is missing or unreadable — a corrupt or absent state file should
/// never block a `hot` run from starting.
pub fn load(watch_root: &Path) -> PersistedState {
    let path = state_path(watch_root);
    match std::fs::read_to_string(&path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable persisted state");
            PersistedState::default()
        }),
        Err(_) => PersistedState::default(),
    }
}

/// Best-effort rewrite; a failure here is logged and otherwise ignored —
/// losing the persisted port just means the next `hot` run picks a fresh
/// ephemeral one.
pub fn save(watch_root: &Path, state: &PersistedState) {
    let path = state_path(watch_root);
    if let Some(parent) = path.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            tracing::warn!(path = %parent.display(), error = %err, "failed to create state directory");
            return;
        }
    }
    match serde_json::to_string_pretty(state) {
        Ok(content) => {
            if let Err(err) = std::fs::write(&path, content) {
                tracing::warn!(path = %path.display(), error = %err, "failed to persist state");
            }
        }
        Err(err) => tracing::warn!(error = %err, "failed to serialize persisted state"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_state_file_loads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load(dir.path()), PersistedState::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = PersistedState { port: Some(8765), ..Default::default() };
        state.compilation_modes.insert("main.js".to_string(), CompilationMode::Debug);
        save(dir.path(), &state);
        assert_eq!(load(dir.path()), state);
    }
}
