// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wraps the `notify` crate, classifying raw filesystem events into the
//! three kinds the orchestrator cares about and dropping everything else.

use notify::{Event as RawEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;

use ew_core::event::WatcherEventKind;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("failed to start filesystem watcher: {0}")]
    StartFailed(notify::Error),
    #[error("failed to watch {path}: {source}")]
    WatchPathFailed { path: PathBuf, source: notify::Error },
}

/// One classified, interesting filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedChange {
    pub kind: WatcherEventKind,
    pub path: PathBuf,
}

fn is_interesting(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("elm") => true,
        _ => matches!(
            path.file_name().and_then(|n| n.to_str()),
            Some("elm-watch.json") | Some("elm-tooling.json") | Some("elm.json")
        ),
    }
}

fn classify(kind: &EventKind) -> Option<WatcherEventKind> {
    match kind {
        EventKind::Create(_) => Some(WatcherEventKind::Added),
        EventKind::Modify(_) => Some(WatcherEventKind::Changed),
        EventKind::Remove(_) => Some(WatcherEventKind::Removed),
        _ => None,
    }
}

/// Starts watching `root` recursively, forwarding classified changes on
/// `tx`. Runs the underlying OS watcher on its own thread (the `notify`
/// callback is synchronous) and bridges into async-land via a channel.
pub fn start(root: &Path, tx: mpsc::UnboundedSender<WatchedChange>) -> Result<RecommendedWatcher, WatcherError> {
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<RawEvent>| match result {
        Ok(event) => {
            let Some(kind) = classify(&event.kind) else { return };
            for path in event.paths {
                if is_interesting(&path) {
                    let _ = tx.send(WatchedChange { kind, path });
                }
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "filesystem watcher error");
        }
    })
    .map_err(WatcherError::StartFailed)?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|source| WatcherError::WatchPathFailed { path: root.to_path_buf(), source })?;

    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elm_files_and_known_config_files_are_interesting() {
        assert!(is_interesting(Path::new("src/Main.elm")));
        assert!(is_interesting(Path::new("elm.json")));
        assert!(is_interesting(Path::new("elm-watch.json")));
        assert!(is_interesting(Path::new("elm-tooling.json")));
    }

    #[test]
    fn unrelated_files_are_ignored() {
        assert!(!is_interesting(Path::new("README.md")));
        assert!(!is_interesting(Path::new("package.json")));
    }
}
