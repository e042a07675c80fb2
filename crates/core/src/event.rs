// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Purely informational events, carried for timeline printing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::project::OutputPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatcherEventKind {
    Added,
    Changed,
    Removed,
}

/// Events that trigger state transitions in the hot orchestrator.
///
/// Serializes with `{"type": "event:name", ...fields}`, matching the
/// tagged-enum convention used throughout this codebase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "watcher:event")]
    WatcherEvent { date_epoch_ms: u64, kind: WatcherEventKind, path: PathBuf },

    #[serde(rename = "websocket:connected")]
    WebSocketConnected { date_epoch_ms: u64, output: OutputPath },
}

impl Event {
    pub fn date_epoch_ms(&self) -> u64 {
        match self {
            Event::WatcherEvent { date_epoch_ms, .. } => *date_epoch_ms,
            Event::WebSocketConnected { date_epoch_ms, .. } => *date_epoch_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watcher_event_round_trips_through_json() {
        let event = Event::WatcherEvent {
            date_epoch_ms: 1234,
            kind: WatcherEventKind::Changed,
            path: PathBuf::from("src/Main.elm"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"watcher:event\""));
        let round_tripped: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(round_tripped, event);
    }
}
