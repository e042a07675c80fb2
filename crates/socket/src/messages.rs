// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire messages exchanged with connected browser clients.

use ew_core::effect::ClientStatus;
use ew_core::project::CompilationMode;
use serde::{Deserialize, Serialize};

/// Sent by a client to request a different compilation mode for the target
/// it's watching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum ClientMessage {
    ChangeCompilationMode { compilation_mode: CompilationMode },
    FocusedTabAcknowledge,
}

/// Sent by the server, either to one client or broadcast to every client
/// watching one output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum ServerMessage {
    StatusChanged { status: ClientStatus },
    /// Tells the client to reload the page (successful compile of code
    /// already running in the browser).
    Reload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_round_trips_through_json() {
        let message =
            ClientMessage::ChangeCompilationMode { compilation_mode: CompilationMode::Debug };
        let json = serde_json::to_string(&message).unwrap();
        let round_tripped: ClientMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(round_tripped, message);
    }

    #[test]
    fn server_message_tags_status_changed() {
        let message = ServerMessage::StatusChanged { status: ClientStatus::Busy };
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"tag\":\"StatusChanged\""));
    }
}
