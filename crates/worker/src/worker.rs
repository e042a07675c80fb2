// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single postprocess worker: one long-lived subprocess, one request in
//! flight at a time.
//!
//! The "elm-watch-node" contract loads a user script in-process and calls
//! its default export once per compile. Rust has no equivalent to dynamic
//! module loading, so each worker instead spawns the script as an isolated
//! subprocess once and keeps it alive, issuing one newline-delimited JSON
//! request/response per postprocess call — same contract, different
//! transport.

use ew_core::project::CompilationMode;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex as AsyncMutex;

use crate::errors::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Busy,
    Terminated,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostprocessRequest {
    pub code: String,
    pub compiled_timestamp: u64,
    pub output_path: String,
    pub compilation_mode: CompilationMode,
    pub run_mode: String,
    pub argv: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "tag")]
enum WireResponse {
    Ok { code: String },
    Error { message: String },
    BadReturnValue { actual_type: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostprocessResponse {
    pub code: Vec<u8>,
}

pub struct Worker {
    id: u64,
    script: PathBuf,
    state: Mutex<WorkerState>,
    io: AsyncMutex<Option<(Child, BufReader<ChildStdout>, ChildStdin)>>,
}

impl Worker {
    /// Spawns the worker's subprocess immediately so a spawn failure surfaces
    /// at pool-fill time rather than on the first compile that needs it.
    pub async fn spawn(id: u64, script: PathBuf) -> Result<Self, WorkerError> {
        if !script.exists() {
            return Err(WorkerError::MissingScript { path: script.display().to_string() });
        }
        let (child, stdout, stdin) = spawn_child(&script).await?;
        Ok(Self {
            id,
            script,
            state: Mutex::new(WorkerState::Idle),
            io: AsyncMutex::new(Some((child, BufReader::new(stdout), stdin))),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    pub fn is_idle(&self) -> bool {
        self.state() == WorkerState::Idle
    }

    /// Runs one postprocess call. On any transport failure the worker is
    /// marked `Terminated` permanently — the pool replaces it rather than
    /// retrying a subprocess whose protocol framing may be out of sync.
    pub async fn run(
        &self,
        request: &PostprocessRequest,
    ) -> Result<PostprocessResponse, WorkerError> {
        *self.state.lock() = WorkerState::Busy;
        let result = self.run_inner(request).await;
        *self.state.lock() = match &result {
            Ok(_) => WorkerState::Idle,
            Err(_) => WorkerState::Terminated,
        };
        result
    }

    async fn run_inner(
        &self,
        request: &PostprocessRequest,
    ) -> Result<PostprocessResponse, WorkerError> {
        let mut guard = self.io.lock().await;
        let (_child, stdout, stdin) =
            guard.as_mut().ok_or_else(|| WorkerError::RunError {
                message: "worker already terminated".to_string(),
            })?;

        let line = serde_json::to_string(request)
            .map_err(|err| WorkerError::RunError { message: err.to_string() })?;
        stdin
            .write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|err| WorkerError::RunError { message: err.to_string() })?;
        stdin.flush().await.map_err(|err| WorkerError::RunError { message: err.to_string() })?;

        let mut response_line = String::new();
        let bytes_read = stdout
            .read_line(&mut response_line)
            .await
            .map_err(|err| WorkerError::RunError { message: err.to_string() })?;
        if bytes_read == 0 {
            return Err(WorkerError::ImportError {
                message: "worker process closed stdout without responding".to_string(),
            });
        }

        let wire: WireResponse = serde_json::from_str(response_line.trim())
            .map_err(|err| WorkerError::BadReturnValue { actual_type: err.to_string() })?;
        match wire {
            WireResponse::Ok { code } => Ok(PostprocessResponse { code: code.into_bytes() }),
            WireResponse::Error { message } => Err(WorkerError::RunError { message }),
            WireResponse::BadReturnValue { actual_type } => {
                Err(WorkerError::BadReturnValue { actual_type })
            }
        }
    }

    /// Kills the subprocess. Idempotent.
    pub async fn terminate(&self) {
        *self.state.lock() = WorkerState::Terminated;
        if let Some((mut child, _, _)) = self.io.lock().await.take() {
            let _ = child.kill().await;
        }
    }
}

async fn spawn_child(
    script: &std::path::Path,
) -> Result<(Child, ChildStdout, ChildStdin), WorkerError> {
    let mut child = tokio::process::Command::new("node")
        .arg(script)
        .arg("--elm-watch-worker")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| WorkerError::SpawnFailed { message: err.to_string() })?;

    let stdout = child.stdout.take().expect("stdout requested above");
    let stdin = child.stdin.take().expect("stdin requested above");

    if let Some(mut stderr) = child.stderr.take() {
        let worker_id_for_log = script.display().to_string();
        tokio::spawn(async move {
            let mut buf = Vec::new();
            use tokio::io::AsyncReadExt;
            if stderr.read_to_end(&mut buf).await.is_ok() && !buf.is_empty() {
                tracing::warn!(
                    script = %worker_id_for_log,
                    stderr = %String::from_utf8_lossy(&buf),
                    "postprocess worker wrote to stderr"
                );
            }
        });
    }

    Ok((child, stdout, stdin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawning_missing_script_is_rejected_before_touching_the_process_table() {
        let result = Worker::spawn(0, PathBuf::from("/no/such/script.js")).await;
        assert!(matches!(result, Err(WorkerError::MissingScript { .. })));
    }
}
