// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A reusable "run a program, capture everything" primitive.
//!
//! Generalizes the effect-building shape used to launch subprocesses: spawn,
//! optionally write stdin, collect stdout/stderr, classify the exit.

use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use ew_core::project::ExitReason;

#[derive(Debug, Clone, PartialEq)]
pub enum SpawnError {
    CommandNotFound { command: String },
    OtherSpawnError { message: String },
    StdinWriteError { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit: Result<(), ExitReason>,
}

impl SpawnOutput {
    pub fn success(&self) -> bool {
        self.exit.is_ok()
    }
}

/// Runs `program args...` in `cwd`, optionally writing `stdin` before closing
/// it, and waits for completion.
pub async fn run(
    program: &str,
    args: &[String],
    cwd: &Path,
    stdin: Option<&[u8]>,
) -> Result<SpawnOutput, SpawnError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|err| classify_spawn_error(program, &err))?;

    if let Some(bytes) = stdin {
        let mut pipe = child.stdin.take().expect("stdin requested above");
        pipe.write_all(bytes)
            .await
            .map_err(|err| SpawnError::StdinWriteError { message: err.to_string() })?;
        drop(pipe);
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|err| SpawnError::OtherSpawnError { message: err.to_string() })?;

    let exit = if output.status.success() {
        Ok(())
    } else {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            output.status.signal().map(|sig| format!("signal {sig}"))
        };
        #[cfg(not(unix))]
        let signal: Option<String> = None;

        Err(match (output.status.code(), signal) {
            (Some(code), _) => ExitReason::ExitCode(code),
            (None, Some(sig)) => ExitReason::Signal(sig),
            (None, None) => ExitReason::Unknown,
        })
    };

    Ok(SpawnOutput { stdout: output.stdout, stderr: output.stderr, exit })
}

fn classify_spawn_error(program: &str, err: &std::io::Error) -> SpawnError {
    if err.kind() == std::io::ErrorKind::NotFound {
        SpawnError::CommandNotFound { command: program.to_string() }
    } else {
        SpawnError::OtherSpawnError { message: err.to_string() }
    }
}
