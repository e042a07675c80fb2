// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process exit codes, kept separate from `anyhow::Error` propagation so
//! `main()` can map a failure to the right code without downcasting.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    CompileError,
    BadArgs,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::CompileError => 1,
            ExitCode::BadArgs => 2,
        }
    }
}

/// Error carrying the exit code `main()` should use, alongside a message for
/// stderr. Commands return this instead of calling `std::process::exit()`
/// directly.
#[derive(Debug)]
pub struct ExitError {
    pub code: ExitCode,
    pub message: String,
}

impl ExitError {
    pub fn new(code: ExitCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn bad_args(message: impl Into<String>) -> Self {
        Self::new(ExitCode::BadArgs, message)
    }

    pub fn compile_error(message: impl Into<String>) -> Self {
        Self::new(ExitCode::CompileError, message)
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
