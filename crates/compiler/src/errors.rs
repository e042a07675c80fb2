// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error families for dependency installation and compilation.
//!
//! Each variant maps onto one `ew_core::project::Status` error state; the
//! engine crate performs that mapping rather than this crate depending
//! downward on the status model's full surface.

use ew_core::project::{CompileError, ExitReason, Status};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("elm executable not found")]
    ElmNotFound,
    #[error("command not found: {command}")]
    CommandNotFound { command: String },
    #[error("failed to spawn elm: {message}")]
    OtherSpawnError { message: String },
    #[error("elm install exited non-zero: {stderr}")]
    NonZeroExit { reason: ExitReason, stderr: String },
}

impl From<InstallError> for Status {
    fn from(err: InstallError) -> Self {
        match err {
            InstallError::ElmNotFound => Status::ElmNotFoundError,
            InstallError::CommandNotFound { command } => Status::CommandNotFoundError { command },
            InstallError::OtherSpawnError { message } => Status::OtherSpawnError { message },
            InstallError::NonZeroExit { reason, stderr } => {
                Status::PostprocessNonZeroExit { reason, stderr }
            }
        }
    }
}

/// Failure to even start the compiler process.
#[derive(Debug, Error)]
pub enum CompileLaunchError {
    #[error("elm executable not found")]
    ElmNotFound,
    #[error("command not found: {command}")]
    CommandNotFound { command: String },
    #[error("failed to spawn elm: {message}")]
    OtherSpawnError { message: String },
    #[error("failed to create dummy entrypoint: {message}")]
    CreatingDummyFailed { message: String },
}

impl From<CompileLaunchError> for Status {
    fn from(err: CompileLaunchError) -> Self {
        match err {
            CompileLaunchError::ElmNotFound => Status::ElmNotFoundError,
            CompileLaunchError::CommandNotFound { command } => {
                Status::CommandNotFoundError { command }
            }
            CompileLaunchError::OtherSpawnError { message } => Status::OtherSpawnError { message },
            CompileLaunchError::CreatingDummyFailed { message } => {
                Status::CreatingDummyFailed { message }
            }
        }
    }
}

/// The compiler ran, but its output couldn't be turned into a success or a
/// well-formed error report.
#[derive(Debug, Error)]
pub enum CompileResultError {
    #[error("unexpected elm make output")]
    UnexpectedOutput { stdout: String, stderr: String },
    #[error("could not parse elm make --report=json output: {message}")]
    JsonParseError { message: String },
    #[error("{title}: {message}")]
    ElmMakeErrorGeneral { title: String, message: String },
}

impl From<CompileResultError> for Status {
    fn from(err: CompileResultError) -> Self {
        match err {
            CompileResultError::UnexpectedOutput { stdout, stderr } => {
                Status::UnexpectedElmMakeOutput { stdout, stderr }
            }
            CompileResultError::JsonParseError { message } => {
                Status::ElmMakeJsonParseError { message }
            }
            CompileResultError::ElmMakeErrorGeneral { title, message } => {
                Status::ElmMakeErrorGeneral { title, message }
            }
        }
    }
}

/// What `compile()` produced. Launch failures (the process never ran) are
/// reported as `CompileLaunchError`; everything past that point — success,
/// a well-formed error report, or a malformed one — is a `CompileOutcome`.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileOutcome {
    Success { code: Vec<u8> },
    CompileErrors { errors: Vec<CompileError> },
    ResultError(CompileResultErrorKind),
}

/// `CompileResultError` without `std::error::Error`'s `Display` baggage,
/// cloneable so `CompileOutcome` can derive `PartialEq` for tests.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileResultErrorKind {
    UnexpectedOutput { stdout: String, stderr: String },
    JsonParseError { message: String },
    ElmMakeErrorGeneral { title: String, message: String },
}

impl From<CompileResultError> for CompileResultErrorKind {
    fn from(err: CompileResultError) -> Self {
        match err {
            CompileResultError::UnexpectedOutput { stdout, stderr } => {
                CompileResultErrorKind::UnexpectedOutput { stdout, stderr }
            }
            CompileResultError::JsonParseError { message } => {
                CompileResultErrorKind::JsonParseError { message }
            }
            CompileResultError::ElmMakeErrorGeneral { title, message } => {
                CompileResultErrorKind::ElmMakeErrorGeneral { title, message }
            }
        }
    }
}

impl From<CompileResultErrorKind> for Status {
    fn from(err: CompileResultErrorKind) -> Self {
        match err {
            CompileResultErrorKind::UnexpectedOutput { stdout, stderr } => {
                Status::UnexpectedElmMakeOutput { stdout, stderr }
            }
            CompileResultErrorKind::JsonParseError { message } => {
                Status::ElmMakeJsonParseError { message }
            }
            CompileResultErrorKind::ElmMakeErrorGeneral { title, message } => {
                Status::ElmMakeErrorGeneral { title, message }
            }
        }
    }
}
