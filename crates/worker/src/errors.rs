// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ew_core::project::Status;
use thiserror::Error;

/// Errors from one postprocess call to a worker running the
/// `elm-watch-node` script contract. The script itself runs as an isolated
/// subprocess rather than loaded in-process (Rust has no dynamic
/// module-loading equivalent), so these line up with process-lifecycle
/// failures instead of JS import errors, but keep the names a Node-based
/// postprocess script's own error contract would use.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorkerError {
    #[error("postprocess script not found: {path}")]
    MissingScript { path: String },
    #[error("worker process failed to start: {message}")]
    SpawnFailed { message: String },
    #[error("worker process exited before responding: {message}")]
    ImportError { message: String },
    #[error("worker process returned a non-function default export")]
    DefaultExportNotFunction { actual_type: String },
    #[error("worker process errored while running: {message}")]
    RunError { message: String },
    #[error("worker process returned an unusable value")]
    BadReturnValue { actual_type: String },
    #[error("worker pool is shutting down")]
    Terminated,
    #[error("worker pool is at its concurrency limit")]
    PoolSaturated,
}

impl From<WorkerError> for Status {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::MissingScript { .. } => Status::ElmWatchNodeMissingScript,
            WorkerError::SpawnFailed { message } | WorkerError::ImportError { message } => {
                Status::ElmWatchNodeImportError { message }
            }
            WorkerError::DefaultExportNotFunction { actual_type } => {
                Status::ElmWatchNodeDefaultExportNotFunction { actual_type }
            }
            WorkerError::RunError { message } => Status::ElmWatchNodeRunError { message },
            WorkerError::BadReturnValue { actual_type } => {
                Status::ElmWatchNodeBadReturnValue { actual_type }
            }
            WorkerError::Terminated => {
                Status::ElmWatchNodeRunError { message: "worker pool terminated".to_string() }
            }
            WorkerError::PoolSaturated => Status::QueuedForPostprocess,
        }
    }
}
