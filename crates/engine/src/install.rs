// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency installation, run once per manifest before any target under
//! it is compiled.

use std::path::Path;

use ew_compiler::CompilerAdapter;
use ew_core::project::Status;

/// Runs `elm install`-equivalent resolution for one manifest. On success the
/// manifest's targets are ready to be queued for compilation; on failure
/// every target under it gets the same launch-error status.
pub async fn install_dependencies<A: CompilerAdapter>(adapter: &A, manifest: &Path) -> Option<Status> {
    match adapter.install_dependencies(manifest).await {
        Ok(()) => None,
        Err(err) => Some(err.into()),
    }
}
