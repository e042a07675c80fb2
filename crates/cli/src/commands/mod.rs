// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations.

pub mod hot;
pub mod make;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ew_core::project::Project;

use crate::exit::ExitError;

/// Finds and loads the project config for the current directory, printing
/// and returning a `BadArgs` error on any failure — shared by `make`/`hot`.
pub fn load_project(cwd: &Path) -> Result<Project, ExitError> {
    let config_path =
        ew_project::find_config(cwd).map_err(|err| ExitError::bad_args(err.to_string()))?;
    ew_project::load(&config_path)
        .map_err(|err| ExitError::bad_args(crate::render::render_config_error(&err)))
}

/// Applies the CLI's target-name filter: enabled targets are left dirty and
/// ready to compile, anything not named moves to `disabled_outputs`.
pub fn select_targets(project: &mut Project, targets: &[String]) {
    let selected: HashSet<&str> = targets.iter().map(String::as_str).collect();
    let watch_root = project.watch_root.clone();
    let related = ew_project::discover_elm_files(&watch_root);
    let mut disabled = HashSet::new();

    for (_, output_path, state) in project.iter_outputs_mut() {
        if !selected.is_empty() && !selected.contains(output_path.display_name()) {
            disabled.insert(output_path.clone());
            state.dirty = false;
            continue;
        }
        state.all_related_elm_file_paths = related.clone();
    }
    project.disabled_outputs = disabled;
}

/// First worker-pool postprocess script named by any enabled target, if
/// any — this implementation runs one worker pool per process, shared
/// across targets (a simplification recorded in DESIGN.md).
pub fn find_worker_script(project: &Project) -> Option<PathBuf> {
    project.iter_outputs().find_map(|(_, _, state)| {
        state
            .uses_worker_postprocess()
            .then(|| state.postprocess.as_ref().and_then(|argv| argv.get(1)))
            .flatten()
            .map(PathBuf::from)
    })
}
