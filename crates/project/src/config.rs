// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locates, loads, and validates `elm-watch.json`.

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use ew_core::project::{ElmJsonError, OutputPath, OutputState, Project};

const CONFIG_FILE_NAME: &str = "elm-watch.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no {CONFIG_FILE_NAME} found in {searched} or any parent directory")]
    NotFound { searched: PathBuf },
    #[error("failed to read {path}: {message}")]
    ReadError { path: PathBuf, message: String },
    #[error("failed to parse {path} as JSON: {message}")]
    ParseError { path: PathBuf, message: String },
    #[error("{CONFIG_FILE_NAME} has no targets")]
    NoTargets,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    targets: IndexMap<String, RawTarget>,
}

#[derive(Debug, Deserialize)]
struct RawTarget {
    inputs: Vec<String>,
    /// Absent or `null` means typecheck-only (`OutputPath::Null`).
    output: Option<String>,
    postprocess: Option<Vec<String>>,
}

/// Walks upward from `start_dir` looking for `elm-watch.json`, the way `elm`
/// itself searches for `elm.json`.
pub fn find_config(start_dir: &Path) -> Result<PathBuf, ConfigError> {
    let mut dir = start_dir;
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return Err(ConfigError::NotFound { searched: start_dir.to_path_buf() }),
        }
    }
}

/// Loads and validates `elm-watch.json`, producing the fully resolved
/// `Project` the rest of the engine operates on. Input paths are resolved
/// relative to the config file's directory, which becomes `watch_root`.
pub fn load(config_path: &Path) -> Result<Project, ConfigError> {
    let content = std::fs::read_to_string(config_path).map_err(|err| ConfigError::ReadError {
        path: config_path.to_path_buf(),
        message: err.to_string(),
    })?;
    let raw: RawConfig = serde_json::from_str(&content).map_err(|err| ConfigError::ParseError {
        path: config_path.to_path_buf(),
        message: err.to_string(),
    })?;
    if raw.targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }

    let watch_root = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let mut outputs: IndexMap<OutputPath, OutputState> = IndexMap::new();
    let mut elm_json_errors = Vec::new();
    let mut seen_inputs: HashSet<PathBuf> = HashSet::new();

    for (target_name, raw_target) in &raw.targets {
        if raw_target.inputs.is_empty() {
            elm_json_errors.push(ElmJsonError {
                output: target_name.clone(),
                message: "target has no inputs".to_string(),
            });
            continue;
        }

        let inputs: Vec<PathBuf> = raw_target
            .inputs
            .iter()
            .map(|input| resolve_relative(&watch_root, input))
            .collect();

        let mut duplicate = false;
        for input in &inputs {
            if !seen_inputs.insert(input.clone()) {
                elm_json_errors.push(ElmJsonError {
                    output: target_name.clone(),
                    message: format!("input {} is used by more than one target", input.display()),
                });
                duplicate = true;
            }
        }
        if duplicate {
            continue;
        }

        let output_path = match &raw_target.output {
            Some(original) => OutputPath::Real {
                absolute: resolve_relative(&watch_root, original),
                original: original.clone(),
            },
            None => OutputPath::Null,
        };

        outputs.insert(output_path, OutputState::new(inputs, raw_target.postprocess.clone()));
    }

    Ok(Project {
        watch_root: watch_root.clone(),
        config_path: config_path.to_path_buf(),
        elm_jsons: IndexMap::from([(config_path.to_path_buf(), outputs)]),
        elm_json_errors,
        disabled_outputs: HashSet::new(),
    })
}

fn resolve_relative(base: &Path, path: &str) -> PathBuf {
    let candidate = PathBuf::from(path);
    if candidate.is_absolute() {
        candidate
    } else {
        base.join(candidate)
    }
}
