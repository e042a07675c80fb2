// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Approximates `allRelatedElmFilePaths`: the set of `.elm` files a target's
//! rebuild depends on, used to decide whether a filesystem event is
//! interesting.
//!
//! A full implementation would parse each module's `import` list and walk
//! the dependency graph the way the real compiler does. This crate instead
//! treats every `.elm` file already discovered under the watch root as
//! potentially related to every target — strictly more permissive than the
//! real algorithm, so it can only cause extra (harmless) recompiles, never
//! missed ones.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Recursively collects every `.elm` file under `root`, skipping
/// `elm-stuff` (the compiler's cache directory) the same way `elm` itself
/// ignores it during module discovery.
pub fn discover_elm_files(root: &Path) -> HashSet<PathBuf> {
    let mut found = HashSet::new();
    collect(root, &mut found);
    found
}

fn collect(dir: &Path, found: &mut HashSet<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().and_then(|n| n.to_str()) == Some("elm-stuff") {
                continue;
            }
            collect(&path, found);
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("elm") {
            found.insert(path);
        }
    }
}
