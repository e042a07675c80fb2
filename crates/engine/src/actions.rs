// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decides which queued targets get to run next, given a concurrency cap
//! and client connection priority.

use std::collections::HashMap;

use ew_core::project::{OutputPath, Project, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputAction {
    Compile,
    Postprocess,
}

/// Picks up to `max_concurrent - in_flight` queued targets to start next.
/// Declaration order (the `Project`'s insertion-ordered map) breaks ties
/// between equal priorities (decision recorded in DESIGN.md).
pub fn get_output_actions(
    project: &Project,
    priorities: &HashMap<OutputPath, u64>,
    max_concurrent: usize,
) -> Vec<(OutputPath, OutputAction)> {
    let in_flight = project.iter_outputs().filter(|(_, _, s)| s.status.is_executing()).count();
    let available = max_concurrent.saturating_sub(in_flight);
    if available == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(OutputPath, OutputAction)> = project
        .iter_outputs()
        .filter(|(_, _, state)| state.dirty && !state.status.is_executing())
        .map(|(_, path, state)| {
            let action = match state.status {
                Status::QueuedForPostprocess => OutputAction::Postprocess,
                _ => OutputAction::Compile,
            };
            (path.clone(), action)
        })
        .collect();

    candidates.sort_by(|(a, _), (b, _)| {
        let a_priority = priorities.get(a).copied().unwrap_or(0);
        let b_priority = priorities.get(b).copied().unwrap_or(0);
        b_priority.cmp(&a_priority)
    });

    candidates.truncate(available);
    candidates
}
