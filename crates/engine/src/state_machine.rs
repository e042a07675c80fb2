// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure per-target status transitions.
//!
//! `NotWrittenToDisk | Success | <error>` → `QueuedForElmMake` → `ElmMake` →
//! (`QueuedForPostprocess` → `Postprocess` →) `Success` | `<error>`, with
//! `Interrupted` pre-empting any in-flight step when a newer event arrives.

use ew_core::project::Status;

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// A relevant filesystem event arrived; the target needs a rebuild.
    Enqueue,
    /// The scheduler picked this target's queued compile to run now.
    StartCompile,
    /// `elm make` produced a usable artifact with no postprocess step.
    CompileSucceeded { code: Vec<u8>, compiled_timestamp: u64 },
    /// `elm make` produced an artifact that still needs postprocessing.
    CompileNeedsPostprocess,
    /// `elm make` failed; `status` is one of the compile-error variants.
    CompileFailed(Status),
    /// The scheduler picked this target's queued postprocess to run now.
    StartPostprocess,
    /// The postprocess script ran to completion.
    PostprocessSucceeded { code: Vec<u8>, compiled_timestamp: u64 },
    /// The postprocess script failed; `status` is one of its error variants.
    PostprocessFailed(Status),
    /// A newer event superseded this in-flight step.
    Interrupt,
}

/// Advances `current` by `transition`. Panics in debug builds on a
/// transition that doesn't apply to the current state — the scheduler must
/// never offer one.
pub fn advance(current: &Status, transition: Transition) -> Status {
    match (current, transition) {
        (_, Transition::Enqueue) => Status::QueuedForElmMake,
        (Status::QueuedForElmMake, Transition::StartCompile) => Status::ElmMake,
        (Status::ElmMake, Transition::CompileSucceeded { code, compiled_timestamp }) => {
            Status::Success { code, compiled_timestamp }
        }
        (Status::ElmMake, Transition::CompileNeedsPostprocess) => Status::QueuedForPostprocess,
        (Status::ElmMake, Transition::CompileFailed(status)) => status,
        (Status::QueuedForPostprocess, Transition::StartPostprocess) => Status::Postprocess,
        (Status::Postprocess, Transition::PostprocessSucceeded { code, compiled_timestamp }) => {
            Status::Success { code, compiled_timestamp }
        }
        (Status::Postprocess, Transition::PostprocessFailed(status)) => status,
        (Status::ElmMake | Status::Postprocess, Transition::Interrupt) => Status::Interrupted,
        (other, transition) => {
            debug_assert!(
                false,
                "invalid status transition: {other:?} cannot apply {transition:?}"
            );
            other.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_without_postprocess() {
        let status = Status::NotWrittenToDisk;
        let status = advance(&status, Transition::Enqueue);
        assert_eq!(status, Status::QueuedForElmMake);
        let status = advance(&status, Transition::StartCompile);
        assert_eq!(status, Status::ElmMake);
        let status =
            advance(&status, Transition::CompileSucceeded { code: vec![1], compiled_timestamp: 10 });
        assert_eq!(status, Status::Success { code: vec![1], compiled_timestamp: 10 });
    }

    #[test]
    fn happy_path_with_postprocess() {
        let status = Status::ElmMake;
        let status = advance(&status, Transition::CompileNeedsPostprocess);
        assert_eq!(status, Status::QueuedForPostprocess);
        let status = advance(&status, Transition::StartPostprocess);
        assert_eq!(status, Status::Postprocess);
        let status = advance(
            &status,
            Transition::PostprocessSucceeded { code: vec![2], compiled_timestamp: 20 },
        );
        assert_eq!(status, Status::Success { code: vec![2], compiled_timestamp: 20 });
    }

    #[test]
    fn in_flight_steps_can_be_interrupted() {
        assert_eq!(advance(&Status::ElmMake, Transition::Interrupt), Status::Interrupted);
        assert_eq!(advance(&Status::Postprocess, Transition::Interrupt), Status::Interrupted);
    }

    #[test]
    fn any_terminal_state_can_be_requeued() {
        let success = Status::Success { code: vec![], compiled_timestamp: 0 };
        assert_eq!(advance(&success, Transition::Enqueue), Status::QueuedForElmMake);
        assert_eq!(advance(&Status::ElmNotFoundError, Transition::Enqueue), Status::QueuedForElmMake);
    }
}
