// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs one compile or postprocess step and turns the result into the
//! target's next `Status`.

use std::path::Path;

use ew_compiler::spawn::{self, SpawnError};
use ew_compiler::{CompileOutcome, CompilerAdapter};
use ew_core::project::{OutputPath, OutputState, Status};
use ew_worker::{Pool, PostprocessRequest};

use crate::state_machine::{advance, Transition};

/// Runs the compiler for one target. The caller is responsible for having
/// already transitioned the target's status to `ElmMake`.
pub async fn compile<A: CompilerAdapter>(
    adapter: &A,
    manifest: &Path,
    output: &OutputPath,
    state: &OutputState,
) -> Status {
    let output_file = match output {
        OutputPath::Real { absolute, .. } => Some(absolute.as_path()),
        OutputPath::Null => None,
    };

    match adapter.compile(manifest, &state.inputs, output_file, state.compilation_mode).await {
        Ok(CompileOutcome::Success { code }) => {
            if state.postprocess.is_some() {
                Status::QueuedForPostprocess
            } else {
                Status::Success { code, compiled_timestamp: 0 }
            }
        }
        Ok(CompileOutcome::CompileErrors { errors }) => Status::ElmMakeErrors { errors },
        Ok(CompileOutcome::ResultError(kind)) => kind.into(),
        Err(launch_err) => launch_err.into(),
    }
}

/// Runs the configured postprocess command for one target. The caller has
/// already transitioned the target's status to `Postprocess`.
///
/// A target whose first postprocess token is `elm-watch-node` runs inside
/// the shared worker pool; any other first token names an external
/// executable that gets spawned directly, argv and stdin, the same way the
/// compiler launches `elm` itself.
pub async fn postprocess(
    pool: &Pool,
    output: &OutputPath,
    state: &OutputState,
    code: Vec<u8>,
    compiled_timestamp: u64,
) -> Status {
    if state.uses_worker_postprocess() {
        postprocess_via_worker(pool, output, state, code, compiled_timestamp).await
    } else {
        postprocess_via_executable(output, state, code, compiled_timestamp).await
    }
}

async fn postprocess_via_worker(
    pool: &Pool,
    output: &OutputPath,
    state: &OutputState,
    code: Vec<u8>,
    compiled_timestamp: u64,
) -> Status {
    let worker = match pool.get_or_create_available_worker().await {
        Ok(worker) => worker,
        Err(err) => return err.into(),
    };

    let request = PostprocessRequest {
        code: String::from_utf8_lossy(&code).into_owned(),
        compiled_timestamp,
        output_path: output.display_name().to_string(),
        compilation_mode: state.compilation_mode,
        run_mode: "hot".to_string(),
        argv: Vec::new(),
    };

    match worker.run(&request).await {
        Ok(response) => Status::Success { code: response.code, compiled_timestamp },
        Err(err) => err.into(),
    }
}

async fn postprocess_via_executable(
    output: &OutputPath,
    state: &OutputState,
    code: Vec<u8>,
    compiled_timestamp: u64,
) -> Status {
    let Some(argv) = &state.postprocess else {
        return Status::Success { code, compiled_timestamp };
    };
    let Some((program, rest)) = argv.split_first() else {
        return Status::OtherSpawnError { message: "empty postprocess command".to_string() };
    };

    let mut args = rest.to_vec();
    args.push(output.display_name().to_string());
    let cwd = std::env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf());

    match spawn::run(program, &args, &cwd, Some(&code)).await {
        Ok(result) if result.success() => Status::Success { code: result.stdout, compiled_timestamp },
        Ok(result) => Status::PostprocessNonZeroExit {
            reason: result.exit.unwrap_err(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        },
        Err(SpawnError::CommandNotFound { command }) => Status::CommandNotFoundError { command },
        Err(SpawnError::OtherSpawnError { message }) => Status::OtherSpawnError { message },
        Err(SpawnError::StdinWriteError { message }) => {
            Status::PostprocessStdinWriteError { message }
        }
    }
}

/// Applies a finished compile's result to a target's state: transitions
/// `status`, stashes `pending_code` when a postprocess step still needs it,
/// and clears `dirty` unless the result is itself an error (which requeues
/// it on the next scheduling pass). Shared between the `hot` orchestrator
/// and the one-shot `make` driver so the two never disagree about what a
/// finished compile means.
///
/// If the target was marked `Interrupted` while this compile was running (a
/// newer file change arrived), the result is stale: discard it and requeue
/// instead of applying it.
pub fn apply_compile_result(state: &mut OutputState, status: Status, now_ms: u64) {
    if state.status == Status::Interrupted {
        state.status = advance(&state.status, Transition::Enqueue);
        return;
    }
    let transition = match &status {
        Status::Success { code, .. } => {
            if state.postprocess.is_some() {
                state.pending_code = Some(code.clone());
                Transition::CompileNeedsPostprocess
            } else {
                Transition::CompileSucceeded { code: code.clone(), compiled_timestamp: now_ms }
            }
        }
        other => Transition::CompileFailed(other.clone()),
    };
    state.status = advance(&state.status, transition);
    state.dirty = state.status.is_error();
}

/// Applies a finished postprocess's result to a target's state. See
/// `apply_compile_result`.
pub fn apply_postprocess_result(state: &mut OutputState, status: Status) {
    state.pending_code = None;
    if state.status == Status::Interrupted {
        state.status = advance(&state.status, Transition::Enqueue);
        return;
    }
    let transition = match &status {
        Status::Success { code, compiled_timestamp } => Transition::PostprocessSucceeded {
            code: code.clone(),
            compiled_timestamp: *compiled_timestamp,
        },
        other => Transition::PostprocessFailed(other.clone()),
    };
    state.status = advance(&state.status, transition);
    state.dirty = state.status.is_error();
}

#[cfg(test)]
mod tests {
    use super::*;
    use ew_compiler::FakeCompilerAdapter;
    use std::path::PathBuf;

    #[tokio::test]
    async fn successful_compile_without_postprocess_reaches_success() {
        let adapter = FakeCompilerAdapter::new();
        let state = OutputState::new(vec![PathBuf::from("src/Main.elm")], None);
        let output =
            OutputPath::Real { absolute: PathBuf::from("main.js"), original: "main.js".into() };
        let status = compile(&adapter, Path::new("elm.json"), &output, &state).await;
        assert!(matches!(status, Status::Success { .. }));
    }

    #[tokio::test]
    async fn successful_compile_with_postprocess_queues_for_it() {
        let adapter = FakeCompilerAdapter::new();
        let state = OutputState::new(
            vec![PathBuf::from("src/Main.elm")],
            Some(vec!["./postprocess.sh".to_string()]),
        );
        let output =
            OutputPath::Real { absolute: PathBuf::from("main.js"), original: "main.js".into() };
        let status = compile(&adapter, Path::new("elm.json"), &output, &state).await;
        assert_eq!(status, Status::QueuedForPostprocess);
    }

    #[test]
    fn apply_compile_result_stashes_code_when_postprocess_is_needed() {
        let mut state = OutputState::new(
            vec![PathBuf::from("src/Main.elm")],
            Some(vec!["./postprocess.sh".to_string()]),
        );
        state.status = Status::ElmMake;
        apply_compile_result(&mut state, Status::Success { code: vec![9], compiled_timestamp: 0 }, 123);
        assert_eq!(state.status, Status::QueuedForPostprocess);
        assert_eq!(state.pending_code, Some(vec![9]));
    }

    #[test]
    fn apply_compile_result_uses_now_ms_when_no_postprocess_is_needed() {
        let mut state = OutputState::new(vec![PathBuf::from("src/Main.elm")], None);
        state.status = Status::ElmMake;
        apply_compile_result(&mut state, Status::Success { code: vec![1], compiled_timestamp: 0 }, 42);
        assert_eq!(state.status, Status::Success { code: vec![1], compiled_timestamp: 42 });
        assert!(!state.dirty);
    }

    #[test]
    fn apply_compile_result_discards_a_stale_result_and_requeues_when_interrupted() {
        let mut state = OutputState::new(vec![PathBuf::from("src/Main.elm")], None);
        state.status = Status::Interrupted;
        state.dirty = true;
        apply_compile_result(&mut state, Status::Success { code: vec![1], compiled_timestamp: 0 }, 42);
        assert_eq!(state.status, Status::QueuedForElmMake);
        assert!(state.dirty);
    }

    #[tokio::test]
    async fn postprocess_spawns_the_named_executable_directly_when_not_worker_based() {
        let mut state = OutputState::new(
            vec![PathBuf::from("src/Main.elm")],
            Some(vec!["sh".to_string(), "-c".to_string(), "cat".to_string()]),
        );
        state.status = Status::Postprocess;
        assert!(!state.uses_worker_postprocess());

        let pool = Pool::new(PathBuf::new());
        let output =
            OutputPath::Real { absolute: PathBuf::from("main.js"), original: "main.js".into() };
        let status = postprocess(&pool, &output, &state, b"var x = 1;".to_vec(), 99).await;
        assert_eq!(status, Status::Success { code: b"var x = 1;".to_vec(), compiled_timestamp: 99 });
    }

    #[tokio::test]
    async fn postprocess_reports_command_not_found_for_a_missing_executable() {
        let state = OutputState::new(
            vec![PathBuf::from("src/Main.elm")],
            Some(vec!["definitely-not-a-real-binary".to_string()]),
        );
        let pool = Pool::new(PathBuf::new());
        let output =
            OutputPath::Real { absolute: PathBuf::from("main.js"), original: "main.js".into() };
        let status = postprocess(&pool, &output, &state, Vec::new(), 0).await;
        assert_eq!(
            status,
            Status::CommandNotFoundError { command: "definitely-not-a-real-binary".to_string() }
        );
    }

    #[test]
    fn apply_postprocess_result_clears_pending_code() {
        let mut state = OutputState::new(vec![PathBuf::from("src/Main.elm")], None);
        state.status = Status::Postprocess;
        state.pending_code = Some(vec![1, 2, 3]);
        apply_postprocess_result(
            &mut state,
            Status::Success { code: vec![4], compiled_timestamp: 99 },
        );
        assert!(state.pending_code.is_none());
        assert_eq!(state.status, Status::Success { code: vec![4], compiled_timestamp: 99 });
    }

    #[test]
    fn apply_postprocess_result_discards_a_stale_result_and_requeues_when_interrupted() {
        let mut state = OutputState::new(vec![PathBuf::from("src/Main.elm")], None);
        state.status = Status::Interrupted;
        state.dirty = true;
        state.pending_code = Some(vec![1, 2, 3]);
        apply_postprocess_result(
            &mut state,
            Status::Success { code: vec![4], compiled_timestamp: 99 },
        );
        assert_eq!(state.status, Status::QueuedForElmMake);
        assert!(state.pending_code.is_none());
    }
}
