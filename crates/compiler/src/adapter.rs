// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use ew_core::project::CompilationMode;

use crate::errors::{CompileLaunchError, CompileOutcome, CompileResultError, InstallError};
use crate::report::parse_report_json;
use crate::spawn::{self, SpawnError};

/// Adapter over the external compiler. Decoupled from `tokio::process`
/// directly so tests can drive compile outcomes without a real `elm`
/// binary on `PATH`.
#[async_trait]
pub trait CompilerAdapter: Clone + Send + Sync + 'static {
    async fn install_dependencies(&self, manifest: &Path) -> Result<(), InstallError>;

    async fn compile(
        &self,
        manifest: &Path,
        inputs: &[PathBuf],
        output: Option<&Path>,
        mode: CompilationMode,
    ) -> Result<CompileOutcome, CompileLaunchError>;
}

/// Shells out to the real `elm` executable on `PATH`.
#[derive(Clone, Debug, Default)]
pub struct ElmCompilerAdapter {
    pub elm_binary: String,
}

impl ElmCompilerAdapter {
    pub fn new() -> Self {
        Self { elm_binary: "elm".to_string() }
    }
}

#[async_trait]
impl CompilerAdapter for ElmCompilerAdapter {
    async fn install_dependencies(&self, manifest: &Path) -> Result<(), InstallError> {
        let cwd = manifest.parent().unwrap_or(Path::new("."));
        let args = vec!["make".to_string(), "--report=json".to_string()];
        let output = spawn::run(&self.elm_binary, &args, cwd, None)
            .await
            .map_err(map_spawn_error_to_install)?;
        if output.success() {
            Ok(())
        } else {
            Err(InstallError::NonZeroExit {
                reason: output.exit.unwrap_err(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }

    async fn compile(
        &self,
        manifest: &Path,
        inputs: &[PathBuf],
        output: Option<&Path>,
        mode: CompilationMode,
    ) -> Result<CompileOutcome, CompileLaunchError> {
        let cwd = manifest.parent().unwrap_or(Path::new("."));
        let mut args = vec!["make".to_string()];
        for input in inputs {
            args.push(input.display().to_string());
        }
        args.push("--report=json".to_string());
        if let Some(flag) = mode.as_flag() {
            args.push(flag.to_string());
        }
        let out_arg = match output {
            Some(path) => format!("--output={}", path.display()),
            None => "--output=/dev/null".to_string(),
        };
        args.push(out_arg);

        let spawned = spawn::run(&self.elm_binary, &args, cwd, None)
            .await
            .map_err(map_spawn_error_to_launch)?;

        Ok(interpret_elm_make_output(&spawned))
    }
}

fn map_spawn_error_to_install(err: SpawnError) -> InstallError {
    match err {
        SpawnError::CommandNotFound { command } => InstallError::CommandNotFound { command },
        SpawnError::OtherSpawnError { message } | SpawnError::StdinWriteError { message } => {
            InstallError::OtherSpawnError { message }
        }
    }
}

fn map_spawn_error_to_launch(err: SpawnError) -> CompileLaunchError {
    match err {
        SpawnError::CommandNotFound { command } => CompileLaunchError::CommandNotFound { command },
        SpawnError::OtherSpawnError { message } | SpawnError::StdinWriteError { message } => {
            CompileLaunchError::OtherSpawnError { message }
        }
    }
}

fn interpret_elm_make_output(spawned: &spawn::SpawnOutput) -> CompileOutcome {
    if spawned.success() {
        return CompileOutcome::Success { code: spawned.stdout.clone() };
    }
    let stderr = String::from_utf8_lossy(&spawned.stderr);
    let result = if stderr.trim_start().starts_with('{') {
        parse_report_json(&stderr)
    } else {
        Err(CompileResultError::UnexpectedOutput {
            stdout: String::from_utf8_lossy(&spawned.stdout).into_owned(),
            stderr: stderr.into_owned(),
        })
    };
    match result {
        Ok(outcome) => outcome,
        Err(err) => CompileOutcome::ResultError(err.into()),
    }
}

/// Records calls and replays configured outcomes; used in engine/watch tests
/// that must never invoke a real compiler.
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    pub struct CompileCall {
        pub manifest: PathBuf,
        pub inputs: Vec<PathBuf>,
        pub mode: CompilationMode,
    }

    struct FakeState {
        install_results: Vec<Result<(), InstallError>>,
        compile_results: Vec<Result<CompileOutcome, CompileLaunchError>>,
        calls: Vec<CompileCall>,
    }

    #[derive(Clone)]
    pub struct FakeCompilerAdapter {
        inner: Arc<Mutex<FakeState>>,
    }

    impl Default for FakeCompilerAdapter {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeState {
                    install_results: Vec::new(),
                    compile_results: Vec::new(),
                    calls: Vec::new(),
                })),
            }
        }
    }

    impl FakeCompilerAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the next `install_dependencies` result (FIFO). Defaults to
        /// `Ok(())` once the queue is drained.
        pub fn push_install_result(&self, result: Result<(), InstallError>) {
            self.inner.lock().install_results.push(result);
        }

        /// Queue the next `compile` result (FIFO).
        pub fn push_compile_result(&self, result: Result<CompileOutcome, CompileLaunchError>) {
            self.inner.lock().compile_results.push(result);
        }

        pub fn calls(&self) -> Vec<CompileCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl CompilerAdapter for FakeCompilerAdapter {
        async fn install_dependencies(&self, _manifest: &Path) -> Result<(), InstallError> {
            let mut state = self.inner.lock();
            if state.install_results.is_empty() {
                Ok(())
            } else {
                state.install_results.remove(0)
            }
        }

        async fn compile(
            &self,
            manifest: &Path,
            inputs: &[PathBuf],
            _output: Option<&Path>,
            mode: CompilationMode,
        ) -> Result<CompileOutcome, CompileLaunchError> {
            let mut state = self.inner.lock();
            state.calls.push(CompileCall {
                manifest: manifest.to_path_buf(),
                inputs: inputs.to_vec(),
                mode,
            });
            if state.compile_results.is_empty() {
                Ok(CompileOutcome::Success { code: Vec::new() })
            } else {
                state.compile_results.remove(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeCompilerAdapter;
    use super::*;

    #[tokio::test]
    async fn fake_adapter_records_compile_calls() {
        let adapter = FakeCompilerAdapter::new();
        let manifest = PathBuf::from("elm.json");
        let inputs = vec![PathBuf::from("src/Main.elm")];
        let _ = adapter
            .compile(&manifest, &inputs, None, CompilationMode::Standard)
            .await
            .unwrap();
        let calls = adapter.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].manifest, manifest);
    }

    #[tokio::test]
    async fn fake_adapter_replays_queued_compile_error() {
        let adapter = FakeCompilerAdapter::new();
        adapter.push_compile_result(Err(CompileLaunchError::ElmNotFound));
        let result = adapter
            .compile(Path::new("elm.json"), &[], None, CompilationMode::Standard)
            .await;
        assert!(matches!(result, Err(CompileLaunchError::ElmNotFound)));
    }
}
