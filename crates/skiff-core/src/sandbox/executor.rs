//! Child process plumbing and the top-level execution entry point.

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SkiffError};
use crate::manifest::EntryPoint;
use crate::sandbox::module::{self, ModuleLoad};
use crate::sandbox::protocol::{self, ExecutionRequest, ExecutionResult};
use crate::sandbox::runtime::RunnerSpec;
use crate::sandbox::state::SandboxScope;

/// Captured output of one runner process.
#[derive(Debug, Clone)]
pub struct RunnerOutput {
    /// Whether the runner exited successfully
    pub success: bool,

    /// Exit code, absent when the runner was killed by a signal
    pub code: Option<i32>,

    /// Full stdout
    pub stdout: String,

    /// Full stderr
    pub stderr: String,
}

/// Execute a package entry point inside a sandbox scope.
///
/// The scope guard guarantees search path restoration and module cache
/// eviction on every exit path. Host-side problems (unresolvable module,
/// spawn failures) return `Err`; anything the package's own code does wrong
/// comes back as a structured failure result.
pub fn execute(
    package_root: &Path,
    entry: &EntryPoint,
    request: &ExecutionRequest,
) -> Result<ExecutionResult> {
    let mut scope = SandboxScope::enter(package_root);

    let loaded = match module::load_module(&mut scope, entry)? {
        ModuleLoad::Failed(detail) => return Ok(ExecutionResult::failure(detail)),
        ModuleLoad::Ready(loaded) => loaded,
    };

    let envelope = protocol::build_envelope(request, loaded.target);
    let spec = loaded.runtime.call_spec(
        &loaded.file,
        &entry.attribute,
        protocol::convention_label(loaded.target),
        scope.search_path(),
    );
    let output = run_child(&spec, Some(&envelope.to_string()))?;
    Ok(protocol::interpret_output(request, loaded.target, &output))
}

/// Spawn a runner and feed it the envelope, capturing all output.
pub(crate) fn run_child(spec: &RunnerSpec, stdin: Option<&str>) -> Result<RunnerOutput> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| SkiffError::Execution(format!("failed to create tokio runtime: {e}")))?;
    runtime.block_on(run_child_inner(spec, stdin))
}

/// Stdin writing runs concurrently with output collection so a large
/// envelope cannot deadlock against a chatty runner.
async fn run_child_inner(spec: &RunnerSpec, stdin: Option<&str>) -> Result<RunnerOutput> {
    debug!(command = %spec.command, "spawning module runner");
    let mut command = Command::new(&spec.command);
    command
        .args(&spec.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in &spec.env {
        command.env(key, value);
    }
    let mut child = command
        .spawn()
        .map_err(|e| SkiffError::Execution(format!("failed to spawn {}: {e}", spec.command)))?;

    let stdin_pipe = child.stdin.take();
    let payload = stdin.map(str::to_owned);
    let writer = async move {
        if let Some(mut pipe) = stdin_pipe {
            if let Some(payload) = payload {
                let _ = pipe.write_all(payload.as_bytes()).await;
            }
            let _ = pipe.shutdown().await;
        }
    };
    let (output, ()) = tokio::join!(child.wait_with_output(), writer);
    let output = output
        .map_err(|e| SkiffError::Execution(format!("failed to collect runner output: {e}")))?;

    let runner = RunnerOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!(success = runner.success, code = ?runner.code, "module runner finished");
    Ok(runner)
}

/// Last non-empty line of a stream, where outcome JSON lives.
pub(crate) fn last_nonempty_line(text: &str) -> Option<&str> {
    text.lines().rev().find(|line| !line.trim().is_empty())
}
