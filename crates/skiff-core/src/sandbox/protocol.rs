//! Call envelope assembly and outcome interpretation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::sandbox::executor::{RunnerOutput, last_nonempty_line};
use crate::sandbox::module::CallTarget;

/// Parameter names owned by the host surface, stripped before dispatch.
const RESERVED_PARAMS: [&str; 3] = ["format", "stdin_as", "help"];

/// One validated execution request.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Request id carried into the structured input object
    pub id: Uuid,

    /// Coerced keyword arguments from the argument compiler
    pub kwargs: Map<String, Value>,

    /// Fully captured piped content, when stdin was not a terminal
    pub piped: Option<String>,
}

impl ExecutionRequest {
    /// Create a request with a generated id.
    pub fn new(kwargs: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kwargs,
            piped: None,
        }
    }

    /// Attach piped stdin content.
    pub fn with_piped(mut self, piped: impl Into<String>) -> Self {
        self.piped = Some(piped.into());
        self
    }

    /// Use a caller-supplied request id.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}

/// Structured failure detail captured at the sandbox boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Failure kind, an exception type name or a runner-level tag
    pub kind: String,

    /// Human-readable message
    pub message: String,
}

impl FailureDetail {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Outcome of one sandboxed execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionResult {
    /// The entry point returned a value
    Success {
        /// Result payload, normalized per the calling convention
        result: Value,
    },
    /// Package code or its runner failed; captured, never propagated
    Failure {
        /// Structured error detail
        error: FailureDetail,
    },
}

impl ExecutionResult {
    pub fn success(result: Value) -> Self {
        Self::Success { result }
    }

    pub fn failure(error: FailureDetail) -> Self {
        Self::Failure { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Deserialize)]
struct WireOutcome {
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<FailureDetail>,
}

/// Build the JSON envelope written to the runner's stdin.
///
/// Protocol calls get a pre-assembled payload: kwargs minus reserved names,
/// with piped content exposed under both the `input` and `stdin` keys.
/// Legacy calls carry raw kwargs plus the piped content for the shim to
/// alias against the callable's signature.
pub(crate) fn build_envelope(request: &ExecutionRequest, target: CallTarget) -> Value {
    match target {
        CallTarget::Protocol => {
            let mut payload = request.kwargs.clone();
            for name in RESERVED_PARAMS {
                payload.remove(name);
            }
            if let Some(piped) = &request.piped {
                payload.insert("input".to_string(), Value::String(piped.clone()));
                payload.insert("stdin".to_string(), Value::String(piped.clone()));
            }
            json!({
                "id": request.id.to_string(),
                "payload": payload,
                "context": {},
            })
        }
        CallTarget::Function | CallTarget::Class => {
            let mut kwargs = request.kwargs.clone();
            for name in RESERVED_PARAMS {
                kwargs.remove(name);
            }
            json!({
                "id": request.id.to_string(),
                "kwargs": kwargs,
                "piped": request.piped,
            })
        }
    }
}

/// Wire name of the calling convention, passed to the call shim.
pub(crate) fn convention_label(target: CallTarget) -> &'static str {
    match target {
        CallTarget::Protocol => "protocol",
        CallTarget::Function | CallTarget::Class => "legacy",
    }
}

/// Interpret a runner's captured output as an execution outcome.
///
/// A parseable outcome line on stdout wins regardless of exit status. A
/// clean exit without one treats the whole stdout as a plain text result,
/// which is what shell modules produce. A failed exit without one is a
/// runner failure carrying the stderr tail.
pub(crate) fn interpret_output(
    request: &ExecutionRequest,
    target: CallTarget,
    output: &RunnerOutput,
) -> ExecutionResult {
    if let Some(line) = last_nonempty_line(&output.stdout)
        && let Ok(outcome) = serde_json::from_str::<WireOutcome>(line)
    {
        return if outcome.ok {
            ExecutionResult::success(normalize_result(request, target, outcome.result))
        } else {
            ExecutionResult::failure(outcome.error.unwrap_or_else(|| {
                FailureDetail::new("UnknownError", "runner reported failure without detail")
            }))
        };
    }
    if output.success {
        let text = output.stdout.trim_end().to_string();
        return ExecutionResult::success(normalize_result(
            request,
            target,
            Value::String(text),
        ));
    }
    ExecutionResult::failure(FailureDetail::new("RunnerExit", runner_failure_message(output)))
}

/// Normalize a protocol-convention result.
///
/// Plain mappings that lack the structured output shape are wrapped into
/// one under the request id; everything else passes through unchanged.
fn normalize_result(request: &ExecutionRequest, target: CallTarget, raw: Value) -> Value {
    if target != CallTarget::Protocol {
        return raw;
    }
    match raw {
        Value::Object(map)
            if !(map.contains_key("input_id") && map.contains_key("result")) =>
        {
            json!({
                "input_id": request.id.to_string(),
                "result": Value::Object(map),
            })
        }
        other => other,
    }
}

fn runner_failure_message(output: &RunnerOutput) -> String {
    let detail = tail(&output.stderr)
        .or_else(|| tail(&output.stdout))
        .unwrap_or_default();
    match output.code {
        Some(code) if detail.is_empty() => format!("runner exited with status {code}"),
        Some(code) => format!("runner exited with status {code}: {detail}"),
        None if detail.is_empty() => "runner terminated by a signal".to_string(),
        None => format!("runner terminated by a signal: {detail}"),
    }
}

/// Last few lines of a stream, for failure messages.
fn tail(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    let start = lines.len().saturating_sub(5);
    Some(lines[start..].join("\n"))
}
