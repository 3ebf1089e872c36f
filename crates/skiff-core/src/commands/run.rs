//! Run command implementation.
//!
//! Compiles the package's declared argument schema against the raw CLI
//! tokens and dispatches the entry point through the sandbox. `--help`
//! short-circuits into the generated package help view before any parsing.

use tracing::info;

use crate::args::{ArgumentParser, render_help};
use crate::context::AppContext;
use crate::error::SkiffError;
use crate::sandbox::{self, ExecutionRequest, ExecutionResult};

/// Options for the run command
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Name of the installed package to run
    pub name: String,
    /// Raw argument tokens after the package name, uninterpreted
    pub raw_args: Vec<String>,
    /// Fully captured piped stdin content, when present
    pub piped: Option<String>,
}

impl RunOptions {
    /// Create options for a package name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_args: Vec::new(),
            piped: None,
        }
    }

    /// Set the raw argument tokens.
    pub fn with_args(mut self, raw_args: Vec<String>) -> Self {
        self.raw_args = raw_args;
        self
    }

    /// Attach piped stdin content.
    pub fn with_piped(mut self, piped: impl Into<String>) -> Self {
        self.piped = Some(piped.into());
        self
    }
}

/// Outcome of a run invocation
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The package help view was requested
    Help(String),
    /// The entry point ran to completion, successfully or with a captured
    /// failure
    Completed(ExecutionResult),
}

/// Run command orchestrator
#[derive(Debug)]
pub struct RunCommand {
    context: AppContext,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(context: AppContext) -> Self {
        Self { context }
    }

    /// Create a run command rooted at the default state directory.
    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(AppContext::with_defaults()?))
    }

    /// Execute the run command.
    pub fn execute(&self, options: &RunOptions) -> anyhow::Result<RunOutcome> {
        let record = self.context.registry().get(&options.name)?;

        if ArgumentParser::wants_help(&options.raw_args) {
            return Ok(RunOutcome::Help(render_help(&record.manifest)));
        }

        if !record.install_dir.is_dir() {
            return Err(SkiffError::Execution(format!(
                "install directory {} is missing; reinstall '{}'",
                record.install_dir.display(),
                record.manifest.name
            ))
            .into());
        }

        let kwargs = ArgumentParser::new(&record.manifest.arguments).parse(&options.raw_args)?;
        let entry = record.manifest.entry()?;
        let mut request = ExecutionRequest::new(kwargs);
        if let Some(piped) = &options.piped {
            request = request.with_piped(piped.clone());
        }

        info!(package = %record.manifest.name, entry = %entry, "running package entry point");
        let result = sandbox::execute(&record.install_dir, &entry, &request)?;
        Ok(RunOutcome::Completed(result))
    }
}
