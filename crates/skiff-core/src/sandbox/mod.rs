//! Sandboxed execution of package entry points.
//!
//! A sandbox scope is a reversible, exclusive extension of the host's
//! code-resolution state: the package root is prepended to the module
//! search path, the entry module resolved and probed, and the call
//! dispatched to the module's runtime in a child process. The scope guard
//! restores the prior state on every exit path, so packages never leak
//! modules or path entries into each other.

mod executor;
mod module;
mod protocol;
mod runtime;
mod state;

pub use executor::{RunnerOutput, execute};
pub use module::{CallTarget, LoadedModule, ModuleDescriptor, ModuleLoad, load_module};
pub use protocol::{ExecutionRequest, ExecutionResult, FailureDetail};
pub use runtime::{ModuleRuntime, RunnerSpec};
pub use state::SandboxScope;
