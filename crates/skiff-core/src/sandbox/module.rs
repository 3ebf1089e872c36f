//! Entry module resolution and the invocation variant probe.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SkiffError};
use crate::manifest::EntryPoint;
use crate::sandbox::executor;
use crate::sandbox::protocol::FailureDetail;
use crate::sandbox::runtime::ModuleRuntime;
use crate::sandbox::state::SandboxScope;

/// How an entry point wants to be invoked, resolved once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    /// Takes one structured input object carrying id, payload, and context
    Protocol,
    /// Plain callable taking keyword arguments
    Function,
    /// Zero-argument-constructible type whose instance is the callable
    Class,
}

/// Cached probe result for one module file.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    /// blake3 hex digest of the module file contents
    pub fingerprint: String,

    /// Invocation variant the probe resolved
    pub target: CallTarget,
}

/// A resolved, probed entry module ready for dispatch.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    /// Module file resolved along the search path
    pub file: PathBuf,

    /// Runtime that executes this module
    pub runtime: ModuleRuntime,

    /// Invocation variant
    pub target: CallTarget,
}

/// Result of loading an entry module inside a scope.
#[derive(Debug, Clone)]
pub enum ModuleLoad {
    /// Module resolved and probed, ready for dispatch
    Ready(LoadedModule),
    /// The package's own code failed during the probe (import error, missing
    /// attribute); captured, not propagated
    Failed(FailureDetail),
}

#[derive(Debug, Deserialize)]
struct WireProbe {
    ok: bool,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    protocol: bool,
    #[serde(default)]
    error: Option<FailureDetail>,
}

enum ProbeResult {
    Target(CallTarget),
    Failed(FailureDetail),
}

/// Resolve and probe the entry module for `entry` inside an active scope.
///
/// The module file is resolved along the search path, fingerprinted, and
/// probed for its invocation variant unless a descriptor with the same
/// fingerprint is already cached. Host-side problems (unresolvable module,
/// broken probe plumbing) are errors; failures inside the package's own
/// code come back as [`ModuleLoad::Failed`].
pub fn load_module(scope: &mut SandboxScope, entry: &EntryPoint) -> Result<ModuleLoad> {
    let candidates = entry.file_candidates();
    let Some(file) = scope.resolve_module_file(&candidates) else {
        return Err(SkiffError::Execution(format!(
            "entry module '{}' not found on the search path",
            entry.module
        )));
    };
    let runtime = ModuleRuntime::for_module_file(&file).ok_or_else(|| {
        SkiffError::Execution(format!(
            "no runtime available for module file {}",
            file.display()
        ))
    })?;
    let fingerprint = file_fingerprint(&file)?;

    let target = match scope.cached_descriptor(&entry.module, &fingerprint) {
        Some(descriptor) => descriptor.target,
        None => match probe_module(scope, runtime, &file, entry)? {
            ProbeResult::Failed(detail) => return Ok(ModuleLoad::Failed(detail)),
            ProbeResult::Target(target) => {
                scope.store_descriptor(
                    &entry.module,
                    ModuleDescriptor {
                        fingerprint,
                        target,
                    },
                );
                target
            }
        },
    };

    debug!(module = %entry.module, file = %file.display(), ?target, "loaded entry module");
    Ok(ModuleLoad::Ready(LoadedModule {
        file,
        runtime,
        target,
    }))
}

/// blake3 hex fingerprint of a module file's contents.
pub fn file_fingerprint(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

fn probe_module(
    scope: &SandboxScope,
    runtime: ModuleRuntime,
    file: &Path,
    entry: &EntryPoint,
) -> Result<ProbeResult> {
    let Some(spec) = runtime.probe_spec(file, &entry.attribute, scope.search_path()) else {
        return Ok(ProbeResult::Target(CallTarget::Function));
    };
    let output = executor::run_child(&spec, None)?;
    let line = executor::last_nonempty_line(&output.stdout).unwrap_or_default();
    let outcome: WireProbe = serde_json::from_str(line).map_err(|_| {
        SkiffError::Execution(format!(
            "unreadable probe output for module '{}'",
            entry.module
        ))
    })?;
    if !outcome.ok {
        let detail = outcome.error.unwrap_or_else(|| {
            FailureDetail::new("UnknownError", "probe reported failure without detail")
        });
        return Ok(ProbeResult::Failed(detail));
    }
    let target = if outcome.protocol {
        CallTarget::Protocol
    } else if outcome.kind == "class" {
        CallTarget::Class
    } else {
        CallTarget::Function
    };
    Ok(ProbeResult::Target(target))
}
