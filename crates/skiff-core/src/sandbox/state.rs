//! Process-wide loader state and the sandbox scope guard.
//!
//! The module search path and the cache of probed module descriptors are one
//! shared mutable resource. A [`SandboxScope`] holds the mutex for its whole
//! lifetime, so only one sandbox can be active at a time within a process.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::debug;

use crate::sandbox::module::ModuleDescriptor;

/// The host's code-resolution state: search path plus module cache.
#[derive(Debug, Default)]
pub struct LoaderState {
    search_path: Vec<PathBuf>,
    modules: HashMap<String, ModuleDescriptor>,
}

static LOADER: OnceLock<Mutex<LoaderState>> = OnceLock::new();

fn loader() -> &'static Mutex<LoaderState> {
    LOADER.get_or_init(|| Mutex::new(LoaderState::default()))
}

/// Exclusive, scoped extension of the loader state.
///
/// Entering a scope prepends the package root to the search path. On drop
/// the search path is restored to its prior exact state and every module
/// descriptor cached during the scope is evicted, on every exit path.
pub struct SandboxScope {
    guard: MutexGuard<'static, LoaderState>,
    saved_path: Vec<PathBuf>,
    preexisting: HashSet<String>,
}

impl SandboxScope {
    /// Acquire the loader and prepend `package_root` to the search path.
    pub fn enter(package_root: &Path) -> Self {
        let mut guard = loader().lock().unwrap_or_else(PoisonError::into_inner);
        let saved_path = guard.search_path.clone();
        let preexisting = guard.modules.keys().cloned().collect();
        guard.search_path.insert(0, package_root.to_path_buf());
        debug!(root = %package_root.display(), "entered sandbox scope");
        Self {
            guard,
            saved_path,
            preexisting,
        }
    }

    /// Current search path, package root first.
    pub fn search_path(&self) -> &[PathBuf] {
        &self.guard.search_path
    }

    /// Resolve a module reference to a file along the search path.
    ///
    /// Each directory is probed for the candidate file names in order; the
    /// first hit wins.
    pub fn resolve_module_file(&self, candidates: &[String]) -> Option<PathBuf> {
        for dir in &self.guard.search_path {
            for name in candidates {
                let path = dir.join(name);
                if path.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }

    /// Cached descriptor for `module`, if its fingerprint still matches.
    ///
    /// A same-name descriptor with a different fingerprint belongs to some
    /// other package's module and is evicted here, so packages sharing a
    /// module name never see each other's stale descriptor.
    pub fn cached_descriptor(
        &mut self,
        module: &str,
        fingerprint: &str,
    ) -> Option<ModuleDescriptor> {
        match self.guard.modules.get(module) {
            Some(descriptor) if descriptor.fingerprint == fingerprint => {
                Some(descriptor.clone())
            }
            Some(_) => {
                self.guard.modules.remove(module);
                None
            }
            None => None,
        }
    }

    /// Cache a probed descriptor under `module`.
    pub fn store_descriptor(&mut self, module: &str, descriptor: ModuleDescriptor) {
        self.guard.modules.insert(module.to_string(), descriptor);
    }
}

impl Drop for SandboxScope {
    fn drop(&mut self) {
        self.guard.search_path = std::mem::take(&mut self.saved_path);
        let preexisting = std::mem::take(&mut self.preexisting);
        self.guard.modules.retain(|name, _| preexisting.contains(name));
        debug!("restored loader state");
    }
}
