//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};

use crate::registry::RegistryStore;
use crate::source::SourceFetcher;

/// Unified application context for dependency injection.
///
/// Owns the state-directory layout and hands out the services built on it.
/// The CLI creates this once and passes it to commands.
#[derive(Debug, Clone)]
pub struct AppContext {
    state_dir: PathBuf,
}

impl AppContext {
    /// Create a context rooted at an explicit state directory.
    pub fn new(state_dir: PathBuf) -> Self {
        Self { state_dir }
    }

    /// Create a context rooted at the platform data directory.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let state_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?
            .join("skiff");
        Ok(Self::new(state_dir))
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Path of the persisted registry document.
    pub fn registry_path(&self) -> PathBuf {
        self.state_dir.join("registry.json")
    }

    /// Root directory holding one subdirectory per installed package.
    pub fn packages_dir(&self) -> PathBuf {
        self.state_dir.join("packages")
    }

    /// Root directory for in-flight fetch staging.
    pub fn staging_dir(&self) -> PathBuf {
        self.state_dir.join("staging")
    }

    /// Install directory owned by the named package.
    pub fn install_dir(&self, name: &str) -> PathBuf {
        self.packages_dir().join(name)
    }

    /// Get a SourceFetcher staging under this context.
    pub fn fetcher(&self) -> SourceFetcher {
        SourceFetcher::new(self.staging_dir())
    }

    /// Get the RegistryStore for this context.
    pub fn registry(&self) -> RegistryStore {
        RegistryStore::new(self.registry_path())
    }
}
