//! Uninstall command implementation.

use std::path::PathBuf;

use tracing::info;

use crate::context::AppContext;

/// Options for the uninstall command
#[derive(Debug, Clone)]
pub struct UninstallOptions {
    /// Name of the installed package to remove
    pub name: String,
}

impl UninstallOptions {
    /// Create options for a package name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Report from an uninstall operation
#[derive(Debug, Clone)]
pub struct UninstallReport {
    /// Removed package name
    pub name: String,
    /// Version that was removed
    pub version: String,
    /// Install directory that was removed
    pub install_dir: PathBuf,
}

/// Uninstall command orchestrator
#[derive(Debug)]
pub struct UninstallCommand {
    context: AppContext,
}

impl UninstallCommand {
    /// Create a new uninstall command.
    pub fn new(context: AppContext) -> Self {
        Self { context }
    }

    /// Create an uninstall command rooted at the default state directory.
    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(AppContext::with_defaults()?))
    }

    /// Execute the uninstall command, removing the record and its directory.
    ///
    /// Directory removal happens inside the store before the record is
    /// dropped, so a failed removal leaves the record in place for a retry.
    pub fn execute(&self, options: &UninstallOptions) -> anyhow::Result<UninstallReport> {
        let record = self.context.registry().unregister(&options.name)?;
        info!(name = %record.manifest.name, "package uninstalled");
        Ok(UninstallReport {
            name: record.manifest.name.clone(),
            version: record.manifest.version.clone(),
            install_dir: record.install_dir,
        })
    }
}
