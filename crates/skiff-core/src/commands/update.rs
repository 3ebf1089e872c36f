//! Update command implementation.
//!
//! Re-fetches an installed package from its recorded source and swaps the
//! install directory. The prior install is set aside until the new one is
//! registered, so a failure at any stage leaves it untouched.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::context::AppContext;
use crate::error::SkiffError;
use crate::manifest;
use crate::registry::{InstalledPackageRecord, SourceRef};
use crate::source::{FetchedSource, SourceLocator};

use super::install::copy_tree_filtered;

/// Options for the update command
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Name of the installed package to update
    pub name: String,
    /// Branch to check out instead of the one recorded at install time
    pub branch: Option<String>,
}

impl UpdateOptions {
    /// Create options for a package name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            branch: None,
        }
    }

    /// Set the branch to check out.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

/// Report from an update operation
#[derive(Debug, Clone)]
pub struct UpdateReport {
    /// Updated package name
    pub name: String,
    /// Version recorded before the update
    pub old_version: String,
    /// Version recorded after the update
    pub new_version: String,
    /// Commit SHA before the update, when one was recorded
    pub old_commit: Option<String>,
    /// Commit SHA the update resolved to
    pub new_commit: String,
}

/// Update command orchestrator
#[derive(Debug)]
pub struct UpdateCommand {
    context: AppContext,
}

impl UpdateCommand {
    /// Create a new update command.
    pub fn new(context: AppContext) -> Self {
        Self { context }
    }

    /// Create an update command rooted at the default state directory.
    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(AppContext::with_defaults()?))
    }

    /// Execute the update command.
    pub fn execute(&self, options: &UpdateOptions) -> anyhow::Result<UpdateReport> {
        let record = self.context.registry().get(&options.name)?;
        let branch = options
            .branch
            .clone()
            .or_else(|| record.source.branch.clone());

        let mut locator = SourceLocator::new(record.source.url.clone());
        if let Some(subdir) = &record.source.subdir {
            locator = locator.with_subdir(subdir.clone());
        }
        let fetched = self.context.fetcher().fetch(&locator, branch.as_deref())?;
        let outcome = self.apply_update(&record, &fetched, branch);
        fetched.cleanup();
        outcome
    }

    fn apply_update(
        &self,
        record: &InstalledPackageRecord,
        fetched: &FetchedSource,
        branch: Option<String>,
    ) -> anyhow::Result<UpdateReport> {
        let manifest = manifest::load_validated(&fetched.package_root)?;
        if manifest.name != record.manifest.name {
            return Err(SkiffError::Validation(vec![format!(
                "package name changed from '{}' to '{}'; uninstall and reinstall instead",
                record.manifest.name, manifest.name
            )])
            .into());
        }

        let install_dir = record.install_dir.clone();
        let backup = swap_out(&install_dir)?;
        if let Err(err) = copy_tree_filtered(&fetched.package_root, &install_dir) {
            restore_backup(&install_dir, backup.as_deref());
            return Err(err);
        }

        let mut source = SourceRef::new(record.source.url.clone());
        if let Some(branch) = &branch {
            source = source.with_branch(branch.clone());
        }
        if let Some(subdir) = &record.source.subdir {
            source = source.with_subdir(subdir.clone());
        }
        let updated = InstalledPackageRecord::new(manifest, install_dir.clone(), source)
            .with_commit(&fetched.commit);
        let report = UpdateReport {
            name: record.manifest.name.clone(),
            old_version: record.manifest.version.clone(),
            new_version: updated.manifest.version.clone(),
            old_commit: record.commit.clone(),
            new_commit: fetched.commit.clone(),
        };
        if let Err(err) = self.context.registry().overwrite(updated) {
            let _ = std::fs::remove_dir_all(&install_dir);
            restore_backup(&install_dir, backup.as_deref());
            return Err(err.into());
        }
        if let Some(backup) = backup {
            let _ = std::fs::remove_dir_all(&backup);
        }

        info!(
            name = %report.name,
            old = report.old_commit.as_deref().unwrap_or("unknown"),
            new = %report.new_commit,
            "package updated"
        );
        Ok(report)
    }
}

/// Rename the current install aside, returning the backup path.
fn swap_out(install_dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    if !install_dir.exists() {
        return Ok(None);
    }
    let file_name = install_dir
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            anyhow::anyhow!("invalid install directory path: {}", install_dir.display())
        })?;
    let backup = install_dir.with_file_name(format!("{file_name}.prev.{}", std::process::id()));
    std::fs::rename(install_dir, &backup).with_context(|| {
        format!("failed to set aside prior install at {}", install_dir.display())
    })?;
    Ok(Some(backup))
}

/// Put a set-aside install back in place after a failed swap.
fn restore_backup(install_dir: &Path, backup: Option<&Path>) {
    let Some(backup) = backup else {
        return;
    };
    let _ = std::fs::remove_dir_all(install_dir);
    let _ = std::fs::rename(backup, install_dir);
}
