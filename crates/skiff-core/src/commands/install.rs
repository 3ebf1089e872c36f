//! Install command implementation.
//!
//! Fetches a package source from git, validates its metadata, moves the
//! package into the managed packages directory, and registers it. Staging
//! is removed on every path; a failure after a successful fetch leaves no
//! record and no install directory behind.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::context::AppContext;
use crate::error::SkiffError;
use crate::manifest;
use crate::registry::{InstalledPackageRecord, SourceRef};
use crate::source::{FetchedSource, SourceLocator};

/// Options for the install command
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Package source locator, `<repo-url>[/<subdirectory>]`
    pub locator: String,
    /// Branch or tag to check out instead of the remote default
    pub branch: Option<String>,
    /// Replace an existing install of the same package
    pub force: bool,
}

impl InstallOptions {
    /// Create options for a source locator.
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            branch: None,
            force: false,
        }
    }

    /// Set the branch to check out.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Replace an existing install of the same package.
    pub fn with_force(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Report from an install operation
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// Installed package name
    pub name: String,
    /// Installed package version
    pub version: String,
    /// Commit SHA the install resolved to
    pub commit: String,
    /// Directory the package was installed into
    pub install_dir: PathBuf,
    /// Whether an existing install was replaced
    pub replaced: bool,
}

/// Install command orchestrator
#[derive(Debug)]
pub struct InstallCommand {
    context: AppContext,
}

impl InstallCommand {
    /// Create a new install command.
    pub fn new(context: AppContext) -> Self {
        Self { context }
    }

    /// Create an install command rooted at the default state directory.
    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(AppContext::with_defaults()?))
    }

    /// Execute the install command.
    pub fn execute(&self, options: &InstallOptions) -> anyhow::Result<InstallReport> {
        let locator = SourceLocator::parse(&options.locator)?;
        let fetched = self
            .context
            .fetcher()
            .fetch(&locator, options.branch.as_deref())?;
        let outcome = self.install_fetched(&fetched, &locator, options);
        fetched.cleanup();
        outcome
    }

    fn install_fetched(
        &self,
        fetched: &FetchedSource,
        locator: &SourceLocator,
        options: &InstallOptions,
    ) -> anyhow::Result<InstallReport> {
        let manifest = manifest::load_validated(&fetched.package_root)?;
        let name = manifest.name.clone();

        let store = self.context.registry();
        let replaced = store.contains(&name)?;
        if replaced && !options.force {
            return Err(SkiffError::Duplicate(name).into());
        }

        // Purge the prior install before any file lands, so a forced
        // reinstall can never leave stale files mixed with new ones.
        let install_dir = self.context.install_dir(&name);
        if replaced {
            let prior = store.get(&name)?;
            if prior.install_dir != install_dir && prior.install_dir.exists() {
                std::fs::remove_dir_all(&prior.install_dir)
                    .with_context(|| format!("failed to remove prior install of '{name}'"))?;
            }
        }
        if install_dir.exists() {
            std::fs::remove_dir_all(&install_dir)
                .with_context(|| format!("failed to clear install directory for '{name}'"))?;
        }
        copy_tree_filtered(&fetched.package_root, &install_dir)?;

        let mut source = SourceRef::new(locator.repo_url.clone());
        if let Some(branch) = &options.branch {
            source = source.with_branch(branch.clone());
        }
        if let Some(subdir) = &locator.subdir {
            source = source.with_subdir(subdir.clone());
        }
        let record = InstalledPackageRecord::new(manifest, install_dir.clone(), source)
            .with_commit(&fetched.commit);
        let report = InstallReport {
            name: record.name().to_string(),
            version: record.manifest.version.clone(),
            commit: fetched.commit.clone(),
            install_dir: install_dir.clone(),
            replaced,
        };
        if let Err(err) = store.register(record, options.force) {
            let _ = std::fs::remove_dir_all(&install_dir);
            return Err(err.into());
        }

        info!(name = %report.name, version = %report.version, commit = %report.commit, "package installed");
        Ok(report)
    }
}

/// Copy a package tree, skipping `.git` metadata.
pub(crate) fn copy_tree_filtered(src: &Path, dst: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("failed to create directory {}", dst.display()))?;
    for entry in std::fs::read_dir(src)
        .with_context(|| format!("failed to read directory {}", src.display()))?
    {
        let entry =
            entry.with_context(|| format!("failed to read an entry of {}", src.display()))?;
        if entry.file_name() == ".git" {
            continue;
        }
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to stat {}", from.display()))?;
        if file_type.is_dir() {
            copy_tree_filtered(&from, &to)?;
        } else if file_type.is_file() {
            std::fs::copy(&from, &to)
                .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;
        } else {
            anyhow::bail!("unsupported filesystem entry at {}", from.display());
        }
    }
    Ok(())
}
