//! Git fetcher for staging package sources.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{Result, SkiffError};

use super::SourceLocator;

/// A successfully staged package source.
#[derive(Debug, Clone)]
pub struct FetchedSource {
    /// Staging directory holding the full clone
    pub staging_dir: PathBuf,
    /// Package root inside the clone (the subdirectory, if one was given)
    pub package_root: PathBuf,
    /// Commit SHA the clone resolved to
    pub commit: String,
}

impl FetchedSource {
    /// Remove the staging directory. Failures are ignored; staging lives
    /// under the state directory and stale entries are harmless.
    pub fn cleanup(&self) {
        let _ = std::fs::remove_dir_all(&self.staging_dir);
    }
}

/// Fetches package sources from git remotes into fresh staging directories.
#[derive(Debug)]
pub struct SourceFetcher {
    staging_root: PathBuf,
}

impl SourceFetcher {
    /// Create a new SourceFetcher staging under the given root.
    pub fn new(staging_root: PathBuf) -> Self {
        Self { staging_root }
    }

    /// Clone the locator's repository into a fresh staging directory.
    ///
    /// The clone is shallow and checks out `branch` when given, the remote
    /// default otherwise. If the locator names a subdirectory it must exist
    /// in the clone; it becomes the package root. On any failure the staging
    /// directory is removed before the error is returned.
    pub fn fetch(&self, locator: &SourceLocator, branch: Option<&str>) -> Result<FetchedSource> {
        let staging_dir = self.unique_staging_dir(locator)?;
        info!(repo = %locator.repo_url, staging = %staging_dir.display(), "cloning package source");

        match self.clone_into(&staging_dir, locator, branch) {
            Ok(fetched) => Ok(fetched),
            Err(err) => {
                let _ = std::fs::remove_dir_all(&staging_dir);
                Err(err)
            }
        }
    }

    fn clone_into(
        &self,
        staging_dir: &Path,
        locator: &SourceLocator,
        branch: Option<&str>,
    ) -> Result<FetchedSource> {
        let staging_str = staging_dir
            .to_str()
            .ok_or_else(|| SkiffError::Fetch("staging path is not valid UTF-8".to_string()))?;

        let mut args = vec!["clone", "--depth", "1"];
        if let Some(branch) = branch {
            args.extend(["--branch", branch]);
        }
        args.extend([locator.repo_url.as_str(), staging_str]);
        run_git(None, &args)?;

        let commit = git_rev_parse(staging_dir, "HEAD")?;
        debug!(commit = %commit, "clone resolved");

        let package_root = match &locator.subdir {
            Some(subdir) => {
                let root = staging_dir.join(subdir);
                if !root.is_dir() {
                    return Err(SkiffError::Fetch(format!(
                        "subdirectory '{}' not found in repository {}",
                        subdir, locator.repo_url
                    )));
                }
                root
            }
            None => staging_dir.to_path_buf(),
        };

        Ok(FetchedSource {
            staging_dir: staging_dir.to_path_buf(),
            package_root,
            commit,
        })
    }

    /// Allocate a fresh staging directory for this locator.
    fn unique_staging_dir(&self, locator: &SourceLocator) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.staging_root)?;
        let name = format!("{}-{}", locator.staging_stem(), uuid::Uuid::new_v4());
        Ok(self.staging_root.join(name))
    }
}

/// Run a git command, mapping failure to a fetch error.
fn run_git(cwd: Option<&Path>, args: &[&str]) -> Result<()> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let output = cmd
        .output()
        .map_err(|e| SkiffError::Fetch(format!("failed to invoke git: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SkiffError::Fetch(format!(
            "git {} failed: {}",
            args.first().copied().unwrap_or("command"),
            stderr.trim()
        )));
    }
    Ok(())
}

/// Run git rev-parse and return the resolved SHA.
fn git_rev_parse(cwd: &Path, rev: &str) -> Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", rev])
        .current_dir(cwd)
        .output()
        .map_err(|e| SkiffError::Fetch(format!("failed to invoke git: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SkiffError::Fetch(format!(
            "git rev-parse {} failed: {}",
            rev,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
