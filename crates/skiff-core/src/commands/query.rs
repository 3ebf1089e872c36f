//! Read-only registry views: list, info, search, and status.

use std::path::PathBuf;

use crate::context::AppContext;
use crate::registry::InstalledPackageRecord;

/// Report from the status view
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// State root directory
    pub state_dir: PathBuf,
    /// Registry document path
    pub registry_path: PathBuf,
    /// Number of registered packages
    pub package_count: usize,
    /// Names of records whose install directory has gone missing
    pub orphaned: Vec<String>,
}

/// Read-only registry command orchestrator
#[derive(Debug)]
pub struct QueryCommand {
    context: AppContext,
}

impl QueryCommand {
    /// Create a new query command.
    pub fn new(context: AppContext) -> Self {
        Self { context }
    }

    /// Create a query command rooted at the default state directory.
    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(AppContext::with_defaults()?))
    }

    /// All installed records, ordered by name.
    pub fn list(&self) -> anyhow::Result<Vec<InstalledPackageRecord>> {
        Ok(self.context.registry().list()?)
    }

    /// Full record for one installed package.
    pub fn info(&self, name: &str) -> anyhow::Result<InstalledPackageRecord> {
        Ok(self.context.registry().get(name)?)
    }

    /// Records matching a query and tag filter.
    pub fn search(
        &self,
        query: Option<&str>,
        tags: &[String],
    ) -> anyhow::Result<Vec<InstalledPackageRecord>> {
        Ok(self.context.registry().search(query, tags)?)
    }

    /// Registry health summary.
    pub fn status(&self) -> anyhow::Result<StatusReport> {
        let store = self.context.registry();
        let records = store.list()?;
        let orphaned = store
            .orphans()?
            .into_iter()
            .map(|record| record.manifest.name)
            .collect();
        Ok(StatusReport {
            state_dir: self.context.state_dir().to_path_buf(),
            registry_path: self.context.registry_path(),
            package_count: records.len(),
            orphaned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::manifest::PackageManifest;
    use crate::registry::SourceRef;

    fn setup_test_env() -> (TempDir, QueryCommand) {
        let temp = TempDir::new().unwrap();
        let context = AppContext::new(temp.path().join("state"));
        (temp, QueryCommand::new(context))
    }

    fn register(command: &QueryCommand, name: &str, present: bool) {
        let install_dir = command.context.install_dir(name);
        if present {
            std::fs::create_dir_all(&install_dir).unwrap();
        }
        let manifest = PackageManifest {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            description: "a demo package".to_string(),
            author: "demo".to_string(),
            repository_url: "https://example.com/demo.git".to_string(),
            entry_point: "tool.main".to_string(),
            ..Default::default()
        };
        let record = InstalledPackageRecord::new(
            manifest,
            install_dir,
            SourceRef::new("https://example.com/demo.git"),
        );
        command.context.registry().register(record, false).unwrap();
    }

    #[test]
    fn status_counts_packages_and_names_orphans() {
        let (_temp, command) = setup_test_env();
        register(&command, "alpha", true);
        register(&command, "beta", false);

        let report = command.status().unwrap();
        assert_eq!(report.package_count, 2);
        assert_eq!(report.orphaned, vec!["beta".to_string()]);
        assert!(report.registry_path.ends_with("registry.json"));
    }

    #[test]
    fn info_surfaces_not_found_for_unknown_names() {
        let (_temp, command) = setup_test_env();
        let err = command.info("missing-pkg").unwrap_err();
        assert!(err.to_string().contains("missing-pkg"));
    }
}
