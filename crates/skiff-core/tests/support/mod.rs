//! Shared fixtures: isolated state roots and local git package repositories.

pub mod git;

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use skiff_core::AppContext;

/// Fresh state directory under a tempdir, with a context rooted in it.
pub fn isolated_context() -> (TempDir, AppContext) {
    let temp = TempDir::new().expect("failed to create temp dir");
    let context = AppContext::new(temp.path().join("state"));
    (temp, context)
}

/// Config text for a package with a shell entry module `tool.main`.
pub fn package_config(name: &str, version: &str) -> String {
    format!(
        r#"name: {name}
version: {version}
description: Test package {name}
author: Integration Tests
repository_url: https://example.com/{name}
entry_point: tool.main
tags: [test]
arguments:
  - name: shout
    type: bool
    default: false
    help: Uppercase the result
"#
    )
}

/// Write a minimal valid package (config plus shell entry module) into `dir`.
pub fn write_package_fixture(dir: &Path, name: &str, version: &str) {
    fs::create_dir_all(dir).expect("failed to create package dir");
    fs::write(dir.join("package.yaml"), package_config(name, version))
        .expect("failed to write package config");
    fs::write(
        dir.join("tool.sh"),
        "#!/bin/sh\nprintf '{\"ok\": true, \"result\": \"ran\"}\\n'\n",
    )
    .expect("failed to write entry module");
}

/// Initialize a git repository with a committer identity configured.
pub fn init_repo(dir: &Path) {
    fs::create_dir_all(dir).expect("failed to create repo dir");
    git::run(dir, &["init"]);
    git::run(dir, &["config", "user.email", "tests@example.com"]);
    git::run(dir, &["config", "user.name", "Integration Tests"]);
    git::run(dir, &["config", "commit.gpgsign", "false"]);
}

/// Stage everything and commit, returning the resulting HEAD SHA.
pub fn commit_all(dir: &Path, message: &str) -> String {
    git::run(dir, &["add", "-A"]);
    git::run(dir, &["commit", "-m", message]);
    git::output(dir, &["rev-parse", "HEAD"])
}
