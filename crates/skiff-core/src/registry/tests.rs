//! Tests for the registry module.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::*;
use crate::error::SkiffError;
use crate::manifest::PackageManifest;

fn manifest_fixture(name: &str) -> PackageManifest {
    PackageManifest {
        name: name.to_string(),
        version: "0.1.0".to_string(),
        description: format!("{name} test package"),
        author: "tester".to_string(),
        repository_url: format!("https://github.com/acme/{name}"),
        entry_point: "main_mod.run".to_string(),
        tags: vec!["demo".to_string()],
        ..PackageManifest::default()
    }
}

fn record_fixture(name: &str, install_dir: &Path) -> InstalledPackageRecord {
    InstalledPackageRecord::new(
        manifest_fixture(name),
        install_dir.to_path_buf(),
        SourceRef::new(format!("https://github.com/acme/{name}")),
    )
    .with_commit("abc1234")
}

fn setup_store() -> (TempDir, RegistryStore) {
    let temp = TempDir::new().unwrap();
    let store = RegistryStore::new(temp.path().join("state").join("registry.json"));
    (temp, store)
}

fn make_install_dir(temp: &TempDir, name: &str) -> PathBuf {
    let dir = temp.path().join("packages").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("main_mod.py"), "def run():\n    pass\n").unwrap();
    dir
}

mod types_tests {
    use super::*;

    #[test]
    fn record_serializes_with_flattened_manifest() {
        let record = record_fixture("docqa", Path::new("/tmp/pkgs/docqa"));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["name"], "docqa");
        assert_eq!(value["version"], "0.1.0");
        assert_eq!(value["installed_path"], "/tmp/pkgs/docqa");
        assert_eq!(value["commit_hash"], "abc1234");
        assert_eq!(value["source"]["url"], "https://github.com/acme/docqa");
        assert!(value["install_time"].is_string());
    }

    #[test]
    fn source_ref_builders_set_optional_fields() {
        let source = SourceRef::new("https://github.com/acme/docqa")
            .with_branch("develop")
            .with_subdir("pkgs/docqa");
        assert_eq!(source.branch.as_deref(), Some("develop"));
        assert_eq!(source.subdir.as_deref(), Some("pkgs/docqa"));
    }

    #[test]
    fn document_rejects_unsupported_version() {
        let document = RegistryDocument {
            version: REGISTRY_VERSION + 1,
            packages: Default::default(),
        };
        assert!(document.validate().is_err());
    }
}

mod store_tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_empty_registry() {
        let (_temp, store) = setup_store();
        let document = store.load().unwrap();
        assert_eq!(document.version, REGISTRY_VERSION);
        assert!(document.packages.is_empty());
    }

    #[test]
    fn register_persists_the_record() {
        let (temp, store) = setup_store();
        let dir = make_install_dir(&temp, "docqa");
        store.register(record_fixture("docqa", &dir), false).unwrap();

        let loaded = store.get("docqa").unwrap();
        assert_eq!(loaded.name(), "docqa");
        assert_eq!(loaded.install_dir, dir);
        assert!(store.path().is_file());
    }

    #[test]
    fn register_rejects_duplicate_and_preserves_original() {
        let (temp, store) = setup_store();
        let dir = make_install_dir(&temp, "docqa");
        store.register(record_fixture("docqa", &dir), false).unwrap();
        let original = store.get("docqa").unwrap();

        let mut replacement = record_fixture("docqa", &dir);
        replacement.manifest.version = "9.9.9".to_string();
        let err = store.register(replacement, false).unwrap_err();

        assert!(matches!(err, SkiffError::Duplicate(name) if name == "docqa"));
        assert_eq!(store.get("docqa").unwrap(), original);
    }

    #[test]
    fn register_with_force_replaces_the_record() {
        let (temp, store) = setup_store();
        let dir = make_install_dir(&temp, "docqa");
        store.register(record_fixture("docqa", &dir), false).unwrap();

        let mut replacement = record_fixture("docqa", &dir);
        replacement.manifest.version = "2.0.0".to_string();
        store.register(replacement, true).unwrap();

        assert_eq!(store.get("docqa").unwrap().manifest.version, "2.0.0");
    }

    #[test]
    fn register_with_force_removes_a_relocated_install_dir() {
        let (temp, store) = setup_store();
        let old_dir = make_install_dir(&temp, "docqa-old");
        let new_dir = make_install_dir(&temp, "docqa-new");
        store
            .register(record_fixture("docqa", &old_dir), false)
            .unwrap();

        store.register(record_fixture("docqa", &new_dir), true).unwrap();

        assert!(!old_dir.exists());
        assert!(new_dir.is_dir());
    }

    #[test]
    fn unregister_removes_record_and_directory() {
        let (temp, store) = setup_store();
        let dir = make_install_dir(&temp, "docqa");
        store.register(record_fixture("docqa", &dir), false).unwrap();

        let removed = store.unregister("docqa").unwrap();

        assert_eq!(removed.name(), "docqa");
        assert!(!dir.exists());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn unregister_unknown_package_is_not_found() {
        let (temp, store) = setup_store();
        let dir = make_install_dir(&temp, "docqa");
        store.register(record_fixture("docqa", &dir), false).unwrap();

        let err = store.unregister("missing-pkg").unwrap_err();

        assert!(matches!(err, SkiffError::NotFound(name) if name == "missing-pkg"));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn get_unknown_package_is_not_found() {
        let (_temp, store) = setup_store();
        assert!(matches!(
            store.get("missing-pkg").unwrap_err(),
            SkiffError::NotFound(_)
        ));
    }

    #[test]
    fn list_orders_records_by_name() {
        let (temp, store) = setup_store();
        for name in ["zeta", "alpha", "mid"] {
            let dir = make_install_dir(&temp, name);
            store.register(record_fixture(name, &dir), false).unwrap();
        }

        let names: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn overwrite_requires_an_existing_record() {
        let (temp, store) = setup_store();
        let dir = make_install_dir(&temp, "docqa");
        let err = store.overwrite(record_fixture("docqa", &dir)).unwrap_err();
        assert!(matches!(err, SkiffError::NotFound(_)));

        store.register(record_fixture("docqa", &dir), false).unwrap();
        let mut updated = record_fixture("docqa", &dir);
        updated.commit = Some("def5678".to_string());
        store.overwrite(updated).unwrap();
        assert_eq!(store.get("docqa").unwrap().commit.as_deref(), Some("def5678"));
    }

    #[test]
    fn search_matches_substrings_case_insensitively() {
        let (temp, store) = setup_store();
        let dir = make_install_dir(&temp, "docqa");
        store.register(record_fixture("docqa", &dir), false).unwrap();
        let dir = make_install_dir(&temp, "summarize");
        store
            .register(record_fixture("summarize", &dir), false)
            .unwrap();

        let hits = store.search(Some("DOC"), &[]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name(), "docqa");

        // description substring also matches
        let hits = store.search(Some("test package"), &[]).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn search_matches_any_shared_tag() {
        let (temp, store) = setup_store();
        let dir = make_install_dir(&temp, "docqa");
        let mut record = record_fixture("docqa", &dir);
        record.manifest.tags = vec!["qa".to_string(), "documents".to_string()];
        store.register(record, false).unwrap();

        let dir = make_install_dir(&temp, "summarize");
        let mut record = record_fixture("summarize", &dir);
        record.manifest.tags = vec!["nlp".to_string()];
        store.register(record, false).unwrap();

        let tags = vec!["qa".to_string(), "absent".to_string()];
        let hits = store.search(None, &tags).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name(), "docqa");
    }

    #[test]
    fn search_applies_query_and_tags_together() {
        let (temp, store) = setup_store();
        let dir = make_install_dir(&temp, "docqa");
        store.register(record_fixture("docqa", &dir), false).unwrap();

        let tags = vec!["demo".to_string()];
        assert_eq!(store.search(Some("docqa"), &tags).unwrap().len(), 1);
        assert!(store.search(Some("nomatch"), &tags).unwrap().is_empty());
        let other_tags = vec!["absent".to_string()];
        assert!(store.search(Some("docqa"), &other_tags).unwrap().is_empty());
    }

    #[test]
    fn orphans_lists_records_with_missing_directories() {
        let (temp, store) = setup_store();
        let kept = make_install_dir(&temp, "kept");
        store.register(record_fixture("kept", &kept), false).unwrap();
        let gone = make_install_dir(&temp, "gone");
        store.register(record_fixture("gone", &gone), false).unwrap();

        std::fs::remove_dir_all(&gone).unwrap();

        let orphans = store.orphans().unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].name(), "gone");
    }

    #[test]
    fn malformed_document_is_an_error() {
        let (_temp, store) = setup_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_err());
    }
}
