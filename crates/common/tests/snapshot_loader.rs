//! Snapshot artifact loading: whole-file JSON artifacts, degrading to empty
//! stores instead of failing startup.

mod common;

use common::{site_manifest_json, write_snapshot_dir, BLOG_ID};

use ::common::prelude::*;

#[test]
fn test_loads_all_artifacts() {
    let dir = write_snapshot_dir(
        Some(&site_manifest_json()),
        Some(&format!(
            r#"[{{"pageId": "{BLOG_ID}", "routePath": "/journal"}}]"#
        )),
        Some(&common::blog_protection_json()),
        Some(r#"{"pathPrefixes": ["/bio"]}"#),
    );

    let snapshot = Snapshot::load(dir.path());
    let summary = snapshot.summary();
    assert_eq!(summary.nodes, 4);
    assert_eq!(summary.overrides, 1);
    assert_eq!(summary.protections, 1);
    assert_eq!(snapshot.exclusions.path_prefixes, vec!["/bio".to_string()]);
}

#[test]
fn test_missing_artifacts_degrade_to_empty_stores() {
    let dir = write_snapshot_dir(Some(&site_manifest_json()), None, None, None);

    let snapshot = Snapshot::load(dir.path());
    assert_eq!(snapshot.manifest.len(), 4);
    assert!(snapshot.overrides.is_empty());
    assert!(snapshot.protections.is_empty());

    // No protection store means open access, not a startup failure.
    let aliases = LegacyAliases::default();
    let resolver = AccessResolver::new(&snapshot, &aliases);
    let res = resolver.resolve("/blog/post-1");
    assert!(res.page_id.is_some());
    assert!(res.rule.is_none());
}

#[test]
fn test_malformed_artifact_degrades_alone() {
    let dir = write_snapshot_dir(
        Some("{not json"),
        None,
        Some(&common::blog_protection_json()),
        None,
    );

    let snapshot = Snapshot::load(dir.path());
    assert!(snapshot.manifest.is_empty());
    // The well-formed protections artifact still loads.
    assert_eq!(snapshot.protections.len(), 1);
}

#[test]
fn test_entirely_absent_directory_is_empty_snapshot() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("never-built");
    let snapshot = Snapshot::load(&missing);
    assert!(snapshot.manifest.is_empty());
    assert!(snapshot.overrides.is_empty());
    assert!(snapshot.protections.is_empty());
}
