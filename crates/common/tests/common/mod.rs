//! Shared fixtures for resolution integration tests.
#![allow(dead_code)]

use std::fs;

use tempfile::TempDir;

/// Write one snapshot artifact directory from raw JSON strings. `None`
/// leaves the artifact out entirely.
pub fn write_snapshot_dir(
    manifest: Option<&str>,
    overrides: Option<&str>,
    protections: Option<&str>,
    exclusions: Option<&str>,
) -> TempDir {
    let dir = TempDir::new().unwrap();
    let write = |name: &str, body: Option<&str>| {
        if let Some(body) = body {
            fs::write(dir.path().join(name), body).unwrap();
        }
    };
    write("manifest.json", manifest);
    write("overrides.json", overrides);
    write("protections.json", protections);
    write("exclusions.json", exclusions);
    dir
}

pub const ROOT_ID: &str = "00000000000000000000000000000001";
pub const BLOG_ID: &str = "00000000000000000000000000000002";
pub const POST_ID: &str = "00000000000000000000000000000003";
pub const BIO_ID: &str = "deadbeefdeadbeefdeadbeefdeadbeef";

/// The small site used across the suites: root, blog, one post, a bio page.
pub fn site_manifest_json() -> String {
    format!(
        r#"[
            {{"id": "{ROOT_ID}", "title": "Home", "routePath": "/", "kind": "page"}},
            {{"id": "{BLOG_ID}", "title": "Blog", "routePath": "/blog", "parentId": "{ROOT_ID}", "kind": "database"}},
            {{"id": "{POST_ID}", "title": "First post", "routePath": "/blog/post-1", "parentId": "{BLOG_ID}", "kind": "page"}},
            {{"id": "{BIO_ID}", "title": "Bio", "routePath": "/bio", "parentId": "{ROOT_ID}", "kind": "page"}}
        ]"#
    )
}

pub fn blog_protection_json() -> String {
    format!(
        r#"[
            {{
                "id": "11111111-1111-1111-1111-111111111111",
                "pageId": "{BLOG_ID}",
                "path": "/blog",
                "matchMode": "prefix",
                "authMode": "password",
                "credentialToken": "0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f.aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
            }}
        ]"#
    )
}
