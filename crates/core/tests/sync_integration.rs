//! End-to-end tests for tree synchronization and deploy validation,
//! exercised against real temporary directories.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use gitdeploy_core::errors::{ConfigError, DeployError};
use gitdeploy_core::patterns::{match_pattern, MatchOptions, PatternInput};
use gitdeploy_core::sync::{plan, synchronize};
use gitdeploy_core::{deploy, DeployOptions};

fn touch(dir: &Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Every entry under `dir`, hidden included, as forward-slash relative paths.
fn list_tree(dir: &Path) -> BTreeSet<String> {
    match_pattern("**/*", dir, MatchOptions::hidden())
}

fn set(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|s| s.to_string()).collect()
}

#[test]
fn sync_replaces_stale_content_but_preserves_git_metadata() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    touch(src.path(), "a.txt", "a");
    touch(src.path(), "b/c.txt", "c");
    touch(dest.path(), "old.txt", "stale");
    touch(dest.path(), ".git/HEAD", "ref: refs/heads/master");

    // Both ignore sets carry the metadata protector, as the deploy entry
    // point always arranges.
    let git_meta = PatternInput::from(".git/**");
    synchronize(src.path(), &git_meta, dest.path(), &git_meta).unwrap();

    assert_eq!(
        list_tree(dest.path()),
        set(&[".git", ".git/HEAD", "a.txt", "b", "b/c.txt"])
    );
    assert_eq!(
        fs::read_to_string(dest.path().join(".git/HEAD")).unwrap(),
        "ref: refs/heads/master"
    );
}

#[test]
fn sync_is_idempotent() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    touch(src.path(), "index.html", "<html>");
    touch(src.path(), "assets/app.js", "js");
    touch(dest.path(), ".git/config", "[core]");

    let git_meta = PatternInput::from(".git/**");
    let first = synchronize(src.path(), &git_meta, dest.path(), &git_meta).unwrap();
    let after_first = list_tree(dest.path());

    let second = synchronize(src.path(), &git_meta, dest.path(), &git_meta).unwrap();
    let after_second = list_tree(dest.path());

    assert_eq!(after_first, after_second);
    assert_eq!(first.copied_files, 2);
    assert_eq!(second.copied_files, 2);
}

#[test]
fn sync_overwrites_existing_files() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    touch(src.path(), "index.html", "new");
    touch(dest.path(), "index.html", "old");
    touch(dest.path(), ".git/HEAD", "x");

    let git_meta = PatternInput::from(".git/**");
    synchronize(src.path(), &git_meta, dest.path(), &git_meta).unwrap();

    assert_eq!(
        fs::read_to_string(dest.path().join("index.html")).unwrap(),
        "new"
    );
}

#[test]
fn source_ignore_patterns_keep_files_out_of_the_copy() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    touch(src.path(), "app.js", "js");
    touch(src.path(), "app.js.map", "map");

    let src_ignore = PatternInput::from(vec!["**/*.map".to_string(), ".git/**".to_string()]);
    synchronize(
        src.path(),
        &src_ignore,
        dest.path(),
        &PatternInput::from(".git/**"),
    )
    .unwrap();

    assert_eq!(list_tree(dest.path()), set(&["app.js"]));
}

#[test]
fn repo_ignore_patterns_protect_caller_files_and_their_dirs() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    touch(src.path(), "index.html", "x");
    touch(dest.path(), "CNAME", "example.com");
    touch(dest.path(), "well-known/keys/site.pub", "key");
    touch(dest.path(), "stale.html", "x");

    let repo_ignore = PatternInput::from(vec![
        "CNAME".to_string(),
        "well-known/keys/site.pub".to_string(),
        ".git/**".to_string(),
    ]);
    synchronize(
        src.path(),
        &PatternInput::from(".git/**"),
        dest.path(),
        &repo_ignore,
    )
    .unwrap();

    // The protected leaf survives together with the directories that exist
    // only to contain it; everything stale is gone.
    assert_eq!(
        list_tree(dest.path()),
        set(&[
            "CNAME",
            "index.html",
            "well-known",
            "well-known/keys",
            "well-known/keys/site.pub",
        ])
    );
}

#[test]
fn plan_is_read_only() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    touch(src.path(), "a.txt", "a");
    touch(dest.path(), "old.txt", "x");

    let before = list_tree(dest.path());
    let plan = plan(
        src.path(),
        &PatternInput::empty(),
        dest.path(),
        &PatternInput::empty(),
    );
    assert_eq!(list_tree(dest.path()), before);
    assert!(plan.to_delete.contains("old.txt"));
    assert!(plan.to_copy.contains("a.txt"));
}

#[tokio::test]
async fn deploy_rejects_missing_source_before_any_work() {
    let err = deploy(DeployOptions::new(
        "/no/such/build/output",
        "https://example.com/repo.git",
    ))
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        DeployError::Config(ConfigError::SourceDirMissing(_))
    ));
}

#[tokio::test]
async fn deploy_rejects_missing_url_before_any_work() {
    let src = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    touch(src.path(), "a.txt", "a");
    // A marker that must survive: validation failures precede the scratch
    // directory teardown.
    touch(scratch.path(), "marker.txt", "untouched");

    let mut options = DeployOptions::new(src.path(), "");
    options.tmp = scratch.path().to_path_buf();

    let err = deploy(options).await.unwrap_err();
    assert!(matches!(
        err,
        DeployError::Config(ConfigError::UrlMissing)
    ));
    assert!(scratch.path().join("marker.txt").exists());
}
