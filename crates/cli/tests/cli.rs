use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn hubcache(db: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("hubcache"));
    cmd.env_remove("HUBCACHE_CONFIG_FILE")
        .env_remove("RUST_LOG")
        .env("HUBCACHE_TIMEOUT_MS", "2000")
        .arg("--db")
        .arg(db);
    cmd
}

#[test]
fn keys_on_empty_store_prints_empty_array() {
    let temp = tempdir().unwrap();
    let db = temp.path().join("cache.sqlite");

    hubcache(&db)
        .arg("keys")
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));

    assert!(db.exists());
}

#[test]
fn entries_of_unknown_generation_fails() {
    let temp = tempdir().unwrap();

    hubcache(&temp.path().join("cache.sqlite"))
        .args(["entries", "student-hub-v1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CACHE_MISS: student-hub-v1"));
}

#[test]
fn update_against_unreachable_site_fails() {
    let temp = tempdir().unwrap();
    let db = temp.path().join("cache.sqlite");

    hubcache(&db)
        .env("HUBCACHE_SCOPE", "http://127.0.0.1:9/")
        .arg("update")
        .assert()
        .failure()
        .stderr(predicate::str::contains("INSTALL_FAILED"));

    hubcache(&db)
        .arg("keys")
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn fetch_before_update_fails() {
    let temp = tempdir().unwrap();

    hubcache(&temp.path().join("cache.sqlite"))
        .args(["fetch", "./index.html", "--navigate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("INVALID_STATE"));
}

#[test]
fn invalid_config_is_rejected() {
    let temp = tempdir().unwrap();

    hubcache(&temp.path().join("cache.sqlite"))
        .env("HUBCACHE_MAX_BYTES", "0")
        .arg("keys")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_bytes"));
}
