//! Integration tests for the sealstore CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`. Every
//! test runs inside its own temp directory so the default `.sealstore/`
//! paths never touch the working tree.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Helper: a sealstore command rooted at `dir` with no env overrides.
fn sealstore(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("sealstore").expect("binary should exist");
    cmd.current_dir(dir.path())
        .env_remove("SEALSTORE_KEK_FILE")
        .env_remove("SEALSTORE_DB")
        .env_remove("RUST_LOG");
    cmd
}

/// Run `put` and return the version id printed on stdout.
fn put(dir: &TempDir, path: &str, value: &str) -> String {
    let out = sealstore(dir)
        .args(["put", path])
        .write_stdin(value)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(out).unwrap().trim().to_string()
}

#[test]
fn help_flag_shows_usage() {
    let dir = TempDir::new().unwrap();
    sealstore(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("envelope encryption"))
        .stdout(predicate::str::contains("put"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("versions"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("kek"));
}

#[test]
fn version_flag_shows_version() {
    let dir = TempDir::new().unwrap();
    sealstore(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sealstore"));
}

#[test]
fn no_args_shows_help() {
    let dir = TempDir::new().unwrap();
    sealstore(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn put_then_get_round_trips() {
    let dir = TempDir::new().unwrap();
    let v1 = put(&dir, "db/password", "s3cr3t");
    let v2 = put(&dir, "db/password", "n3wpass");
    assert_ne!(v1, v2);

    sealstore(&dir)
        .args(["get", "db/password"])
        .assert()
        .success()
        .stdout("n3wpass\n");

    sealstore(&dir)
        .args(["get", "db/password", "--version-id", &v1])
        .assert()
        .success()
        .stdout("s3cr3t\n");
}

#[test]
fn piped_value_keeps_trailing_whitespace() {
    let dir = TempDir::new().unwrap();
    put(&dir, "svc/pass", "pass \t\n");

    sealstore(&dir)
        .args(["get", "svc/pass"])
        .assert()
        .success()
        .stdout("pass \t\n");
}

#[test]
fn piped_binary_value_round_trips() {
    let dir = TempDir::new().unwrap();
    let value: Vec<u8> = vec![0xff, 0x00, 0xfe, b'\n', 0x80];

    sealstore(&dir)
        .args(["put", "blob"])
        .write_stdin(value.clone())
        .assert()
        .success();

    // Not UTF-8, so the value is written back without a trailing newline.
    sealstore(&dir)
        .args(["get", "blob"])
        .assert()
        .success()
        .stdout(value);
}

#[test]
fn first_put_creates_private_key_and_database() {
    let dir = TempDir::new().unwrap();
    put(&dir, "api/key", "abc");

    dir.child(".sealstore/kek.bin").assert(predicate::path::is_file());
    dir.child(".sealstore/secrets.db").assert(predicate::path::is_file());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(dir.child(".sealstore/kek.bin").path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn database_never_holds_plaintext() {
    let dir = TempDir::new().unwrap();
    put(&dir, "api/key", "very-recognisable-plaintext");

    let bytes = std::fs::read(dir.child(".sealstore/secrets.db").path()).unwrap();
    let needle = b"very-recognisable-plaintext";
    assert!(!bytes.windows(needle.len()).any(|w| w == needle));
}

#[test]
fn explicit_version_id_is_used_and_reuse_fails() {
    let dir = TempDir::new().unwrap();
    sealstore(&dir)
        .args(["put", "svc/token", "--version-id", "v1"])
        .write_stdin("first")
        .assert()
        .success()
        .stdout("v1\n");

    sealstore(&dir)
        .args(["put", "svc/token", "--version-id", "v1"])
        .write_stdin("second")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn get_missing_secret_is_opaque() {
    let dir = TempDir::new().unwrap();
    put(&dir, "present", "x");

    sealstore(&dir)
        .args(["get", "absent"])
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("Secret unavailable"));
}

#[test]
fn reveal_error_detail_shows_cause() {
    let dir = TempDir::new().unwrap();
    dir.child(".sealstore.toml")
        .write_str("reveal_error_detail = true\n")
        .unwrap();
    put(&dir, "present", "x");

    sealstore(&dir)
        .args(["get", "absent"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("absent"));
}

#[test]
fn get_with_wrong_kek_fails_opaquely() {
    let dir = TempDir::new().unwrap();
    put(&dir, "db/password", "s3cr3t");

    sealstore(&dir)
        .args(["--kek-file", "other.kek", "get", "db/password"])
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("Secret unavailable"));
}

#[test]
fn env_overrides_select_key_and_database() {
    let dir = TempDir::new().unwrap();
    sealstore(&dir)
        .env("SEALSTORE_KEK_FILE", "keys/a.kek")
        .env("SEALSTORE_DB", "data/a.db")
        .args(["put", "p"])
        .write_stdin("value")
        .assert()
        .success();

    dir.child("keys/a.kek").assert(predicate::path::is_file());
    dir.child("data/a.db").assert(predicate::path::is_file());
    dir.child(".sealstore").assert(predicate::path::missing());
}

#[test]
fn get_json_includes_version_metadata() {
    let dir = TempDir::new().unwrap();
    let v1 = put(&dir, "db/password", "s3cr3t");

    let out = sealstore(&dir)
        .args(["get", "db/password", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(doc["path"], "db/password");
    assert_eq!(doc["version"], v1.as_str());
    assert_eq!(doc["value"], "s3cr3t");
}

#[test]
fn versions_lists_newest_first() {
    let dir = TempDir::new().unwrap();
    put(&dir, "db/password", "a");
    let v2 = put(&dir, "db/password", "b");

    sealstore(&dir)
        .args(["versions", "db/password"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{v2} (latest)")));
}

#[test]
fn paths_lists_every_secret() {
    let dir = TempDir::new().unwrap();
    put(&dir, "b/two", "2");
    put(&dir, "a/one", "1");

    sealstore(&dir)
        .arg("paths")
        .assert()
        .success()
        .stdout("a/one\nb/two\n");
}

#[test]
fn inspect_shows_ciphertext_not_plaintext() {
    let dir = TempDir::new().unwrap();
    put(&dir, "db/password", "s3cr3t");

    sealstore(&dir)
        .args(["inspect", "db/password"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wrapped_dek"))
        .stdout(predicate::str::contains("s3cr3t").not());
}

#[test]
fn delete_force_removes_all_versions() {
    let dir = TempDir::new().unwrap();
    put(&dir, "tmp/token", "a");
    put(&dir, "tmp/token", "b");

    sealstore(&dir)
        .args(["delete", "tmp/token", "--force"])
        .assert()
        .success()
        .stderr(predicate::str::contains("2 version(s)"));

    sealstore(&dir)
        .args(["get", "tmp/token"])
        .assert()
        .code(2);
}

#[test]
fn kek_init_then_info() {
    let dir = TempDir::new().unwrap();
    sealstore(&dir)
        .args(["kek", "init"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("file://"));

    sealstore(&dir)
        .args(["kek", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fingerprint"));

    // A second init must refuse to overwrite the key.
    sealstore(&dir).args(["kek", "init"]).assert().code(1);
}

#[test]
fn empty_path_is_rejected() {
    let dir = TempDir::new().unwrap();
    sealstore(&dir)
        .args(["put", ""])
        .write_stdin("x")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("path"));
}
