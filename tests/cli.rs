//! Integration tests for the `runpack` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn runpack_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("runpack").expect("Failed to find runpack binary for testing");
    cmd.current_dir(dir);
    cmd
}

fn write_fixtures(dir: &Path) {
    fs::create_dir_all(dir.join("docs")).unwrap();
    fs::write(dir.join("docs/readme.md"), "# héllo\n").unwrap();
    fs::write(dir.join("logo.png"), [0x89u8, b'P', b'N', b'G', 0x00, 0xff]).unwrap();
}

#[test]
fn test_help_flag() {
    let dir = tempdir().unwrap();
    runpack_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("runpack -c site.rpk.gz"));
}

#[test]
fn test_create_then_list() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    runpack_cmd(dir.path())
        .args(["-c", "site.rpk.gz", "docs/readme.md", "logo.png"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("adding: docs/readme.md (text)")
                .and(predicate::str::contains("adding: logo.png (binary)")),
        );

    runpack_cmd(dir.path())
        .args(["-l", "site.rpk.gz"])
        .assert()
        .success()
        .stdout("docs/readme.md\nlogo.png\n");

    runpack_cmd(dir.path())
        .args(["-v", "site.rpk.gz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 entries (1 binary)"));
}

#[test]
fn test_extract_into_dir() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    runpack_cmd(dir.path())
        .args(["-q", "-c", "site.rpk.gz", "docs/readme.md", "logo.png"])
        .assert()
        .success();

    runpack_cmd(dir.path())
        .args(["site.rpk.gz", "-d", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("extracting: logo.png"));

    assert_eq!(
        fs::read_to_string(dir.path().join("out/docs/readme.md")).unwrap(),
        "# héllo\n"
    );
    assert_eq!(
        fs::read(dir.path().join("out/logo.png")).unwrap(),
        [0x89u8, b'P', b'N', b'G', 0x00, 0xff]
    );

    // Second run leaves existing files alone
    runpack_cmd(dir.path())
        .args(["site.rpk.gz", "-d", "out"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipping: logo.png"));
}

#[cfg(feature = "brotli")]
#[test]
fn test_brotli_archive() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    runpack_cmd(dir.path())
        .args(["-q", "-c", "site.rpk.br", "docs/readme.md", "logo.png"])
        .assert()
        .success();

    runpack_cmd(dir.path())
        .args(["-p", "site.rpk.br", "docs/readme.md"])
        .assert()
        .success()
        .stdout("# héllo\n");

    // The gzip reader refuses a brotli stream
    runpack_cmd(dir.path())
        .args(["-l", "-f", "gzip", "site.rpk.br"])
        .assert()
        .failure();
}

#[cfg(not(feature = "brotli"))]
#[test]
fn test_brotli_unavailable() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    runpack_cmd(dir.path())
        .args(["-q", "-c", "site.rpk.br", "docs/readme.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("brotli"));
}

#[test]
fn test_pipe_single_entry() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    runpack_cmd(dir.path())
        .args(["-q", "-c", "site.rpk", "docs/readme.md", "logo.png"])
        .assert()
        .success();

    runpack_cmd(dir.path())
        .args(["-p", "site.rpk", "readme.md"])
        .assert()
        .success()
        .stdout("# héllo\n");
}

#[test]
fn test_text_archive() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    runpack_cmd(dir.path())
        .args(["-q", "-t", "-c", "site.rpk.zz.b64", "docs/readme.md"])
        .assert()
        .success();

    let text = fs::read_to_string(dir.path().join("site.rpk.zz.b64")).unwrap();
    assert!(text.chars().all(|c| c.is_ascii_alphanumeric() || "+/=".contains(c)));

    runpack_cmd(dir.path())
        .args(["-t", "-l", "site.rpk.zz.b64"])
        .assert()
        .success()
        .stdout("docs/readme.md\n");
}

#[test]
fn test_wrong_format_fails() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    runpack_cmd(dir.path())
        .args(["-q", "-c", "site.rpk.gz", "logo.png"])
        .assert()
        .success();

    runpack_cmd(dir.path())
        .args(["-l", "-f", "deflate", "site.rpk.gz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Corrupted archive data"));
}

#[test]
fn test_missing_input_file() {
    let dir = tempdir().unwrap();

    runpack_cmd(dir.path())
        .args(["-c", "site.rpk.gz", "nope.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read nope.txt"));
}
