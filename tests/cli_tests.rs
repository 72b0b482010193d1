use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn makedmg() -> Command {
    let mut cmd = Command::cargo_bin("makedmg").unwrap();
    cmd.env_remove("SIGNING_IDENTITY")
        .env_remove("SIGNING_FLAGS")
        .env_remove("DMG_MAX_SIZE")
        .env_remove("HDIUTIL")
        .env_remove("CODESIGN");
    cmd
}

#[test]
fn test_missing_arguments_is_usage_error() {
    makedmg()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_invalid_max_size_is_rejected() {
    let dir = TempDir::new().unwrap();
    makedmg()
        .args(["out.dmg", "Vol"])
        .arg(dir.path())
        .arg(dir.path())
        .args(["--max-size", "lots"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("lots"));
}

#[test]
fn test_missing_license_fails_with_hint() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("src");
    let binary = dir.path().join("bin");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(binary.join("App.app")).unwrap();

    makedmg()
        .arg(dir.path().join("out.dmg"))
        .arg("Vol")
        .arg(&source)
        .arg(&binary)
        .args(["--settle-secs", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("LICENSE.GPL3-EXCEPT"));

    assert!(!dir.path().join("out.dmg").exists());
}

#[cfg(unix)]
#[test]
fn test_end_to_end_with_fake_image_tool() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let source = dir.path().join("src");
    let binary = dir.path().join("install").join("App");
    let scratch = dir.path().join("tmp");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(binary.join("App.app/Contents/MacOS")).unwrap();
    fs::create_dir_all(&scratch).unwrap();
    fs::write(source.join("LICENSE.GPL3-EXCEPT"), "license").unwrap();
    fs::write(binary.join("App.app/Contents/MacOS/App"), "bin").unwrap();

    // Writes a marker to its last argument, the output image.
    let tool = dir.path().join("hdiutil");
    fs::write(
        &tool,
        "#!/bin/sh\nfor last; do :; done\nprintf 'disk image' > \"$last\"\n",
    )
    .unwrap();
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

    // hdiutil names its output App.dmg when given App
    let target = dir.path().join("out").join("App");
    makedmg()
        .env("TMPDIR", &scratch)
        .arg(&target)
        .arg("App")
        .arg(&source)
        .arg(&binary)
        .arg("--hdiutil")
        .arg(&tool)
        .args(["--settle-secs", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sha256:"));

    assert_eq!(fs::read(target.with_extension("dmg")).unwrap(), b"disk image");
    assert!(!target.exists());
    assert_eq!(
        fs::read_dir(&scratch).unwrap().count(),
        0,
        "staging root left behind"
    );
}
