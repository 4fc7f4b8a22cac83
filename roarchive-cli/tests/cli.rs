use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn roarchive() -> Command {
    Command::cargo_bin("roarchive").unwrap()
}

fn tree(root: &Path) -> PathBuf {
    let base = root.join("tree");
    fs::create_dir_all(base.join("pack/data")).unwrap();
    fs::write(base.join("pack/tileset.conf"), b"conf\n").unwrap();
    fs::write(base.join("pack/data/one.txt"), b"one\n").unwrap();
    base
}

fn tarball(root: &Path) -> PathBuf {
    let path = root.join("pack.tar");
    let mut builder = tar::Builder::new(fs::File::create(&path).unwrap());
    for (name, data) in [("pack/tileset.conf", &b"conf\n"[..]), ("pack/data/one.txt", &b"one\n"[..])] {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, data).unwrap();
    }
    builder.finish().unwrap();
    path
}

#[test]
fn list_directory_under_hint() {
    let dir = tempfile::tempdir().unwrap();
    let base = tree(dir.path());

    roarchive()
        .args(["--hint", "tileset.conf", "list"])
        .arg(&base)
        .assert()
        .success()
        .stdout("data/one.txt\ntileset.conf\n");
}

#[test]
fn list_alias() {
    let dir = tempfile::tempdir().unwrap();
    let tar = tarball(dir.path());

    roarchive()
        .arg("l")
        .arg(&tar)
        .assert()
        .success()
        .stdout(predicate::str::contains("pack/data/one.txt"));
}

#[test]
fn cat_from_tarball() {
    let dir = tempfile::tempdir().unwrap();
    let tar = tarball(dir.path());

    roarchive()
        .arg("cat")
        .arg(&tar)
        .arg("data/one.txt")
        .args(["--hint", "tileset.conf"])
        .assert()
        .success()
        .stdout("one\n");
}

#[test]
fn cat_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let base = tree(dir.path());

    roarchive()
        .arg("cat")
        .arg(&base)
        .arg("nope")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot open `nope`"));
}

#[test]
fn find_prints_first_match() {
    let dir = tempfile::tempdir().unwrap();
    let tar = tarball(dir.path());

    roarchive()
        .arg("find")
        .arg(&tar)
        .arg("one.txt")
        .assert()
        .success()
        .stdout("pack/data/one.txt\n");

    roarchive()
        .arg("find")
        .arg(&tar)
        .arg("two.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No file named `two.txt`"));
}

#[test]
fn info_reports_hint() {
    let dir = tempfile::tempdir().unwrap();
    let base = tree(dir.path());

    roarchive()
        .args(["--hint", "missing.conf", "--hint", "tileset.conf", "info"])
        .arg(&base)
        .assert()
        .success()
        .stdout(predicate::str::contains("Kind:        directory"))
        .stdout(predicate::str::contains("Used hint:   tileset.conf"))
        .stdout(predicate::str::contains("Direct I/O:  yes"));
}

#[test]
fn not_an_archive() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("plain.txt");
    fs::write(&plain, b"just text").unwrap();

    roarchive()
        .arg("list")
        .arg(&plain)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot open archive"));
}
