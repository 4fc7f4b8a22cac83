//! Fixture archives shared by the integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Files of the fixture, as laid out in every archive format.
pub const FILES: &[(&str, &[u8])] = &[
    ("tiles/tileset.conf", b"[tileset]\nname = test\n"),
    ("tiles/0/0/0.bin", b"root tile"),
    ("tiles/1/0/0.bin", b"north west"),
    ("tiles/1/1/1.bin", b"south east, slightly longer"),
    ("tiles/extra/mapconfig.json", b"{}"),
    ("README", b"not part of the tileset"),
];

pub fn tempdir() -> TempDir {
    tempfile::tempdir().unwrap()
}

pub fn directory(root: &Path) -> PathBuf {
    let base = root.join("tree");
    for (name, data) in FILES {
        let path = base.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }
    base
}

pub fn tarball(root: &Path) -> PathBuf {
    tarball_of(root, "fixture.tar", FILES)
}

/// Tarball holding `entries` in the given order.
pub fn tarball_of(root: &Path, file: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = root.join(file);
    let mut builder = tar::Builder::new(File::create(&path).unwrap());

    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_600_000_000);
        builder.append_data(&mut header, name, *data).unwrap();
    }

    builder.finish().unwrap();
    path
}

pub fn zip(root: &Path) -> PathBuf {
    let path = root.join("fixture.zip");
    let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
    let options = zip::write::SimpleFileOptions::default();

    writer.add_directory("tiles/", options).unwrap();
    for (name, data) in FILES {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }

    writer.finish().unwrap();
    path
}

/// Zip archive holding `entries` in the given order.
pub fn zip_of(root: &Path, file: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = root.join(file);
    let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
    let options = zip::write::SimpleFileOptions::default();

    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }

    writer.finish().unwrap();
    path
}

/// The same `entries` packed as a tarball and as a zip archive.
pub fn packed(root: &Path, entries: &[(&str, &[u8])]) -> Vec<PathBuf> {
    vec![
        tarball_of(root, "packed.tar", entries),
        zip_of(root, "packed.zip", entries),
    ]
}

/// Every fixture format, each in its own directory under `root`.
pub fn all(root: &Path) -> Vec<PathBuf> {
    let mut out = vec![];
    for (i, make) in [directory as fn(&Path) -> PathBuf, tarball, zip].iter().enumerate() {
        let sub = root.join(i.to_string());
        std::fs::create_dir(&sub).unwrap();
        out.push(make(&sub));
    }
    out
}

/// Fixture contents relative to `prefix`.
pub fn files_under(prefix: &str) -> Vec<(String, &'static [u8])> {
    let mut out: Vec<_> = FILES
        .iter()
        .filter_map(|(name, data)| {
            let rest = if prefix.is_empty() {
                Some(*name)
            } else {
                name.strip_prefix(prefix)?.strip_prefix('/')
            };
            rest.map(|r| (r.to_string(), *data))
        })
        .collect();
    out.sort();
    out
}
