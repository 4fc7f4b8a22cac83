//! HTTP trees through `RoArchive`, served by an in-memory fetcher.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use roarchive::backend::HttpTree;
use roarchive::fetch::{Fetch, FetchResponse, Url};
use roarchive::{ArchiveKind, FileHint, RoArchive};

struct Pages(HashMap<&'static str, &'static [u8]>);

impl Fetch for Pages {
    fn fetch(&self, url: &Url) -> io::Result<FetchResponse> {
        Ok(match self.0.get(url.as_str()) {
            Some(body) => FetchResponse {
                status: 200,
                body: body.to_vec(),
            },
            None => FetchResponse {
                status: 404,
                body: vec![],
            },
        })
    }
}

fn archive(url: &str, hint: &str) -> RoArchive {
    let pages = Pages(
        [
            ("http://tiles.test/set/tileset.conf", &b"conf"[..]),
            ("http://tiles.test/set/0/0/0.bin", &b"tile"[..]),
        ]
        .into_iter()
        .collect(),
    );
    let hint = if hint.is_empty() {
        FileHint::none()
    } else {
        FileHint::from(hint)
    };
    let backend = HttpTree::with_fetcher(url, &hint, Arc::new(pages)).unwrap();
    RoArchive::from_backend(PathBuf::from(url), Box::new(backend))
}

#[test]
fn test_reads_relative_to_hinted_root() {
    let archive = archive("http://tiles.test/set/tileset.conf", "tileset.conf");

    assert_eq!(archive.kind(), ArchiveKind::Http);
    assert_eq!(archive.used_hint(), Some("tileset.conf"));
    assert_eq!(archive.read("0/0/0.bin").unwrap(), b"tile");
    assert_eq!(archive.read("tileset.conf").unwrap(), b"conf");
}

#[test]
fn test_not_found_and_not_implemented() {
    let archive = archive("http://tiles.test/set/", "");

    assert!(archive.exists("whatever/you/like"));
    assert!(archive.open_stream("missing").unwrap_err().is_not_found());
    assert!(archive.enumerate().unwrap_err().is_not_implemented());
    assert!(archive.find_by_name("0.bin").unwrap_err().is_not_implemented());
    assert!(archive.handles_schema("http"));
    assert!(!archive.supports_direct_access());
    assert!(!archive.changed());
}

#[test]
fn test_repeated_reads_are_identical() {
    let archive = archive("http://tiles.test/set/", "");

    let first = archive.read("0/0/0.bin").unwrap();
    let second = archive.read("0/0/0.bin").unwrap();
    assert_eq!(first, second);
}
