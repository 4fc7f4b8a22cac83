use std::io::Cursor;
use std::sync::Arc;

use super::{index_key, schema_of, ArchiveKind, Backend};
use crate::fetch::{self, Fetch, Url};
use crate::hint::{FileHint, HintedPath};
use crate::istream::{FilterInit, IStream, StreamInfo};
use crate::path::ArchivePath;
use crate::{Error, Result};

const SCHEMAS: &[&str] = &["http", "https"];

pub(crate) fn handles_schema(schema: &str) -> bool {
    SCHEMAS.iter().any(|s| s.eq_ignore_ascii_case(schema))
}

/// Tree of files under a base URL. Nothing is fetched until a stream is
/// opened, and the tree can not be listed.
pub struct HttpTree {
    original: Url,
    hinted: HintedPath<Url>,
    fetcher: Arc<dyn Fetch>,
}

impl std::fmt::Debug for HttpTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTree")
            .field("original", &self.original.as_str())
            .field("hinted", &self.hinted)
            .finish_non_exhaustive()
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| {
        Error::io(
            format!("Invalid URL '{}'", url),
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
        )
    })
}

/// Root is decided from the URL alone. A URL naming a file stands for its
/// directory when a hint is given, and the file name is taken as the used
/// hint.
///
/// Without a hint, a URL whose last segment is a file name is treated as a
/// directory: a trailing `/` is added, so `http://host/a/b` resolves `c` to
/// `http://host/a/b/c` rather than `http://host/a/c`.
fn resolve_root(original: &Url, hint: &FileHint) -> HintedPath<Url> {
    let file_name = original
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|last| !last.is_empty())
        .map(str::to_string);

    match file_name {
        Some(name) if !hint.is_empty() => {
            let mut parent = original.clone();
            if let Ok(mut segments) = parent.path_segments_mut() {
                segments.pop().push("");
            }
            HintedPath {
                path: parent,
                used_hint: Some(name),
            }
        }
        Some(_) => {
            // relative joins must land below the URL, not next to it
            let mut root = original.clone();
            if let Ok(mut segments) = root.path_segments_mut() {
                segments.push("");
            }
            HintedPath::unhinted(root)
        }
        None => HintedPath::unhinted(original.clone()),
    }
}

impl HttpTree {
    pub fn open(url: &str, hint: &FileHint) -> Result<HttpTree> {
        let fetcher = fetch::shared().map_err(|e| Error::io("Cannot create HTTP client", e))?;
        HttpTree::with_fetcher(url, hint, fetcher)
    }

    /// Opens the tree with a specific fetcher instead of the shared client.
    pub fn with_fetcher(url: &str, hint: &FileHint, fetcher: Arc<dyn Fetch>) -> Result<HttpTree> {
        let original = parse_url(url)?;
        if !handles_schema(original.scheme()) {
            return Err(Error::NotAnArchive {
                path: url.into(),
                mime: format!("{}://", original.scheme()),
            });
        }

        let hinted = resolve_root(&original, hint);
        tracing::debug!(root = %hinted.path, used_hint = ?hinted.used_hint, "HTTP tree root");

        Ok(HttpTree {
            original,
            hinted,
            fetcher,
        })
    }

    #[inline(always)]
    pub fn url(&self) -> &Url {
        &self.hinted.path
    }

    fn locate(&self, path: &str) -> Result<Url> {
        if schema_of(path).is_some() {
            return parse_url(path);
        }

        let key: ArchivePath = index_key(path)?;
        self.hinted.path.join(key.as_str()).map_err(|e| {
            Error::io(
                format!("Cannot resolve '{}' against '{}'", path, self.hinted.path),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
            )
        })
    }
}

impl Backend for HttpTree {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Http
    }

    fn root(&self) -> String {
        self.hinted.path.to_string()
    }

    fn open_stream(&self, path: &str, filter_init: Option<FilterInit<'_>>) -> Result<IStream> {
        let url = self.locate(path)?;
        tracing::trace!(%url, "open stream");

        let response = self
            .fetcher
            .fetch(&url)
            .map_err(|e| Error::io(format!("Failed to fetch '{}'", url), e))?;

        if response.status == 404 {
            return Err(Error::no_such_file(path, self.root()));
        }
        if !response.is_success() {
            return Err(Error::io(
                format!("Failed to fetch '{}'", url),
                std::io::Error::other(format!("HTTP status {}", response.status)),
            ));
        }

        let info = StreamInfo::new(url.to_string(), path).size(Some(response.body.len() as u64));
        Ok(IStream::new(info, Cursor::new(response.body), filter_init))
    }

    fn exists(&self, _path: &str) -> bool {
        true
    }

    fn enumerate(&self) -> Result<Vec<ArchivePath>> {
        Err(Error::NotImplemented {
            operation: "Listing",
            kind: ArchiveKind::Http,
        })
    }

    fn find_by_name(&self, _filename: &str) -> Result<Option<ArchivePath>> {
        Err(Error::NotImplemented {
            operation: "Finding files by name",
            kind: ArchiveKind::Http,
        })
    }

    fn apply_hint(&mut self, hint: &FileHint) -> Result<()> {
        self.hinted = resolve_root(&self.original, hint);
        tracing::debug!(root = %self.hinted.path, used_hint = ?self.hinted.used_hint, "re-hinted HTTP tree");
        Ok(())
    }

    fn used_hint(&self) -> Option<&str> {
        self.hinted.used_hint.as_deref()
    }

    fn handles_schema(&self, schema: &str) -> bool {
        handles_schema(schema)
    }
}
