use std::fmt;
use std::path::{Path, PathBuf};

use crate::archive::OpenOptions;
use crate::hint::FileHint;
use crate::istream::{FilterInit, IStream};
use crate::path::ArchivePath;
use crate::sniff::{MimeSniffer, MIME_DIRECTORY, MIME_TAR, MIME_ZIP};
use crate::{Error, Result};

mod directory;
mod http;
mod tarball;
mod zipfile;

pub use self::directory::Directory;
pub use self::http::HttpTree;
pub use self::tarball::Tarball;
pub use self::zipfile::Zip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Directory,
    Tarball,
    Zip,
    Http,
}

impl ArchiveKind {
    /// Backend kind for a content type, if it is an archive at all.
    pub fn from_mime(mime: &str) -> Option<ArchiveKind> {
        match mime {
            MIME_DIRECTORY => Some(ArchiveKind::Directory),
            MIME_TAR => Some(ArchiveKind::Tarball),
            MIME_ZIP => Some(ArchiveKind::Zip),
            _ => None,
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArchiveKind::Directory => "directory",
            ArchiveKind::Tarball => "tarball",
            ArchiveKind::Zip => "zip",
            ArchiveKind::Http => "HTTP",
        };
        f.write_str(s)
    }
}

/// Operations every archive format provides.
///
/// Paths are relative to the backend's effective root. Backends that can
/// not list their contents answer `enumerate` and `find_by_name` with
/// [`Error::NotImplemented`].
pub trait Backend: fmt::Debug + Send {
    fn kind(&self) -> ArchiveKind;

    /// Display form of the effective root.
    fn root(&self) -> String;

    /// Opens a file. Fails with [`Error::NoSuchFile`] if it is not there.
    fn open_stream(&self, path: &str, filter_init: Option<FilterInit<'_>>) -> Result<IStream>;

    /// Never fails; problems answer `false`.
    fn exists(&self, path: &str) -> bool;

    /// Every file under the effective root, in a stable order.
    fn enumerate(&self) -> Result<Vec<ArchivePath>>;

    /// First enumerated file whose last component is `filename`.
    fn find_by_name(&self, filename: &str) -> Result<Option<ArchivePath>>;

    /// Resolves `hint` again against the original physical root and rebuilds
    /// the index. On failure the previous state is kept.
    fn apply_hint(&mut self, hint: &FileHint) -> Result<()>;

    fn used_hint(&self) -> Option<&str>;

    fn supports_direct_access(&self) -> bool {
        false
    }

    /// Real filesystem path of `path`, for backends with direct access.
    fn direct_path(&self, _path: &Path) -> Option<PathBuf> {
        None
    }

    fn handles_schema(&self, _schema: &str) -> bool {
        false
    }
}

/// Scheme of `path` if it looks like a URL (`scheme://...`).
pub(crate) fn schema_of(path: &str) -> Option<&str> {
    let (schema, _) = path.split_once("://")?;
    let valid = !schema.is_empty()
        && schema
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(schema)
}

/// Picks and opens the backend for `path`.
///
/// A backend claiming the URL scheme wins before any content sniffing; then
/// the declared content type, else the sniffed one, decides.
pub(crate) fn open_backend(
    path: &Path,
    options: &OpenOptions,
    sniffer: &dyn MimeSniffer,
) -> Result<Box<dyn Backend>> {
    let location = path.to_string_lossy();

    if let Some(schema) = schema_of(&location) {
        if http::handles_schema(schema) {
            tracing::debug!(url = %location, schema, "opening as HTTP tree");
            return Ok(Box::new(HttpTree::open(&location, &options.hint)?));
        }
    }

    let mime = match &options.mime {
        Some(mime) => mime.clone(),
        None => sniffer.mime(path).map_err(|source| {
            Error::io(
                format!("Cannot determine content type of '{}'", path.display()),
                source,
            )
        })?,
    };

    let kind = ArchiveKind::from_mime(&mime).ok_or_else(|| Error::NotAnArchive {
        path: path.to_path_buf(),
        mime: mime.clone(),
    })?;
    tracing::debug!(path = %path.display(), %mime, %kind, "opening archive");

    let backend: Box<dyn Backend> = match kind {
        ArchiveKind::Directory => Box::new(Directory::open(path, &options.hint, options.scan_limit)?),
        ArchiveKind::Tarball => Box::new(Tarball::open(path, &options.hint, options.scan_limit)?),
        ArchiveKind::Zip => Box::new(Zip::open(path, &options.hint, options.scan_limit)?),
        ArchiveKind::Http => {
            return Err(Error::NotAnArchive {
                path: path.to_path_buf(),
                mime,
            })
        }
    };

    Ok(backend)
}

/// Sanitises a caller path into an index key.
pub(crate) fn index_key(path: &str) -> Result<ArchivePath> {
    ArchivePath::new(path).map_err(|source| Error::InvalidPath {
        path: path.to_string(),
        source,
    })
}

/// Builds an index from members under `root`, keyed by de-prefixed path.
pub(crate) fn build_index<'a, M, T, F>(
    members: &'a [M],
    root: &ArchivePath,
    path_of: fn(&M) -> &ArchivePath,
    locate: F,
) -> std::collections::BTreeMap<ArchivePath, T>
where
    F: Fn(&'a M) -> T,
{
    members
        .iter()
        .filter_map(|member| {
            let relative = path_of(member).strip_prefix(root)?;
            if relative.is_root() {
                return None;
            }
            Some((relative, locate(member)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas() {
        assert_eq!(schema_of("http://example.com/a"), Some("http"));
        assert_eq!(schema_of("https://example.com/a"), Some("https"));
        assert_eq!(schema_of("/tmp/archive.tar"), None);
        assert_eq!(schema_of("relative/dir"), None);
        assert_eq!(schema_of("C:\\odd://thing"), None);
    }

    #[test]
    fn mime_mapping() {
        assert_eq!(
            ArchiveKind::from_mime("inode/directory"),
            Some(ArchiveKind::Directory)
        );
        assert_eq!(
            ArchiveKind::from_mime("application/x-tar"),
            Some(ArchiveKind::Tarball)
        );
        assert_eq!(ArchiveKind::from_mime("application/zip"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::from_mime("text/plain"), None);
    }
}
