use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::backend::{self, ArchiveKind, Backend};
use crate::hint::FileHint;
use crate::istream::{FilterInit, IStream};
use crate::path::ArchivePath;
use crate::sniff::{MagicSniffer, MimeSniffer};
use crate::{Error, Result};

/// How an archive is opened.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Candidate filenames locating the logical root, most preferred first.
    pub hint: FileHint,
    /// Only this many members are examined while resolving the hint.
    pub scan_limit: Option<usize>,
    /// Content type to use instead of sniffing the path.
    pub mime: Option<String>,
}

impl OpenOptions {
    #[inline(always)]
    pub fn new() -> OpenOptions {
        OpenOptions::default()
    }

    pub fn hint<H: Into<FileHint>>(mut self, hint: H) -> OpenOptions {
        self.hint = hint.into();
        self
    }

    pub fn scan_limit(mut self, limit: usize) -> OpenOptions {
        self.scan_limit = Some(limit);
        self
    }

    pub fn mime<S: Into<String>>(mut self, mime: S) -> OpenOptions {
        self.mime = Some(mime.into());
        self
    }
}

/// Read-only archive of any supported format.
///
/// All paths passed in are relative to the effective root chosen by the
/// hint, whatever the physical layout of the archive is.
#[derive(Debug)]
pub struct RoArchive {
    path: PathBuf,
    backend: Box<dyn Backend>,
    direct_io: bool,
    opened: Option<SystemTime>,
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl RoArchive {
    /// Opens `path`, sniffing its content type unless `options` names one.
    pub fn open<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<RoArchive> {
        RoArchive::open_with(path, options, &MagicSniffer)
    }

    pub fn open_with<P: AsRef<Path>>(
        path: P,
        options: OpenOptions,
        sniffer: &dyn MimeSniffer,
    ) -> Result<RoArchive> {
        let path = path.as_ref().to_path_buf();
        let backend = backend::open_backend(&path, &options, sniffer)?;
        Ok(RoArchive::from_backend(path, backend))
    }

    /// Wraps an already opened backend.
    pub fn from_backend(path: PathBuf, backend: Box<dyn Backend>) -> RoArchive {
        let direct_io = backend.supports_direct_access();
        let opened = match backend.kind() {
            ArchiveKind::Http => None,
            _ => modified(&path),
        };
        tracing::debug!(path = %path.display(), kind = %backend.kind(), root = %backend.root(), "opened archive");

        RoArchive {
            path,
            backend,
            direct_io,
            opened,
        }
    }

    pub fn open_stream(&self, path: &str) -> Result<IStream> {
        self.backend.open_stream(path, None)
    }

    /// Opens a stream whose filter chain is set up by `filter_init`.
    pub fn open_stream_with(&self, path: &str, filter_init: FilterInit<'_>) -> Result<IStream> {
        self.backend.open_stream(path, Some(filter_init))
    }

    /// Reads a whole file into memory.
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        let mut stream = self.open_stream(path)?;
        stream
            .read_all()
            .map_err(|e| Error::io(format!("Failed to read '{}' from '{}'", path, self.backend.root()), e))
    }

    #[inline]
    pub fn exists(&self, path: &str) -> bool {
        self.backend.exists(path)
    }

    pub fn enumerate(&self) -> Result<Vec<ArchivePath>> {
        self.backend.enumerate()
    }

    pub fn find_by_name(&self, filename: &str) -> Result<Option<ArchivePath>> {
        self.backend.find_by_name(filename)
    }

    /// Resolves the root again with a new hint. A failed re-hint leaves the
    /// archive as it was.
    pub fn apply_hint<H: Into<FileHint>>(&mut self, hint: H) -> Result<()> {
        let hint = hint.into();
        self.backend.apply_hint(&hint)?;
        tracing::debug!(%hint, root = %self.backend.root(), "applied hint");
        Ok(())
    }

    #[inline]
    pub fn used_hint(&self) -> Option<&str> {
        self.backend.used_hint()
    }

    #[inline(always)]
    pub fn supports_direct_access(&self) -> bool {
        self.direct_io
    }

    /// Real filesystem path of a file, for callers bypassing streams.
    ///
    /// Only archives with direct access have one; the rest answer
    /// [`Error::NotImplemented`].
    pub fn path<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        if !self.direct_io {
            return Err(Error::NotImplemented {
                operation: "Direct access",
                kind: self.backend.kind(),
            });
        }

        self.backend
            .direct_path(path.as_ref())
            .ok_or_else(|| Error::NotImplemented {
                operation: "Direct access",
                kind: self.backend.kind(),
            })
    }

    /// Whether the physical archive looks modified since it was opened.
    ///
    /// Best effort: only the modification time is compared, and remote
    /// archives never report a change.
    pub fn changed(&self) -> bool {
        match self.opened {
            Some(opened) => modified(&self.path) != Some(opened),
            None => false,
        }
    }

    #[inline]
    pub fn kind(&self) -> ArchiveKind {
        self.backend.kind()
    }

    /// Display form of the effective root.
    #[inline]
    pub fn root(&self) -> String {
        self.backend.root()
    }

    /// Physical path or URL the archive was opened from.
    #[inline(always)]
    pub fn archive_path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn handles_schema(&self, schema: &str) -> bool {
        self.backend.handles_schema(schema)
    }
}
