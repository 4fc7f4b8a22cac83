use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{index_key, ArchiveKind, Backend};
use crate::hint::{self, FileHint, HintedPath};
use crate::istream::{FilterInit, IStream, StreamInfo};
use crate::path::ArchivePath;
use crate::{Error, Result};

/// Plain directory tree. The filesystem is the index: nothing is cached
/// beyond the resolved root.
#[derive(Debug)]
pub struct Directory {
    original: PathBuf,
    hinted: HintedPath<PathBuf>,
    scan_limit: Option<usize>,
}

/// Every regular file under `base`, relative to it, sorted by name at each
/// level. Entries that can not be read are skipped.
fn walk(base: &Path) -> impl Iterator<Item = ArchivePath> + '_ {
    WalkDir::new(base)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(base = %base.display(), "Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(move |entry| {
            let relative = pathdiff::diff_paths(entry.path(), base)?;
            match ArchivePath::new(&relative) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(path = %relative.display(), "Skipping file: {}", e);
                    None
                }
            }
        })
}

fn resolve_root(
    original: &Path,
    hint: &FileHint,
    scan_limit: Option<usize>,
) -> Result<HintedPath<PathBuf>> {
    if !original.is_dir() {
        return Err(Error::io(
            format!("Cannot open directory '{}'", original.display()),
            io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let resolved =
        hint::resolve(hint, walk(original), scan_limit).ok_or_else(|| Error::HintNotFound {
            hint: hint.clone(),
            archive: original.display().to_string(),
        })?;

    Ok(resolved.map(|root| root.to_path(original)))
}

impl Directory {
    pub fn open<P: AsRef<Path>>(
        path: P,
        hint: &FileHint,
        scan_limit: Option<usize>,
    ) -> Result<Directory> {
        let original = path.as_ref().to_path_buf();
        let hinted = resolve_root(&original, hint, scan_limit)?;
        tracing::debug!(root = %hinted.path.display(), used_hint = ?hinted.used_hint, "directory root");

        Ok(Directory {
            original,
            hinted,
            scan_limit,
        })
    }

    #[inline(always)]
    pub fn path(&self) -> &Path {
        &self.hinted.path
    }

    fn full_path(&self, path: &str) -> Result<(ArchivePath, PathBuf)> {
        let key = index_key(path)?;
        let full = key.to_path(&self.hinted.path);
        Ok((key, full))
    }
}

impl Backend for Directory {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Directory
    }

    fn root(&self) -> String {
        self.hinted.path.display().to_string()
    }

    fn open_stream(&self, path: &str, filter_init: Option<FilterInit<'_>>) -> Result<IStream> {
        let (_, full) = self.full_path(path)?;
        if full.is_dir() {
            return Err(Error::no_such_file(path, self.root()));
        }

        let file = match File::open(&full) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::no_such_file(path, self.root()))
            }
            Err(e) => {
                return Err(Error::io(
                    format!("Cannot open file '{}'", full.display()),
                    e,
                ))
            }
        };

        let meta = file
            .metadata()
            .map_err(|e| Error::io(format!("Cannot stat file '{}'", full.display()), e))?;
        if !meta.is_file() {
            return Err(Error::no_such_file(path, self.root()));
        }

        tracing::trace!(path = %full.display(), size = meta.len(), "open stream");
        let info = StreamInfo::new(full.display().to_string(), path)
            .size(Some(meta.len()))
            .timestamp(meta.modified().ok());

        Ok(IStream::new(info, file, filter_init))
    }

    fn exists(&self, path: &str) -> bool {
        self.full_path(path)
            .map(|(_, full)| full.is_file())
            .unwrap_or(false)
    }

    fn enumerate(&self) -> Result<Vec<ArchivePath>> {
        Ok(walk(&self.hinted.path).collect())
    }

    fn find_by_name(&self, filename: &str) -> Result<Option<ArchivePath>> {
        Ok(walk(&self.hinted.path).find(|p| p.file_name() == Some(filename)))
    }

    fn apply_hint(&mut self, hint: &FileHint) -> Result<()> {
        self.hinted = resolve_root(&self.original, hint, self.scan_limit)?;
        tracing::debug!(root = %self.hinted.path.display(), used_hint = ?self.hinted.used_hint, "re-hinted directory");
        Ok(())
    }

    fn used_hint(&self) -> Option<&str> {
        self.hinted.used_hint.as_deref()
    }

    fn supports_direct_access(&self) -> bool {
        true
    }

    /// Sanitised like stream paths, so the result never leaves the root.
    fn direct_path(&self, path: &Path) -> Option<PathBuf> {
        let key = match path.to_str()? {
            "" => ArchivePath::root(),
            path => index_key(path).ok()?,
        };
        Some(key.to_path(&self.hinted.path))
    }
}
