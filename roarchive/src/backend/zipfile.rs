use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ::zip::result::ZipError;
use ::zip::ZipArchive;

use super::{build_index, index_key, ArchiveKind, Backend};
use crate::hint::{self, FileHint, HintedPath};
use crate::istream::{FilterInit, IStream, StreamInfo};
use crate::path::ArchivePath;
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct ZipMember {
    path: ArchivePath,
    index: usize,
}

impl ZipMember {
    fn path(&self) -> &ArchivePath {
        &self.path
    }
}

/// Decompressed member, ready to be handed out as a stream.
struct Plugged {
    path: String,
    size: u64,
    seekable: bool,
    data: Cursor<Vec<u8>>,
}

/// Largest buffer reserved up front from a member's declared size. Bigger
/// members grow the buffer while they are read.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Buffer for a member of `declared` uncompressed bytes. The size comes from
/// the archive headers and is not trusted.
fn member_buffer(declared: u64) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(declared.min(MAX_PREALLOC) as usize)
        .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
    Ok(data)
}

fn zip_error(e: ZipError) -> io::Error {
    match e {
        ZipError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

fn read_members(archive: &mut ZipArchive<File>) -> io::Result<Vec<ZipMember>> {
    let mut members = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let file = archive.by_index_raw(index).map_err(zip_error)?;
        if file.is_dir() {
            continue;
        }

        match ArchivePath::new(file.name()) {
            Ok(path) => members.push(ZipMember { path, index }),
            Err(e) => tracing::warn!(member = file.name(), "Skipping zip member: {}", e),
        }
    }

    Ok(members)
}

/// Zip archive. One reader is shared by every stream; members are inflated
/// whole while it is locked.
#[derive(Debug)]
pub struct Zip {
    path: PathBuf,
    archive: Mutex<ZipArchive<File>>,
    members: Vec<ZipMember>,
    hinted: HintedPath<ArchivePath>,
    index: BTreeMap<ArchivePath, usize>,
    scan_limit: Option<usize>,
}

impl Zip {
    pub fn open<P: AsRef<Path>>(path: P, hint: &FileHint, scan_limit: Option<usize>) -> Result<Zip> {
        let path = path.as_ref().to_path_buf();
        let context = || format!("Cannot read zip archive at '{}'", path.display());

        let file = File::open(&path).map_err(|e| Error::io(context(), e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| Error::io(context(), zip_error(e)))?;
        let members = read_members(&mut archive).map_err(|e| Error::io(context(), e))?;
        tracing::debug!(path = %path.display(), members = members.len(), "read zip archive");

        let (hinted, index) = Self::index(&path, &members, hint, scan_limit)?;

        Ok(Zip {
            path,
            archive: Mutex::new(archive),
            members,
            hinted,
            index,
            scan_limit,
        })
    }

    #[allow(clippy::type_complexity)]
    fn index(
        path: &Path,
        members: &[ZipMember],
        hint: &FileHint,
        scan_limit: Option<usize>,
    ) -> Result<(HintedPath<ArchivePath>, BTreeMap<ArchivePath, usize>)> {
        let hinted = hint::resolve(hint, members.iter().map(ZipMember::path), scan_limit)
            .ok_or_else(|| Error::HintNotFound {
                hint: hint.clone(),
                archive: path.display().to_string(),
            })?;

        let index = build_index(members, &hinted.path, ZipMember::path, |m| m.index);
        tracing::debug!(prefix = %hinted.path, files = index.len(), "indexed zip archive");

        Ok((hinted, index))
    }

    #[inline(always)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn archive(&self) -> String {
        self.path.display().to_string()
    }

    /// Inflates member `index` into memory.
    fn plug(&self, index: usize) -> io::Result<Plugged> {
        let mut archive = self.archive.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = archive.by_index(index).map_err(zip_error)?;

        let mut data = member_buffer(file.size())?;
        file.read_to_end(&mut data)?;

        Ok(Plugged {
            path: file.name().to_string(),
            size: data.len() as u64,
            seekable: true,
            data: Cursor::new(data),
        })
    }
}

impl Backend for Zip {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Zip
    }

    fn root(&self) -> String {
        if self.hinted.path.is_root() {
            self.archive()
        } else {
            format!("{}/{}", self.archive(), self.hinted.path)
        }
    }

    fn open_stream(&self, path: &str, filter_init: Option<FilterInit<'_>>) -> Result<IStream> {
        let key = index_key(path)?;
        let index = *self
            .index
            .get(&key)
            .ok_or_else(|| Error::no_such_file(path, self.archive()))?;

        let plugged = self.plug(index).map_err(|e| {
            Error::io(
                format!("Cannot inflate '{}' in zip archive '{}'", path, self.archive()),
                e,
            )
        })?;
        tracing::trace!(member = %plugged.path, size = plugged.size, "open stream");

        let info = StreamInfo::new(plugged.path, path)
            .size(Some(plugged.size))
            .seekable(plugged.seekable);

        Ok(IStream::new(info, plugged.data, filter_init))
    }

    fn exists(&self, path: &str) -> bool {
        index_key(path)
            .map(|key| self.index.contains_key(&key))
            .unwrap_or(false)
    }

    fn enumerate(&self) -> Result<Vec<ArchivePath>> {
        Ok(self.index.keys().cloned().collect())
    }

    fn find_by_name(&self, filename: &str) -> Result<Option<ArchivePath>> {
        Ok(self
            .index
            .keys()
            .find(|p| p.file_name() == Some(filename))
            .cloned())
    }

    fn apply_hint(&mut self, hint: &FileHint) -> Result<()> {
        let (hinted, index) = Self::index(&self.path, &self.members, hint, self.scan_limit)?;
        self.hinted = hinted;
        self.index = index;
        Ok(())
    }

    fn used_hint(&self) -> Option<&str> {
        self.hinted.used_hint.as_deref()
    }
}
