use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::{build_index, index_key, ArchiveKind, Backend};
use crate::hint::{self, FileHint, HintedPath};
use crate::istream::{FilterInit, IStream, StreamInfo};
use crate::path::ArchivePath;
use crate::{Error, Result};

/// A regular file inside the tarball: where its data lives in the archive.
#[derive(Debug, Clone)]
struct TarMember {
    path: ArchivePath,
    start: u64,
    end: u64,
    mtime: Option<u64>,
}

impl TarMember {
    fn path(&self) -> &ArchivePath {
        &self.path
    }
}

/// Reads the member list in one pass. Data is skipped with seeks, so this
/// only touches the headers.
fn read_members(path: &Path) -> io::Result<(Arc<File>, Vec<TarMember>)> {
    let file = File::open(path)?;
    let mut members = vec![];

    {
        let mut archive = tar::Archive::new(&file);
        for entry in archive.entries_with_seek()? {
            let entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let name = entry.path()?;
            let member_path = match ArchivePath::new(&name) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(member = %name.display(), "Skipping tar member: {}", e);
                    continue;
                }
            };

            let start = entry.raw_file_position();
            members.push(TarMember {
                path: member_path,
                start,
                end: start + entry.size(),
                mtime: entry.header().mtime().ok(),
            });
        }
    }

    Ok((Arc::new(file), members))
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

/// `[start, end)` window into the shared descriptor.
///
/// Every read names its offset, so any number of these can be open on the
/// same descriptor at once.
struct MemberReader {
    fd: Arc<File>,
    start: u64,
    end: u64,
    pos: u64,
}

impl MemberReader {
    fn new(fd: Arc<File>, start: u64, end: u64) -> MemberReader {
        MemberReader {
            fd,
            start,
            end,
            pos: start,
        }
    }

    #[inline(always)]
    fn len(&self) -> u64 {
        self.end - self.start
    }
}

impl Read for MemberReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.end || buf.is_empty() {
            return Ok(0);
        }

        let max = (self.end - self.pos).min(buf.len() as u64) as usize;
        let n = read_at(&self.fd, &mut buf[..max], self.pos)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "tarball ends at {} inside member data ending at {}",
                    self.pos, self.end
                ),
            ));
        }

        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for MemberReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let current = (self.pos - self.start) as i128;
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::End(d) => self.len() as i128 + d as i128,
            SeekFrom::Current(d) => current + d as i128,
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative position",
            ));
        }

        // past the end is allowed, reads there just return nothing
        let target = u64::try_from(target).unwrap_or(u64::MAX);
        self.pos = self.start.saturating_add(target);
        Ok(target)
    }
}

/// Tar archive. The member list is read once at open and kept, so re-hinting
/// never touches the archive again.
#[derive(Debug)]
pub struct Tarball {
    path: PathBuf,
    fd: Arc<File>,
    members: Vec<TarMember>,
    hinted: HintedPath<ArchivePath>,
    index: BTreeMap<ArchivePath, TarMember>,
    scan_limit: Option<usize>,
}

impl Tarball {
    pub fn open<P: AsRef<Path>>(
        path: P,
        hint: &FileHint,
        scan_limit: Option<usize>,
    ) -> Result<Tarball> {
        let path = path.as_ref().to_path_buf();
        let (fd, members) = read_members(&path).map_err(|e| {
            Error::io(format!("Cannot read tarball at '{}'", path.display()), e)
        })?;
        tracing::debug!(path = %path.display(), members = members.len(), "read tarball");

        let (hinted, index) = Self::index(&path, &members, hint, scan_limit)?;

        Ok(Tarball {
            path,
            fd,
            members,
            hinted,
            index,
            scan_limit,
        })
    }

    #[allow(clippy::type_complexity)]
    fn index(
        path: &Path,
        members: &[TarMember],
        hint: &FileHint,
        scan_limit: Option<usize>,
    ) -> Result<(HintedPath<ArchivePath>, BTreeMap<ArchivePath, TarMember>)> {
        let hinted = hint::resolve(hint, members.iter().map(TarMember::path), scan_limit)
            .ok_or_else(|| Error::HintNotFound {
                hint: hint.clone(),
                archive: path.display().to_string(),
            })?;

        let index = build_index(members, &hinted.path, TarMember::path, TarMember::clone);
        tracing::debug!(prefix = %hinted.path, files = index.len(), "indexed tarball");

        Ok((hinted, index))
    }

    #[inline(always)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn archive(&self) -> String {
        self.path.display().to_string()
    }
}

impl Backend for Tarball {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Tarball
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
        let member = self
            .index
            .get(&key)
            .ok_or_else(|| Error::no_such_file(path, self.archive()))?;
        tracing::trace!(member = %member.path, start = member.start, end = member.end, "open stream");

        let reader = MemberReader::new(self.fd.clone(), member.start, member.end);
        let info = StreamInfo::new(member.path.to_string(), path)
            .size(Some(reader.len()))
            .timestamp(
                member
                    .mtime
                    .map(|secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs)),
            );

        Ok(IStream::new(info, reader, filter_init))
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
