use relative_path::RelativePathBuf;
use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

mod error;

pub use self::error::IntoArchivePathError;

/// The separator used in `ArchivePath`s on every platform, matching the
/// separator used by tar and zip member names and by URLs.
pub const PATH_ARCHIVE_SEP: &str = "/";

/// A sanitised path relative to some root inside an archive.
///
/// The empty path is the root itself. There is never a leading, trailing or
/// doubled separator, and `..` can not escape the root.
#[derive(Debug, Clone, Default, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ArchivePath(pub(crate) RelativePathBuf);

/// Splits `path` into clean components. `..` pops the previous component and
/// never climbs above the start; root, prefix and `.` components vanish.
pub fn sanitize<P: AsRef<Path>>(path: P) -> Result<Vec<String>, IntoArchivePathError> {
    let mut out = vec![];

    for component in path.as_ref().components() {
        match component {
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(os_str) => {
                let part = os_str.to_str().ok_or(IntoArchivePathError::NotUtf8)?;
                if part.chars().any(char::is_control) {
                    return Err(IntoArchivePathError::ControlCharacter(part.to_string()));
                }
                out.push(part.to_string());
            }
        }
    }

    Ok(out)
}

impl ArchivePath {
    pub fn new<P: AsRef<Path>>(path: P) -> std::result::Result<ArchivePath, IntoArchivePathError> {
        let out = sanitize(&path)?;

        if out.is_empty() {
            return Err(IntoArchivePathError::EmptyPath);
        }

        Ok(ArchivePath(RelativePathBuf::from(out.join(PATH_ARCHIVE_SEP))))
    }

    /// The root of whatever this path is relative to.
    pub fn root() -> ArchivePath {
        ArchivePath(RelativePathBuf::new())
    }

    #[inline(always)]
    pub fn is_root(&self) -> bool {
        self.as_str().is_empty()
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Resolves this path against a directory on the host filesystem.
    pub fn to_path(&self, base: &Path) -> PathBuf {
        self.0.to_path(base)
    }

    pub fn parent(&self) -> Option<ArchivePath> {
        if self.is_root() {
            return None;
        }
        match self.as_str().rsplit_once(PATH_ARCHIVE_SEP) {
            Some((parent, _)) => Some(ArchivePath(RelativePathBuf::from(parent))),
            None => Some(ArchivePath::root()),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.iter().last()
    }

    pub fn depth(&self) -> usize {
        self.iter().count()
    }

    pub fn starts_with(&self, other: &ArchivePath) -> bool {
        self.strip_prefix(other).is_some()
    }

    /// Returns the remainder of this path under `prefix`, comparing whole
    /// components only (`ab/c` is not under `a`).
    pub fn strip_prefix(&self, prefix: &ArchivePath) -> Option<ArchivePath> {
        if prefix.is_root() {
            return Some(self.clone());
        }

        let rest = self.as_str().strip_prefix(prefix.as_str())?;
        if rest.is_empty() {
            return Some(ArchivePath::root());
        }

        rest.strip_prefix(PATH_ARCHIVE_SEP)
            .map(|rest| ArchivePath(RelativePathBuf::from(rest)))
    }

    pub fn join(&self, tail: &ArchivePath) -> ArchivePath {
        match (self.is_root(), tail.is_root()) {
            (true, _) => tail.clone(),
            (_, true) => self.clone(),
            _ => ArchivePath(RelativePathBuf::from(format!(
                "{}{}{}",
                self.as_str(),
                PATH_ARCHIVE_SEP,
                tail.as_str()
            ))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.as_str()
            .split(PATH_ARCHIVE_SEP)
            .filter(|x| !x.is_empty())
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
