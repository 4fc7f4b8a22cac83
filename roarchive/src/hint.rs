//! Locating the logical root of an archive from a filename hint.
//!
//! Archives are often packed with an extra top-level directory (or several),
//! so callers name a file they know lives at the logical root, e.g.
//! `tileset.conf`. The hint is a list of such names in order of preference,
//! which lets one caller accept several archive layouts.

use std::fmt;

use crate::path::ArchivePath;

/// Ordered list of candidate filenames, most preferred first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHint(Vec<String>);

impl FileHint {
    pub fn new<I, S>(candidates: I) -> FileHint
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FileHint(candidates.into_iter().map(Into::into).collect())
    }

    #[inline(always)]
    pub fn none() -> FileHint {
        FileHint(vec![])
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline(always)]
    pub fn candidates(&self) -> &[String] {
        &self.0
    }

    /// Priority of `name` among the candidates, 0 being the best.
    #[inline(always)]
    pub fn priority(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|c| c == name)
    }
}

impl fmt::Display for FileHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("|"))
    }
}

impl From<&str> for FileHint {
    fn from(name: &str) -> FileHint {
        FileHint::new([name])
    }
}

impl From<String> for FileHint {
    fn from(name: String) -> FileHint {
        FileHint(vec![name])
    }
}

impl From<Vec<String>> for FileHint {
    fn from(candidates: Vec<String>) -> FileHint {
        FileHint(candidates)
    }
}

impl<'a> From<&[&'a str]> for FileHint {
    fn from(candidates: &[&'a str]) -> FileHint {
        FileHint::new(candidates.iter().copied())
    }
}

/// Effective root resolved from a hint, and the candidate that selected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintedPath<T> {
    pub path: T,
    pub used_hint: Option<String>,
}

impl<T> HintedPath<T> {
    pub fn unhinted(path: T) -> HintedPath<T> {
        HintedPath {
            path,
            used_hint: None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> HintedPath<U> {
        HintedPath {
            path: f(self.path),
            used_hint: self.used_hint,
        }
    }
}

/// Best-of-all-occurrences scan over a member list.
///
/// A match only replaces the current best when it is for a strictly better
/// candidate, so discovery order never beats priority. The scan is cut short
/// only by a priority-0 match.
pub(crate) struct HintResolver<'h> {
    hint: &'h FileHint,
    best_index: usize,
    best_match: Option<ArchivePath>,
}

impl<'h> HintResolver<'h> {
    pub(crate) fn new(hint: &'h FileHint) -> HintResolver<'h> {
        HintResolver {
            hint,
            best_index: hint.candidates().len(),
            best_match: None,
        }
    }

    /// Returns `true` once nothing later in the scan can improve the result.
    pub(crate) fn feed(&mut self, member: &ArchivePath) -> bool {
        if let Some(name) = member.file_name() {
            let better = self.hint.priority(name).filter(|&p| p < self.best_index);

            if let Some(index) = better {
                tracing::trace!(%member, priority = index, "hint candidate matched");
                self.best_index = index;
                self.best_match = Some(member.clone());
            }
        }

        self.is_done()
    }

    #[inline(always)]
    pub(crate) fn is_done(&self) -> bool {
        self.best_index == 0
    }

    /// Root is the parent directory of the best match.
    pub(crate) fn finish(self) -> Option<HintedPath<ArchivePath>> {
        let best = self.best_match?;
        let used_hint = self.hint.candidates()[self.best_index].clone();

        Some(HintedPath {
            path: best.parent().unwrap_or_default(),
            used_hint: Some(used_hint),
        })
    }
}

/// Runs the resolver over `members`, examining at most `limit` of them.
///
/// Returns `None` if no candidate was found. An empty hint resolves to the
/// root without scanning.
pub(crate) fn resolve<I>(
    hint: &FileHint,
    members: I,
    limit: Option<usize>,
) -> Option<HintedPath<ArchivePath>>
where
    I: IntoIterator,
    I::Item: std::borrow::Borrow<ArchivePath>,
{
    use std::borrow::Borrow;

    if hint.is_empty() {
        return Some(HintedPath::unhinted(ArchivePath::root()));
    }

    let mut resolver = HintResolver::new(hint);
    let members = members.into_iter().take(limit.unwrap_or(usize::MAX));

    for member in members {
        if resolver.feed(member.borrow()) {
            break;
        }
    }

    resolver.finish()
}
