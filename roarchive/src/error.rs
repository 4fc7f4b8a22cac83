use std::path::PathBuf;

use crate::backend::ArchiveKind;
use crate::hint::FileHint;
use crate::path::IntoArchivePathError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported archive type <{mime}>. Path: '{}'", .path.display())]
    NotAnArchive { path: PathBuf, mime: String },

    #[error("File not found in the archive. Path: '{path}', archive: '{archive}'")]
    NoSuchFile { path: String, archive: String },

    #[error("No \"{hint}\" found in the archive at '{archive}'")]
    HintNotFound { hint: FileHint, archive: String },

    #[error("{operation} is not implemented for {kind} archives")]
    NotImplemented {
        operation: &'static str,
        kind: ArchiveKind,
    },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot handle path '{path}'")]
    InvalidPath {
        path: String,
        #[source]
        source: IntoArchivePathError,
    },
}

impl Error {
    pub(crate) fn io<S: Into<String>>(context: S, source: std::io::Error) -> Error {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn no_such_file<P: ToString, A: ToString>(path: P, archive: A) -> Error {
        Error::NoSuchFile {
            path: path.to_string(),
            archive: archive.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NoSuchFile { .. })
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Error::NotImplemented { .. })
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> std::io::Error {
        use std::io::ErrorKind;

        match err {
            Error::Io { source, .. } => source,
            Error::NoSuchFile { .. } => std::io::Error::new(ErrorKind::NotFound, err),
            Error::InvalidPath { .. } => std::io::Error::new(ErrorKind::InvalidInput, err),
            Error::NotImplemented { .. } => std::io::Error::new(ErrorKind::Unsupported, err),
            _ => std::io::Error::other(err),
        }
    }
}
