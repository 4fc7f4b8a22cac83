use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open archive `{}`", .path.display())]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: roarchive::Error,
    },

    #[error("Cannot list archive `{}`", .path.display())]
    List {
        path: PathBuf,
        #[source]
        source: roarchive::Error,
    },

    #[error("Cannot open `{file}` in archive `{}`", .path.display())]
    OpenFile {
        path: PathBuf,
        file: String,
        #[source]
        source: roarchive::Error,
    },

    #[error("Cannot read `{file}` from archive `{}`", .path.display())]
    ReadFile {
        path: PathBuf,
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot search archive `{}`", .path.display())]
    Find {
        path: PathBuf,
        #[source]
        source: roarchive::Error,
    },

    #[error("No file named `{name}` in archive `{}`", .path.display())]
    NotFound { path: PathBuf, name: String },

    #[error("Cannot write to standard output")]
    WriteOutput {
        #[source]
        source: std::io::Error,
    },
}
