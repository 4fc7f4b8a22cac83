/// Why a path can not be used inside an archive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntoArchivePathError {
    #[error("path is not valid UTF-8")]
    NotUtf8,

    #[error("path component `{}` contains a control character", .0.escape_debug())]
    ControlCharacter(String),

    #[error("no path provided")]
    EmptyPath,
}
