use std::path::Path;

use roarchive::{OpenOptions, RoArchive};

use crate::error::{Error, Result};

pub mod cat;
pub mod find;
pub mod info;
pub mod list;

pub use cat::run as cat;
pub use find::run as find;
pub use info::run as info;
pub use list::run as list;

fn open(path: &Path, options: OpenOptions) -> Result<RoArchive> {
    RoArchive::open(path, options).map_err(|source| Error::OpenArchive {
        path: path.to_path_buf(),
        source,
    })
}
