use std::io::Write;
use std::path::PathBuf;

use roarchive::OpenOptions;

use crate::error::{Error, Result};

pub fn run(path: PathBuf, options: OpenOptions) -> Result<()> {
    let archive = super::open(&path, options)?;
    let files = archive
        .enumerate()
        .map_err(|source| Error::List {
            path: path.clone(),
            source,
        })?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for file in files {
        writeln!(out, "{}", file).map_err(|source| Error::WriteOutput { source })?;
    }

    Ok(())
}
