use std::path::PathBuf;

use roarchive::OpenOptions;

use crate::error::{Error, Result};

pub fn run(path: PathBuf, name: String, options: OpenOptions) -> Result<()> {
    let archive = super::open(&path, options)?;

    match archive.find_by_name(&name) {
        Ok(Some(found)) => {
            println!("{}", found);
            Ok(())
        }
        Ok(None) => Err(Error::NotFound { path, name }),
        Err(source) => Err(Error::Find { path, source }),
    }
}
