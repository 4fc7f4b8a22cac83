use std::path::PathBuf;

use roarchive::OpenOptions;

use crate::error::Result;

pub fn run(path: PathBuf, options: OpenOptions) -> Result<()> {
    let archive = super::open(&path, options)?;

    println!("Archive:     {}", archive.archive_path().display());
    println!("Kind:        {}", archive.kind());
    println!("Root:        {}", archive.root());
    println!("Used hint:   {}", archive.used_hint().unwrap_or("-"));
    println!(
        "Direct I/O:  {}",
        if archive.supports_direct_access() { "yes" } else { "no" }
    );

    Ok(())
}
