use std::io::{Read, Write};
use std::path::PathBuf;

use roarchive::{Filter, FilterChain, OpenOptions};

use crate::error::{Error, Result};

pub fn run(path: PathBuf, file: String, gunzip: bool, options: OpenOptions) -> Result<()> {
    let archive = super::open(&path, options)?;

    let stream = if gunzip {
        archive.open_stream_with(&file, &|chain: &mut FilterChain| {
            chain.push(Filter::gunzip());
        })
    } else {
        archive.open_stream(&file)
    };
    let mut stream = stream.map_err(|source| Error::OpenFile {
        path: path.clone(),
        file: file.clone(),
        source,
    })?;
    tracing::debug!(file = stream.path(), size = ?stream.size(), filters = ?stream.filters(), "copying");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut buf = vec![0u8; 64 * 1024];

    // read and write errors are told apart, so no io::copy here
    loop {
        let n = stream.read(&mut buf).map_err(|source| Error::ReadFile {
            path: path.clone(),
            file: file.clone(),
            source,
        })?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])
            .map_err(|source| Error::WriteOutput { source })?;
    }

    out.flush().map_err(|source| Error::WriteOutput { source })
}
