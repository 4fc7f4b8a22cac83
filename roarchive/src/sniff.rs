//! Content-type detection for archive paths.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub const MIME_DIRECTORY: &str = "inode/directory";
pub const MIME_TAR: &str = "application/x-tar";
pub const MIME_ZIP: &str = "application/zip";
pub const MIME_GZIP: &str = "application/gzip";
pub const MIME_UNKNOWN: &str = "application/octet-stream";

const TAR_BLOCK_LEN: usize = 512;
const USTAR_MAGIC_OFFSET: usize = 257;
const TAR_CHECKSUM_OFFSET: usize = 148;
const TAR_CHECKSUM_LEN: usize = 8;

/// Maps a local path to a MIME type.
pub trait MimeSniffer {
    fn mime(&self, path: &Path) -> io::Result<String>;
}

/// Sniffs by filesystem type and magic bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct MagicSniffer;

impl MimeSniffer for MagicSniffer {
    fn mime(&self, path: &Path) -> io::Result<String> {
        if std::fs::metadata(path)?.is_dir() {
            return Ok(MIME_DIRECTORY.into());
        }

        let mut header = Vec::with_capacity(TAR_BLOCK_LEN);
        File::open(path)?
            .take(TAR_BLOCK_LEN as u64)
            .read_to_end(&mut header)?;

        Ok(sniff_header(&header).into())
    }
}

pub fn sniff_header(header: &[u8]) -> &'static str {
    if is_zip_magic(header) {
        MIME_ZIP
    } else if is_gzip_magic(header) {
        MIME_GZIP
    } else if is_tar_header(header) {
        MIME_TAR
    } else {
        MIME_UNKNOWN
    }
}

#[inline(always)]
pub fn is_zip_magic(header: &[u8]) -> bool {
    header.len() >= 4
        && header[0] == b'P'
        && header[1] == b'K'
        && matches!((header[2], header[3]), (3, 4) | (5, 6) | (7, 8))
}

#[inline(always)]
pub fn is_gzip_magic(header: &[u8]) -> bool {
    header.len() >= 2 && header[0] == 0x1f && header[1] == 0x8b
}

/// ustar magic, or failing that a pre-POSIX header whose checksum adds up.
pub fn is_tar_header(header: &[u8]) -> bool {
    if header.len() < TAR_BLOCK_LEN {
        return false;
    }

    if &header[USTAR_MAGIC_OFFSET..USTAR_MAGIC_OFFSET + 5] == b"ustar" {
        return true;
    }

    let field = &header[TAR_CHECKSUM_OFFSET..TAR_CHECKSUM_OFFSET + TAR_CHECKSUM_LEN];
    let stored = match parse_octal(field) {
        Some(v) => v,
        None => return false,
    };

    // the checksum field itself is summed as if it were all spaces
    let computed: u64 = header[..TAR_BLOCK_LEN]
        .iter()
        .enumerate()
        .map(|(i, b)| {
            if (TAR_CHECKSUM_OFFSET..TAR_CHECKSUM_OFFSET + TAR_CHECKSUM_LEN).contains(&i) {
                u64::from(b' ')
            } else {
                u64::from(*b)
            }
        })
        .sum();

    // an all-zero block sums to 256 and is not a header
    stored == computed && header[0] != 0
}

fn parse_octal(field: &[u8]) -> Option<u64> {
    let digits = field
        .iter()
        .skip_while(|b| **b == b' ')
        .take_while(|b| (b'0'..=b'7').contains(*b));

    let mut value = None;
    for b in digits {
        value = Some(value.unwrap_or(0u64) * 8 + u64::from(b - b'0'));
    }
    value
}
