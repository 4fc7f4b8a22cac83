//! Read-only access to files inside directories, tarballs, zip archives and
//! trees served over HTTP, all through [`RoArchive`].
//!
//! ```no_run
//! use roarchive::{OpenOptions, RoArchive};
//!
//! let archive = RoArchive::open("tiles.tar", OpenOptions::new().hint("tileset.conf"))?;
//! for path in archive.enumerate()? {
//!     println!("{}", path);
//! }
//! let conf = archive.read("tileset.conf")?;
//! # Ok::<(), roarchive::Error>(())
//! ```

mod archive;
pub mod backend;
mod error;
pub mod fetch;
mod hint;
mod istream;
pub mod path;
pub mod sniff;

pub use archive::{OpenOptions, RoArchive};
pub use backend::{ArchiveKind, Backend};
pub use error::{Error, Result};
pub use hint::{FileHint, HintedPath};
pub use istream::{Filter, FilterChain, FilterInit, IStream};
pub use path::ArchivePath;
