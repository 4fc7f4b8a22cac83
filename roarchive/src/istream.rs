//! Byte streams handed out by every archive backend.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::SystemTime;

use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};

pub(crate) trait SeekRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekRead for T {}

type BoxedRead = Box<dyn Read + Send>;

/// One transform stacked on top of a stream's source.
pub struct Filter {
    name: &'static str,
    wrap: Box<dyn FnOnce(BoxedRead) -> BoxedRead + Send>,
}

impl Filter {
    pub fn new<F>(name: &'static str, wrap: F) -> Filter
    where
        F: FnOnce(BoxedRead) -> BoxedRead + Send + 'static,
    {
        Filter {
            name,
            wrap: Box::new(wrap),
        }
    }

    /// Decompresses gzip data, including concatenated members.
    pub fn gunzip() -> Filter {
        Filter::new("gunzip", |r| Box::new(MultiGzDecoder::new(r)))
    }

    pub fn zlib() -> Filter {
        Filter::new("zlib", |r| Box::new(ZlibDecoder::new(r)))
    }

    /// Raw DEFLATE, without any header.
    pub fn deflate() -> Filter {
        Filter::new("deflate", |r| Box::new(DeflateDecoder::new(r)))
    }

    #[inline(always)]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Filter").field(&self.name).finish()
    }
}

/// Ordered filters between a stream's source and its reader.
///
/// The first filter pushed is the outermost one: reads pull from it, it pulls
/// from the next one, and the last filter pulls from the source.
#[derive(Debug, Default)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    pub fn push(&mut self, filter: Filter) -> &mut FilterChain {
        self.filters.push(filter);
        self
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(Filter::name).collect()
    }

    fn apply(self, source: BoxedRead) -> BoxedRead {
        self.filters
            .into_iter()
            .rev()
            .fold(source, |inner, filter| (filter.wrap)(inner))
    }
}

/// Configures the filter chain of a stream before anything is read.
pub type FilterInit<'a> = &'a dyn Fn(&mut FilterChain);

/// Everything a backend knows about a stream besides its bytes.
#[derive(Debug, Clone)]
pub(crate) struct StreamInfo {
    pub(crate) path: String,
    pub(crate) index: String,
    pub(crate) size: Option<u64>,
    pub(crate) seekable: bool,
    pub(crate) timestamp: Option<SystemTime>,
}

impl StreamInfo {
    pub(crate) fn new<P: Into<String>, I: Into<String>>(path: P, index: I) -> StreamInfo {
        StreamInfo {
            path: path.into(),
            index: index.into(),
            size: None,
            seekable: true,
            timestamp: None,
        }
    }

    pub(crate) fn size(mut self, size: Option<u64>) -> StreamInfo {
        self.size = size;
        self
    }

    pub(crate) fn seekable(mut self, seekable: bool) -> StreamInfo {
        self.seekable = seekable;
        self
    }

    pub(crate) fn timestamp(mut self, timestamp: Option<SystemTime>) -> StreamInfo {
        self.timestamp = timestamp;
        self
    }
}

enum Inner {
    Source(Box<dyn SeekRead>),
    Stacked(BoxedRead),
}

/// Input stream for one file inside an archive.
///
/// Size and seekability describe the bytes this stream yields. Once a filter
/// is stacked the source offsets no longer map to output offsets, so the
/// stream reports no size and refuses to seek.
pub struct IStream {
    inner: Inner,
    info: StreamInfo,
    filters: Vec<&'static str>,
}

impl IStream {
    pub(crate) fn new<R>(info: StreamInfo, source: R, filter_init: Option<FilterInit<'_>>) -> IStream
    where
        R: Read + Seek + Send + 'static,
    {
        let mut chain = FilterChain::default();
        if let Some(init) = filter_init {
            init(&mut chain);
        }

        if chain.is_empty() {
            return IStream {
                inner: Inner::Source(Box::new(source)),
                info,
                filters: vec![],
            };
        }

        let filters = chain.names();
        let inner = Inner::Stacked(chain.apply(Box::new(source)));

        IStream {
            inner,
            info: StreamInfo {
                size: None,
                seekable: false,
                ..info
            },
            filters,
        }
    }

    /// Real full path of the file inside the archive.
    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.info.path
    }

    /// Path this stream was requested by.
    #[inline(always)]
    pub fn index(&self) -> &str {
        &self.info.index
    }

    /// Size of the file, if known.
    #[inline(always)]
    pub fn size(&self) -> Option<u64> {
        self.info.size
    }

    #[inline(always)]
    pub fn seekable(&self) -> bool {
        self.info.seekable
    }

    #[inline(always)]
    pub fn stacked(&self) -> bool {
        matches!(self.inner, Inner::Stacked(_))
    }

    /// Modification time of the file, if the archive records one.
    #[inline(always)]
    pub fn timestamp(&self) -> Option<SystemTime> {
        self.info.timestamp
    }

    pub fn filters(&self) -> &[&'static str] {
        &self.filters
    }

    /// Reads the whole file. The stream must not have been read from before.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        if let Some(size) = self.info.size {
            return self.read_exactly(size);
        }

        if self.info.seekable {
            if let Inner::Source(source) = &mut self.inner {
                let size = source.seek(SeekFrom::End(0))?;
                source.seek(SeekFrom::Start(0))?;
                return self.read_exactly(size);
            }
        }

        let mut buf = Vec::new();
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn read_exactly(&mut self, size: u64) -> io::Result<Vec<u8>> {
        let size = usize::try_from(size).map_err(|_| {
            io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("'{}' is too large to read into memory", self.info.path),
            )
        })?;

        let mut buf = vec![0u8; size];
        self.read_exact(&mut buf).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to read {} bytes from '{}': {}", size, self.info.path, e),
            )
        })?;
        Ok(buf)
    }

    /// Copies the rest of the stream into `out`.
    pub fn copy_to<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<u64> {
        io::copy(self, out)
    }

    /// Copies the rest of the stream into a newly created local file.
    pub fn copy_to_file<P: AsRef<Path>>(&mut self, dest: P) -> io::Result<u64> {
        let mut out = io::BufWriter::new(File::create(dest.as_ref())?);
        let n = self.copy_to(&mut out)?;
        out.flush()?;
        Ok(n)
    }
}

impl Read for IStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Source(source) => source.read(buf),
            Inner::Stacked(reader) => reader.read(buf),
        }
    }
}

impl Seek for IStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.inner {
            Inner::Source(source) if self.info.seekable => source.seek(pos),
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("stream for '{}' is not seekable", self.info.path),
            )),
        }
    }
}

impl fmt::Debug for IStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IStream")
            .field("info", &self.info)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::Cursor;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    /// Counts seeks so tests can tell which read strategy ran.
    struct SeekCounter {
        inner: Cursor<Vec<u8>>,
        seeks: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl Read for SeekCounter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Seek for SeekCounter {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.seeks
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.seek(pos)
        }
    }

    #[test]
    fn plain_stream_keeps_size() {
        let data = b"hello world".to_vec();
        let info = StreamInfo::new("a/b", "b").size(Some(data.len() as u64));
        let mut s = IStream::new(info, Cursor::new(data.clone()), None);

        assert_eq!(s.size(), Some(11));
        assert!(s.seekable());
        assert!(!s.stacked());
        assert_eq!(s.read_all().unwrap(), data);
    }

    #[test]
    fn empty_initializer_does_not_stack() {
        let info = StreamInfo::new("a", "a").size(Some(3));
        let s = IStream::new(info, Cursor::new(b"abc".to_vec()), Some(&|_: &mut FilterChain| {}));

        assert_eq!(s.size(), Some(3));
        assert!(s.seekable());
    }

    #[test]
    fn stacked_stream_loses_size_and_seek() {
        let data = b"compress me, compress me, compress me".to_vec();
        let gz = gzip(&data);
        let info = StreamInfo::new("a.gz", "a.gz").size(Some(gz.len() as u64));
        let mut s = IStream::new(
            info,
            Cursor::new(gz),
            Some(&|chain: &mut FilterChain| {
                chain.push(Filter::gunzip());
            }),
        );

        assert_eq!(s.size(), None);
        assert!(!s.seekable());
        assert!(s.stacked());
        assert_eq!(s.filters(), &["gunzip"]);
        assert!(s.seek(SeekFrom::Start(0)).is_err());
        assert_eq!(s.read_all().unwrap(), data);
    }

    #[test]
    fn first_pushed_filter_is_outermost() {
        let data = b"twice wrapped".to_vec();
        // outer layer is gzip, so gunzip must run first on the way out
        let twice = gzip(&gzip(&data));
        let mut s = IStream::new(
            StreamInfo::new("x", "x"),
            Cursor::new(twice),
            Some(&|chain: &mut FilterChain| {
                chain.push(Filter::gunzip()).push(Filter::gunzip());
            }),
        );

        assert_eq!(s.read_all().unwrap(), data);
    }

    #[test]
    fn unknown_size_seekable_discovers_size_by_seeking() {
        let seeks = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let source = SeekCounter {
            inner: Cursor::new(b"0123456789".to_vec()),
            seeks: seeks.clone(),
        };
        let mut s = IStream::new(StreamInfo::new("x", "x"), source, None);

        assert_eq!(s.read_all().unwrap(), b"0123456789");
        assert_eq!(seeks.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_size_unseekable_copies_incrementally() {
        let seeks = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let source = SeekCounter {
            inner: Cursor::new(b"0123456789".to_vec()),
            seeks: seeks.clone(),
        };
        let mut s = IStream::new(StreamInfo::new("x", "x").seekable(false), source, None);

        assert_eq!(s.read_all().unwrap(), b"0123456789");
        assert_eq!(seeks.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(s.seek(SeekFrom::Start(0)).is_err());
    }

    #[test]
    fn known_size_larger_than_data_is_an_error() {
        let info = StreamInfo::new("short", "short").size(Some(20));
        let mut s = IStream::new(info, Cursor::new(b"tiny".to_vec()), None);

        let err = s.read_all().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn copy_to_writer() {
        let mut s = IStream::new(StreamInfo::new("x", "x"), Cursor::new(b"abc".to_vec()), None);
        let mut out = vec![];
        assert_eq!(s.copy_to(&mut out).unwrap(), 3);
        assert_eq!(out, b"abc");
    }
}
