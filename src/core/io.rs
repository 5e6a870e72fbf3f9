//! Text input layer
//!
//! Opens BED / BEDPE inputs for line reading. Gzip and bzip2 are
//! decompressed on the fly; large plain files are memory mapped.

use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::Path;

/// Read buffer size (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Plain files at least this large are memory mapped (100MB)
pub const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Compression format of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Plain,
    Gzip,
    Bzip2,
}

impl CompressionFormat {
    fn from_magic(magic: &[u8]) -> Self {
        match magic {
            [0x1f, 0x8b, ..] => CompressionFormat::Gzip,
            [b'B', b'Z', b'h', ..] => CompressionFormat::Bzip2,
            _ => CompressionFormat::Plain,
        }
    }

    fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "gz" => Some(CompressionFormat::Gzip),
            "bz2" => Some(CompressionFormat::Bzip2),
            _ => None,
        }
    }
}

/// Detect compression from the file extension, falling back to magic bytes
pub fn detect_compression<P: AsRef<Path>>(path: P) -> io::Result<CompressionFormat> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    if let Some(format) = CompressionFormat::from_extension(path) {
        return Ok(format);
    }

    let mut magic = [0u8; 3];
    let mut filled = 0;
    while filled < magic.len() {
        match file.read(&mut magic[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(CompressionFormat::from_magic(&magic[..filled]))
}

/// Line-readable input, whatever its encoding on disk
pub enum TextReader {
    Plain(BufReader<File>),
    Mapped(Cursor<Mmap>),
    Gzip(BufReader<MultiGzDecoder<File>>),
    Bzip2(BufReader<BzDecoder<File>>),
}

impl TextReader {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let format = detect_compression(path)?;
        let file = File::open(path)?;

        let reader = match format {
            CompressionFormat::Gzip => TextReader::Gzip(BufReader::with_capacity(
                DEFAULT_BUFFER_SIZE,
                MultiGzDecoder::new(file),
            )),
            CompressionFormat::Bzip2 => TextReader::Bzip2(BufReader::with_capacity(
                DEFAULT_BUFFER_SIZE,
                BzDecoder::new(file),
            )),
            CompressionFormat::Plain if file.metadata()?.len() >= MMAP_THRESHOLD => {
                // SAFETY: inputs are read-only for the lifetime of a run
                let mmap = unsafe { Mmap::map(&file)? };
                TextReader::Mapped(Cursor::new(mmap))
            }
            CompressionFormat::Plain => {
                TextReader::Plain(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))
            }
        };
        Ok(reader)
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, TextReader::Mapped(_))
    }

    fn inner(&mut self) -> &mut dyn BufRead {
        match self {
            TextReader::Plain(r) => r,
            TextReader::Mapped(r) => r,
            TextReader::Gzip(r) => r,
            TextReader::Bzip2(r) => r,
        }
    }
}

impl Read for TextReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner().read(buf)
    }
}

impl BufRead for TextReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner().fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner().consume(amt)
    }
}

/// Open a text file for line reading
pub fn open_text<P: AsRef<Path>>(path: P) -> io::Result<TextReader> {
    TextReader::open(path)
}

/// Line reader reusing one buffer, tracking 1-based line numbers
pub struct LineIterator<R: BufRead> {
    reader: R,
    buffer: String,
    line_number: usize,
}

impl<R: BufRead> LineIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::with_capacity(1024),
            line_number: 0,
        }
    }

    /// Next line without its `\n` / `\r\n` terminator, `None` at EOF
    pub fn next_line(&mut self) -> Option<io::Result<&str>> {
        self.buffer.clear();
        match self.reader.read_line(&mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                let trimmed = self.buffer.trim_end_matches(['\n', '\r']).len();
                self.buffer.truncate(trimmed);
                Some(Ok(&self.buffer))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// 1-based number of the line last returned
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

/// Header / comment lines carried by BED-family files
pub fn is_comment_line(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("track") || line.starts_with("browser")
}
