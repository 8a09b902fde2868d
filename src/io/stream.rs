//! Byte-level input with position tracking and single-byte peek.
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

/// Marker written at the start of a binary archive.
pub const BINARY_HEADER: [u8; 2] = [0, b'B'];

/// A buffered reader that knows how many bytes it has consumed.
///
/// Every reader in this crate takes an `InputStream` so that diagnostics
/// can report the byte offsets where a read started and where it failed.
#[derive(Debug)]
pub struct InputStream<R> {
    inner: R,
    pos: u64,
}

impl<R: BufRead> InputStream<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Bytes consumed since the stream was wrapped.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Next byte without consuming it; `None` at end of stream.
    pub fn peek(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.inner.consume(1);
            self.pos += 1;
        }
        Ok(byte)
    }

    /// Fill `buf` completely or fail with `UnexpectedEof`.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("expected {} bytes, got {}", buf.len(), filled),
                    ))
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            filled += n;
            self.pos += n as u64;
        }
        Ok(())
    }

    /// Read exactly `len` bytes into a new buffer or fail with
    /// `UnexpectedEof`. The buffer grows with the data actually read, so a
    /// bogus length on a short stream fails without allocating `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        let got = (&mut self.inner).take(len as u64).read_to_end(&mut out)?;
        self.pos += got as u64;
        if got < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, got {}", len, got),
            ));
        }
        Ok(out)
    }

    pub fn skip_whitespace(&mut self) -> io::Result<()> {
        while let Some(b) = self.peek()? {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.next_byte()?;
        }
        Ok(())
    }

    /// Skip whitespace, then collect bytes until whitespace or end of stream.
    /// Returns `None` if the stream ends before any byte is collected.
    pub fn read_word(&mut self) -> io::Result<Option<String>> {
        self.skip_whitespace()?;
        self.read_until(|b| b.is_ascii_whitespace())
    }

    /// Collect bytes up to (not including) the first one matching `stop`.
    pub(crate) fn read_until<F: Fn(u8) -> bool>(&mut self, stop: F) -> io::Result<Option<String>> {
        let mut word = Vec::new();
        while let Some(b) = self.peek()? {
            if stop(b) {
                break;
            }
            word.push(b);
            self.next_byte()?;
        }
        if word.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&word).into_owned()))
        }
    }

    /// Consume the `\0B` binary marker if present.
    ///
    /// Returns whether the archive is binary. A lone `\0` that is not
    /// followed by `B` is an error.
    pub fn read_binary_header(&mut self) -> io::Result<bool> {
        if self.peek()? != Some(BINARY_HEADER[0]) {
            log::trace!("no binary header, reading archive as text");
            return Ok(false);
        }
        self.next_byte()?;
        if self.peek()? != Some(BINARY_HEADER[1]) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "archive starts with \\0 but is not followed by 'B'",
            ));
        }
        self.next_byte()?;
        log::trace!("binary header found");
        Ok(true)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl InputStream<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<'a> InputStream<&'a [u8]> {
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

/// Start an archive: write the `\0B` marker when `binary` is set.
pub fn write_binary_header<W: Write>(out: &mut W, binary: bool) -> io::Result<()> {
    if binary {
        out.write_all(&BINARY_HEADER)?;
    }
    Ok(())
}
