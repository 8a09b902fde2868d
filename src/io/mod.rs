//! Readers and writers for the Kaldi archive formats.
//!
//! `stream` and `basic` hold the byte-level framing, `matrix_io` and
//! `vector_io` the dense object codecs, `htk` the HTK feature file format
//! and `archive` the path-level helpers that also handle the binary marker.
use std::io::{self, BufRead};

use crate::error::MatrixError;

pub mod archive;
pub mod basic;
pub mod htk;
pub mod matrix_io;
pub mod stream;
pub(crate) mod text;
pub mod vector_io;

pub use archive::{read_matrix, read_vector, write_matrix, write_vector};
pub use htk::{read_htk, write_htk, HtkHeader};
pub use matrix_io::{read_stored, StoredMatrix};
pub use stream::{write_binary_header, InputStream, BINARY_HEADER};

/// Remembers where a read started so failures can report both offsets.
pub(crate) struct ReadContext {
    what: &'static str,
    start: u64,
}

impl ReadContext {
    pub(crate) fn new<R: BufRead>(what: &'static str, input: &InputStream<R>) -> Self {
        Self {
            what,
            start: input.position(),
        }
    }

    pub(crate) fn error<R: BufRead>(
        &self,
        input: &InputStream<R>,
        detail: impl Into<String>,
    ) -> MatrixError {
        MatrixError::Format {
            what: self.what,
            detail: detail.into(),
            start: self.start,
            current: input.position(),
        }
    }

    pub(crate) fn io_error<R: BufRead>(
        &self,
        input: &InputStream<R>,
        err: io::Error,
    ) -> MatrixError {
        let detail = match err.kind() {
            io::ErrorKind::UnexpectedEof => format!("Stream failure/EOF: {}", err),
            _ => err.to_string(),
        };
        self.error(input, detail)
    }

    /// Bytes taken by `counts` items of `size` bytes each, or a format error
    /// if a header declares more than the address space can hold.
    pub(crate) fn payload_len<R: BufRead>(
        &self,
        input: &InputStream<R>,
        counts: &[usize],
        size: usize,
    ) -> std::result::Result<usize, MatrixError> {
        counts
            .iter()
            .try_fold(size, |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| {
                self.error(
                    input,
                    format!("Declared size {:?} x {} bytes overflows", counts, size),
                )
            })
    }
}
