//! Binary and text codec for dense matrices.
use std::fmt;
use std::io::{BufRead, Write};

use crate::error::{truncate_token, Advisory, MatrixError, Result};
use crate::io::basic::{read_dim, read_token, write_dim, write_token};
use crate::io::stream::InputStream;
use crate::io::text::{consume_line_end, scan_number, scan_word, Scanned};
use crate::io::ReadContext;
use crate::math::{
    CompressedMatrix, Matrix, MatrixStride, MatrixView, Real, ResizePolicy, Transpose,
};

const WHAT: &str = "matrix";

/// A matrix as found in a binary archive, before normalisation to the
/// caller's precision.
#[derive(Debug)]
pub enum StoredMatrix<T: Real> {
    /// Dense payload in the requested precision.
    Dense(Matrix<T>),
    /// Dense payload written in the other precision.
    Foreign(Matrix<T::Other>),
    /// Quantized payload.
    Compressed(CompressedMatrix),
}

impl<T: Real> StoredMatrix<T> {
    pub fn into_dense(self) -> Matrix<T> {
        match self {
            StoredMatrix::Dense(m) => m,
            StoredMatrix::Foreign(m) => Matrix::from_mat(&m, Transpose::NoTrans),
            StoredMatrix::Compressed(c) => Matrix::from_compressed(&c),
        }
    }
}

/// Decode one binary matrix object, choosing the variant from the first byte.
pub fn read_stored<T: Real, R: BufRead>(input: &mut InputStream<R>) -> Result<StoredMatrix<T>> {
    let ctx = ReadContext::new(WHAT, input);
    let first = input.peek().map_err(|e| ctx.io_error(input, e))?;
    match first {
        Some(b'C') => {
            let compressed = CompressedMatrix::read(input)?;
            log::debug!(
                "decoding {:?} compressed matrix of {}x{}",
                compressed.format(),
                compressed.num_rows(),
                compressed.num_cols()
            );
            Ok(StoredMatrix::Compressed(compressed))
        }
        Some(b) if b == <T::Other as Real>::PRECISION.token_start() => {
            log::debug!(
                "reading {} precision matrix into {} precision",
                <T::Other as Real>::PRECISION,
                T::PRECISION
            );
            Ok(StoredMatrix::Foreign(read_dense::<T::Other, R>(input)?))
        }
        _ => Ok(StoredMatrix::Dense(read_dense::<T, R>(input)?)),
    }
}

fn read_dense<T: Real, R: BufRead>(input: &mut InputStream<R>) -> Result<Matrix<T>> {
    let ctx = ReadContext::new(WHAT, input);
    let expected = T::PRECISION.matrix_token();
    let token = read_token(input).map_err(|e| ctx.io_error(input, e))?;
    if token != expected {
        return Err(ctx.error(
            input,
            format!("Expected token {}, got {}", expected, truncate_token(&token)),
        ));
    }
    let rows = read_dim(input).map_err(|e| ctx.io_error(input, e))?;
    let cols = read_dim(input).map_err(|e| ctx.io_error(input, e))?;

    // The payload must arrive before the matrix is allocated.
    let len = ctx.payload_len(input, &[rows, cols], T::size())?;
    let raw = input.read_bytes(len).map_err(|e| ctx.io_error(input, e))?;

    let m = Matrix::<T>::with_policy(rows, cols, ResizePolicy::Undefined, MatrixStride::Default);
    fill_rows(&m, &raw);
    Ok(m)
}

/// Copy row-major little-endian elements into `m`.
fn fill_rows<T: Real>(m: &MatrixView<T>, raw: &[u8]) {
    let cols = m.num_cols();
    if cols == 0 {
        return;
    }
    for (i, chunk) in raw.chunks_exact(T::size()).enumerate() {
        m.put(i / cols, i % cols, T::read_le(chunk));
    }
}

fn read_text<T: Real, R: BufRead>(
    input: &mut InputStream<R>,
) -> Result<(Matrix<T>, Vec<Advisory>)> {
    let ctx = ReadContext::new(WHAT, input);
    let opening = input.read_word().map_err(|e| ctx.io_error(input, e))?;
    match opening.as_deref() {
        None => return Err(ctx.error(input, "Expected \"[\", got EOF")),
        Some("[]") => return Ok((Matrix::default(), Vec::new())),
        Some("[") => {}
        Some(other) => {
            return Err(ctx.error(
                input,
                format!("Expected \"[\", got \"{}\"", truncate_token(other)),
            ))
        }
    }

    let mut rows: Vec<Vec<T>> = Vec::new();
    let mut current: Vec<T> = Vec::new();
    let mut advisories = Vec::new();
    loop {
        let next = input.peek().map_err(|e| ctx.io_error(input, e))?;
        match next {
            None => return Err(ctx.error(input, "Got EOF while reading matrix data")),
            Some(b']') => {
                input.next_byte().map_err(|e| ctx.io_error(input, e))?;
                if let Err(e) = consume_line_end(input) {
                    log::warn!("After end of matrix data, read error: {}", e);
                }
                if !current.is_empty() {
                    rows.push(current);
                }
                break;
            }
            Some(b'\n') | Some(b';') => {
                input.next_byte().map_err(|e| ctx.io_error(input, e))?;
                if !current.is_empty() {
                    let width = current.len();
                    rows.push(std::mem::replace(&mut current, Vec::with_capacity(width)));
                }
            }
            Some(b) if b.is_ascii_whitespace() => {
                input.next_byte().map_err(|e| ctx.io_error(input, e))?;
            }
            Some(b) => {
                let offset = input.position();
                let numeric = b.is_ascii_digit() || b == b'-';
                let scanned = if numeric {
                    scan_number::<T, R>(input)
                } else {
                    scan_word::<T, R>(input)
                }
                .map_err(|e| ctx.io_error(input, e))?;
                match scanned {
                    Scanned::Value(v) => current.push(v),
                    Scanned::Special(v, value) => {
                        let advisory = Advisory { value, offset };
                        log::warn!("Reading special value into matrix: {}", advisory);
                        advisories.push(advisory);
                        current.push(v);
                    }
                    Scanned::Invalid(token) if numeric => {
                        return Err(ctx.error(
                            input,
                            format!(
                                "Stream failure/EOF while reading matrix data, got {}",
                                truncate_token(&token)
                            ),
                        ))
                    }
                    Scanned::Invalid(token) => {
                        return Err(ctx.error(
                            input,
                            format!(
                                "Expecting numeric matrix data, got {}",
                                truncate_token(&token)
                            ),
                        ))
                    }
                }
            }
        }
    }

    let num_cols = match rows.first() {
        None => return Ok((Matrix::default(), advisories)),
        Some(first) => first.len(),
    };
    for (i, row) in rows.iter().enumerate() {
        if row.len() != num_cols {
            return Err(ctx.error(
                input,
                format!(
                    "Matrix has inconsistent #cols: {} vs. {} (processing row {})",
                    num_cols,
                    row.len(),
                    i
                ),
            ));
        }
    }
    let m = Matrix::<T>::with_policy(
        rows.len(),
        num_cols,
        ResizePolicy::Undefined,
        MatrixStride::Default,
    );
    for (r, row) in rows.into_iter().enumerate() {
        for (c, v) in row.into_iter().enumerate() {
            m.put(r, c, v);
        }
    }
    Ok((m, advisories))
}

impl<T: Real> Matrix<T> {
    /// Read a matrix written by [`MatrixView::write`].
    ///
    /// In binary mode a compressed payload or a payload of the other
    /// precision is decoded and converted transparently. With `add` set the
    /// decoded matrix is added to this one: an empty `self` takes the read
    /// shape, an empty read is a no-op, and any other shape difference is an
    /// error. Returns the special values met in text data.
    ///
    /// On error the contents of `self` are unspecified.
    pub fn read<R: BufRead>(
        &mut self,
        input: &mut InputStream<R>,
        binary: bool,
        add: bool,
    ) -> Result<Vec<Advisory>> {
        if add {
            let mut tmp = Matrix::<T>::default();
            let advisories = tmp.read(input, binary, false)?;
            if self.is_empty() {
                *self = tmp;
            } else if !tmp.is_empty() {
                if tmp.shape() != self.shape() {
                    return Err(MatrixError::ShapeMismatch {
                        op: "Matrix::read(add)",
                        rows: self.num_rows(),
                        cols: self.num_cols(),
                        other_rows: tmp.num_rows(),
                        other_cols: tmp.num_cols(),
                    });
                }
                self.add_mat(T::one(), &tmp, Transpose::NoTrans)?;
            }
            return Ok(advisories);
        }

        if binary {
            *self = read_stored::<T, R>(input)?.into_dense();
            Ok(Vec::new())
        } else {
            let (m, advisories) = read_text::<T, R>(input)?;
            *self = m;
            Ok(advisories)
        }
    }
}

impl<T: Real> MatrixView<T> {
    /// Write in binary (`FM`/`DM` framing) or text (`[ ... ]`) form.
    pub fn write<W: Write>(&self, out: &mut W, binary: bool) -> Result<()> {
        let (rows, cols) = self.shape();
        if binary {
            write_token(out, T::PRECISION.matrix_token())?;
            write_dim(out, rows)?;
            write_dim(out, cols)?;
            if self.is_contiguous() {
                let mut raw = Vec::with_capacity(rows * cols * T::size());
                for v in self.to_vec() {
                    v.write_le(&mut raw);
                }
                out.write_all(&raw)?;
            } else {
                let mut raw = Vec::with_capacity(cols * T::size());
                for r in 0..rows {
                    raw.clear();
                    for c in 0..cols {
                        self.at(r, c).write_le(&mut raw);
                    }
                    out.write_all(&raw)?;
                }
            }
        } else if cols == 0 {
            out.write_all(b" [ ]\n")?;
        } else {
            out.write_all(b" [")?;
            for r in 0..rows {
                out.write_all(b"\n  ")?;
                for c in 0..cols {
                    write!(out, "{} ", self.at(r, c))?;
                }
            }
            out.write_all(b"]\n")?;
        }
        Ok(())
    }
}

impl<T: Real> fmt::Display for MatrixView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = Vec::new();
        self.write(&mut text, false).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&text))
    }
}
