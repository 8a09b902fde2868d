//! Binary and text codec for vectors.
use std::fmt;
use std::io::{BufRead, Write};

use crate::error::{truncate_token, Advisory, MatrixError, Result};
use crate::io::basic::{read_dim, read_token, write_dim, write_token};
use crate::io::stream::InputStream;
use crate::io::text::{consume_line_end, scan_number, scan_word, Scanned};
use crate::io::ReadContext;
use crate::math::{Real, Vector, VectorView};

const WHAT: &str = "vector";

fn read_binary<T: Real, R: BufRead>(input: &mut InputStream<R>) -> Result<Vector<T>> {
    let ctx = ReadContext::new(WHAT, input);
    let first = input.peek().map_err(|e| ctx.io_error(input, e))?;
    if first == Some(<T::Other as Real>::PRECISION.token_start()) {
        log::debug!(
            "reading {} precision vector into {} precision",
            <T::Other as Real>::PRECISION,
            T::PRECISION
        );
        let other = read_binary::<T::Other, R>(input)?;
        return Ok(Vector::from_view(&other));
    }

    let expected = T::PRECISION.vector_token();
    let token = read_token(input).map_err(|e| ctx.io_error(input, e))?;
    if token != expected {
        return Err(ctx.error(
            input,
            format!("Expected token {}, got {}", expected, truncate_token(&token)),
        ));
    }
    let dim = read_dim(input).map_err(|e| ctx.io_error(input, e))?;
    let len = ctx.payload_len(input, &[dim], T::size())?;
    let raw = input.read_bytes(len).map_err(|e| ctx.io_error(input, e))?;
    Ok(Vector::from_vec(
        raw.chunks_exact(T::size()).map(T::read_le).collect(),
    ))
}

fn read_text<T: Real, R: BufRead>(
    input: &mut InputStream<R>,
) -> Result<(Vector<T>, Vec<Advisory>)> {
    let ctx = ReadContext::new(WHAT, input);
    let opening = input.read_word().map_err(|e| ctx.io_error(input, e))?;
    match opening.as_deref() {
        None => return Err(ctx.error(input, "Expected \"[\", got EOF")),
        Some("[]") => return Ok((Vector::default(), Vec::new())),
        Some("[") => {}
        Some(other) => {
            return Err(ctx.error(
                input,
                format!("Expected \"[\" but got {}", truncate_token(other)),
            ))
        }
    }

    let mut data = Vec::new();
    let mut advisories = Vec::new();
    loop {
        let next = input.peek().map_err(|e| ctx.io_error(input, e))?;
        match next {
            None => return Err(ctx.error(input, "Got EOF while reading vector data")),
            Some(b']') => {
                input.next_byte().map_err(|e| ctx.io_error(input, e))?;
                if let Err(e) = consume_line_end(input) {
                    log::warn!("After end of vector data, read error: {}", e);
                }
                break;
            }
            Some(b'\n') | Some(b'\r') => {
                return Err(ctx.error(
                    input,
                    "Newline found while reading vector (maybe it's a matrix?)",
                ))
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
                    Scanned::Value(v) => data.push(v),
                    Scanned::Special(v, value) => {
                        let advisory = Advisory { value, offset };
                        log::warn!("Reading special value into vector: {}", advisory);
                        advisories.push(advisory);
                        data.push(v);
                    }
                    Scanned::Invalid(token) if numeric => {
                        return Err(ctx.error(
                            input,
                            format!("Failed to read number, got {}", truncate_token(&token)),
                        ))
                    }
                    Scanned::Invalid(token) => {
                        return Err(ctx.error(
                            input,
                            format!(
                                "Expecting numeric vector data, got {}",
                                truncate_token(&token)
                            ),
                        ))
                    }
                }
            }
        }
    }
    Ok((Vector::from_vec(data), advisories))
}

impl<T: Real> Vector<T> {
    /// Read a vector written by [`VectorView::write`]; `add` follows the
    /// same rules as [`crate::math::Matrix::read`].
    pub fn read<R: BufRead>(
        &mut self,
        input: &mut InputStream<R>,
        binary: bool,
        add: bool,
    ) -> Result<Vec<Advisory>> {
        if add {
            let mut tmp = Vector::<T>::default();
            let advisories = tmp.read(input, binary, false)?;
            if self.is_empty() {
                *self = tmp;
            } else if !tmp.is_empty() {
                if tmp.dim() != self.dim() {
                    return Err(MatrixError::DimMismatch {
                        op: "Vector::read(add)",
                        left: self.dim(),
                        right: tmp.dim(),
                    });
                }
                self.add_vec(T::one(), &tmp)?;
            }
            return Ok(advisories);
        }

        if binary {
            *self = read_binary::<T, R>(input)?;
            Ok(Vec::new())
        } else {
            let (v, advisories) = read_text::<T, R>(input)?;
            *self = v;
            Ok(advisories)
        }
    }
}

impl<T: Real> VectorView<T> {
    /// Write in binary (`FV`/`DV` framing) or text (`[ ... ]`) form.
    pub fn write<W: Write>(&self, out: &mut W, binary: bool) -> Result<()> {
        if binary {
            write_token(out, T::PRECISION.vector_token())?;
            write_dim(out, self.dim())?;
            let mut raw = Vec::with_capacity(self.dim() * T::size());
            for v in self.iter() {
                v.write_le(&mut raw);
            }
            out.write_all(&raw)?;
        } else {
            out.write_all(b" [ ")?;
            for v in self.iter() {
                write!(out, "{} ", v)?;
            }
            out.write_all(b"]\n")?;
        }
        Ok(())
    }
}

impl<T: Real> fmt::Display for VectorView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = Vec::new();
        self.write(&mut text, false).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&text))
    }
}
