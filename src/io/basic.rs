//! Framing primitives shared by every binary object: tokens and sized integers.
use std::io::{self, BufRead, Write};

use crate::io::stream::InputStream;

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Write `token` followed by a single space.
pub fn write_token<W: Write>(out: &mut W, token: &str) -> io::Result<()> {
    out.write_all(token.as_bytes())?;
    out.write_all(b" ")
}

/// Read a whitespace-delimited token and the single space that ends it.
pub fn read_token<R: BufRead>(input: &mut InputStream<R>) -> io::Result<String> {
    let token = input.read_word()?.ok_or_else(|| {
        io::Error::new(io::ErrorKind::UnexpectedEof, "expected token, got end of stream")
    })?;
    match input.peek()? {
        Some(b) if b.is_ascii_whitespace() => {
            input.next_byte()?;
            Ok(token)
        }
        Some(b) => Err(invalid(format!(
            "expected space after token {}, saw instead {:?}",
            token, b as char
        ))),
        None => Err(invalid(format!(
            "expected space after token {}, got end of stream",
            token
        ))),
    }
}

/// Write a signed 32-bit integer as a size byte (`4`) and 4 little-endian bytes.
pub fn write_i32<W: Write>(out: &mut W, value: i32) -> io::Result<()> {
    out.write_all(&[std::mem::size_of::<i32>() as u8])?;
    out.write_all(&value.to_le_bytes())
}

pub fn read_i32<R: BufRead>(input: &mut InputStream<R>) -> io::Result<i32> {
    let size = input.next_byte()?.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "expected integer, got end of stream",
        )
    })?;
    if size as usize != std::mem::size_of::<i32>() {
        return Err(invalid(format!(
            "did not get expected integer type, {} vs. {}",
            size,
            std::mem::size_of::<i32>()
        )));
    }
    let mut raw = [0u8; 4];
    input.read_exact(&mut raw)?;
    Ok(i32::from_le_bytes(raw))
}

/// Read a non-negative dimension stored as `i32`.
pub fn read_dim<R: BufRead>(input: &mut InputStream<R>) -> io::Result<usize> {
    let value = read_i32(input)?;
    usize::try_from(value).map_err(|_| invalid(format!("negative dimension {}", value)))
}

/// Write a dimension as `i32`; fails if it does not fit.
pub fn write_dim<W: Write>(out: &mut W, dim: usize) -> io::Result<()> {
    let value =
        i32::try_from(dim).map_err(|_| invalid(format!("dimension {} exceeds i32 range", dim)))?;
    write_i32(out, value)
}
