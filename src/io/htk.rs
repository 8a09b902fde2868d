//! HTK feature files: a 12-byte big-endian header followed by big-endian
//! `f32` frames.
use std::io::{BufRead, Write};

use crate::error::{MatrixError, Result};
use crate::io::stream::InputStream;
use crate::io::ReadContext;
use crate::math::{Matrix, MatrixStride, MatrixView, Real, ResizePolicy};

const WHAT: &str = "HTK features";

/// Sample-kind qualifier marking compressed HTK data.
pub const HTK_COMPRESSED: u16 = 0o2000;

/// Base parameter kinds used by Kaldi's feature tools.
pub const HTK_MFCC: u16 = 6;
pub const HTK_FBANK: u16 = 7;
pub const HTK_USER: u16 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtkHeader {
    /// Number of frames.
    pub num_samples: i32,
    /// Frame period in 100ns units.
    pub sample_period: i32,
    /// Bytes per frame.
    pub sample_size: i16,
    pub sample_kind: u16,
}

impl HtkHeader {
    pub const SIZE: usize = 12;

    fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.num_samples.to_be_bytes());
        out[4..8].copy_from_slice(&self.sample_period.to_be_bytes());
        out[8..10].copy_from_slice(&self.sample_size.to_be_bytes());
        out[10..12].copy_from_slice(&self.sample_kind.to_be_bytes());
        out
    }

    fn from_bytes(raw: &[u8; Self::SIZE]) -> Self {
        Self {
            num_samples: i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]),
            sample_period: i32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]),
            sample_size: i16::from_be_bytes([raw[8], raw[9]]),
            sample_kind: u16::from_be_bytes([raw[10], raw[11]]),
        }
    }
}

/// Read an HTK file into a matrix with one row per frame.
pub fn read_htk<T: Real, R: BufRead>(
    input: &mut InputStream<R>,
) -> Result<(Matrix<T>, HtkHeader)> {
    let ctx = ReadContext::new(WHAT, input);
    let mut raw = [0u8; HtkHeader::SIZE];
    input
        .read_exact(&mut raw)
        .map_err(|e| ctx.io_error(input, e))?;
    let header = HtkHeader::from_bytes(&raw);

    if header.sample_kind & HTK_COMPRESSED != 0 {
        return Err(ctx.error(input, "Compressed HTK files are not supported"));
    }
    if header.num_samples < 0 || header.sample_size < 0 || header.sample_size % 4 != 0 {
        return Err(ctx.error(
            input,
            format!(
                "Invalid HTK header: {} samples of {} bytes",
                header.num_samples, header.sample_size
            ),
        ));
    }

    let rows = header.num_samples as usize;
    let cols = header.sample_size as usize / 4;
    let len = ctx.payload_len(input, &[rows, cols], 4)?;
    let raw = input.read_bytes(len).map_err(|e| ctx.io_error(input, e))?;

    let m = Matrix::<T>::with_policy(rows, cols, ResizePolicy::Undefined, MatrixStride::Default);
    if cols > 0 {
        for (i, b) in raw.chunks_exact(4).enumerate() {
            let v = f32::from_be_bytes([b[0], b[1], b[2], b[3]]);
            m.put(i / cols, i % cols, T::from_double(v as f64));
        }
    }
    Ok((m, header))
}

/// Write `m` as an HTK file. `num_samples` and `sample_size` come from the
/// matrix; period and kind from `header`.
pub fn write_htk<T: Real, W: Write>(
    out: &mut W,
    m: &MatrixView<T>,
    header: HtkHeader,
) -> Result<()> {
    let (rows, cols) = m.shape();
    let num_samples = i32::try_from(rows).map_err(|_| MatrixError::TooLarge {
        op: "write_htk",
        what: "sample count",
        value: rows,
        limit: i32::MAX as usize,
    })?;
    let sample_size = cols
        .checked_mul(4)
        .and_then(|bytes| i16::try_from(bytes).ok())
        .ok_or(MatrixError::TooLarge {
            op: "write_htk",
            what: "frame width in columns",
            value: cols,
            limit: i16::MAX as usize / 4,
        })?;
    let header = HtkHeader {
        num_samples,
        sample_size,
        ..header
    };
    out.write_all(&header.to_bytes())?;

    let mut frame = Vec::with_capacity(cols * 4);
    for r in 0..rows {
        frame.clear();
        for c in 0..cols {
            let v = m.at(r, c).to_double() as f32;
            frame.extend_from_slice(&v.to_be_bytes());
        }
        out.write_all(&frame)?;
    }
    Ok(())
}
