//! Decode-only support for Kaldi's quantized matrix encoding.
//!
//! A compressed matrix stores a global `[min, min + range]` interval and
//! quantizes elements into it, either uniformly (`CM2`, `CM3`) or through
//! per-column percentile headers (`CM`). Decoding always yields a dense
//! [`Matrix`]; compressed data is never written to or operated on.
use std::io::BufRead;

use crate::error::{truncate_token, MatrixError, Result};
use crate::io::basic::read_token;
use crate::io::stream::InputStream;
use crate::io::ReadContext;
use crate::math::{Matrix, MatrixStride, MatrixView, Real, ResizePolicy};

const WHAT: &str = "compressed matrix";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// One byte per element, with per-column percentile headers (`CM`).
    OneByteWithColHeaders,
    /// Two bytes per element, uniform quantization (`CM2`).
    TwoByte,
    /// One byte per element, uniform quantization (`CM3`).
    OneByte,
}

impl CompressionFormat {
    pub fn token(self) -> &'static str {
        match self {
            CompressionFormat::OneByteWithColHeaders => "CM",
            CompressionFormat::TwoByte => "CM2",
            CompressionFormat::OneByte => "CM3",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "CM" => Some(CompressionFormat::OneByteWithColHeaders),
            "CM2" => Some(CompressionFormat::TwoByte),
            "CM3" => Some(CompressionFormat::OneByte),
            _ => None,
        }
    }
}

/// Interval and shape shared by all formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalHeader {
    pub min_value: f32,
    pub range: f32,
    pub num_rows: usize,
    pub num_cols: usize,
}

impl GlobalHeader {
    #[inline]
    fn uint16_to_float(&self, value: u16) -> f32 {
        self.min_value + self.range * (1.0 / 65535.0) * value as f32
    }

    #[inline]
    fn uint8_to_float(&self, value: u8) -> f32 {
        self.min_value + self.range * (1.0 / 255.0) * value as f32
    }
}

/// Quantized 0th, 25th, 75th and 100th percentile of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerColHeader {
    pub percentile_0: u16,
    pub percentile_25: u16,
    pub percentile_75: u16,
    pub percentile_100: u16,
}

/// Percentiles of one column, dequantized.
struct ColumnRange {
    p0: f32,
    p25: f32,
    p75: f32,
    p100: f32,
}

impl ColumnRange {
    fn new(global: &GlobalHeader, header: &PerColHeader) -> Self {
        Self {
            p0: global.uint16_to_float(header.percentile_0),
            p25: global.uint16_to_float(header.percentile_25),
            p75: global.uint16_to_float(header.percentile_75),
            p100: global.uint16_to_float(header.percentile_100),
        }
    }

    /// Piecewise-linear map: bytes 0..=64, 64..=192 and 192..=255 cover the
    /// three inter-percentile intervals.
    #[inline]
    fn byte_to_float(&self, value: u8) -> f32 {
        let v = value as f32;
        if value <= 64 {
            self.p0 + (self.p25 - self.p0) * v * (1.0 / 64.0)
        } else if value <= 192 {
            self.p25 + (self.p75 - self.p25) * (v - 64.0) * (1.0 / 128.0)
        } else {
            self.p75 + (self.p100 - self.p75) * (v - 192.0) * (1.0 / 63.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    ColumnBytes {
        headers: Vec<PerColHeader>,
        bytes: Vec<u8>,
    },
    TwoByte(Vec<u16>),
    OneByte(Vec<u8>),
}

/// A quantized matrix read from an archive.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedMatrix {
    header: GlobalHeader,
    payload: Payload,
}

impl CompressedMatrix {
    fn check_len(op: &'static str, expected: usize, got: usize) -> Result<()> {
        if expected != got {
            return Err(MatrixError::DimMismatch {
                op,
                left: expected,
                right: got,
            });
        }
        Ok(())
    }

    /// `CM3`: row-major bytes.
    pub fn one_byte(header: GlobalHeader, data: Vec<u8>) -> Result<Self> {
        Self::check_len(
            "CompressedMatrix::one_byte",
            header.num_rows * header.num_cols,
            data.len(),
        )?;
        Ok(Self {
            header,
            payload: Payload::OneByte(data),
        })
    }

    /// `CM2`: row-major 16-bit values.
    pub fn two_byte(header: GlobalHeader, data: Vec<u16>) -> Result<Self> {
        Self::check_len(
            "CompressedMatrix::two_byte",
            header.num_rows * header.num_cols,
            data.len(),
        )?;
        Ok(Self {
            header,
            payload: Payload::TwoByte(data),
        })
    }

    /// `CM`: one header per column, then column-major bytes.
    pub fn with_col_headers(
        header: GlobalHeader,
        headers: Vec<PerColHeader>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        let op = "CompressedMatrix::with_col_headers";
        Self::check_len(op, header.num_cols, headers.len())?;
        Self::check_len(op, header.num_rows * header.num_cols, bytes.len())?;
        Ok(Self {
            header,
            payload: Payload::ColumnBytes { headers, bytes },
        })
    }

    pub fn num_rows(&self) -> usize {
        self.header.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.header.num_cols
    }

    pub fn header(&self) -> &GlobalHeader {
        &self.header
    }

    pub fn format(&self) -> CompressionFormat {
        match self.payload {
            Payload::ColumnBytes { .. } => CompressionFormat::OneByteWithColHeaders,
            Payload::TwoByte(_) => CompressionFormat::TwoByte,
            Payload::OneByte(_) => CompressionFormat::OneByte,
        }
    }

    /// Decode every element into `dest`, which must have the same shape.
    pub fn copy_to_mat<T: Real>(&self, dest: &mut MatrixView<T>) -> Result<()> {
        let (rows, cols) = (self.header.num_rows, self.header.num_cols);
        if dest.shape() != (rows, cols) {
            return Err(MatrixError::ShapeMismatch {
                op: "CompressedMatrix::copy_to_mat",
                rows,
                cols,
                other_rows: dest.num_rows(),
                other_cols: dest.num_cols(),
            });
        }
        self.decode_into(dest);
        Ok(())
    }

    /// Decode into `dest`, whose shape the caller has already matched.
    fn decode_into<T: Real>(&self, dest: &MatrixView<T>) {
        let (rows, cols) = (self.header.num_rows, self.header.num_cols);
        match &self.payload {
            Payload::OneByte(data) => {
                for (i, &b) in data.iter().enumerate() {
                    let v = self.header.uint8_to_float(b);
                    dest.put(i / cols, i % cols, T::from_double(v as f64));
                }
            }
            Payload::TwoByte(data) => {
                for (i, &q) in data.iter().enumerate() {
                    let v = self.header.uint16_to_float(q);
                    dest.put(i / cols, i % cols, T::from_double(v as f64));
                }
            }
            Payload::ColumnBytes { headers, bytes } => {
                for (c, col_header) in headers.iter().enumerate() {
                    let range = ColumnRange::new(&self.header, col_header);
                    let column = &bytes[c * rows..(c + 1) * rows];
                    for (r, &b) in column.iter().enumerate() {
                        dest.put(r, c, T::from_double(range.byte_to_float(b) as f64));
                    }
                }
            }
        }
    }

    /// Read a binary compressed object (token, header, payload).
    pub fn read<R: BufRead>(input: &mut InputStream<R>) -> Result<Self> {
        let ctx = ReadContext::new(WHAT, input);
        let token = read_token(input).map_err(|e| ctx.io_error(input, e))?;
        let format = CompressionFormat::from_token(&token).ok_or_else(|| {
            ctx.error(
                input,
                format!("Unexpected token {}, expecting CM, CM2 or CM3", truncate_token(&token)),
            )
        })?;

        let mut raw = [0u8; 16];
        input
            .read_exact(&mut raw)
            .map_err(|e| ctx.io_error(input, e))?;
        let f32_at = |i: usize| f32::from_le_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]);
        let i32_at = |i: usize| i32::from_le_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]);
        let (num_rows, num_cols) = (i32_at(8), i32_at(12));
        if num_rows < 0 || num_cols < 0 {
            return Err(ctx.error(
                input,
                format!("Invalid compressed matrix shape {}x{}", num_rows, num_cols),
            ));
        }
        let mut header = GlobalHeader {
            min_value: f32_at(0),
            range: f32_at(4),
            num_rows: num_rows as usize,
            num_cols: num_cols as usize,
        };
        if header.num_rows == 0 || header.num_cols == 0 {
            header.num_rows = 0;
            header.num_cols = 0;
            return Self::one_byte(header, Vec::new());
        }

        let count = ctx.payload_len(input, &[header.num_rows, header.num_cols], 1)?;
        match format {
            CompressionFormat::OneByte => {
                let data = input.read_bytes(count).map_err(|e| ctx.io_error(input, e))?;
                Self::one_byte(header, data)
            }
            CompressionFormat::TwoByte => {
                let len = ctx.payload_len(input, &[count], 2)?;
                let data = input.read_bytes(len).map_err(|e| ctx.io_error(input, e))?;
                let values = data
                    .chunks_exact(2)
                    .map(|b| u16::from_le_bytes([b[0], b[1]]))
                    .collect();
                Self::two_byte(header, values)
            }
            CompressionFormat::OneByteWithColHeaders => {
                let len = ctx.payload_len(input, &[header.num_cols], 8)?;
                let raw_headers = input.read_bytes(len).map_err(|e| ctx.io_error(input, e))?;
                let headers = raw_headers
                    .chunks_exact(8)
                    .map(|h| PerColHeader {
                        percentile_0: u16::from_le_bytes([h[0], h[1]]),
                        percentile_25: u16::from_le_bytes([h[2], h[3]]),
                        percentile_75: u16::from_le_bytes([h[4], h[5]]),
                        percentile_100: u16::from_le_bytes([h[6], h[7]]),
                    })
                    .collect();
                let bytes = input.read_bytes(count).map_err(|e| ctx.io_error(input, e))?;
                Self::with_col_headers(header, headers, bytes)
            }
        }
    }
}

impl<T: Real> Matrix<T> {
    /// Dense copy of a compressed matrix.
    pub fn from_compressed(c: &CompressedMatrix) -> Self {
        let m = Matrix::with_policy(
            c.num_rows(),
            c.num_cols(),
            ResizePolicy::Undefined,
            MatrixStride::Default,
        );
        c.decode_into(&m);
        m
    }
}
