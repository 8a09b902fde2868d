//! Floating-point element types supported by the containers.
use std::fmt;
use std::str::FromStr;

use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Precision tag carried by archives and containers.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    Single,
    Double,
}

impl Precision {
    /// Binary token of a dense matrix in this precision.
    pub fn matrix_token(self) -> &'static str {
        match self {
            Precision::Single => "FM",
            Precision::Double => "DM",
        }
    }

    /// Binary token of a vector in this precision.
    pub fn vector_token(self) -> &'static str {
        match self {
            Precision::Single => "FV",
            Precision::Double => "DV",
        }
    }

    /// First byte shared by all tokens of this precision.
    pub fn token_start(self) -> u8 {
        match self {
            Precision::Single => b'F',
            Precision::Double => b'D',
        }
    }

    pub fn element_size(self) -> usize {
        match self {
            Precision::Single => 4,
            Precision::Double => 8,
        }
    }
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "float" | "f32" => Ok(Precision::Single),
            "double" | "f64" => Ok(Precision::Double),
            _ => Err(format!(
                "Unknown precision: {}. Expected one of single/float/f32 or double/f64",
                s
            )),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Single => write!(f, "single"),
            Precision::Double => write!(f, "double"),
        }
    }
}

/// Element type of a vector or matrix: `f32` or `f64`.
///
/// `Other` names the opposite precision, which is what the binary readers
/// fall back to when an archive was written with the other element type.
pub trait Real:
    Float + Default + fmt::Debug + fmt::Display + FromStr + Send + Sync + 'static
{
    const PRECISION: Precision;

    type Other: Real<Other = Self>;

    /// Widen to `f64` without loss.
    fn to_double(self) -> f64;

    /// Narrow (or keep) an `f64`, rounding to nearest.
    fn from_double(value: f64) -> Self;

    /// Decode one element from its little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Append the little-endian bytes of this element.
    fn write_le(self, out: &mut Vec<u8>);

    #[inline]
    fn cast<U: Real>(self) -> U {
        U::from_double(self.to_double())
    }

    #[inline]
    fn size() -> usize {
        Self::PRECISION.element_size()
    }
}

impl Real for f32 {
    const PRECISION: Precision = Precision::Single;

    type Other = f64;

    #[inline]
    fn to_double(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_double(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Real for f64 {
    const PRECISION: Precision = Precision::Double;

    type Other = f32;

    #[inline]
    fn to_double(self) -> f64 {
        self
    }

    #[inline]
    fn from_double(value: f64) -> Self {
        value
    }

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..8]);
        f64::from_le_bytes(raw)
    }

    #[inline]
    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}
