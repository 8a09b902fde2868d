//! Dense numeric containers.
//!
//! Storage lives in a reference-counted [`NumericBuffer`]; [`VectorView`]
//! and [`MatrixView`] describe a strided region of one buffer, and the
//! owning [`Vector`] / [`Matrix`] add allocation and resizing on top.
//! Sub-views (`row`, `col`, `range`, ...) alias their parent's buffer and
//! keep it alive for as long as they exist.
pub mod buffer;
pub mod compressed;
pub mod matrix;
pub mod real;
pub mod resize;
pub mod vector;

pub use buffer::NumericBuffer;
pub use compressed::{CompressedMatrix, CompressionFormat, GlobalHeader, PerColHeader};
pub use matrix::{Matrix, MatrixStride, MatrixView, Transpose};
pub use real::{Precision, Real};
pub use resize::ResizePolicy;
pub use vector::{vec_vec, Vector, VectorView};
