//! tkaldi-matrix: Kaldi-compatible dense matrix and vector containers.
//!
//! This crate provides reference-counted numeric buffers with zero-copy
//! vector/matrix views over them, BLAS-style in-place arithmetic, and the
//! legacy Kaldi archive formats: the framed binary encoding (`FM`/`DM`,
//! `FV`/`DV`), the bracketed text encoding, the decode-only compressed
//! matrix encoding (`CM`, `CM2`, `CM3`) and HTK feature files.
//!
//! `math` holds the containers, `io` every reader and writer, and `config`
//! the settings used by the path-level helpers in [`io::archive`].
pub mod config;
pub mod error;
pub mod io;
pub mod math;

pub use error::{Advisory, MatrixError, Result, SpecialValue};
pub use math::{
    vec_vec, CompressedMatrix, Matrix, MatrixStride, MatrixView, NumericBuffer, Precision, Real,
    ResizePolicy, Transpose, Vector, VectorView,
};
