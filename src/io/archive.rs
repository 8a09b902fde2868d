//! Path-level helpers: one object per file, with the `\0B` binary marker
//! detected on read.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::ArchiveConfig;
use crate::io::stream::{write_binary_header, InputStream};
use crate::math::{Matrix, MatrixView, Real, Transpose, Vector, VectorView};

fn report_advisories(path: &Path, count: usize) {
    if count > 0 {
        log::warn!(
            "{} infinite or NaN values read from {}",
            count,
            path.display()
        );
    }
}

/// Write a matrix to `path` using `config`.
pub fn write_matrix<T: Real, P: AsRef<Path>>(
    path: P,
    m: &MatrixView<T>,
    config: &ArchiveConfig,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create matrix archive: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let binary = config.encoding.is_binary();
    write_binary_header(&mut out, binary)?;
    let written = match config.precision {
        Some(precision) if precision != T::PRECISION => {
            Matrix::<T::Other>::from_mat(m, Transpose::NoTrans).write(&mut out, binary)
        }
        _ => m.write(&mut out, binary),
    };
    written.with_context(|| format!("Failed to write matrix to {}", path.display()))?;
    out.flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

/// Read a matrix from `path`, detecting binary or text encoding.
pub fn read_matrix<T: Real, P: AsRef<Path>>(path: P) -> Result<Matrix<T>> {
    let path = path.as_ref();
    let mut input = InputStream::open(path)
        .with_context(|| format!("Failed to open matrix archive: {}", path.display()))?;
    let binary = input
        .read_binary_header()
        .with_context(|| format!("Failed to read archive header of {}", path.display()))?;
    let mut m = Matrix::default();
    let advisories = m
        .read(&mut input, binary, false)
        .with_context(|| format!("Failed to read matrix from {}", path.display()))?;
    report_advisories(path, advisories.len());
    Ok(m)
}

/// Write a vector to `path` using `config`.
pub fn write_vector<T: Real, P: AsRef<Path>>(
    path: P,
    v: &VectorView<T>,
    config: &ArchiveConfig,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create vector archive: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let binary = config.encoding.is_binary();
    write_binary_header(&mut out, binary)?;
    let written = match config.precision {
        Some(precision) if precision != T::PRECISION => {
            Vector::<T::Other>::from_view(v).write(&mut out, binary)
        }
        _ => v.write(&mut out, binary),
    };
    written.with_context(|| format!("Failed to write vector to {}", path.display()))?;
    out.flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

/// Read a vector from `path`, detecting binary or text encoding.
pub fn read_vector<T: Real, P: AsRef<Path>>(path: P) -> Result<Vector<T>> {
    let path = path.as_ref();
    let mut input = InputStream::open(path)
        .with_context(|| format!("Failed to open vector archive: {}", path.display()))?;
    let binary = input
        .read_binary_header()
        .with_context(|| format!("Failed to read archive header of {}", path.display()))?;
    let mut v = Vector::default();
    let advisories = v
        .read(&mut input, binary, false)
        .with_context(|| format!("Failed to read vector from {}", path.display()))?;
    report_advisories(path, advisories.len());
    Ok(v)
}
