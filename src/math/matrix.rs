use std::ops::{Deref, DerefMut};

use num_traits::Zero;

use crate::error::{MatrixError, Result};
use crate::math::buffer::NumericBuffer;
use crate::math::real::Real;
use crate::math::resize::ResizePolicy;
use crate::math::vector::VectorView;

/// Whether an operand is used as stored or transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transpose {
    NoTrans,
    Trans,
}

/// Row pitch requested when an owning matrix allocates storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixStride {
    /// Rows padded to a multiple of 16 bytes.
    #[default]
    Default,
    /// Rows packed back to back.
    EqualNumCols,
}

impl MatrixStride {
    pub(crate) fn row_pitch<T: Real>(self, cols: usize) -> usize {
        match self {
            MatrixStride::EqualNumCols => cols,
            MatrixStride::Default => {
                let align = (16 / T::size()).max(1);
                (cols + align - 1) / align * align
            }
        }
    }
}

/// True when `[offset, offset + len)` lies inside `[0, dim)`.
pub(crate) fn fits_within(offset: usize, len: usize, dim: usize) -> bool {
    offset.checked_add(len).map_or(false, |end| end <= dim)
}

/// A 2-D row-major view over a shared [`NumericBuffer`].
///
/// Element `(r, c)` lives at `offset + r * stride + c`. `stride` may exceed
/// `num_cols` for padded storage or for sub-matrices of a wider parent.
#[derive(Clone, Debug)]
pub struct MatrixView<T: Real> {
    buf: NumericBuffer<T>,
    offset: usize,
    rows: usize,
    cols: usize,
    stride: usize,
}

impl<T: Real> MatrixView<T> {
    pub fn from_buffer(
        buf: NumericBuffer<T>,
        offset: usize,
        rows: usize,
        cols: usize,
        stride: usize,
    ) -> Result<Self> {
        if rows > 0 && cols > 0 {
            let extent = (rows - 1)
                .checked_mul(stride)
                .and_then(|e| e.checked_add(cols));
            let fits = extent
                .and_then(|e| e.checked_add(offset))
                .map_or(false, |end| end <= buf.len());
            if stride < cols || !fits {
                return Err(MatrixError::InvalidLayout {
                    offset,
                    extent: extent.unwrap_or(usize::MAX),
                    len: buf.len(),
                });
            }
        }
        Ok(Self {
            buf,
            offset,
            rows,
            cols,
            stride,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_cols(&self) -> usize {
        self.cols
    }

    /// Elements between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// True when rows are stored back to back.
    pub fn is_contiguous(&self) -> bool {
        self.stride == self.cols || self.rows <= 1
    }

    pub fn buffer(&self) -> &NumericBuffer<T> {
        &self.buf
    }

    #[inline]
    pub(crate) fn at(&self, r: usize, c: usize) -> T {
        self.buf.get(self.offset + r * self.stride + c)
    }

    #[inline]
    pub(crate) fn put(&self, r: usize, c: usize, value: T) {
        self.buf.set(self.offset + r * self.stride + c, value)
    }

    fn check_index(&self, r: usize, c: usize) -> Result<()> {
        if r >= self.rows {
            return Err(MatrixError::IndexOutOfBounds {
                index: r,
                dim: self.rows,
            });
        }
        if c >= self.cols {
            return Err(MatrixError::IndexOutOfBounds {
                index: c,
                dim: self.cols,
            });
        }
        Ok(())
    }

    fn check_shape(&self, op: &'static str, rows: usize, cols: usize) -> Result<()> {
        if (self.rows, self.cols) != (rows, cols) {
            return Err(MatrixError::ShapeMismatch {
                op,
                rows: self.rows,
                cols: self.cols,
                other_rows: rows,
                other_cols: cols,
            });
        }
        Ok(())
    }

    pub fn get(&self, r: usize, c: usize) -> Result<T> {
        self.check_index(r, c)?;
        Ok(self.at(r, c))
    }

    pub fn set(&mut self, r: usize, c: usize, value: T) -> Result<()> {
        self.check_index(r, c)?;
        self.put(r, c, value);
        Ok(())
    }

    /// Aliasing view of row `r`.
    pub fn row(&self, r: usize) -> Result<VectorView<T>> {
        if r >= self.rows {
            return Err(MatrixError::IndexOutOfBounds {
                index: r,
                dim: self.rows,
            });
        }
        Ok(VectorView::strided_unchecked(
            self.buf.clone(),
            self.offset + r * self.stride,
            self.cols,
            1,
        ))
    }

    /// Aliasing, strided view of column `c`.
    pub fn col(&self, c: usize) -> Result<VectorView<T>> {
        if c >= self.cols {
            return Err(MatrixError::IndexOutOfBounds {
                index: c,
                dim: self.cols,
            });
        }
        Ok(VectorView::strided_unchecked(
            self.buf.clone(),
            self.offset + c,
            self.rows,
            self.stride.max(1),
        ))
    }

    /// Aliasing view of rows `[offset, offset + num_rows)`.
    pub fn row_range(&self, offset: usize, num_rows: usize) -> Result<MatrixView<T>> {
        self.range(offset, num_rows, 0, self.cols)
    }

    /// Aliasing view of a sub-rectangle, like `A(ro:ro+r, co:co+c)`.
    pub fn range(
        &self,
        row_offset: usize,
        num_rows: usize,
        col_offset: usize,
        num_cols: usize,
    ) -> Result<MatrixView<T>> {
        if !fits_within(row_offset, num_rows, self.rows) {
            return Err(MatrixError::RangeOutOfBounds {
                offset: row_offset,
                len: num_rows,
                dim: self.rows,
            });
        }
        if !fits_within(col_offset, num_cols, self.cols) {
            return Err(MatrixError::RangeOutOfBounds {
                offset: col_offset,
                len: num_cols,
                dim: self.cols,
            });
        }
        Ok(Self {
            buf: self.buf.clone(),
            offset: self.offset + row_offset * self.stride + col_offset,
            rows: num_rows,
            cols: num_cols,
            stride: self.stride,
        })
    }

    /// Elements in row-major order, padding skipped.
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.rows * self.cols);
        for r in 0..self.rows {
            out.extend((0..self.cols).map(|c| self.at(r, c)));
        }
        out
    }

    pub(crate) fn for_each_mut<F: FnMut(T) -> T>(&mut self, mut f: F) {
        for r in 0..self.rows {
            for c in 0..self.cols {
                self.put(r, c, f(self.at(r, c)));
            }
        }
    }

    pub fn set_zero(&mut self) {
        self.for_each_mut(|_| T::zero());
    }

    pub fn scale(&mut self, alpha: T) {
        self.for_each_mut(|v| v * alpha);
    }

    /// Add a constant to every element.
    pub fn add(&mut self, c: T) {
        self.for_each_mut(|v| v + c);
    }

    pub fn sum(&self) -> T {
        self.to_vec().into_iter().fold(T::zero(), |acc, v| acc + v)
    }

    /// Largest element; `-inf` for an empty matrix.
    pub fn max(&self) -> T {
        self.to_vec()
            .into_iter()
            .fold(T::neg_infinity(), |acc, v| if v > acc { v } else { acc })
    }

    /// Smallest element; `+inf` for an empty matrix.
    pub fn min(&self) -> T {
        self.to_vec()
            .into_iter()
            .fold(T::infinity(), |acc, v| if v < acc { v } else { acc })
    }

    fn source_values<U: Real>(
        &self,
        op: &'static str,
        other: &MatrixView<U>,
        trans: Transpose,
    ) -> Result<Vec<U>> {
        match trans {
            Transpose::NoTrans => {
                self.check_shape(op, other.num_rows(), other.num_cols())?;
                Ok(other.to_vec())
            }
            Transpose::Trans => {
                self.check_shape(op, other.num_cols(), other.num_rows())?;
                let mut out = Vec::with_capacity(self.rows * self.cols);
                for r in 0..self.rows {
                    out.extend((0..self.cols).map(|c| other.at(c, r)));
                }
                Ok(out)
            }
        }
    }

    /// Element-wise copy of `op(other)`; the source may have the other precision.
    pub fn copy_from_mat<U: Real>(
        &mut self,
        other: &MatrixView<U>,
        trans: Transpose,
    ) -> Result<()> {
        let values = self.source_values("CopyFromMat", other, trans)?;
        let mut it = values.into_iter();
        self.for_each_mut(|old| it.next().map_or(old, |v| v.cast()));
        Ok(())
    }

    /// `self += alpha * op(other)`.
    pub fn add_mat(&mut self, alpha: T, other: &MatrixView<T>, trans: Transpose) -> Result<()> {
        let values = self.source_values("AddMat", other, trans)?;
        let mut it = values.into_iter();
        self.for_each_mut(|old| it.next().map_or(old, |v| old + alpha * v));
        Ok(())
    }

    /// Write `v` into column `col`.
    pub fn copy_col_from_vec(&mut self, v: &VectorView<T>, col: usize) -> Result<()> {
        if col >= self.cols {
            return Err(MatrixError::IndexOutOfBounds {
                index: col,
                dim: self.cols,
            });
        }
        if v.dim() != self.rows {
            return Err(MatrixError::DimMismatch {
                op: "CopyColFromVec",
                left: self.rows,
                right: v.dim(),
            });
        }
        for (r, value) in v.to_vec().into_iter().enumerate() {
            self.put(r, col, value);
        }
        Ok(())
    }

    /// Write `v` into row `row`.
    pub fn copy_row_from_vec(&mut self, v: &VectorView<T>, row: usize) -> Result<()> {
        if row >= self.rows {
            return Err(MatrixError::IndexOutOfBounds {
                index: row,
                dim: self.rows,
            });
        }
        if v.dim() != self.cols {
            return Err(MatrixError::DimMismatch {
                op: "CopyRowFromVec",
                left: self.cols,
                right: v.dim(),
            });
        }
        for (c, value) in v.to_vec().into_iter().enumerate() {
            self.put(row, c, value);
        }
        Ok(())
    }

    pub fn to_ndarray(&self) -> ndarray::Array2<T> {
        ndarray::Array2::from_shape_fn((self.rows, self.cols), |(r, c)| self.at(r, c))
    }
}

impl<T: Real> PartialEq for MatrixView<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.to_vec() == other.to_vec()
    }
}

/// A matrix that owns its storage and can be resized.
#[derive(Debug)]
pub struct Matrix<T: Real> {
    view: MatrixView<T>,
}

impl<T: Real> Matrix<T> {
    /// Zero-filled `rows x cols` matrix with the default (padded) stride.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_policy(rows, cols, ResizePolicy::ZeroFill, MatrixStride::Default)
    }

    pub fn with_policy(
        rows: usize,
        cols: usize,
        policy: ResizePolicy,
        stride: MatrixStride,
    ) -> Self {
        let mut m = Self::default();
        m.resize_with_stride(rows, cols, policy, stride);
        m
    }

    /// Take a row-major `Vec` as densely packed storage.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        let expected = rows.checked_mul(cols);
        if expected != Some(data.len()) {
            return Err(MatrixError::DimMismatch {
                op: "Matrix::from_vec",
                left: expected.unwrap_or(usize::MAX),
                right: data.len(),
            });
        }
        let buf = NumericBuffer::from_vec(data);
        Ok(Self {
            view: MatrixView {
                buf,
                offset: 0,
                rows,
                cols,
                stride: cols,
            },
        })
    }

    /// Copy of `op(src)`, cast to this precision.
    pub fn from_mat<U: Real>(src: &MatrixView<U>, trans: Transpose) -> Self {
        let (rows, cols) = match trans {
            Transpose::NoTrans => src.shape(),
            Transpose::Trans => (src.num_cols(), src.num_rows()),
        };
        let m = Self::with_policy(rows, cols, ResizePolicy::Undefined, MatrixStride::Default);
        for r in 0..rows {
            for c in 0..cols {
                let v = match trans {
                    Transpose::NoTrans => src.at(r, c),
                    Transpose::Trans => src.at(c, r),
                };
                m.put(r, c, v.cast());
            }
        }
        m
    }

    pub fn from_ndarray(a: &ndarray::Array2<T>) -> Self {
        let (rows, cols) = a.dim();
        let m = Self::new(rows, cols);
        for ((r, c), &v) in a.indexed_iter() {
            m.put(r, c, v);
        }
        m
    }

    /// Reallocate with the default stride. See [`Matrix::resize_with_stride`].
    pub fn resize(&mut self, rows: usize, cols: usize, policy: ResizePolicy) {
        self.resize_with_stride(rows, cols, policy, MatrixStride::Default)
    }

    /// Reallocate to `rows x cols`. Views taken before the call keep the old
    /// storage and stop aliasing this matrix.
    pub fn resize_with_stride(
        &mut self,
        rows: usize,
        cols: usize,
        policy: ResizePolicy,
        stride: MatrixStride,
    ) {
        let pitch = stride.row_pitch::<T>(cols);
        let buf = NumericBuffer::filled(rows * pitch, T::zero());
        let next = MatrixView {
            buf,
            offset: 0,
            rows,
            cols,
            stride: pitch,
        };
        if policy == ResizePolicy::PreserveAndZeroPad {
            let old = &self.view;
            for r in 0..rows.min(old.rows) {
                for c in 0..cols.min(old.cols) {
                    next.put(r, c, old.at(r, c));
                }
            }
        }
        self.view = next;
    }

    /// Alias of the whole matrix.
    pub fn view(&self) -> MatrixView<T> {
        self.view.clone()
    }
}

impl<T: Real> Default for Matrix<T> {
    fn default() -> Self {
        Self {
            view: MatrixView {
                buf: NumericBuffer::from_vec(Vec::new()),
                offset: 0,
                rows: 0,
                cols: 0,
                stride: 0,
            },
        }
    }
}

impl<T: Real> Clone for Matrix<T> {
    fn clone(&self) -> Self {
        Self::from_mat(&self.view, Transpose::NoTrans)
    }
}

impl<T: Real> PartialEq for Matrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.view == other.view
    }
}

impl<T: Real> Deref for Matrix<T> {
    type Target = MatrixView<T>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

impl<T: Real> DerefMut for Matrix<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.view
    }
}
