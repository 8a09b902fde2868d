use std::ops::{Deref, DerefMut};

use num_traits::{One, Zero};

use crate::error::{MatrixError, Result};
use crate::math::buffer::NumericBuffer;
use crate::math::matrix::{fits_within, MatrixView, Transpose};
use crate::math::real::Real;
use crate::math::resize::ResizePolicy;

/// A 1-D view over a shared [`NumericBuffer`].
///
/// Element `i` lives at `offset + i * stride` in the buffer. Cloning a view
/// produces another alias of the same elements.
#[derive(Clone, Debug)]
pub struct VectorView<T: Real> {
    buf: NumericBuffer<T>,
    offset: usize,
    dim: usize,
    stride: usize,
}

impl<T: Real> VectorView<T> {
    /// View `dim` elements of `buf`, `stride` apart, starting at `offset`.
    pub fn from_buffer(
        buf: NumericBuffer<T>,
        offset: usize,
        dim: usize,
        stride: usize,
    ) -> Result<Self> {
        if dim > 0 {
            let extent = (dim - 1).checked_mul(stride).and_then(|e| e.checked_add(1));
            let fits = extent
                .and_then(|e| e.checked_add(offset))
                .map_or(false, |end| end <= buf.len());
            if stride == 0 || !fits {
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
            dim,
            stride: stride.max(1),
        })
    }

    pub(crate) fn dense(buf: NumericBuffer<T>) -> Self {
        let dim = buf.len();
        Self {
            buf,
            offset: 0,
            dim,
            stride: 1,
        }
    }

    pub(crate) fn strided_unchecked(
        buf: NumericBuffer<T>,
        offset: usize,
        dim: usize,
        stride: usize,
    ) -> Self {
        Self {
            buf,
            offset,
            dim,
            stride,
        }
    }

    /// Number of elements.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.dim == 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn buffer(&self) -> &NumericBuffer<T> {
        &self.buf
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == 1 || self.dim <= 1
    }

    #[inline]
    pub(crate) fn at(&self, i: usize) -> T {
        self.buf.get(self.offset + i * self.stride)
    }

    #[inline]
    pub(crate) fn put(&self, i: usize, value: T) {
        self.buf.set(self.offset + i * self.stride, value)
    }

    fn check_index(&self, i: usize) -> Result<()> {
        if i >= self.dim {
            return Err(MatrixError::IndexOutOfBounds {
                index: i,
                dim: self.dim,
            });
        }
        Ok(())
    }

    fn check_dim(&self, op: &'static str, other: usize) -> Result<()> {
        if self.dim != other {
            return Err(MatrixError::DimMismatch {
                op,
                left: self.dim,
                right: other,
            });
        }
        Ok(())
    }

    pub fn get(&self, i: usize) -> Result<T> {
        self.check_index(i)?;
        Ok(self.at(i))
    }

    pub fn set(&mut self, i: usize, value: T) -> Result<()> {
        self.check_index(i)?;
        self.put(i, value);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.dim).map(move |i| self.at(i))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn set_zero(&mut self) {
        for i in 0..self.dim {
            self.put(i, T::zero());
        }
    }

    /// Zero-copy view of `len` elements starting at `offset`.
    pub fn range(&self, offset: usize, len: usize) -> Result<VectorView<T>> {
        if !fits_within(offset, len, self.dim) {
            return Err(MatrixError::RangeOutOfBounds {
                offset,
                len,
                dim: self.dim,
            });
        }
        Ok(Self::strided_unchecked(
            self.buf.clone(),
            self.offset + offset * self.stride,
            len,
            self.stride,
        ))
    }

    /// Same as [`VectorView::range`].
    pub fn sub_vector(&self, origin: usize, len: usize) -> Result<VectorView<T>> {
        self.range(origin, len)
    }

    /// Element-wise copy; the source may have the other precision.
    pub fn copy_from_vec<U: Real>(&mut self, other: &VectorView<U>) -> Result<()> {
        self.check_dim("CopyFromVec", other.dim())?;
        let values = other.to_vec();
        for (i, v) in values.into_iter().enumerate() {
            self.put(i, v.cast());
        }
        Ok(())
    }

    pub fn copy_from_slice(&mut self, values: &[T]) -> Result<()> {
        self.check_dim("CopyFromSlice", values.len())?;
        for (i, &v) in values.iter().enumerate() {
            self.put(i, v);
        }
        Ok(())
    }

    /// `self += alpha * other`; the source may have the other precision.
    pub fn add_vec<U: Real>(&mut self, alpha: T, other: &VectorView<U>) -> Result<()> {
        self.check_dim("AddVec", other.dim())?;
        let values = other.to_vec();
        for (i, v) in values.into_iter().enumerate() {
            self.put(i, self.at(i) + alpha * v.cast::<T>());
        }
        Ok(())
    }

    /// `self = beta * self + alpha * op(m) * v`, where `op` optionally transposes.
    ///
    /// With `beta == 0` the previous contents are ignored, NaN included.
    pub fn add_mat_vec(
        &mut self,
        alpha: T,
        m: &MatrixView<T>,
        trans: Transpose,
        v: &VectorView<T>,
        beta: T,
    ) -> Result<()> {
        let (rows, cols) = match trans {
            Transpose::NoTrans => (m.num_rows(), m.num_cols()),
            Transpose::Trans => (m.num_cols(), m.num_rows()),
        };
        if rows != self.dim || cols != v.dim() {
            return Err(MatrixError::ShapeMismatch {
                op: "AddMatVec",
                rows,
                cols,
                other_rows: self.dim,
                other_cols: v.dim(),
            });
        }

        let x = v.to_vec();
        let product: Vec<T> = (0..rows)
            .map(|i| {
                x.iter().enumerate().fold(T::zero(), |acc, (j, &xj)| {
                    let mij = match trans {
                        Transpose::NoTrans => m.at(i, j),
                        Transpose::Trans => m.at(j, i),
                    };
                    acc + mij * xj
                })
            })
            .collect();

        self.accumulate(alpha, product, beta);
        Ok(())
    }

    /// `self = beta * self + alpha * (v ⊙ r)`.
    pub fn add_vec_vec(
        &mut self,
        alpha: T,
        v: &VectorView<T>,
        r: &VectorView<T>,
        beta: T,
    ) -> Result<()> {
        self.check_dim("AddVecVec", v.dim())?;
        self.check_dim("AddVecVec", r.dim())?;
        let product: Vec<T> = v.iter().zip(r.iter()).map(|(a, b)| a * b).collect();
        self.accumulate(alpha, product, beta);
        Ok(())
    }

    fn accumulate(&mut self, alpha: T, values: Vec<T>, beta: T) {
        for (i, value) in values.into_iter().enumerate() {
            let scaled = alpha * value;
            if beta.is_zero() {
                self.put(i, scaled);
            } else if beta.is_one() {
                self.put(i, self.at(i) + scaled);
            } else {
                self.put(i, beta * self.at(i) + scaled);
            }
        }
    }

    pub fn scale(&mut self, alpha: T) {
        for i in 0..self.dim {
            self.put(i, self.at(i) * alpha);
        }
    }

    /// Add a constant to every element.
    pub fn add(&mut self, c: T) {
        for i in 0..self.dim {
            self.put(i, self.at(i) + c);
        }
    }

    pub fn sum(&self) -> T {
        self.iter().fold(T::zero(), |acc, v| acc + v)
    }

    /// Smallest element; `+inf` for an empty vector.
    pub fn min(&self) -> T {
        self.iter()
            .fold(T::infinity(), |acc, v| if v < acc { v } else { acc })
    }

    /// Largest element; `-inf` for an empty vector.
    pub fn max(&self) -> T {
        self.iter()
            .fold(T::neg_infinity(), |acc, v| if v > acc { v } else { acc })
    }

    /// Smallest element and its index. Fails on an empty vector.
    pub fn min_index(&self) -> Result<(T, usize)> {
        if self.dim == 0 {
            return Err(MatrixError::Empty { op: "Min(&index)" });
        }
        let mut best = (self.at(0), 0);
        for i in 1..self.dim {
            let v = self.at(i);
            if v < best.0 {
                best = (v, i);
            }
        }
        Ok(best)
    }

    pub fn to_ndarray(&self) -> ndarray::Array1<T> {
        ndarray::Array1::from_vec(self.to_vec())
    }
}

impl<T: Real> PartialEq for VectorView<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dim == other.dim && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

/// Dot product of two vectors of equal dimension.
pub fn vec_vec<T: Real, U: Real>(v1: &VectorView<T>, v2: &VectorView<U>) -> Result<T> {
    v1.check_dim("VecVec", v2.dim())?;
    Ok(v1
        .iter()
        .zip(v2.iter())
        .fold(T::zero(), |acc, (a, b)| acc + a * b.cast::<T>()))
}

/// A vector that owns its storage and can be resized.
#[derive(Debug)]
pub struct Vector<T: Real> {
    view: VectorView<T>,
}

impl<T: Real> Vector<T> {
    /// Zero-filled vector of `dim` elements.
    pub fn new(dim: usize) -> Self {
        Self::with_policy(dim, ResizePolicy::ZeroFill)
    }

    pub fn with_policy(dim: usize, policy: ResizePolicy) -> Self {
        let mut v = Self::default();
        v.resize(dim, policy);
        v
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            view: VectorView::dense(NumericBuffer::from_vec(data)),
        }
    }

    /// Copy of `src`, cast to this precision.
    pub fn from_view<U: Real>(src: &VectorView<U>) -> Self {
        Self::from_vec(src.iter().map(|v| v.cast()).collect())
    }

    pub fn from_ndarray(a: &ndarray::Array1<T>) -> Self {
        Self::from_vec(a.iter().copied().collect())
    }

    /// Reallocate to `dim` elements. Views taken before the call keep the
    /// old storage and stop aliasing this vector.
    pub fn resize(&mut self, dim: usize, policy: ResizePolicy) {
        let buf = NumericBuffer::filled(dim, T::zero());
        if policy == ResizePolicy::PreserveAndZeroPad {
            for i in 0..dim.min(self.view.dim) {
                buf.set(i, self.view.at(i));
            }
        }
        self.view = VectorView::dense(buf);
    }

    /// Alias of the whole vector.
    pub fn view(&self) -> VectorView<T> {
        self.view.clone()
    }
}

impl<T: Real> Default for Vector<T> {
    fn default() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl<T: Real> Clone for Vector<T> {
    fn clone(&self) -> Self {
        Self::from_vec(self.view.to_vec())
    }
}

impl<T: Real> PartialEq for Vector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.view == other.view
    }
}

impl<T: Real> From<Vec<T>> for Vector<T> {
    fn from(value: Vec<T>) -> Self {
        Vector::from_vec(value)
    }
}

impl<T: Real> Deref for Vector<T> {
    type Target = VectorView<T>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

impl<T: Real> DerefMut for Vector<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.view
    }
}
