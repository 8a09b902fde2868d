//! Reference-counted element storage shared by every view over it.
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Contiguous, shared, interior-mutable storage of `T`.
///
/// Cloning a buffer clones the handle, not the elements. Every view holds
/// one handle, so the storage lives until the last view is dropped. Writes
/// through any handle are visible through all others. Not `Send`: callers
/// must not share a buffer across threads.
pub struct NumericBuffer<T> {
    cells: Rc<Vec<Cell<T>>>,
}

impl<T: Copy> NumericBuffer<T> {
    /// Take ownership of `data` as the backing storage.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            cells: Rc::new(data.into_iter().map(Cell::new).collect()),
        }
    }

    pub fn filled(len: usize, value: T) -> Self {
        Self::from_vec(vec![value; len])
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> T {
        self.cells[index].get()
    }

    #[inline]
    pub fn set(&self, index: usize, value: T) {
        self.cells[index].set(value)
    }

    /// True when both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cells, &other.cells)
    }

    /// Number of live handles (views) on this storage.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.cells)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.cells.iter().map(Cell::get).collect()
    }
}

impl<T> Clone for NumericBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            cells: Rc::clone(&self.cells),
        }
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for NumericBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumericBuffer")
            .field("len", &self.len())
            .field("handles", &self.handle_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_storage() {
        let a = NumericBuffer::from_vec(vec![1.0f32, 2.0, 3.0]);
        let b = a.clone();
        b.set(1, 7.0);
        assert_eq!(a.get(1), 7.0);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.handle_count(), 2);
        drop(b);
        assert_eq!(a.handle_count(), 1);
    }
}
