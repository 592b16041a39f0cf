//! A flattened, column-major view over a dense N-D buffer.
//!
//! Linearization is derived from first principles:
//! `offset = i0 + shape[0]*i1 + shape[0]*shape[1]*i2 + ...`.

use super::geometry::column_major_strides;

/// A `(buffer, shape)` pair with column-major element access, used for
/// matrix-shaped properties (color, covariance) after a full dataset read.
#[derive(Clone, Debug, PartialEq)]
pub struct Flattened<T> {
    buffer: Vec<T>,
    shape: Vec<u64>,
    strides: Vec<u64>,
}

impl<T: Copy> Flattened<T> {
    /// Wrap `buffer` (column-major, per `shape`) as a flattened view.
    ///
    /// # Panics
    /// Panics if `buffer.len()` does not equal the product of `shape`.
    #[must_use]
    pub fn new(buffer: Vec<T>, shape: Vec<u64>) -> Self {
        let expected: u64 = shape.iter().product();
        assert_eq!(
            buffer.len() as u64,
            expected,
            "flattened buffer length does not match shape {shape:?}"
        );
        let strides = column_major_strides(&shape);
        Self {
            buffer,
            shape,
            strides,
        }
    }

    /// The shape this view was constructed with.
    #[must_use]
    pub fn size(&self) -> &[u64] {
        &self.shape
    }

    /// The element at column-major indices `indices`.
    ///
    /// # Panics
    /// Panics if `indices` has the wrong rank or is out of bounds.
    #[must_use]
    pub fn at(&self, indices: &[u64]) -> T {
        assert_eq!(indices.len(), self.shape.len());
        let mut offset = 0u64;
        for (i, (&idx, &stride)) in indices.iter().zip(&self.strides).enumerate() {
            assert!(idx < self.shape[i], "index {idx} out of bounds for axis {i}");
            offset += idx * stride;
        }
        self.buffer[offset as usize]
    }

    /// For a 2-D view of shape `[R, N]`, the column at fixed second index
    /// `j`: `[at([0,j]), at([1,j]), ..., at([R-1,j])]`.
    ///
    /// # Panics
    /// Panics if this view is not rank 2.
    #[must_use]
    pub fn row(&self, j: u64) -> Vec<T> {
        assert_eq!(self.shape.len(), 2, "row() is only defined for rank-2 views");
        (0..self.shape[0]).map(|i| self.at(&[i, j])).collect()
    }

    /// Consume the view, returning the underlying buffer.
    #[must_use]
    pub fn into_buffer(self) -> Vec<T> {
        self.buffer
    }

    #[must_use]
    pub fn buffer(&self) -> &[T] {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_major_indexing_matches_first_principles() {
        // shape [2,3]: column-major offset = i0 + 2*i1
        let buf: Vec<f64> = (0..6).map(f64::from).collect();
        let flat = Flattened::new(buf, vec![2, 3]);
        assert_eq!(flat.at(&[0, 0]), 0.0);
        assert_eq!(flat.at(&[1, 0]), 1.0);
        assert_eq!(flat.at(&[0, 1]), 2.0);
        assert_eq!(flat.at(&[1, 2]), 5.0);
    }

    #[test]
    fn row_reads_a_fixed_second_index_column() {
        let buf: Vec<f64> = (0..8).map(f64::from).collect();
        let flat = Flattened::new(buf, vec![4, 2]);
        assert_eq!(flat.row(0), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(flat.row(1), vec![4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn three_d_indexing_matches_first_principles() {
        // shape [2,2,2]: offset = i0 + 2*i1 + 4*i2
        let buf: Vec<i32> = (0..8).collect();
        let flat = Flattened::new(buf, vec![2, 2, 2]);
        assert_eq!(flat.at(&[1, 1, 1]), 7);
        assert_eq!(flat.at(&[1, 0, 1]), 5);
    }
}
