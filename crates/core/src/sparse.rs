//! Compressed-column sparse matrices.
//!
//! Matrices are assembled by pushing `(row, col, value)` triplets into a
//! [`TripletBuilder`] with a fixed capacity bound, then finalized into a
//! [`CscMatrix`]. The bound is part of the contract: a push beyond it fails
//! instead of growing, because the caller sized it with a separate pass and
//! overflow means that pass was wrong.

use thiserror::Error;

/// Errors raised while assembling a sparse matrix.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SparseError {
    #[error("entry ({row}, {col}) is outside a {dim}x{dim} matrix")]
    OutOfRange { row: usize, col: usize, dim: usize },

    #[error("more than {bound} nonzero entries")]
    Overflow { bound: usize },
}

/// Square sparse matrix in compressed-column form.
///
/// Column `j` occupies `row_indices[col_ptr[j]..col_ptr[j + 1]]` with rows in
/// ascending order.
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix {
    dim: usize,
    col_ptr: Vec<usize>,
    row_indices: Vec<usize>,
    values: Vec<f64>,
}

impl CscMatrix {
    /// An all-zero matrix.
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            col_ptr: vec![0; dim + 1],
            row_indices: Vec::new(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[must_use]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn col_ptr(&self) -> &[usize] {
        &self.col_ptr
    }

    #[must_use]
    pub fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterates over the `(row, value)` entries of column `col`.
    ///
    /// # Panics
    ///
    /// Panics if `col >= dim`.
    pub fn column(&self, col: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.col_ptr[col]..self.col_ptr[col + 1];
        self.row_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Returns entry `(row, col)`, or zero if it is not stored.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row >= self.dim || col >= self.dim {
            return 0.0;
        }
        let range = self.col_ptr[col]..self.col_ptr[col + 1];
        match self.row_indices[range.clone()].binary_search(&row) {
            Ok(offset) => self.values[range.start + offset],
            Err(_) => 0.0,
        }
    }

    /// Computes `A · x`.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() != dim`.
    #[must_use]
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(x.len(), self.dim, "vector length must match matrix");
        let mut y = vec![0.0; self.dim];
        for (col, &xj) in x.iter().enumerate() {
            if xj == 0.0 {
                continue;
            }
            for (row, value) in self.column(col) {
                y[row] += value * xj;
            }
        }
        y
    }

    /// Expands to a dense row-major buffer of length `dim * dim`.
    #[must_use]
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim * self.dim];
        for col in 0..self.dim {
            for (row, value) in self.column(col) {
                dense[row * self.dim + col] = value;
            }
        }
        dense
    }
}

/// Accumulates triplets up to a fixed bound, then builds a [`CscMatrix`].
#[derive(Debug, Clone)]
pub struct TripletBuilder {
    dim: usize,
    bound: usize,
    triplets: Vec<(usize, usize, f64)>,
}

impl TripletBuilder {
    /// Creates a builder for a `dim`×`dim` matrix holding at most `bound`
    /// entries.
    #[must_use]
    pub fn with_bound(dim: usize, bound: usize) -> Self {
        Self {
            dim,
            bound,
            triplets: Vec::with_capacity(bound),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triplets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triplets.is_empty()
    }

    #[must_use]
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Records one entry.
    ///
    /// # Errors
    ///
    /// Returns [`SparseError::OutOfRange`] for indices outside the matrix and
    /// [`SparseError::Overflow`] once the bound is reached.
    pub fn push(&mut self, row: usize, col: usize, value: f64) -> Result<(), SparseError> {
        if row >= self.dim || col >= self.dim {
            return Err(SparseError::OutOfRange {
                row,
                col,
                dim: self.dim,
            });
        }
        if self.triplets.len() == self.bound {
            return Err(SparseError::Overflow { bound: self.bound });
        }
        self.triplets.push((row, col, value));
        Ok(())
    }

    /// Sorts by column then row, sums duplicates, and builds the matrix.
    #[must_use]
    pub fn finalize(mut self) -> CscMatrix {
        self.triplets.sort_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));

        let mut col_ptr = vec![0; self.dim + 1];
        let mut row_indices: Vec<usize> = Vec::with_capacity(self.triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(self.triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, value) in self.triplets {
            if last == Some((row, col)) {
                if let Some(v) = values.last_mut() {
                    *v += value;
                }
                continue;
            }
            row_indices.push(row);
            values.push(value);
            col_ptr[col + 1] += 1;
            last = Some((row, col));
        }
        for col in 0..self.dim {
            col_ptr[col + 1] += col_ptr[col];
        }

        CscMatrix {
            dim: self.dim,
            col_ptr,
            row_indices,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_orders_and_sums_duplicates() {
        let mut builder = TripletBuilder::with_bound(3, 5);
        builder.push(2, 0, 1.0).unwrap();
        builder.push(0, 0, -1.0).unwrap();
        builder.push(2, 0, 0.5).unwrap();
        builder.push(1, 2, 4.0).unwrap();

        let m = builder.finalize();
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.col_ptr(), &[0, 2, 2, 3]);
        assert_eq!(m.row_indices(), &[0, 2, 1]);
        assert_eq!(m.get(2, 0), 1.5);
        assert_eq!(m.get(1, 1), 0.0);
    }

    #[test]
    fn push_beyond_bound_overflows() {
        let mut builder = TripletBuilder::with_bound(2, 1);
        builder.push(0, 0, 1.0).unwrap();
        assert_eq!(
            builder.push(1, 1, 1.0),
            Err(SparseError::Overflow { bound: 1 })
        );
    }

    #[test]
    fn push_out_of_range_is_rejected() {
        let mut builder = TripletBuilder::with_bound(2, 4);
        assert_eq!(
            builder.push(2, 0, 1.0),
            Err(SparseError::OutOfRange {
                row: 2,
                col: 0,
                dim: 2
            })
        );
    }

    #[test]
    fn mul_vec_and_dense_agree() {
        let mut builder = TripletBuilder::with_bound(2, 3);
        builder.push(0, 0, -0.1).unwrap();
        builder.push(1, 0, 0.1).unwrap();
        builder.push(1, 1, -0.5).unwrap();
        let m = builder.finalize();

        assert_eq!(m.mul_vec(&[10.0, 2.0]), vec![-1.0, 0.0]);
        assert_eq!(m.to_dense(), vec![-0.1, 0.0, 0.1, -0.5]);
    }
}
