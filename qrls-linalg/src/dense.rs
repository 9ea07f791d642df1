#![allow(clippy::needless_range_loop)]
//! Dense matrix operations backed by faer.
//!
//! Wraps faer's column-major `Mat<f64>` and keeps every layout conversion
//! explicit: callers hand in row-major or column-major flat buffers, the QR
//! kernels consume column-major flat buffers, and each crossing is a full
//! copy. No method here ever aliases or mutates a caller's buffer.

use faer::Mat;

/// A dense matrix wrapper around faer's `Mat<f64>`.
///
/// Storage is column-major. Element order of an input buffer is a property
/// of that buffer, declared by the constructor used (`from_row_major` vs
/// `from_col_major`), never inferred.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    inner: Mat<f64>,
}

impl DenseMatrix {
    /// Create a new dense matrix filled with zeros.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            inner: Mat::zeros(nrows, ncols),
        }
    }

    /// Create a dense matrix from a flat slice in row-major order.
    pub fn from_row_major(nrows: usize, ncols: usize, data: &[f64]) -> Self {
        assert_eq!(data.len(), nrows * ncols);
        let inner = Mat::from_fn(nrows, ncols, |i, j| data[i * ncols + j]);
        Self { inner }
    }

    /// Create a dense matrix from a flat slice in column-major order.
    pub fn from_col_major(nrows: usize, ncols: usize, data: &[f64]) -> Self {
        assert_eq!(data.len(), nrows * ncols);
        let inner = Mat::from_fn(nrows, ncols, |i, j| data[j * nrows + i]);
        Self { inner }
    }

    /// Create a column vector (n x 1) from a slice.
    pub fn from_vec(data: &[f64]) -> Self {
        let n = data.len();
        let inner = Mat::from_fn(n, 1, |i, _| data[i]);
        Self { inner }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    /// Get element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.inner.read(row, col)
    }

    /// Set element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.inner.write(row, col, value);
    }

    /// Extract column `j` as a `Vec<f64>`.
    pub fn col(&self, j: usize) -> Vec<f64> {
        let n = self.nrows();
        let mut v = Vec::with_capacity(n);
        for i in 0..n {
            v.push(self.inner.read(i, j));
        }
        v
    }

    /// Matrix-matrix product: self * other.
    pub fn mat_mul(&self, other: &DenseMatrix) -> DenseMatrix {
        assert_eq!(self.ncols(), other.nrows());
        let result = &self.inner * &other.inner;
        DenseMatrix { inner: result }
    }

    /// Element-wise subtraction: self - other.
    pub fn sub(&self, other: &DenseMatrix) -> DenseMatrix {
        assert_eq!(self.nrows(), other.nrows());
        assert_eq!(self.ncols(), other.ncols());
        let inner = Mat::from_fn(self.nrows(), self.ncols(), |i, j| {
            self.inner.read(i, j) - other.inner.read(i, j)
        });
        DenseMatrix { inner }
    }

    /// Transposed copy: an ncols x nrows matrix holding the same data with
    /// row and column roles swapped. Full copy, no aliasing; zero-sized
    /// dimensions produce a valid empty matrix.
    pub fn transpose(&self) -> DenseMatrix {
        let inner = Mat::from_fn(self.ncols(), self.nrows(), |i, j| self.inner.read(j, i));
        DenseMatrix { inner }
    }

    /// Flat copy of the data in column-major order.
    ///
    /// This is the buffer handed to the QR kernels; it is always a fresh
    /// allocation so the kernels can never touch the matrix itself.
    pub fn to_col_major(&self) -> Vec<f64> {
        let mut data = Vec::with_capacity(self.nrows() * self.ncols());
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                data.push(self.inner.read(i, j));
            }
        }
        data
    }

    /// Flat copy of the data in row-major order.
    pub fn to_row_major(&self) -> Vec<f64> {
        let mut data = Vec::with_capacity(self.nrows() * self.ncols());
        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                data.push(self.inner.read(i, j));
            }
        }
        data
    }
}

impl std::fmt::Display for DenseMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                if j > 0 {
                    write!(f, "\t")?;
                }
                write!(f, "{:.6}", self.inner.read(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
