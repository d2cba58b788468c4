use std::ops::{Index, IndexMut, Range};

use crate::error::SolveError;

/// Dense row-major matrix of `f64`.
///
/// Sized for tableaus with tens of rows and columns; every operation
/// allocates a fresh result except the in-place row updates.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[i][i] = 1.0;
        }
        m
    }

    /// Builds a matrix from row vectors, each of which must have `cols` entries.
    pub fn from_rows(cols: usize, rows: &[Vec<f64>]) -> Result<Self, SolveError> {
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(SolveError::dimension(format!("matrix row {}", i), cols, row.len()));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn row_vector(values: &[f64]) -> Self {
        Self {
            rows: 1,
            cols: values.len(),
            data: values.to_vec(),
        }
    }

    pub fn column_vector(values: &[f64]) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        self.column_range(j, 0..self.rows)
    }

    /// Column `j` restricted to the given row range.
    pub fn column_range(&self, j: usize, rows: Range<usize>) -> Vec<f64> {
        rows.map(|i| self[i][j]).collect()
    }

    pub fn scale_row(&mut self, i: usize, factor: f64) {
        for v in &mut self[i] {
            *v *= factor;
        }
    }

    pub fn negate_row(&mut self, i: usize) {
        self.scale_row(i, -1.0);
    }

    /// `row[dst] += factor * row[src]`
    pub fn add_scaled_row(&mut self, dst: usize, src: usize, factor: f64) {
        debug_assert_ne!(dst, src);
        for j in 0..self.cols {
            let delta = factor * self[src][j];
            self[dst][j] += delta;
        }
    }

    /// Concatenates `other` to the right of `self`.
    pub fn hstack(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.rows, other.rows);
        let cols = self.cols + other.cols;
        let mut data = Vec::with_capacity(self.rows * cols);
        for i in 0..self.rows {
            data.extend_from_slice(&self[i]);
            data.extend_from_slice(&other[i]);
        }
        Matrix {
            rows: self.rows,
            cols,
            data,
        }
    }

    /// Concatenates `other` below `self`.
    pub fn vstack(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.cols, other.cols);
        let mut data = self.data.clone();
        data.extend_from_slice(&other.data);
        Matrix {
            rows: self.rows + other.rows,
            cols: self.cols,
            data,
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t[j][i] = self[i][j];
            }
        }
        t
    }

    /// Rows in `rows`, columns in the order given by `cols`.
    pub fn submatrix(&self, rows: Range<usize>, cols: &[usize]) -> Matrix {
        let mut sub = Matrix::zeros(rows.len(), cols.len());
        for (si, i) in rows.enumerate() {
            for (sj, &j) in cols.iter().enumerate() {
                sub[si][sj] = self[i][j];
            }
        }
        sub
    }

    pub fn select_columns(&self, cols: &[usize]) -> Matrix {
        self.submatrix(0..self.rows, cols)
    }

    /// Drops the listed columns, keeping the remaining ones in order.
    pub fn remove_columns(&self, removed: &[usize]) -> Matrix {
        let kept: Vec<usize> = (0..self.cols).filter(|j| !removed.contains(j)).collect();
        self.select_columns(&kept)
    }

    pub fn remove_row(&mut self, i: usize) {
        let start = i * self.cols;
        self.data.drain(start..start + self.cols);
        self.rows -= 1;
    }

    /// `self * x`
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(self.cols, x.len());
        (0..self.rows).map(|i| dot(&self[i], x)).collect()
    }

    /// `y^T * self`
    pub fn vec_mul(&self, y: &[f64]) -> Vec<f64> {
        debug_assert_eq!(self.rows, y.len());
        let mut out = vec![0.0; self.cols];
        for (i, &yi) in y.iter().enumerate() {
            if yi == 0.0 {
                continue;
            }
            for (o, &a) in out.iter_mut().zip(&self[i]) {
                *o += yi * a;
            }
        }
        out
    }

    pub fn matmul(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.cols, other.rows);
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            let row = other.vec_mul(&self[i]);
            out[i].copy_from_slice(&row);
        }
        out
    }

    /// Gauss-Jordan inverse with partial pivoting.
    ///
    /// Returns `None` when the matrix is not square or a pivot smaller than
    /// `tolerance` is met.
    pub fn inverse(&self, tolerance: f64) -> Option<Matrix> {
        if self.rows != self.cols {
            return None;
        }
        let n = self.rows;
        let mut work = self.hstack(&Matrix::identity(n));

        for col in 0..n {
            let pivot_row = (col..n).max_by(|&a, &b| {
                work[a][col]
                    .abs()
                    .partial_cmp(&work[b][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;
            if work[pivot_row][col].abs() <= tolerance {
                return None;
            }
            work.swap_rows(col, pivot_row);
            let pivot = work[col][col];
            work.scale_row(col, 1.0 / pivot);
            for i in 0..n {
                if i != col {
                    let factor = work[i][col];
                    if factor != 0.0 {
                        work.add_scaled_row(i, col, -factor);
                    }
                }
            }
        }

        let right: Vec<usize> = (n..2 * n).collect();
        Some(work.select_columns(&right))
    }

    /// Elementary pivot matrix for a basis change on `pivot` row.
    ///
    /// `column` is the updated entering column `B_inv * a_q`. The result is the
    /// identity with column `pivot` replaced by `-column[i] / column[pivot]`
    /// (and `1 / column[pivot]` on the diagonal), so `E * B_inv` is the inverse
    /// of the new basis. Returns `None` on a pivot smaller than `tolerance`.
    pub fn eta(column: &[f64], pivot: usize, tolerance: f64) -> Option<Matrix> {
        let alpha = column[pivot];
        if alpha.abs() <= tolerance {
            return None;
        }
        let mut e = Matrix::identity(column.len());
        for (i, &v) in column.iter().enumerate() {
            e[i][pivot] = if i == pivot { 1.0 / alpha } else { -v / alpha };
        }
        Some(e)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.cols {
            self.data.swap(a * self.cols + j, b * self.cols + j);
        }
    }
}

impl Index<usize> for Matrix {
    type Output = [f64];

    fn index(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }
}

impl IndexMut<usize> for Matrix {
    fn index_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
