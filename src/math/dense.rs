//! Dense matrix value type used for every element-level quantity
//!
//! Wraps a `nalgebra` dynamic matrix with shape-checked arithmetic: combining
//! two matrices of incompatible dimensions is reported as
//! [`FEMError::ShapeMismatch`] instead of panicking inside nalgebra, and
//! cell access outside the grid is either a [`FEMError::OutOfRangeIndex`]
//! (`get`/`set`) or a panic (`Index`/`IndexMut`).

use std::ops::{Index, IndexMut, Mul};

use serde::{Deserialize, Serialize};

use super::Mat;
use crate::error::{FEMError, FEMResult};

/// A rows x cols grid of `f64` values with value semantics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    data: Mat,
}

impl DenseMatrix {
    /// Create a zero-filled matrix
    pub fn zeros(rows: usize, cols: usize) -> FEMResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(FEMError::EmptyMatrix { rows, cols });
        }
        Ok(Self {
            data: Mat::zeros(rows, cols),
        })
    }

    /// Create a matrix from values given row by row
    pub fn from_row_slice(rows: usize, cols: usize, values: &[f64]) -> FEMResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(FEMError::EmptyMatrix { rows, cols });
        }
        if values.len() != rows * cols {
            return Err(FEMError::InvalidInput(format!(
                "{} values supplied for a {}x{} matrix",
                values.len(),
                rows,
                cols
            )));
        }
        Ok(Self {
            data: Mat::from_row_slice(rows, cols, values),
        })
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// Read a cell, reporting out-of-range access as an error
    pub fn get(&self, row: usize, col: usize) -> FEMResult<f64> {
        self.check_cell(row, col)?;
        Ok(self.data[(row, col)])
    }

    /// Write a cell, reporting out-of-range access as an error
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> FEMResult<()> {
        self.check_cell(row, col)?;
        self.data[(row, col)] = value;
        Ok(())
    }

    fn check_cell(&self, row: usize, col: usize) -> FEMResult<()> {
        let (rows, cols) = self.shape();
        if row >= rows || col >= cols {
            return Err(FEMError::OutOfRangeIndex(format!(
                "cell ({}, {}) outside {}x{} matrix",
                row, col, rows, cols
            )));
        }
        Ok(())
    }

    /// Return the transpose as a new matrix
    pub fn transpose(&self) -> Self {
        Self {
            data: self.data.transpose(),
        }
    }

    /// Elementwise sum; both operands must have identical shapes
    pub fn add(&self, other: &DenseMatrix) -> FEMResult<Self> {
        if self.shape() != other.shape() {
            return Err(FEMError::ShapeMismatch {
                op: "add",
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(Self {
            data: &self.data + &other.data,
        })
    }

    /// Matrix product; requires `self.ncols() == other.nrows()`
    pub fn matmul(&self, other: &DenseMatrix) -> FEMResult<Self> {
        if self.ncols() != other.nrows() {
            return Err(FEMError::ShapeMismatch {
                op: "multiply",
                left: self.shape(),
                right: other.shape(),
            });
        }

        Ok(Self {
            data: &self.data * &other.data,
        })
    }

    /// Multiply every entry by `k`
    pub fn scale(&self, k: f64) -> Self {
        Self {
            data: &self.data * k,
        }
    }

    /// Pack the upper triangle of a square matrix column by column, each
    /// column running from the diagonal upward.
    ///
    /// Entry (i, j) with i <= j lands at `j * (j + 1) / 2 + (j - i)`, which is
    /// the element layout the skyline assembler consumes.
    pub fn symmetric_packed(&self) -> FEMResult<Vec<f64>> {
        let (rows, cols) = self.shape();
        if rows != cols {
            return Err(FEMError::ShapeMismatch {
                op: "symmetric pack",
                left: (rows, cols),
                right: (cols, rows),
            });
        }

        let mut packed = Vec::with_capacity(rows * (rows + 1) / 2);
        for j in 0..cols {
            for i in (0..=j).rev() {
                packed.push(self.data[(i, j)]);
            }
        }
        Ok(packed)
    }

    /// Borrow the underlying nalgebra matrix
    pub fn as_matrix(&self) -> &Mat {
        &self.data
    }
}

impl From<Mat> for DenseMatrix {
    fn from(data: Mat) -> Self {
        Self { data }
    }
}

impl Index<(usize, usize)> for DenseMatrix {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[index]
    }
}

impl IndexMut<(usize, usize)> for DenseMatrix {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.data[index]
    }
}

impl Mul<f64> for &DenseMatrix {
    type Output = DenseMatrix;

    fn mul(self, k: f64) -> DenseMatrix {
        self.scale(k)
    }
}

impl Mul<&DenseMatrix> for f64 {
    type Output = DenseMatrix;

    fn mul(self, m: &DenseMatrix) -> DenseMatrix {
        m.scale(self)
    }
}
