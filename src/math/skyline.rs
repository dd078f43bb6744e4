//! Skyline (variable band) storage for the global stiffness matrix
//!
//! Only the upper triangle is stored, column by column. Column `j` keeps the
//! entries from the diagonal up to its first structurally non-zero row, so
//! its height is `j - min_row(j)`. The same layout holds the L*D*L^T factors
//! after [`SkylineMatrix::factorize`]: `D` on the diagonal, `L^T` above it.
//!
//! Equation numbers are 1-based throughout (0 marks a restrained DOF in a
//! location matrix).

use log::{debug, warn};

use crate::error::{FEMError, FEMResult};

/// Pivots smaller than this fraction of the original diagonal are zero
const PIVOT_TOLERANCE: f64 = 1e-12;

/// What `values` currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    /// Assembled stiffness coefficients
    Matrix,
    /// Complete L*D*L^T factors
    Factors,
    /// Partial factors left by a failed factorization at this equation
    Failed(usize),
}

/// Symmetric matrix in skyline storage with in-place LDLT factorization
///
/// A failed [`factorize`](Self::factorize) leaves partial factors behind; the
/// matrix then rejects further assembly and factorization.
#[derive(Debug, Clone)]
pub struct SkylineMatrix {
    neq: usize,
    /// Column heights, indexed by 0-based column
    heights: Vec<usize>,
    /// Address of each diagonal entry in `values`, indexed by 0-based column
    diagonal: Vec<usize>,
    values: Vec<f64>,
    storage: Storage,
}

impl SkylineMatrix {
    /// Allocate zeroed storage for the profile spanned by a set of element
    /// location matrices
    pub fn from_location_matrices<'a, I>(neq: usize, location_matrices: I) -> FEMResult<Self>
    where
        I: IntoIterator<Item = &'a [usize]>,
    {
        let mut heights = vec![0usize; neq];

        for lm in location_matrices {
            if let Some(&too_big) = lm.iter().find(|&&eq| eq > neq) {
                return Err(FEMError::OutOfRangeIndex(format!(
                    "equation {} in location matrix exceeds {} equations",
                    too_big, neq
                )));
            }

            let Some(min_eq) = lm.iter().copied().filter(|&eq| eq != 0).min() else {
                continue;
            };

            for &eq in lm.iter().filter(|&&eq| eq != 0) {
                let height = eq - min_eq;
                if height > heights[eq - 1] {
                    heights[eq - 1] = height;
                }
            }
        }

        let mut diagonal = Vec::with_capacity(neq);
        let mut address = 0;
        for &h in &heights {
            diagonal.push(address);
            address += h + 1;
        }

        debug!(
            "Skyline profile: {} equations, {} stored entries, max half bandwidth {}",
            neq,
            address,
            heights.iter().copied().max().unwrap_or(0)
        );

        Ok(Self {
            neq,
            heights,
            diagonal,
            values: vec![0.0; address],
            storage: Storage::Matrix,
        })
    }

    /// Number of equations
    pub fn neq(&self) -> usize {
        self.neq
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the matrix has no equations
    pub fn is_empty(&self) -> bool {
        self.neq == 0
    }

    /// Column heights, 0-based column index
    pub fn column_heights(&self) -> &[usize] {
        &self.heights
    }

    /// Largest column height
    pub fn max_half_bandwidth(&self) -> usize {
        self.heights.iter().copied().max().unwrap_or(0)
    }

    /// Whether [`factorize`](Self::factorize) has run
    pub fn is_factorized(&self) -> bool {
        self.storage == Storage::Factors
    }

    /// Storage address of (row, col), 0-based with row <= col
    #[inline]
    fn address(&self, row: usize, col: usize) -> Option<usize> {
        let h = self.heights[col];
        if col - row > h {
            return None;
        }
        Some(self.diagonal[col] + (col - row))
    }

    /// First stored row of a column, 0-based
    #[inline]
    fn top(&self, col: usize) -> usize {
        col - self.heights[col]
    }

    /// Read entry (i, j) using 1-based equation numbers
    ///
    /// Entries outside the profile read as zero.
    pub fn get(&self, i: usize, j: usize) -> FEMResult<f64> {
        if i == 0 || j == 0 || i > self.neq || j > self.neq {
            return Err(FEMError::OutOfRangeIndex(format!(
                "entry ({}, {}) outside {} equations",
                i, j, self.neq
            )));
        }
        let (row, col) = if i <= j { (i - 1, j - 1) } else { (j - 1, i - 1) };
        Ok(self.address(row, col).map_or(0.0, |a| self.values[a]))
    }

    /// Add a packed element stiffness matrix at the equations of its
    /// location matrix
    ///
    /// `packed` holds the element's upper triangle column by column, each
    /// column from the diagonal upward. Restrained DOFs (code 0) are skipped.
    pub fn assemble(&mut self, packed: &[f64], lm: &[usize]) -> FEMResult<()> {
        if self.storage != Storage::Matrix {
            return Err(FEMError::InvalidInput(
                "cannot assemble into a factorized matrix".to_string(),
            ));
        }
        let nd = lm.len();
        if packed.len() != nd * (nd + 1) / 2 {
            return Err(FEMError::InvalidInput(format!(
                "packed element matrix has {} entries, expected {} for {} DOFs",
                packed.len(),
                nd * (nd + 1) / 2,
                nd
            )));
        }

        for j in 0..nd {
            let lj = lm[j];
            if lj == 0 {
                continue;
            }
            let diag_j = j * (j + 1) / 2;

            for i in 0..=j {
                let li = lm[i];
                if li == 0 {
                    continue;
                }
                let (row, col) = if li <= lj { (li - 1, lj - 1) } else { (lj - 1, li - 1) };
                let address = self.address(row, col).ok_or_else(|| {
                    FEMError::OutOfRangeIndex(format!(
                        "entry ({}, {}) lies outside the allocated skyline",
                        row + 1,
                        col + 1
                    ))
                })?;
                self.values[address] += packed[diag_j + (j - i)];
            }
        }

        Ok(())
    }

    /// Factorize in place as L * D * L^T by column reduction
    pub fn factorize(&mut self) -> FEMResult<()> {
        match self.storage {
            Storage::Factors => return Ok(()),
            Storage::Failed(eq) => return Err(FEMError::SingularMatrix(eq)),
            Storage::Matrix => {}
        }

        for j in 0..self.neq {
            let mj = self.top(j);

            // g_ij = k_ij - sum_r l_ri * g_rj
            for i in (mj + 1)..j {
                let start = self.top(i).max(mj);
                let mut sum = 0.0;
                for r in start..i {
                    sum += self.values[self.diagonal[i] + (i - r)]
                        * self.values[self.diagonal[j] + (j - r)];
                }
                self.values[self.diagonal[j] + (j - i)] -= sum;
            }

            // l_rj = g_rj / d_r, d_j = k_jj - sum_r l_rj * g_rj
            let k_jj = self.values[self.diagonal[j]];
            let mut d_j = k_jj;
            for r in mj..j {
                let a_rj = self.diagonal[j] + (j - r);
                let g = self.values[a_rj];
                let l = g / self.values[self.diagonal[r]];
                d_j -= l * g;
                self.values[a_rj] = l;
            }

            if d_j == 0.0 || d_j.abs() <= PIVOT_TOLERANCE * k_jj.abs() || !d_j.is_finite() {
                self.storage = Storage::Failed(j + 1);
                return Err(FEMError::SingularMatrix(j + 1));
            }
            if d_j < 0.0 {
                warn!("Negative pivot {:e} at equation {}", d_j, j + 1);
            }
            self.values[self.diagonal[j]] = d_j;
        }

        self.storage = Storage::Factors;
        Ok(())
    }

    /// Solve K * x = f in place using the factors from [`factorize`](Self::factorize)
    pub fn back_substitute(&self, force: &mut [f64]) -> FEMResult<()> {
        if self.storage != Storage::Factors {
            return Err(FEMError::InvalidInput(
                "back substitution requires a factorized matrix".to_string(),
            ));
        }
        if force.len() != self.neq {
            return Err(FEMError::OutOfRangeIndex(format!(
                "right-hand side has {} entries for {} equations",
                force.len(),
                self.neq
            )));
        }

        // Reduce: L * y = f
        for j in 0..self.neq {
            let mj = self.top(j);
            let mut sum = 0.0;
            for r in mj..j {
                sum += self.values[self.diagonal[j] + (j - r)] * force[r];
            }
            force[j] -= sum;
        }

        // D * z = y
        for j in 0..self.neq {
            force[j] /= self.values[self.diagonal[j]];
        }

        // Back substitute: L^T * x = z
        for j in (1..self.neq).rev() {
            let mj = self.top(j);
            let x_j = force[j];
            for r in mj..j {
                force[r] -= self.values[self.diagonal[j] + (j - r)] * x_j;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Mat;
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    /// Dense LU reference solve
    fn solve_dense(a: &Mat, b: &[f64]) -> DVector<f64> {
        a.clone()
            .lu()
            .solve(&DVector::from_column_slice(b))
            .expect("reference system is regular")
    }

    fn pack(k: &[[f64; 3]; 3]) -> Vec<f64> {
        vec![k[0][0], k[1][1], k[0][1], k[2][2], k[1][2], k[0][2]]
    }

    #[test]
    fn test_profile_from_location_matrices() {
        let lms: [&[usize]; 3] = [&[1, 2, 0], &[2, 4], &[3, 0, 5]];
        let k = SkylineMatrix::from_location_matrices(5, lms).unwrap();
        assert_eq!(k.column_heights(), &[0, 1, 0, 2, 2]);
        assert_eq!(k.len(), 1 + 2 + 1 + 3 + 3);
        assert_eq!(k.max_half_bandwidth(), 2);
    }

    #[test]
    fn test_equation_out_of_range() {
        let lms: [&[usize]; 1] = [&[1, 7]];
        assert!(matches!(
            SkylineMatrix::from_location_matrices(3, lms),
            Err(FEMError::OutOfRangeIndex(_))
        ));
    }

    #[test]
    fn test_assemble_skips_restrained() {
        // three springs in series, left end fixed
        let spring = [[1.0, -1.0, 0.0], [-1.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let lm_a: [usize; 3] = [0, 1, 0];
        let lm_b: [usize; 3] = [1, 2, 0];
        let lms: [&[usize]; 2] = [&lm_a, &lm_b];
        let mut k = SkylineMatrix::from_location_matrices(2, lms).unwrap();
        k.assemble(&pack(&spring), &lm_a).unwrap();
        k.assemble(&pack(&spring), &lm_b).unwrap();

        assert_eq!(k.get(1, 1).unwrap(), 2.0);
        assert_eq!(k.get(1, 2).unwrap(), -1.0);
        assert_eq!(k.get(2, 1).unwrap(), -1.0);
        assert_eq!(k.get(2, 2).unwrap(), 1.0);
        assert!(k.get(0, 1).is_err());
    }

    #[test]
    fn test_ldlt_matches_dense_solution() {
        #[rustfmt::skip]
        let dense = [
            [ 4.0, -1.0,  0.0,  0.5,  0.0],
            [-1.0,  5.0, -2.0,  0.0,  0.0],
            [ 0.0, -2.0,  6.0, -1.0,  0.3],
            [ 0.5,  0.0, -1.0,  4.0, -1.5],
            [ 0.0,  0.0,  0.3, -1.5,  3.0],
        ];
        let n = 5;

        // one "element" per upper-triangle column span
        let lm: Vec<usize> = (1..=n).collect();
        let lms: [&[usize]; 1] = [&lm];
        let mut k = SkylineMatrix::from_location_matrices(n, lms).unwrap();
        let mut packed = Vec::new();
        for j in 0..n {
            for i in (0..=j).rev() {
                packed.push(dense[i][j]);
            }
        }
        k.assemble(&packed, &lm).unwrap();
        k.factorize().unwrap();

        let rhs = [1.0, -2.0, 0.5, 3.0, -1.0];
        let mut x = rhs.to_vec();
        k.back_substitute(&mut x).unwrap();

        let a = Mat::from_fn(n, n, |i, j| dense[i][j]);
        let expected = solve_dense(&a, &rhs);
        for i in 0..n {
            assert_relative_eq!(x[i], expected[i], epsilon = 1e-12);
        }

        // factors are reused across right-hand sides
        let mut y = vec![0.0, 0.0, 1.0, 0.0, 0.0];
        k.back_substitute(&mut y).unwrap();
        let expected = solve_dense(&a, &[0.0, 0.0, 1.0, 0.0, 0.0]);
        for i in 0..n {
            assert_relative_eq!(y[i], expected[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_singular_matrix_detected() {
        // free-free spring: rigid body mode
        let spring = [[1.0, -1.0, 0.0], [-1.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let lm: [usize; 3] = [1, 2, 0];
        let lms: [&[usize]; 1] = [&lm];
        let mut k = SkylineMatrix::from_location_matrices(2, lms).unwrap();
        k.assemble(&pack(&spring), &lm).unwrap();
        assert!(matches!(k.factorize(), Err(FEMError::SingularMatrix(2))));
        assert!(!k.is_factorized());

        // partial factors are not reused
        assert!(matches!(k.factorize(), Err(FEMError::SingularMatrix(2))));
        assert!(k.assemble(&pack(&spring), &lm).is_err());
        let mut f = vec![1.0, 0.0];
        assert!(k.back_substitute(&mut f).is_err());
    }

    #[test]
    fn test_no_assembly_after_factorization() {
        let spring = [[1.0, -1.0, 0.0], [-1.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let lm: [usize; 3] = [0, 1, 0];
        let lms: [&[usize]; 1] = [&lm];
        let mut k = SkylineMatrix::from_location_matrices(1, lms).unwrap();
        k.assemble(&pack(&spring), &lm).unwrap();
        k.factorize().unwrap();
        assert!(k.is_factorized());
        assert!(k.assemble(&pack(&spring), &lm).is_err());
        // factorizing again is a no-op
        k.factorize().unwrap();
        assert_eq!(k.get(1, 1).unwrap(), 1.0);
    }

    #[test]
    fn test_back_substitute_requires_factors() {
        let lm: [usize; 1] = [1];
        let lms: [&[usize]; 1] = [&lm];
        let k = SkylineMatrix::from_location_matrices(1, lms).unwrap();
        let mut f = vec![1.0];
        assert!(k.back_substitute(&mut f).is_err());
    }
}
