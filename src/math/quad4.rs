//! Isoparametric geometry for the 4-node bilinear quadrilateral
//!
//! Reference square node order (counter-clockwise):
//! ```text
//!   4 (-1, 1) ---- 3 (1, 1)
//!       |              |
//!   1 (-1,-1) ---- 2 (1,-1)
//! ```
//! Shape functions: `N_i = (1 + xi*xi_i)(1 + eta*eta_i) / 4`.
//!
//! Everything here is a pure function of the reference point and the four
//! physical (x, y) node coordinates.

use super::DenseMatrix;
use crate::error::{FEMError, FEMResult};

/// 1/sqrt(3), the 2-point Gauss-Legendre abscissa
pub const GAUSS_POINT: f64 = 0.577_350_269_189_625_8;

/// 2x2 Gauss rule as (xi, eta, weight), ordered like the element nodes
pub const GAUSS_2X2: [(f64, f64, f64); 4] = [
    (-GAUSS_POINT, -GAUSS_POINT, 1.0),
    (GAUSS_POINT, -GAUSS_POINT, 1.0),
    (GAUSS_POINT, GAUSS_POINT, 1.0),
    (-GAUSS_POINT, GAUSS_POINT, 1.0),
];

/// Reference coordinates of the four corner nodes
pub const CORNERS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// Derivatives of the shape functions in reference coordinates (2x4)
///
/// Row 0 holds dN_i/dxi, row 1 holds dN_i/deta.
pub fn shape_derivatives(xi: f64, eta: f64) -> FEMResult<DenseMatrix> {
    let mut g = DenseMatrix::zeros(2, 4)?;
    for (i, &(xi_i, eta_i)) in CORNERS.iter().enumerate() {
        g[(0, i)] = xi_i * (1.0 + eta * eta_i);
        g[(1, i)] = eta_i * (1.0 + xi * xi_i);
    }
    Ok(g.scale(0.25))
}

/// Node coordinates stacked as a 4x2 matrix (rows = nodes, cols = x, y)
fn coordinate_matrix(x: &[f64; 4], y: &[f64; 4]) -> FEMResult<DenseMatrix> {
    let mut xy = DenseMatrix::zeros(4, 2)?;
    for i in 0..4 {
        xy[(i, 0)] = x[i];
        xy[(i, 1)] = y[i];
    }
    Ok(xy)
}

fn determinant(j: &DenseMatrix) -> f64 {
    j[(0, 0)] * j[(1, 1)] - j[(0, 1)] * j[(1, 0)]
}

/// Jacobian of the reference-to-physical mapping and its determinant
pub fn jacobian(xi: f64, eta: f64, x: &[f64; 4], y: &[f64; 4]) -> FEMResult<(DenseMatrix, f64)> {
    let g = shape_derivatives(xi, eta)?;
    let j = g.matmul(&coordinate_matrix(x, y)?)?;
    let det_j = determinant(&j);
    Ok((j, det_j))
}

/// Strain-displacement operator B (3x8) and det(J) at (xi, eta)
///
/// Rows of B are (eps_x, eps_y, gamma_xy); columns are (u1, v1, ..., u4, v4).
/// A non-positive det(J) is reported as [`FEMError::DegenerateGeometry`].
pub fn strain_displacement(
    xi: f64,
    eta: f64,
    x: &[f64; 4],
    y: &[f64; 4],
) -> FEMResult<(DenseMatrix, f64)> {
    let g = shape_derivatives(xi, eta)?;
    let j = g.matmul(&coordinate_matrix(x, y)?)?;
    let det_j = determinant(&j);

    if !(det_j > 0.0) {
        return Err(FEMError::DegenerateGeometry { det_j, xi, eta });
    }

    let mut adj = DenseMatrix::zeros(2, 2)?;
    adj[(0, 0)] = j[(1, 1)];
    adj[(0, 1)] = -j[(0, 1)];
    adj[(1, 0)] = -j[(1, 0)];
    adj[(1, 1)] = j[(0, 0)];

    // dN/dx, dN/dy = J^-1 * G
    let dn = adj.matmul(&g)?.scale(1.0 / det_j);

    let mut b = DenseMatrix::zeros(3, 8)?;
    for i in 0..4 {
        b[(0, 2 * i)] = dn[(0, i)];
        b[(1, 2 * i + 1)] = dn[(1, i)];
        b[(2, 2 * i)] = dn[(1, i)];
        b[(2, 2 * i + 1)] = dn[(0, i)];
    }

    Ok((b, det_j))
}

/// Check that det(J) is strictly positive at every reference corner
///
/// Positive corner determinants mean the quadrilateral is strictly convex and
/// numbered counter-clockwise; a node collapsed onto a neighbour fails here
/// even though det(J) stays positive at the interior Gauss points.
pub fn check_corners(x: &[f64; 4], y: &[f64; 4]) -> FEMResult<()> {
    for &(xi, eta) in CORNERS.iter() {
        let (_, det_j) = jacobian(xi, eta, x, y)?;
        if !(det_j > 0.0) {
            return Err(FEMError::DegenerateGeometry { det_j, xi, eta });
        }
    }
    Ok(())
}
