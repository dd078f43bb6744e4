//! Q4 element - 4-node isoparametric quadrilateral for plane stress
//!
//! 2 DOFs per node (u, v), 8 DOFs per element. Stiffness is integrated with
//! the 2x2 Gauss rule; stresses are recovered at the element centroid
//! (xi = eta = 0), giving one constant stress state per element.

use super::material::{Material, PlaneStressMaterial};
use super::node::Node;
use crate::error::{FEMError, FEMResult};
use crate::math::{check_corners, strain_displacement, DenseMatrix, GAUSS_2X2};

/// Number of nodes of a Q4 element
pub const Q4_NODES: usize = 4;
/// Number of DOFs of a Q4 element
pub const Q4_DOFS: usize = 8;

/// A Q4 element borrowing its nodes and material from the domain
///
/// Nodes are ordered counter-clockwise. The element holds no state beyond
/// these references: every operation is recomputed on demand.
#[derive(Debug, Clone, Copy)]
pub struct Q4<'a> {
    nodes: [&'a Node; Q4_NODES],
    material: &'a PlaneStressMaterial,
}

impl<'a> Q4<'a> {
    /// Create a Q4 view; the material must be a plane-stress set
    pub fn new(nodes: [&'a Node; Q4_NODES], material: &'a Material) -> FEMResult<Self> {
        match material {
            Material::PlaneStress(m) => Ok(Self { nodes, material: m }),
            other => Err(FEMError::MaterialMismatch {
                expected: "plane stress",
                found: other.kind(),
            }),
        }
    }

    /// The element's nodes in counter-clockwise order
    pub fn nodes(&self) -> &[&'a Node; Q4_NODES] {
        &self.nodes
    }

    /// The element's material
    pub fn material(&self) -> &PlaneStressMaterial {
        self.material
    }

    /// Physical (x, y) coordinates of the four nodes
    pub fn coordinates(&self) -> ([f64; 4], [f64; 4]) {
        let mut x = [0.0; 4];
        let mut y = [0.0; 4];
        for (i, node) in self.nodes.iter().enumerate() {
            (x[i], y[i]) = node.xy();
        }
        (x, y)
    }

    /// Global equation numbers of (u1, v1, ..., u4, v4)
    pub fn location_matrix(&self) -> [usize; Q4_DOFS] {
        let mut lm = [0; Q4_DOFS];
        for (i, node) in self.nodes.iter().enumerate() {
            lm[2 * i] = node.bcode[0];
            lm[2 * i + 1] = node.bcode[1];
        }
        lm
    }

    /// Full 8x8 element stiffness matrix
    ///
    /// `K = sum_g B^T D B det(J) w` over the 2x2 Gauss points.
    pub fn stiffness_matrix(&self) -> FEMResult<DenseMatrix> {
        let (x, y) = self.coordinates();
        check_corners(&x, &y)?;

        let d = self.material.constitutive_matrix()?;
        let mut k = DenseMatrix::zeros(Q4_DOFS, Q4_DOFS)?;

        for &(xi, eta, weight) in GAUSS_2X2.iter() {
            let (b, det_j) = strain_displacement(xi, eta, &x, &y)?;
            let btdb = b.transpose().matmul(&d)?.matmul(&b)?;
            k = k.add(&btdb.scale(weight * det_j))?;
        }

        Ok(k)
    }

    /// Element stiffness in packed symmetric storage (36 entries)
    pub fn stiffness(&self) -> FEMResult<Vec<f64>> {
        self.stiffness_matrix()?.symmetric_packed()
    }

    /// Gather the element displacement vector (8x1) from the global solution
    ///
    /// Restrained DOFs (equation 0) contribute zero; equation `k` reads
    /// `displacement[k - 1]`.
    pub fn local_displacement(&self, displacement: &[f64]) -> FEMResult<DenseMatrix> {
        let mut u = DenseMatrix::zeros(Q4_DOFS, 1)?;
        for (i, &eq) in self.location_matrix().iter().enumerate() {
            if eq == 0 {
                continue;
            }
            u[(i, 0)] = *displacement.get(eq - 1).ok_or_else(|| {
                FEMError::OutOfRangeIndex(format!(
                    "equation {} outside displacement vector of length {}",
                    eq,
                    displacement.len()
                ))
            })?;
        }
        Ok(u)
    }

    /// Centroid stresses [sx, sy, txy]
    pub fn stress(&self, displacement: &[f64]) -> FEMResult<[f64; 3]> {
        let (x, y) = self.coordinates();
        check_corners(&x, &y)?;

        let d = self.material.constitutive_matrix()?;
        let u = self.local_displacement(displacement)?;
        let (b, _) = strain_displacement(0.0, 0.0, &x, &y)?;

        let strain = b.matmul(&u)?;
        let sigma = d.matmul(&strain)?;

        Ok([sigma[(0, 0)], sigma[(1, 0)], sigma[(2, 0)]])
    }
}
