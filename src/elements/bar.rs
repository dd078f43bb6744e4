//! Bar element - 2-node truss resisting axial force only
//!
//! 3 translational DOFs per node. With `d = x2 - x1` and `L = |d|`:
//! ```text
//! K = (E*A/L^3) * [  d*d^T  -d*d^T ]
//!                 [ -d*d^T   d*d^T ]
//! ```

use super::material::{BarMaterial, Material};
use super::node::{Node, NDF};
use crate::error::{FEMError, FEMResult};
use crate::math::DenseMatrix;

/// Number of DOFs of a bar element
pub const BAR_DOFS: usize = 2 * NDF;

/// A bar element borrowing its nodes and material from the domain
#[derive(Debug, Clone, Copy)]
pub struct Bar<'a> {
    nodes: [&'a Node; 2],
    material: &'a BarMaterial,
}

impl<'a> Bar<'a> {
    /// Create a bar view; the material must be a bar set
    pub fn new(nodes: [&'a Node; 2], material: &'a Material) -> FEMResult<Self> {
        match material {
            Material::Bar(m) => Ok(Self { nodes, material: m }),
            other => Err(FEMError::MaterialMismatch {
                expected: "bar",
                found: other.kind(),
            }),
        }
    }

    /// Axis vector from node 1 to node 2 and its squared length
    fn axis(&self) -> FEMResult<([f64; 3], f64)> {
        let mut d = [0.0; 3];
        for (k, dk) in d.iter_mut().enumerate() {
            *dk = self.nodes[1].xyz[k] - self.nodes[0].xyz[k];
        }
        let l2 = d.iter().map(|v| v * v).sum::<f64>();
        if l2 <= 0.0 {
            return Err(FEMError::InvalidGeometry(format!(
                "bar between nodes {} and {} has zero length",
                self.nodes[0].number, self.nodes[1].number
            )));
        }
        Ok((d, l2))
    }

    /// Element length
    pub fn length(&self) -> FEMResult<f64> {
        Ok(self.axis()?.1.sqrt())
    }

    /// Global equation numbers of (u1, v1, w1, u2, v2, w2)
    pub fn location_matrix(&self) -> [usize; BAR_DOFS] {
        let mut lm = [0; BAR_DOFS];
        for (n, node) in self.nodes.iter().enumerate() {
            lm[n * NDF..(n + 1) * NDF].copy_from_slice(&node.bcode);
        }
        lm
    }

    /// Full 6x6 element stiffness matrix
    pub fn stiffness_matrix(&self) -> FEMResult<DenseMatrix> {
        let (d, l2) = self.axis()?;
        let k = self.material.e * self.material.area / (l2 * l2.sqrt());

        let mut stiffness = DenseMatrix::zeros(BAR_DOFS, BAR_DOFS)?;
        for a in 0..NDF {
            for b in 0..NDF {
                let c = k * d[a] * d[b];
                stiffness[(a, b)] = c;
                stiffness[(a + NDF, b + NDF)] = c;
                stiffness[(a, b + NDF)] = -c;
                stiffness[(a + NDF, b)] = -c;
            }
        }
        Ok(stiffness)
    }

    /// Element stiffness in packed symmetric storage (21 entries)
    pub fn stiffness(&self) -> FEMResult<Vec<f64>> {
        self.stiffness_matrix()?.symmetric_packed()
    }

    /// Axial stress `E/L^2 * d . (u2 - u1)`
    pub fn stress(&self, displacement: &[f64]) -> FEMResult<f64> {
        let (d, l2) = self.axis()?;
        let lm = self.location_matrix();

        let mut elongation = 0.0;
        for k in 0..NDF {
            let u1 = lookup(displacement, lm[k])?;
            let u2 = lookup(displacement, lm[k + NDF])?;
            elongation += d[k] * (u2 - u1);
        }

        Ok(self.material.e / l2 * elongation)
    }

    /// Axial force from the axial stress
    pub fn axial_force(&self, stress: f64) -> f64 {
        stress * self.material.area
    }
}

fn lookup(displacement: &[f64], eq: usize) -> FEMResult<f64> {
    if eq == 0 {
        return Ok(0.0);
    }
    displacement.get(eq - 1).copied().ok_or_else(|| {
        FEMError::OutOfRangeIndex(format!(
            "equation {} outside displacement vector of length {}",
            eq,
            displacement.len()
        ))
    })
}
