//! Node - a point in 3D space carrying boundary codes

use serde::{Deserialize, Serialize};

use crate::error::{FEMError, FEMResult};

/// Maximum number of degrees of freedom per node
pub const NDF: usize = 3;

/// A nodal point of the finite element model
///
/// `bcode` has two meanings over the life of a domain. As read from input,
/// 0 marks an active DOF and 1 a restrained one. After
/// [`Domain::calculate_equation_numbers`](crate::model::Domain::calculate_equation_numbers)
/// it holds the 1-based global equation number of each DOF, with 0 for
/// restrained DOFs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node number (1-based)
    pub number: usize,
    /// X, Y, Z coordinates
    pub xyz: [f64; 3],
    /// Boundary code / equation number of each DOF
    pub bcode: [usize; NDF],
}

impl Node {
    /// Create a free node at the given coordinates
    pub fn new(number: usize, x: f64, y: f64, z: f64) -> Self {
        Self {
            number,
            xyz: [x, y, z],
            bcode: [0; NDF],
        }
    }

    /// Create a node in the XY plane; the Z translation is inactive
    pub fn planar(number: usize, x: f64, y: f64) -> Self {
        Self {
            number,
            xyz: [x, y, 0.0],
            bcode: [0, 0, 1],
        }
    }

    /// Set the input boundary codes (0 = free, 1 = fixed)
    pub fn with_bcode(mut self, bcode: [usize; NDF]) -> Self {
        self.bcode = bcode;
        self
    }

    /// Fix the given DOFs (0-based: 0 = X, 1 = Y, 2 = Z)
    pub fn fixed(mut self, dofs: &[usize]) -> Self {
        for &d in dofs {
            if d < NDF {
                self.bcode[d] = 1;
            }
        }
        self
    }

    /// In-plane coordinates (x, y)
    pub fn xy(&self) -> (f64, f64) {
        (self.xyz[0], self.xyz[1])
    }

    /// Displacement of each DOF given the global solution vector
    ///
    /// Equation numbers must already be assigned; restrained DOFs read 0.
    /// An equation number past the end of `solution` is an error.
    pub fn displacement(&self, solution: &[f64]) -> FEMResult<[f64; NDF]> {
        let mut d = [0.0; NDF];
        for (value, &eq) in d.iter_mut().zip(self.bcode.iter()) {
            if eq != 0 {
                *value = *solution.get(eq - 1).ok_or_else(|| {
                    FEMError::OutOfRangeIndex(format!(
                        "node {} equation {} beyond solution of length {}",
                        self.number,
                        eq,
                        solution.len()
                    ))
                })?;
            }
        }
        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = Node::new(1, 1.0, 2.0, 3.0);
        assert_eq!(node.xyz, [1.0, 2.0, 3.0]);
        assert_eq!(node.bcode, [0, 0, 0]);

        let planar = Node::planar(2, 4.0, 5.0).fixed(&[0]);
        assert_eq!(planar.bcode, [1, 0, 1]);
        assert_eq!(planar.xy(), (4.0, 5.0));
    }

    #[test]
    fn test_displacement_lookup() {
        let node = Node::new(1, 0.0, 0.0, 0.0).with_bcode([2, 0, 3]);
        let d = node.displacement(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(d, [20.0, 0.0, 30.0]);
    }

    #[test]
    fn test_displacement_short_solution() {
        let node = Node::new(4, 0.0, 0.0, 0.0).with_bcode([2, 0, 3]);
        assert!(matches!(
            node.displacement(&[10.0, 20.0]),
            Err(FEMError::OutOfRangeIndex(_))
        ));
    }
}
