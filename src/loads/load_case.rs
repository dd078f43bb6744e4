//! Load cases made of concentrated nodal loads

use serde::{Deserialize, Serialize};

use crate::elements::NDF;

/// A force applied to a single DOF of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConcentratedLoad {
    /// Node number (1-based)
    pub node: usize,
    /// Direction (1 = X, 2 = Y, 3 = Z)
    pub dof: usize,
    /// Load magnitude
    pub load: f64,
}

impl ConcentratedLoad {
    /// Create a new concentrated load
    pub fn new(node: usize, dof: usize, load: f64) -> Self {
        Self { node, dof, load }
    }

    /// Create a load in X direction
    pub fn fx(node: usize, load: f64) -> Self {
        Self::new(node, 1, load)
    }

    /// Create a load in Y direction
    pub fn fy(node: usize, load: f64) -> Self {
        Self::new(node, 2, load)
    }

    /// Create a load in Z direction
    pub fn fz(node: usize, load: f64) -> Self {
        Self::new(node, 3, load)
    }

    /// Whether the direction is one of the node's DOFs
    pub fn has_valid_dof(&self) -> bool {
        (1..=NDF).contains(&self.dof)
    }
}

/// A load case groups concentrated loads solved together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadCase {
    pub loads: Vec<ConcentratedLoad>,
}

impl LoadCase {
    /// Create an empty load case
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a load (builder style)
    pub fn with_load(mut self, node: usize, dof: usize, load: f64) -> Self {
        self.loads.push(ConcentratedLoad::new(node, dof, load));
        self
    }

    /// Add a load
    pub fn add(&mut self, load: ConcentratedLoad) {
        self.loads.push(load);
    }

    /// Number of loads in the case
    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Sum of the load components per direction
    pub fn resultant(&self) -> [f64; NDF] {
        let mut total = [0.0; NDF];
        for load in self.loads.iter().filter(|l| l.has_valid_dof()) {
            total[load.dof - 1] += load.load;
        }
        total
    }
}
