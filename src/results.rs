//! Result types for static analysis

use serde::{Deserialize, Serialize};

use crate::elements::NDF;

/// Displacement results at a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeDisplacement {
    /// Node number (1-based)
    pub node: usize,
    /// Displacement in X, Y and Z direction
    pub displacement: [f64; NDF],
}

impl NodeDisplacement {
    /// Get translation magnitude
    pub fn magnitude(&self) -> f64 {
        self.displacement.iter().map(|d| d * d).sum::<f64>().sqrt()
    }
}

/// In-plane stress components of a plane-stress element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneStresses {
    /// Normal stress in X direction
    pub sx: f64,
    /// Normal stress in Y direction
    pub sy: f64,
    /// Shear stress XY
    pub txy: f64,
}

impl PlaneStresses {
    /// Von Mises equivalent stress
    pub fn von_mises(&self) -> f64 {
        (self.sx.powi(2) - self.sx * self.sy + self.sy.powi(2) + 3.0 * self.txy.powi(2)).sqrt()
    }

    /// Principal stresses (s1 >= s2)
    pub fn principal(&self) -> (f64, f64) {
        let s_avg = (self.sx + self.sy) / 2.0;
        let r = ((self.sx - self.sy).powi(2) / 4.0 + self.txy.powi(2)).sqrt();
        (s_avg + r, s_avg - r)
    }
}

/// Stress recovered for one element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ElementStress {
    /// Bar element: axial stress and force (positive = tension)
    Axial { stress: f64, force: f64 },
    /// Q4 element: centroid stresses
    PlaneStress(PlaneStresses),
}

impl ElementStress {
    /// Scalar measure used for extreme-value summaries
    pub fn equivalent(&self) -> f64 {
        match self {
            Self::Axial { stress, .. } => stress.abs(),
            Self::PlaneStress(s) => s.von_mises(),
        }
    }
}

/// Element stress tagged with its group and element number
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementStressResult {
    /// Element group number (1-based)
    pub group: usize,
    /// Element number within the group (1-based)
    pub element: usize,
    pub stress: ElementStress,
}

/// Results of one load case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCaseResult {
    /// Load case number (1-based)
    pub case: usize,
    pub displacements: Vec<NodeDisplacement>,
    pub stresses: Vec<ElementStressResult>,
}

impl LoadCaseResult {
    /// Displacement record of a node
    pub fn displacement(&self, node: usize) -> Option<&NodeDisplacement> {
        self.displacements.iter().find(|d| d.node == node)
    }

    /// Stress record of an element
    pub fn stress(&self, group: usize, element: usize) -> Option<&ElementStress> {
        self.stresses
            .iter()
            .find(|s| s.group == group && s.element == element)
            .map(|s| &s.stress)
    }
}

/// Wall-clock time spent in each solution phase (seconds)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionTimes {
    /// Numbering, allocation and stiffness assembly
    pub assembly: f64,
    /// LDLT factorization
    pub factorization: f64,
    /// Load vectors, back substitution and stress recovery
    pub solution: f64,
}

impl SolutionTimes {
    pub fn total(&self) -> f64 {
        self.assembly + self.factorization + self.solution
    }
}

/// Complete results of an analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    /// Number of equations
    pub neq: usize,
    /// One entry per load case; empty after a data check run
    pub load_cases: Vec<LoadCaseResult>,
    pub times: SolutionTimes,
}

impl AnalysisResults {
    /// Largest nodal translation over all load cases, with its node number
    pub fn max_displacement(&self) -> Option<(usize, f64)> {
        self.load_cases
            .iter()
            .flat_map(|case| case.displacements.iter())
            .map(|d| (d.node, d.magnitude()))
            .fold(None, |best, (node, mag)| match best {
                Some((_, m)) if m >= mag => best,
                _ => Some((node, mag)),
            })
    }

    /// Results of a load case by 1-based number
    pub fn load_case(&self, case: usize) -> Option<&LoadCaseResult> {
        self.load_cases.iter().find(|c| c.case == case)
    }
}
