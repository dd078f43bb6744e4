//! STAP FEM - a native Rust linear static finite element solver
//!
//! The solver follows the classic STAP program structure:
//! - Isoparametric 4-node quadrilateral (Q4) plane-stress elements,
//!   integrated with the 2x2 Gauss rule, stresses at the centroid
//! - 2-node bar (truss) elements in 3D
//! - Skyline storage of the global stiffness and LDLT factorization
//! - Multiple load cases solved against one factorization
//! - Line-oriented `.dat` input and a plain-text report
//!
//! ## Example
//! ```rust
//! use stap_fem::prelude::*;
//!
//! let mut domain = Domain::planar("Unit square");
//!
//! // Nodes, counter-clockwise, with supports
//! domain.add_node(Node::planar(1, 0.0, 0.0).fixed(&[0, 1])).unwrap();
//! domain.add_node(Node::planar(2, 1.0, 0.0).fixed(&[1])).unwrap();
//! domain.add_node(Node::planar(3, 1.0, 1.0)).unwrap();
//! domain.add_node(Node::planar(4, 0.0, 1.0).fixed(&[0])).unwrap();
//!
//! // One Q4 element with E = 1000, nu = 0.3, t = 1
//! let group = ElementGroup::new(ElementType::Q4)
//!     .with_material(Material::plane_stress(1000.0, 0.3, 1.0))
//!     .with_element(&[1, 2, 3, 4], 1);
//! domain.add_group(group).unwrap();
//!
//! // Pull the right edge
//! domain
//!     .add_load_case(LoadCase::new().with_load(2, 1, 5.0).with_load(3, 1, 5.0))
//!     .unwrap();
//!
//! // Analyze
//! let results = domain.analyze(AnalysisOptions::execute()).unwrap();
//!
//! // Get results
//! let case = results.load_case(1).unwrap();
//! let u = case.displacement(3).unwrap().displacement[0];
//! assert!((u - 0.01).abs() < 1e-12);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod io;
pub mod loads;
pub mod math;
pub mod model;
pub mod results;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{AnalysisOptions, SolutionMode};
    pub use crate::elements::{
        Bar, BarMaterial, Element, ElementConnectivity, ElementGroup, ElementType, ElementView,
        Material, Node, PlaneStressMaterial, Q4,
    };
    pub use crate::error::{FEMError, FEMResult};
    pub use crate::io::ReportWriter;
    pub use crate::loads::{ConcentratedLoad, LoadCase};
    pub use crate::math::{DenseMatrix, SkylineMatrix};
    pub use crate::model::Domain;
    pub use crate::results::{
        AnalysisResults, ElementStress, ElementStressResult, LoadCaseResult, NodeDisplacement,
        PlaneStresses, SolutionTimes,
    };
}
