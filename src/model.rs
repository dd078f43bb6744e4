//! Domain - the finite element model and the static solution driver
//!
//! A [`Domain`] is built either programmatically (`add_node`, `add_group`,
//! `add_load_case`) or from an input file. Equation numbering is the only
//! phase that mutates nodes; assembly, load vectors and stress recovery all
//! borrow the domain immutably, so they cannot run before numbering has
//! finished or interleave with it.

use std::time::Instant;

use log::{debug, info, log, trace, warn, Level};
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisOptions, SolutionMode};
use crate::elements::{Element, ElementGroup, ElementType, ElementView, Node, NDF};
use crate::error::{FEMError, FEMResult};
use crate::loads::LoadCase;
use crate::math::SkylineMatrix;
use crate::results::{
    AnalysisResults, ElementStressResult, LoadCaseResult, NodeDisplacement, SolutionTimes,
};

/// The finite element model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Heading line of the problem
    pub title: String,
    /// Solution mode requested by the input
    pub mode: SolutionMode,
    /// Spatial dimension of the input (2 or 3)
    pub dimension: usize,
    /// Nodes, numbered sequentially from 1
    pub nodes: Vec<Node>,
    /// Element groups
    pub groups: Vec<ElementGroup>,
    /// Load cases
    pub load_cases: Vec<LoadCase>,

    /// Number of equations once numbered; tells which meaning `bcode` has
    #[serde(default)]
    neq: Option<usize>,
}

impl Default for Domain {
    fn default() -> Self {
        Self::new("")
    }
}

impl Domain {
    /// Create an empty 3D domain
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            mode: SolutionMode::Execute,
            dimension: 3,
            nodes: Vec::new(),
            groups: Vec::new(),
            load_cases: Vec::new(),
            neq: None,
        }
    }

    /// Create an empty domain in the XY plane
    ///
    /// Nodes added to a planar domain have their Z translation restrained.
    pub fn planar(title: &str) -> Self {
        Self {
            dimension: 2,
            ..Self::new(title)
        }
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a node; node numbers must run sequentially from 1
    pub fn add_node(&mut self, mut node: Node) -> FEMResult<()> {
        if self.is_numbered() {
            return Err(FEMError::AlreadyNumbered);
        }
        let expected = self.nodes.len() + 1;
        if node.number != expected {
            return Err(FEMError::InvalidInput(format!(
                "node {} out of sequence, expected node {}",
                node.number, expected
            )));
        }
        if node.bcode.iter().any(|&b| b > 1) {
            return Err(FEMError::InvalidInput(format!(
                "node {} has boundary codes {:?}, expected 0 (free) or 1 (fixed)",
                node.number, node.bcode
            )));
        }
        if self.dimension == 2 {
            node.xyz[2] = 0.0;
            node.bcode[2] = 1;
        }

        self.nodes.push(node);
        Ok(())
    }

    /// Add an element group after checking its node and material references
    pub fn add_group(&mut self, group: ElementGroup) -> FEMResult<()> {
        if self.is_numbered() {
            return Err(FEMError::AlreadyNumbered);
        }
        let number = self.groups.len() + 1;
        let element_type = group.element_type;

        for (i, material) in group.materials.iter().enumerate() {
            if !element_type.accepts(material) {
                return Err(FEMError::MaterialMismatch {
                    expected: match element_type {
                        ElementType::Bar => "bar",
                        ElementType::Q4 => "plane stress",
                    },
                    found: material.kind(),
                });
            }
            material.warn_if_unphysical(i + 1);
        }

        for (i, element) in group.elements.iter().enumerate() {
            if element.nodes.len() != element_type.nodes_per_element() {
                return Err(FEMError::InvalidInput(format!(
                    "group {}: {} element {} has {} nodes, expected {}",
                    number,
                    element_type.name(),
                    i + 1,
                    element.nodes.len(),
                    element_type.nodes_per_element()
                )));
            }
            for &n in &element.nodes {
                if n == 0 || n > self.nodes.len() {
                    return Err(FEMError::NodeNotFound(n));
                }
            }
            group.material(element.material)?;
        }

        debug!(
            "Group {}: {} {} elements, {} material sets",
            number,
            group.len(),
            element_type.name(),
            group.materials.len()
        );
        self.groups.push(group);
        Ok(())
    }

    /// Add a load case after checking its node and DOF references
    pub fn add_load_case(&mut self, case: LoadCase) -> FEMResult<()> {
        for load in &case.loads {
            if load.node == 0 || load.node > self.nodes.len() {
                return Err(FEMError::NodeNotFound(load.node));
            }
            if !load.has_valid_dof() {
                return Err(FEMError::InvalidInput(format!(
                    "load on node {} has direction {}, expected 1 to {}",
                    load.node, load.dof, NDF
                )));
            }
        }
        self.load_cases.push(case);
        Ok(())
    }

    // ========================
    // Queries
    // ========================

    /// Node by 1-based number
    pub fn node(&self, number: usize) -> FEMResult<&Node> {
        number
            .checked_sub(1)
            .and_then(|i| self.nodes.get(i))
            .ok_or(FEMError::NodeNotFound(number))
    }

    /// Number of equations, if numbering has been done
    pub fn neq(&self) -> Option<usize> {
        self.neq
    }

    pub fn is_numbered(&self) -> bool {
        self.neq.is_some()
    }

    /// Total number of elements over all groups
    pub fn num_elements(&self) -> usize {
        self.groups.iter().map(|g| g.len()).sum()
    }

    /// Every element as `(group, element, view)`, numbers 1-based
    pub fn elements(&self) -> impl Iterator<Item = FEMResult<(usize, usize, ElementView<'_>)>> + '_ {
        self.groups.iter().enumerate().flat_map(move |(g, group)| {
            (0..group.len()).map(move |e| {
                group
                    .view(e, &self.nodes)
                    .map(|view| (g + 1, e + 1, view))
            })
        })
    }

    fn require_numbered(&self) -> FEMResult<usize> {
        self.neq.ok_or(FEMError::NotNumbered)
    }

    // ========================
    // Solution Phases
    // ========================

    /// Replace boundary codes with global equation numbers
    ///
    /// Free DOFs are numbered 1, 2, ... in node order; restrained DOFs get 0.
    /// Numbering happens once: later calls return the existing count.
    pub fn calculate_equation_numbers(&mut self) -> usize {
        if let Some(neq) = self.neq {
            return neq;
        }

        let mut neq = 0;
        for node in self.nodes.iter_mut() {
            for code in node.bcode.iter_mut() {
                if *code == 0 {
                    neq += 1;
                    *code = neq;
                } else {
                    *code = 0;
                }
            }
        }

        info!("Numbered {} equations over {} nodes", neq, self.nodes.len());
        self.neq = Some(neq);
        neq
    }

    /// Allocate the skyline profile from the element location matrices
    pub fn allocate_stiffness(&self) -> FEMResult<SkylineMatrix> {
        let neq = self.require_numbered()?;
        let location_matrices = self
            .elements()
            .map(|item| item.map(|(_, _, view)| view.location_matrix()))
            .collect::<FEMResult<Vec<_>>>()?;

        SkylineMatrix::from_location_matrices(neq, location_matrices.iter().map(|lm| lm.as_slice()))
    }

    /// Assemble the global stiffness matrix in skyline storage
    pub fn assemble_stiffness(&self) -> FEMResult<SkylineMatrix> {
        let mut stiffness = self.allocate_stiffness()?;
        info!(
            "Allocated skyline: {} equations, {} stored entries, max half bandwidth {}",
            stiffness.neq(),
            stiffness.len(),
            stiffness.max_half_bandwidth()
        );

        for item in self.elements() {
            let (g, e, view) = item?;
            let k = view.stiffness()?;
            trace!("Group {} element {} stiffness: {:?}", g, e, k);
            stiffness.assemble(&k, &view.location_matrix())?;
        }

        Ok(stiffness)
    }

    /// Global load vector of load case `case` (1-based)
    ///
    /// Loads on restrained DOFs are skipped.
    pub fn assemble_force(&self, case: usize) -> FEMResult<Vec<f64>> {
        let neq = self.require_numbered()?;
        let load_case = case
            .checked_sub(1)
            .and_then(|i| self.load_cases.get(i))
            .ok_or_else(|| {
                FEMError::OutOfRangeIndex(format!(
                    "load case {} outside {} load cases",
                    case,
                    self.load_cases.len()
                ))
            })?;

        let mut force = vec![0.0; neq];
        for load in &load_case.loads {
            let node = self.node(load.node)?;
            match node.bcode.get(load.dof.wrapping_sub(1)) {
                Some(&0) => warn!(
                    "Load case {}: load on restrained DOF {} of node {} ignored",
                    case, load.dof, load.node
                ),
                Some(&eq) => force[eq - 1] += load.load,
                None => {
                    return Err(FEMError::InvalidInput(format!(
                        "load on node {} has direction {}",
                        load.node, load.dof
                    )))
                }
            }
        }
        Ok(force)
    }

    /// Nodal displacements from the global solution vector
    pub fn node_displacements(&self, displacement: &[f64]) -> FEMResult<Vec<NodeDisplacement>> {
        let neq = self.require_numbered()?;
        if displacement.len() != neq {
            return Err(FEMError::OutOfRangeIndex(format!(
                "solution has {} entries for {} equations",
                displacement.len(),
                neq
            )));
        }
        self.nodes
            .iter()
            .map(|node| {
                Ok(NodeDisplacement {
                    node: node.number,
                    displacement: node.displacement(displacement)?,
                })
            })
            .collect()
    }

    /// Element stresses from the global solution vector
    pub fn element_stresses(&self, displacement: &[f64]) -> FEMResult<Vec<ElementStressResult>> {
        self.elements()
            .map(|item| {
                let (group, element, view) = item?;
                Ok(ElementStressResult {
                    group,
                    element,
                    stress: view.stress(displacement)?,
                })
            })
            .collect()
    }

    /// Number equations, then assemble, factorize and solve every load case
    ///
    /// A data check run stops after numbering and returns no load case
    /// results.
    pub fn analyze(&mut self, options: AnalysisOptions) -> FEMResult<AnalysisResults> {
        let level = if options.log { Level::Info } else { Level::Debug };
        let start = Instant::now();

        let neq = self.calculate_equation_numbers();
        if options.mode == SolutionMode::DataCheck {
            log!(level, "Data check complete: {} equations", neq);
            return Ok(AnalysisResults {
                neq,
                ..AnalysisResults::default()
            });
        }
        // Numbering is done; everything below only reads the domain.
        let domain: &Domain = self;

        let mut stiffness = domain.assemble_stiffness()?;
        let assembled = Instant::now();
        log!(level, "Assembled {} elements", domain.num_elements());

        stiffness.factorize()?;
        let factorized = Instant::now();
        log!(level, "Factorized stiffness matrix");

        let mut load_cases = Vec::with_capacity(domain.load_cases.len());
        for case in 1..=domain.load_cases.len() {
            let mut displacement = domain.assemble_force(case)?;
            stiffness.back_substitute(&mut displacement)?;

            let result = LoadCaseResult {
                case,
                displacements: domain.node_displacements(&displacement)?,
                stresses: domain.element_stresses(&displacement)?,
            };
            log!(level, "Solved load case {}", case);
            load_cases.push(result);
        }
        let solved = Instant::now();

        let times = SolutionTimes {
            assembly: (assembled - start).as_secs_f64(),
            factorization: (factorized - assembled).as_secs_f64(),
            solution: (solved - factorized).as_secs_f64(),
        };
        log!(
            level,
            "Solution time: assembly {:.3}s, factorization {:.3}s, solution {:.3}s",
            times.assembly,
            times.factorization,
            times.solution
        );

        Ok(AnalysisResults {
            neq,
            load_cases,
            times,
        })
    }

    // ========================
    // Serialization
    // ========================

    /// Serialize the model to JSON
    pub fn to_json(&self) -> FEMResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a model from JSON
    ///
    /// Without `neq` the boundary codes must be in input form (0 or 1). With
    /// it, the nonzero codes must be the equation numbers 1..=neq, each used
    /// once.
    pub fn from_json(json: &str) -> FEMResult<Self> {
        let domain: Domain = serde_json::from_str(json)?;
        domain.check_codes()?;
        Ok(domain)
    }

    fn check_codes(&self) -> FEMResult<()> {
        let Some(neq) = self.neq else {
            return match self.nodes.iter().find(|n| n.bcode.iter().any(|&b| b > 1)) {
                Some(node) => Err(FEMError::InvalidInput(format!(
                    "node {} has boundary codes {:?} but the model is not numbered",
                    node.number, node.bcode
                ))),
                None => Ok(()),
            };
        };

        let mut seen = vec![false; neq];
        for node in &self.nodes {
            for &eq in node.bcode.iter().filter(|&&eq| eq != 0) {
                match seen.get_mut(eq - 1) {
                    Some(slot) if !*slot => *slot = true,
                    _ => {
                        return Err(FEMError::InvalidInput(format!(
                            "node {} has equation numbers {:?}, expected each of 1 to {} once",
                            node.number, node.bcode, neq
                        )))
                    }
                }
            }
        }
        if seen.iter().any(|used| !used) {
            return Err(FEMError::InvalidInput(format!(
                "equation numbers do not cover all {} equations",
                neq
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Material;
    use crate::results::ElementStress;
    use approx::assert_relative_eq;

    /// Unit square Q4 with E = 1, nu = 0, t = 1. Node 1 is fully fixed, node 2
    /// and node 4 are on rollers, node 3 is free in X only.
    fn unit_square() -> Domain {
        let mut domain = Domain::planar("unit square");
        domain.add_node(Node::planar(1, 0.0, 0.0).fixed(&[0, 1])).unwrap();
        domain.add_node(Node::planar(2, 1.0, 0.0).fixed(&[1])).unwrap();
        domain.add_node(Node::planar(3, 1.0, 1.0)).unwrap();
        domain.add_node(Node::planar(4, 0.0, 1.0).fixed(&[0])).unwrap();
        domain
            .add_group(
                ElementGroup::new(ElementType::Q4)
                    .with_material(Material::plane_stress(1.0, 0.0, 1.0))
                    .with_element(&[1, 2, 3, 4], 1),
            )
            .unwrap();
        domain
    }

    #[test]
    fn test_equation_numbering() {
        let mut domain = unit_square();
        assert!(!domain.is_numbered());
        assert_eq!(domain.calculate_equation_numbers(), 4);
        assert_eq!(domain.nodes[0].bcode, [0, 0, 0]);
        assert_eq!(domain.nodes[1].bcode, [1, 0, 0]);
        assert_eq!(domain.nodes[2].bcode, [2, 3, 0]);
        assert_eq!(domain.nodes[3].bcode, [0, 4, 0]);
        // numbering is not repeated
        assert_eq!(domain.calculate_equation_numbers(), 4);
        assert_eq!(domain.nodes[2].bcode, [2, 3, 0]);
    }

    #[test]
    fn test_evaluation_requires_numbering() {
        let domain = unit_square();
        assert!(matches!(domain.allocate_stiffness(), Err(FEMError::NotNumbered)));
        assert!(matches!(domain.assemble_force(1), Err(FEMError::NotNumbered)));
    }

    #[test]
    fn test_add_node_sequence() {
        let mut domain = Domain::new("nodes");
        domain.add_node(Node::new(1, 0.0, 0.0, 0.0)).unwrap();
        assert!(domain.add_node(Node::new(3, 0.0, 0.0, 0.0)).is_err());
        assert!(domain
            .add_node(Node::new(2, 0.0, 0.0, 0.0).with_bcode([2, 0, 0]))
            .is_err());
    }

    #[test]
    fn test_add_group_validation() {
        let mut domain = unit_square();
        let bad_node = ElementGroup::new(ElementType::Q4)
            .with_material(Material::plane_stress(1.0, 0.3, 1.0))
            .with_element(&[1, 2, 3, 5], 1);
        assert!(matches!(domain.add_group(bad_node), Err(FEMError::NodeNotFound(5))));

        let bad_material = ElementGroup::new(ElementType::Q4)
            .with_material(Material::bar(1.0, 1.0))
            .with_element(&[1, 2, 3, 4], 1);
        assert!(matches!(
            domain.add_group(bad_material),
            Err(FEMError::MaterialMismatch { .. })
        ));

        let bad_set = ElementGroup::new(ElementType::Bar)
            .with_material(Material::bar(1.0, 1.0))
            .with_element(&[1, 2], 2);
        assert!(matches!(domain.add_group(bad_set), Err(FEMError::MaterialNotFound(2))));
        assert_eq!(domain.groups.len(), 1);
    }

    #[test]
    fn test_add_load_case_validation() {
        let mut domain = unit_square();
        assert!(domain.add_load_case(LoadCase::new().with_load(9, 1, 1.0)).is_err());
        assert!(domain.add_load_case(LoadCase::new().with_load(3, 4, 1.0)).is_err());
        assert!(domain.add_load_case(LoadCase::new().with_load(3, 1, 1.0)).is_ok());
    }

    #[test]
    fn test_assemble_force_skips_restrained() {
        let mut domain = unit_square();
        domain
            .add_load_case(LoadCase::new().with_load(3, 1, 2.0).with_load(1, 1, 5.0))
            .unwrap();
        domain.calculate_equation_numbers();
        assert_eq!(domain.assemble_force(1).unwrap(), vec![0.0, 2.0, 0.0, 0.0]);
        assert!(domain.assemble_force(2).is_err());
    }

    #[test]
    fn test_unit_square_stretch() {
        // uniaxial stretch: sx = 1 gives u = 1 along x = 1 with nu = 0
        let mut domain = unit_square();
        domain
            .add_load_case(LoadCase::new().with_load(2, 1, 0.5).with_load(3, 1, 0.5))
            .unwrap();
        let results = domain.analyze(AnalysisOptions::execute()).unwrap();

        assert_eq!(results.neq, 4);
        let case = results.load_case(1).unwrap();
        assert_relative_eq!(case.displacement(2).unwrap().displacement[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(case.displacement(3).unwrap().displacement[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(case.displacement(3).unwrap().displacement[1], 0.0, epsilon = 1e-12);

        match case.stress(1, 1).unwrap() {
            ElementStress::PlaneStress(s) => {
                assert_relative_eq!(s.sx, 1.0, epsilon = 1e-12);
                assert_relative_eq!(s.sy, 0.0, epsilon = 1e-12);
                assert_relative_eq!(s.txy, 0.0, epsilon = 1e-12);
            }
            other => panic!("expected plane stress, got {:?}", other),
        }
    }

    #[test]
    fn test_data_check_stops_after_numbering() {
        let mut domain = unit_square();
        domain.add_load_case(LoadCase::new().with_load(3, 1, 1.0)).unwrap();
        let results = domain.analyze(AnalysisOptions::data_check()).unwrap();
        assert_eq!(results.neq, 4);
        assert!(results.load_cases.is_empty());
        assert!(domain.is_numbered());
    }

    #[test]
    fn test_unsupported_model_is_singular() {
        let mut domain = Domain::planar("floating");
        domain.add_node(Node::planar(1, 0.0, 0.0)).unwrap();
        domain.add_node(Node::planar(2, 1.0, 0.0)).unwrap();
        domain.add_node(Node::planar(3, 1.0, 1.0)).unwrap();
        domain.add_node(Node::planar(4, 0.0, 1.0)).unwrap();
        domain
            .add_group(
                ElementGroup::new(ElementType::Q4)
                    .with_material(Material::plane_stress(1.0, 0.3, 1.0))
                    .with_element(&[1, 2, 3, 4], 1),
            )
            .unwrap();
        domain.add_load_case(LoadCase::new().with_load(3, 1, 1.0)).unwrap();
        assert!(matches!(
            domain.analyze(AnalysisOptions::execute()),
            Err(FEMError::SingularMatrix(_))
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_input_codes() {
        let domain = unit_square();
        let json = domain.to_json().unwrap();
        let back = Domain::from_json(&json).unwrap();
        assert_eq!(back, domain);
        assert!(!back.is_numbered());
    }

    #[test]
    fn test_no_nodes_or_groups_after_numbering() {
        let mut domain = unit_square();
        domain.calculate_equation_numbers();
        let codes: Vec<_> = domain.nodes.iter().map(|n| n.bcode).collect();

        assert!(matches!(
            domain.add_node(Node::planar(5, 2.0, 0.0)),
            Err(FEMError::AlreadyNumbered)
        ));
        assert!(matches!(
            domain.add_group(
                ElementGroup::new(ElementType::Q4)
                    .with_material(Material::plane_stress(1.0, 0.0, 1.0))
                    .with_element(&[1, 2, 3, 4], 1),
            ),
            Err(FEMError::AlreadyNumbered)
        ));

        // equation numbers are untouched and numbering is not redone
        assert_eq!(domain.nodes.len(), 4);
        assert_eq!(domain.groups.len(), 1);
        assert_eq!(domain.calculate_equation_numbers(), 4);
        let after: Vec<_> = domain.nodes.iter().map(|n| n.bcode).collect();
        assert_eq!(after, codes);
    }

    #[test]
    fn test_json_round_trip_after_analysis() {
        let mut domain = unit_square();
        domain
            .add_load_case(LoadCase::new().with_load(2, 1, 0.5).with_load(3, 1, 0.5))
            .unwrap();
        let first = domain.analyze(AnalysisOptions::execute()).unwrap();

        let json = domain.to_json().unwrap();
        let mut back = Domain::from_json(&json).unwrap();
        assert_eq!(back, domain);
        assert_eq!(back.neq(), Some(4));

        let second = back.analyze(AnalysisOptions::execute()).unwrap();
        assert_eq!(second.neq, 4);
        assert_eq!(second.load_cases, first.load_cases);
        let u3 = second.load_case(1).unwrap().displacement(3).unwrap().displacement;
        assert_relative_eq!(u3[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_json_rejects_inconsistent_codes() {
        let mut domain = unit_square();
        domain.nodes[2].bcode = [2, 0, 1];
        let json = serde_json::to_string(&domain).unwrap();
        assert!(matches!(
            Domain::from_json(&json),
            Err(FEMError::InvalidInput(_))
        ));

        let mut numbered = unit_square();
        numbered.calculate_equation_numbers();
        numbered.nodes[3].bcode = [0, 9, 0];
        let json = serde_json::to_string(&numbered).unwrap();
        assert!(matches!(
            Domain::from_json(&json),
            Err(FEMError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_node_displacements_checks_solution_length() {
        let mut domain = unit_square();
        assert!(matches!(
            domain.node_displacements(&[1.0; 4]),
            Err(FEMError::NotNumbered)
        ));
        domain.calculate_equation_numbers();
        assert!(matches!(
            domain.node_displacements(&[1.0]),
            Err(FEMError::OutOfRangeIndex(_))
        ));

        let d = domain.node_displacements(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(d[0].displacement, [0.0; 3]);
        assert_eq!(d[2].displacement, [2.0, 3.0, 0.0]);
        assert_eq!(d[3].displacement, [0.0, 4.0, 0.0]);
    }
}
