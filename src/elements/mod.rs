//! Structural elements module
//!
//! Elements are lightweight views: an [`ElementGroup`] stores connectivity as
//! node numbers and material set numbers, and [`ElementGroup::view`] resolves
//! them against the domain's node list into a [`Bar`] or [`Q4`] that borrows
//! its nodes and material.

mod bar;
mod material;
mod node;
mod q4;

pub use bar::{Bar, BAR_DOFS};
pub use material::{BarMaterial, Material, PlaneStressMaterial};
pub use node::{Node, NDF};
pub use q4::{Q4, Q4_DOFS, Q4_NODES};

use serde::{Deserialize, Serialize};

use crate::error::{FEMError, FEMResult};
use crate::results::{ElementStress, PlaneStresses};

/// Element formulations, numbered as in the input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    Bar = 1,
    Q4 = 2,
}

impl ElementType {
    /// Look up an element type by its input code
    pub fn from_code(code: usize) -> Option<Self> {
        match code {
            1 => Some(Self::Bar),
            2 => Some(Self::Q4),
            _ => None,
        }
    }

    /// Input code of this element type
    pub fn code(&self) -> usize {
        *self as usize
    }

    pub fn nodes_per_element(&self) -> usize {
        match self {
            Self::Bar => 2,
            Self::Q4 => Q4_NODES,
        }
    }

    pub fn dofs_per_element(&self) -> usize {
        match self {
            Self::Bar => BAR_DOFS,
            Self::Q4 => Q4_DOFS,
        }
    }

    /// Length of the packed element stiffness
    pub fn packed_len(&self) -> usize {
        let nd = self.dofs_per_element();
        nd * (nd + 1) / 2
    }

    /// Whether `material` can be used by this element type
    pub fn accepts(&self, material: &Material) -> bool {
        matches!(
            (self, material),
            (Self::Bar, Material::Bar(_)) | (Self::Q4, Material::PlaneStress(_))
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bar => "Bar",
            Self::Q4 => "Q4",
        }
    }
}

/// Finite element interface used by the assembler and stress recovery
pub trait Element {
    fn element_type(&self) -> ElementType;

    /// Global equation number of each element DOF (0 = restrained)
    fn location_matrix(&self) -> Vec<usize>;

    /// Element stiffness, upper triangle packed column by column
    fn stiffness(&self) -> FEMResult<Vec<f64>>;

    /// Element stress from the global displacement vector
    fn stress(&self, displacement: &[f64]) -> FEMResult<ElementStress>;
}

/// A resolved element of any supported type
#[derive(Debug, Clone, Copy)]
pub enum ElementView<'a> {
    Bar(Bar<'a>),
    Q4(Q4<'a>),
}

impl Element for ElementView<'_> {
    fn element_type(&self) -> ElementType {
        match self {
            Self::Bar(_) => ElementType::Bar,
            Self::Q4(_) => ElementType::Q4,
        }
    }

    fn location_matrix(&self) -> Vec<usize> {
        match self {
            Self::Bar(bar) => bar.location_matrix().to_vec(),
            Self::Q4(q4) => q4.location_matrix().to_vec(),
        }
    }

    fn stiffness(&self) -> FEMResult<Vec<f64>> {
        match self {
            Self::Bar(bar) => bar.stiffness(),
            Self::Q4(q4) => q4.stiffness(),
        }
    }

    fn stress(&self, displacement: &[f64]) -> FEMResult<ElementStress> {
        match self {
            Self::Bar(bar) => {
                let stress = bar.stress(displacement)?;
                Ok(ElementStress::Axial {
                    stress,
                    force: bar.axial_force(stress),
                })
            }
            Self::Q4(q4) => {
                let [sx, sy, txy] = q4.stress(displacement)?;
                Ok(ElementStress::PlaneStress(PlaneStresses { sx, sy, txy }))
            }
        }
    }
}

/// Element connectivity as stored in a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementConnectivity {
    /// Node numbers (1-based), counter-clockwise for Q4
    pub nodes: Vec<usize>,
    /// Material set number within the group (1-based)
    pub material: usize,
}

impl ElementConnectivity {
    pub fn new(nodes: &[usize], material: usize) -> Self {
        Self {
            nodes: nodes.to_vec(),
            material,
        }
    }
}

/// A group of elements of one type sharing a table of material sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementGroup {
    pub element_type: ElementType,
    pub materials: Vec<Material>,
    pub elements: Vec<ElementConnectivity>,
}

impl ElementGroup {
    /// Create an empty group
    pub fn new(element_type: ElementType) -> Self {
        Self {
            element_type,
            materials: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Add a material set (builder style)
    pub fn with_material(mut self, material: Material) -> Self {
        self.materials.push(material);
        self
    }

    /// Add an element (builder style)
    pub fn with_element(mut self, nodes: &[usize], material: usize) -> Self {
        self.elements.push(ElementConnectivity::new(nodes, material));
        self
    }

    /// Number of elements in the group
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Material set by 1-based number
    pub fn material(&self, set: usize) -> FEMResult<&Material> {
        set.checked_sub(1)
            .and_then(|i| self.materials.get(i))
            .ok_or(FEMError::MaterialNotFound(set))
    }

    /// Resolve element `index` (0-based) against the domain's nodes
    pub fn view<'a>(&'a self, index: usize, nodes: &'a [Node]) -> FEMResult<ElementView<'a>> {
        let connectivity = self.elements.get(index).ok_or_else(|| {
            FEMError::OutOfRangeIndex(format!(
                "element {} outside group of {} elements",
                index + 1,
                self.elements.len()
            ))
        })?;

        let expected = self.element_type.nodes_per_element();
        if connectivity.nodes.len() != expected {
            return Err(FEMError::InvalidInput(format!(
                "{} element {} has {} nodes, expected {}",
                self.element_type.name(),
                index + 1,
                connectivity.nodes.len(),
                expected
            )));
        }

        let node = move |number: usize| -> FEMResult<&'a Node> {
            number
                .checked_sub(1)
                .and_then(|i| nodes.get(i))
                .ok_or(FEMError::NodeNotFound(number))
        };
        let material = self.material(connectivity.material)?;
        let n = &connectivity.nodes;

        Ok(match self.element_type {
            ElementType::Bar => ElementView::Bar(Bar::new([node(n[0])?, node(n[1])?], material)?),
            ElementType::Q4 => ElementView::Q4(Q4::new(
                [node(n[0])?, node(n[1])?, node(n[2])?, node(n[3])?],
                material,
            )?),
        })
    }
}
