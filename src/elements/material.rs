//! Material property sets

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::FEMResult;
use crate::math::DenseMatrix;

/// Material of a bar (truss) element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarMaterial {
    /// Modulus of elasticity
    pub e: f64,
    /// Cross-sectional area
    pub area: f64,
}

impl BarMaterial {
    pub fn new(e: f64, area: f64) -> Self {
        Self { e, area }
    }
}

/// Isotropic plane-stress material of a Q4 element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneStressMaterial {
    /// Modulus of elasticity
    pub e: f64,
    /// Poisson's ratio
    pub nu: f64,
    /// Thickness
    pub t: f64,
}

impl PlaneStressMaterial {
    pub fn new(e: f64, nu: f64, t: f64) -> Self {
        Self { e, nu, t }
    }

    /// Whether the properties describe a physically valid solid:
    /// E > 0, t > 0 and -1 < nu < 0.5
    pub fn is_physical(&self) -> bool {
        self.e > 0.0 && self.t > 0.0 && self.nu > -1.0 && self.nu < 0.5
    }

    /// Plane-stress constitutive matrix [D] (3x3), scaled by thickness
    ///
    /// ```text
    /// D = E*t/(1-nu^2) * [ 1   nu  0          ]
    ///                    [ nu  1   0          ]
    ///                    [ 0   0   (1-nu)/2   ]
    /// ```
    /// The shear term is evaluated as `E*t / (2*(1+nu))`.
    pub fn constitutive_matrix(&self) -> FEMResult<DenseMatrix> {
        let c1 = self.e * self.t / (1.0 - self.nu * self.nu);
        let c2 = self.nu * c1;
        let c3 = 0.5 * self.e * self.t / (1.0 + self.nu);

        DenseMatrix::from_row_slice(3, 3, &[c1, c2, 0.0, c2, c1, 0.0, 0.0, 0.0, c3])
    }
}

/// A material property set, tagged by the element formulation it serves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Material {
    Bar(BarMaterial),
    PlaneStress(PlaneStressMaterial),
}

impl Material {
    /// Bar material from E and area
    pub fn bar(e: f64, area: f64) -> Self {
        Self::Bar(BarMaterial::new(e, area))
    }

    /// Plane-stress material from E, nu and thickness
    pub fn plane_stress(e: f64, nu: f64, t: f64) -> Self {
        Self::PlaneStress(PlaneStressMaterial::new(e, nu, t))
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bar(_) => "bar",
            Self::PlaneStress(_) => "plane stress",
        }
    }

    /// Log a warning if the properties are not physically meaningful
    pub(crate) fn warn_if_unphysical(&self, set: usize) {
        match self {
            Self::Bar(m) if !(m.e > 0.0 && m.area > 0.0) => {
                warn!("Bar material set {} has E = {}, A = {}", set, m.e, m.area);
            }
            Self::PlaneStress(m) if !m.is_physical() => {
                warn!(
                    "Plane stress material set {} has E = {}, nu = {}, t = {}",
                    set, m.e, m.nu, m.t
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_constitutive_matrix() {
        let d = PlaneStressMaterial::new(1.0, 0.0, 1.0)
            .constitutive_matrix()
            .unwrap();
        let expected = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.5]];
        for r in 0..3 {
            for c in 0..3 {
                assert_eq!(d[(r, c)], expected[r][c]);
            }
        }
    }

    #[test]
    fn test_steel_constitutive_matrix() {
        let m = PlaneStressMaterial::new(200e9, 0.3, 0.01);
        let d = m.constitutive_matrix().unwrap();
        let c1 = 200e9 * 0.01 / (1.0 - 0.09);
        assert_relative_eq!(d[(0, 0)], c1, max_relative = 1e-14);
        assert_relative_eq!(d[(1, 1)], c1, max_relative = 1e-14);
        assert_relative_eq!(d[(0, 1)], 0.3 * c1, max_relative = 1e-14);
        assert_eq!(d[(0, 1)], d[(1, 0)]);
        // G*t
        assert_relative_eq!(d[(2, 2)], 200e9 / 2.6 * 0.01, max_relative = 1e-14);
        assert_eq!(d[(0, 2)], 0.0);
        assert_eq!(d[(2, 1)], 0.0);
    }

    #[test]
    fn test_physical_bounds() {
        assert!(PlaneStressMaterial::new(1.0, 0.3, 1.0).is_physical());
        assert!(!PlaneStressMaterial::new(1.0, 0.5, 1.0).is_physical());
        assert!(!PlaneStressMaterial::new(1.0, -1.0, 1.0).is_physical());
        assert!(!PlaneStressMaterial::new(1.0, 0.2, 0.0).is_physical());
    }

    #[test]
    fn test_material_serde_tag() {
        let m = Material::plane_stress(1000.0, 0.25, 0.5);
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"kind\":\"PlaneStress\""));
        let back: Material = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        assert_eq!(back.kind(), "plane stress");
    }
}
