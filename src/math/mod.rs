//! Mathematical utilities for FEA calculations

pub mod dense;
pub mod quad4;
pub mod skyline;

use nalgebra::DMatrix;

pub use dense::DenseMatrix;
pub use quad4::{
    check_corners, jacobian, shape_derivatives, strain_displacement, CORNERS, GAUSS_2X2,
    GAUSS_POINT,
};
pub use skyline::SkylineMatrix;

pub type Mat = DMatrix<f64>;
