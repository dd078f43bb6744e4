//! Error types for the STAP solver

use thiserror::Error;

/// Main error type for finite element operations
#[derive(Error, Debug)]
pub enum FEMError {
    #[error("Shape mismatch in {op}: {}x{} vs {}x{}", .left.0, .left.1, .right.0, .right.1)]
    ShapeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Matrix dimensions must be non-zero, got {rows}x{cols}")]
    EmptyMatrix { rows: usize, cols: usize },

    #[error("Degenerate element geometry: det(J) = {det_j:e} at (xi, eta) = ({xi}, {eta})")]
    DegenerateGeometry { det_j: f64, xi: f64, eta: f64 },

    #[error("Index out of range: {0}")]
    OutOfRangeIndex(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Node {0} not found in domain")]
    NodeNotFound(usize),

    #[error("Material set {0} not found in element group")]
    MaterialNotFound(usize),

    #[error("Material mismatch: expected {expected} material, found {found}")]
    MaterialMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Zero pivot at equation {0} - stiffness matrix is singular, check supports")]
    SingularMatrix(usize),

    #[error("Equation numbers not assigned - run calculate_equation_numbers() first")]
    NotNumbered,

    #[error("Equation numbers already assigned - nodes and element groups can no longer be added")]
    AlreadyNumbered,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for finite element operations
pub type FEMResult<T> = Result<T, FEMError>;
