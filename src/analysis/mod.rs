//! Analysis options

use serde::{Deserialize, Serialize};

/// What the analysis does after reading and numbering the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolutionMode {
    /// Number equations and echo the input, no solution
    DataCheck,
    /// Assemble, factorize and solve every load case
    #[default]
    Execute,
}

impl SolutionMode {
    /// Mode from the `MODEX` input flag (0 = data check, otherwise execute)
    pub fn from_modex(modex: usize) -> Self {
        if modex == 0 {
            Self::DataCheck
        } else {
            Self::Execute
        }
    }

    pub fn modex(&self) -> usize {
        match self {
            Self::DataCheck => 0,
            Self::Execute => 1,
        }
    }
}

/// Options for static analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Solution mode
    pub mode: SolutionMode,
    /// Enable progress output
    pub log: bool,
}

impl AnalysisOptions {
    /// Create options for a full solution
    pub fn execute() -> Self {
        Self::default()
    }

    /// Create options for a data check run
    pub fn data_check() -> Self {
        Self {
            mode: SolutionMode::DataCheck,
            ..Self::default()
        }
    }

    /// Enable logging
    pub fn with_logging(mut self) -> Self {
        self.log = true;
        self
    }

    /// Set the solution mode
    pub fn with_mode(mut self, mode: SolutionMode) -> Self {
        self.mode = mode;
        self
    }
}
