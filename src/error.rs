use thiserror::Error;

/// Errors raised by the simulation, normalization and summary layers.
///
/// Every failure is reported at the point of violation. Nothing in this crate
/// retries or substitutes a sentinel value such as NaN.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Malformed configuration: non-positive sizes, inverted ranges, bad scale factors.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Profile with negative or non-finite weights, or not summing to one.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// Depth that is non-finite or does not round to at least one molecule. `cell` is set
    /// when the depth came from a batch.
    #[error(
        "invalid depth {depth}{}: depth must be finite and round to at least one molecule",
        cell_suffix(.cell)
    )]
    InvalidDepth { cell: Option<usize>, depth: f64 },

    /// Matrix shape inconsistent with the profile or the cell count.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Cell with zero total count, which cannot be divided through.
    #[error("cell {cell} has a total count of zero and cannot be normalized")]
    ZeroDepthCell { cell: usize },
}

pub type Result<T> = std::result::Result<T, SimulationError>;

fn cell_suffix(cell: &Option<usize>) -> String {
    match cell {
        Some(cell) => format!(" for cell {}", cell),
        None => String::new(),
    }
}
