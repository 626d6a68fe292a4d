use crate::error::{Result, SimulationError};
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the total count of each cell is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DepthPolicy {
    /// Every cell receives the same depth.
    Constant { depth: f64 },
    /// Depth drawn uniformly from `[low, high]` per cell.
    Variable { low: f64, high: f64 },
}

impl DepthPolicy {
    pub fn validate(&self) -> Result<()> {
        match *self {
            DepthPolicy::Constant { depth } => check_constant(depth),
            DepthPolicy::Variable { low, high } => check_range(low, high),
        }
    }

    /// One depth per cell under this policy. Depths are real valued; the count simulator
    /// rounds them when it uses them as a number of trials.
    pub fn sample<R>(&self, n_cells: usize, rng: &mut R) -> Result<Vec<f64>>
    where
        R: Rng + ?Sized,
    {
        match *self {
            DepthPolicy::Constant { depth } => constant(depth, n_cells),
            DepthPolicy::Variable { low, high } => variable(n_cells, low, high, rng),
        }
    }
}

pub fn constant(depth: f64, n_cells: usize) -> Result<Vec<f64>> {
    check_cells(n_cells)?;
    check_constant(depth)?;
    Ok(vec![depth; n_cells])
}

pub fn variable<R>(n_cells: usize, low: f64, high: f64, rng: &mut R) -> Result<Vec<f64>>
where
    R: Rng + ?Sized,
{
    check_cells(n_cells)?;
    check_range(low, high)?;
    Ok((0..n_cells).map(|_| rng.gen_range(low..=high)).collect())
}

fn check_cells(n_cells: usize) -> Result<()> {
    if n_cells == 0 {
        return Err(SimulationError::InvalidParameters(
            "at least one cell is required".to_string(),
        ));
    }
    Ok(())
}

fn check_constant(depth: f64) -> Result<()> {
    if !depth.is_finite() || depth <= 0.0 {
        return Err(SimulationError::InvalidParameters(format!(
            "constant depth must be positive and finite, got {}",
            depth
        )));
    }
    Ok(())
}

fn check_range(low: f64, high: f64) -> Result<()> {
    if !low.is_finite() || !high.is_finite() {
        return Err(SimulationError::InvalidParameters(format!(
            "depth range [{}, {}] must be finite",
            low, high
        )));
    }
    if low <= 0.0 {
        return Err(SimulationError::InvalidParameters(format!(
            "lower depth bound must be positive, got {}",
            low
        )));
    }
    if low > high {
        return Err(SimulationError::InvalidParameters(format!(
            "lower depth bound {} exceeds upper bound {}",
            low, high
        )));
    }
    Ok(())
}
