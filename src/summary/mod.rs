//! Per-gene summary statistics and their theoretical references.
//!
//! The [`SummaryStatistics`] trait is implemented for every [`ExpressionMatrix`], so raw
//! counts, normalized matrices and caller supplied real data are all reduced the same way.

pub mod moments;
pub mod report;
pub mod theoretical;

pub use report::{NormalizationReport, compare_normalizations};
pub use theoretical::{TheoreticalCurve, poisson_dropout, poisson_variance};

use crate::error::{Result, SimulationError};
use crate::matrix::ExpressionMatrix;

/// Mean, variance and dropout probability of one gene across cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneSummary {
    pub mean: f64,
    /// Unbiased sample variance.
    pub variance: f64,
    /// Fraction of cells in which the gene is exactly zero.
    pub dropout_probability: f64,
}

impl GeneSummary {
    /// Variance to mean ratio; 1 for a Poisson gene. `None` for genes never observed.
    pub fn dispersion_ratio(&self) -> Option<f64> {
        if self.mean > 0.0 {
            Some(self.variance / self.mean)
        } else {
            None
        }
    }
}

pub trait SummaryStatistics {
    fn mean_variance(&self) -> Result<Vec<(f64, f64)>>;

    fn dropout_probability(&self) -> Result<Vec<f64>>;

    fn summarize(&self) -> Result<Vec<GeneSummary>>;
}

impl<M> SummaryStatistics for M
where
    M: ExpressionMatrix + ?Sized,
{
    fn mean_variance(&self) -> Result<Vec<(f64, f64)>> {
        moments::mean_variance(self.expression())
    }

    fn dropout_probability(&self) -> Result<Vec<f64>> {
        moments::dropout_probability(self.expression())
    }

    fn summarize(&self) -> Result<Vec<GeneSummary>> {
        let moments = self.mean_variance()?;
        let dropout = self.dropout_probability()?;
        if moments.len() != dropout.len() {
            return Err(SimulationError::DimensionMismatch(format!(
                "{} moments for {} dropout values",
                moments.len(),
                dropout.len()
            )));
        }

        Ok(moments
            .into_iter()
            .zip(dropout)
            .map(|((mean, variance), dropout_probability)| GeneSummary {
                mean,
                variance,
                dropout_probability,
            })
            .collect())
    }
}
