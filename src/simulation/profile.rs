use crate::error::{Result, SimulationError};
use crate::matrix::ExpressionMatrix;
use ndarray::Axis;
use num_traits::AsPrimitive;
use rand::Rng;

/// Allowed deviation of a profile's total from one.
pub const PROFILE_TOLERANCE: f64 = 1e-6;

/// Relative abundance of every gene. Weights are nonnegative and sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneProfile {
    weights: Vec<f64>,
}

impl GeneProfile {
    /// Draw a log-uniform abundance profile.
    ///
    /// Each raw weight is `10^u` with `u` uniform in `[min_exponent, max_exponent]`; the
    /// weights are then rescaled to sum to one, so every entry is strictly positive. A range
    /// so wide that the smallest weight underflows to zero next to the largest is rejected
    /// with [`SimulationError::InvalidParameters`].
    pub fn generate<R>(
        n_genes: usize,
        min_exponent: f64,
        max_exponent: f64,
        rng: &mut R,
    ) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        if n_genes == 0 {
            return Err(SimulationError::InvalidParameters(
                "a profile needs at least one gene".to_string(),
            ));
        }
        if !min_exponent.is_finite() || !max_exponent.is_finite() {
            return Err(SimulationError::InvalidParameters(format!(
                "exponent range [{}, {}] must be finite",
                min_exponent, max_exponent
            )));
        }
        if min_exponent > max_exponent {
            return Err(SimulationError::InvalidParameters(format!(
                "minimum exponent {} exceeds maximum exponent {}",
                min_exponent, max_exponent
            )));
        }

        let exponents: Vec<f64> = (0..n_genes)
            .map(|_| rng.gen_range(min_exponent..=max_exponent))
            .collect();
        let max_drawn = exponents.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // relative to the largest draw, so the total lies in [1, n_genes]
        let raw: Vec<f64> = exponents
            .iter()
            .map(|&u| 10f64.powf(u - max_drawn))
            .collect();
        let total: f64 = raw.iter().sum();
        let weights: Vec<f64> = raw.into_iter().map(|w| w / total).collect();

        if let Some(gene) = weights.iter().position(|&w| w == 0.0) {
            return Err(SimulationError::InvalidParameters(format!(
                "exponent range [{}, {}] is too wide: weight of gene {} underflows to zero",
                min_exponent, max_exponent, gene
            )));
        }

        Ok(GeneProfile { weights })
    }

    /// Wrap caller supplied weights after checking they form a valid profile.
    pub fn from_weights(weights: Vec<f64>) -> Result<Self> {
        validate_weights(&weights)?;
        Ok(GeneProfile { weights })
    }

    /// Profile proportional to the per-gene totals of an observed matrix.
    pub fn from_matrix<M>(matrix: &M) -> Result<Self>
    where
        M: ExpressionMatrix + ?Sized,
    {
        let view = matrix.expression();
        let gene_totals: Vec<f64> = view
            .axis_iter(Axis(0))
            .map(|row| row.iter().map(|v| -> f64 { v.as_() }).sum::<f64>())
            .collect();
        let total: f64 = gene_totals.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(SimulationError::InvalidProfile(
                "matrix has no positive total to derive a profile from".to_string(),
            ));
        }
        GeneProfile::from_weights(gene_totals.into_iter().map(|t| t / total).collect())
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl AsRef<[f64]> for GeneProfile {
    fn as_ref(&self) -> &[f64] {
        &self.weights
    }
}

pub(crate) fn validate_weights(weights: &[f64]) -> Result<()> {
    if weights.is_empty() {
        return Err(SimulationError::InvalidProfile(
            "profile has no genes".to_string(),
        ));
    }
    if let Some((gene, &w)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(SimulationError::InvalidProfile(format!(
            "weight of gene {} is {}",
            gene, w
        )));
    }
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > PROFILE_TOLERANCE {
        return Err(SimulationError::InvalidProfile(format!(
            "weights sum to {} instead of 1",
            total
        )));
    }
    Ok(())
}
