//! Closed-form reference curves for mean-variance and mean-dropout plots.

use crate::summary::GeneSummary;
use log::warn;

/// Variance of a Poisson variable with the given mean.
pub fn poisson_variance(mean: f64) -> f64 {
    mean
}

/// Probability that a Poisson variable with the given mean is zero.
pub fn poisson_dropout(mean: f64) -> f64 {
    (-mean).exp()
}

/// Negative binomial variance `mean + phi * mean^2`.
///
/// A non-positive `phi` is treated as zero, giving the Poisson variance.
pub fn negative_binomial_variance(mean: f64, phi: f64) -> f64 {
    mean + phi.max(0.0) * mean * mean
}

/// Negative binomial zero probability `(1 + phi * mean)^(-1 / phi)`.
///
/// A non-positive `phi` is treated as zero, giving the Poisson zero probability.
pub fn negative_binomial_dropout(mean: f64, phi: f64) -> f64 {
    if phi <= 0.0 {
        return poisson_dropout(mean);
    }
    (-(phi * mean).ln_1p() / phi).exp()
}

/// Method-of-moments estimate of a single dispersion shared by all genes:
/// `sum(variance - mean) / sum(mean^2)` over genes with a positive mean, floored at zero.
///
/// Returns `None` when no gene has a positive mean.
pub fn fit_dispersion(summaries: &[GeneSummary]) -> Option<f64> {
    let (excess, mean_sq) = summaries
        .iter()
        .filter(|s| s.mean > 0.0)
        .fold((0.0, 0.0), |(excess, mean_sq), s| {
            (excess + s.variance - s.mean, mean_sq + s.mean * s.mean)
        });
    if mean_sq <= 0.0 {
        warn!("No gene with positive mean, dispersion is not estimable");
        return None;
    }
    Some((excess / mean_sq).max(0.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TheoreticalCurve {
    Poisson,
    NegativeBinomial { phi: f64 },
}

impl TheoreticalCurve {
    pub fn variance(&self, mean: f64) -> f64 {
        match *self {
            TheoreticalCurve::Poisson => poisson_variance(mean),
            TheoreticalCurve::NegativeBinomial { phi } => negative_binomial_variance(mean, phi),
        }
    }

    pub fn dropout(&self, mean: f64) -> f64 {
        match *self {
            TheoreticalCurve::Poisson => poisson_dropout(mean),
            TheoreticalCurve::NegativeBinomial { phi } => negative_binomial_dropout(mean, phi),
        }
    }

    /// `(mean, variance, dropout)` at every requested mean, for plotting.
    pub fn evaluate(&self, means: &[f64]) -> Vec<(f64, f64, f64)> {
        means
            .iter()
            .map(|&m| (m, self.variance(m), self.dropout(m)))
            .collect()
    }
}

/// `n_points` means spaced evenly in log10 between `low` and `high` (both positive).
pub fn log_spaced_means(low: f64, high: f64, n_points: usize) -> Vec<f64> {
    match n_points {
        0 => Vec::new(),
        1 => vec![low],
        _ => {
            let (a, b) = (low.log10(), high.log10());
            let step = (b - a) / (n_points - 1) as f64;
            (0..n_points)
                .map(|i| 10f64.powf(a + step * i as f64))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn poisson_curves() {
        assert_eq!(poisson_variance(0.0), 0.0);
        assert_eq!(poisson_variance(12.5), 12.5);
        assert_eq!(poisson_dropout(0.0), 1.0);
        assert_relative_eq!(poisson_dropout(2.0), (-2.0f64).exp());
    }

    #[test]
    fn negative_binomial_reduces_to_poisson() {
        assert_eq!(negative_binomial_variance(3.0, 0.0), 3.0);
        assert_eq!(negative_binomial_dropout(3.0, 0.0), poisson_dropout(3.0));
        // phi = 1 is geometric: P(0) = 1 / (1 + mean)
        assert_relative_eq!(negative_binomial_dropout(3.0, 1.0), 0.25, epsilon = 1e-12);
        assert_relative_eq!(negative_binomial_variance(3.0, 1.0), 12.0);
        // negative phi falls back to Poisson for both curves
        assert_eq!(negative_binomial_variance(3.0, -0.5), poisson_variance(3.0));
        assert_eq!(negative_binomial_dropout(3.0, -0.5), poisson_dropout(3.0));
        // tiny phi approaches Poisson
        assert_abs_diff_eq!(
            negative_binomial_dropout(3.0, 1e-9),
            poisson_dropout(3.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn dispersion_fit() {
        let summaries: Vec<GeneSummary> = [1.0, 10.0, 100.0]
            .iter()
            .map(|&m| GeneSummary {
                mean: m,
                variance: negative_binomial_variance(m, 0.2),
                dropout_probability: negative_binomial_dropout(m, 0.2),
            })
            .collect();
        assert_relative_eq!(fit_dispersion(&summaries).unwrap(), 0.2, epsilon = 1e-12);

        let underdispersed = [GeneSummary {
            mean: 5.0,
            variance: 1.0,
            dropout_probability: 0.0,
        }];
        assert_eq!(fit_dispersion(&underdispersed), Some(0.0));
        assert_eq!(fit_dispersion(&[]), None);
    }

    #[test]
    fn curve_evaluation() {
        let means = log_spaced_means(0.01, 100.0, 5);
        assert_eq!(means.len(), 5);
        assert_relative_eq!(means[0], 0.01, epsilon = 1e-12);
        assert_relative_eq!(means[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(means[4], 100.0, epsilon = 1e-9);

        let points = TheoreticalCurve::Poisson.evaluate(&means);
        for (m, v, d) in points {
            assert_eq!(v, m);
            assert_eq!(d, (-m).exp());
        }
    }
}
